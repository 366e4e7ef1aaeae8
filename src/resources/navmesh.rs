//! Navigation zones and the pathfinder resource.
//!
//! A [`Zone`] is an immutable triangle graph partitioned into connected
//! groups. The [`Pathfinder`] resource owns zones by name and exposes the
//! four queries the rest of the app uses: zone registration, group
//! resolution, path finding and closest-node lookup.

use bevy::prelude::*;
use bevy::render::mesh::{PrimitiveTopology, VertexAttributeValues};
use serde::Deserialize;
use std::collections::HashMap;

use crate::utils::geometry::{distance_to_triangle_xz, points_equal_xz, surface_height};
use crate::utils::pathfinding::{find_corridor, string_pull, Portal};
use crate::utils::zone_builder::build_zone;

pub use crate::utils::zone_builder::ZoneError;

/// Index of a connected component inside a zone.
pub type GroupId = usize;

/// Raw walkable geometry: a vertex buffer plus a triangle-list index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavGeometry {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl NavGeometry {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Extracts positions and triangle indices from a Bevy mesh.
    /// Non-indexed meshes are read as consecutive vertex triples.
    pub fn from_mesh(mesh: &Mesh) -> Result<Self, ZoneError> {
        let topology = mesh.primitive_topology();
        if topology != PrimitiveTopology::TriangleList {
            return Err(ZoneError::UnsupportedTopology(topology));
        }
        let Some(VertexAttributeValues::Float32x3(raw)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            return Err(ZoneError::MissingPositions);
        };

        let positions: Vec<Vec3> = raw.iter().map(|p| Vec3::from_array(*p)).collect();
        let indices: Vec<u32> = match mesh.indices() {
            Some(indices) => indices.iter().map(|i| i as u32).collect(),
            None => (0..positions.len() as u32).collect(),
        };

        Ok(Self { positions, indices })
    }

    /// Appends another geometry, offsetting its indices.
    pub fn merge(&mut self, other: &NavGeometry) {
        let offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A single walkable triangle of a zone.
#[derive(Debug, Clone, PartialEq)]
pub struct NavNode {
    /// Index of this node inside its group.
    pub id: usize,
    /// Indices into the zone's welded vertex list.
    pub vertex_ids: [usize; 3],
    pub centroid: Vec3,
    /// Group-local ids of the triangles sharing an edge with this one.
    pub neighbours: Vec<usize>,
    /// Shared edge (vertex ids) for each entry of `neighbours`.
    pub portals: Vec<[usize; 2]>,
}

impl NavNode {
    /// The shared edge leading to `neighbour`, if the two nodes are adjacent.
    pub fn portal_to(&self, neighbour: usize) -> Option<[usize; 2]> {
        self.neighbours
            .iter()
            .position(|&n| n == neighbour)
            .map(|k| self.portals[k])
    }
}

/// A connected set of nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavGroup {
    pub nodes: Vec<NavNode>,
}

/// How far a point may sit from a triangle and still be localized to it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocateTolerance {
    /// Maximum distance outside the triangle edges, measured on the XZ plane.
    pub horizontal: f32,
    /// Maximum distance above or below the triangle surface.
    pub vertical: f32,
}

impl Default for LocateTolerance {
    fn default() -> Self {
        Self {
            horizontal: 1e-3,
            vertical: 1.0,
        }
    }
}

/// Summary counts of a built zone, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStats {
    pub vertex_count: usize,
    pub node_count: usize,
    pub group_count: usize,
}

/// Immutable navigation mesh partitioned into connected groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub(crate) vertices: Vec<Vec3>,
    pub(crate) groups: Vec<NavGroup>,
}

impl Zone {
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn groups(&self) -> &[NavGroup] {
        &self.groups
    }

    pub fn group(&self, group: GroupId) -> Option<&NavGroup> {
        self.groups.get(group)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn node_count(&self) -> usize {
        self.groups.iter().map(|g| g.nodes.len()).sum()
    }

    pub fn stats(&self) -> ZoneStats {
        ZoneStats {
            vertex_count: self.vertices.len(),
            node_count: self.node_count(),
            group_count: self.group_count(),
        }
    }

    /// World-space corners of a node.
    pub fn triangle(&self, node: &NavNode) -> [Vec3; 3] {
        node.vertex_ids.map(|i| self.vertices[i])
    }

    /// Scores how well `point` fits on `node`: `(horizontal, vertical)` distance,
    /// or `None` when outside tolerance.
    fn fit(&self, node: &NavNode, point: Vec3, tolerance: &LocateTolerance) -> Option<(f32, f32)> {
        let [a, b, c] = self.triangle(node);
        let horizontal = distance_to_triangle_xz(point, a, b, c)?;
        if horizontal > tolerance.horizontal {
            return None;
        }
        let vertical = (point.y - surface_height(point, a, b, c)?).abs();
        if vertical > tolerance.vertical {
            return None;
        }
        Some((horizontal, vertical))
    }

    /// The point moved vertically onto the node's surface.
    fn onto_surface(&self, node: &NavNode, point: Vec3) -> Vec3 {
        let [a, b, c] = self.triangle(node);
        surface_height(point, a, b, c).map_or(point, |y| Vec3::new(point.x, y, point.z))
    }

    /// Finds the node of `group` the point stands on.
    pub fn locate_in_group(
        &self,
        group: GroupId,
        point: Vec3,
        tolerance: &LocateTolerance,
    ) -> Option<usize> {
        let mut best: Option<(usize, (f32, f32))> = None;
        for node in &self.group(group)?.nodes {
            let Some(score) = self.fit(node, point, tolerance) else { continue };
            let better = match best {
                None => true,
                Some((_, (h, v))) => score.0 < h || (score.0 == h && score.1 < v),
            };
            if better {
                best = Some((node.id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Finds the group and node the point stands on, across all groups.
    pub fn locate(&self, point: Vec3, tolerance: &LocateTolerance) -> Option<(GroupId, usize)> {
        let mut best: Option<(GroupId, usize, (f32, f32))> = None;
        for (group_id, group) in self.groups.iter().enumerate() {
            for node in &group.nodes {
                let Some(score) = self.fit(node, point, tolerance) else { continue };
                let better = match best {
                    None => true,
                    Some((_, _, (h, v))) => score.0 < h || (score.0 == h && score.1 < v),
                };
                if better {
                    best = Some((group_id, node.id, score));
                }
            }
        }
        best.map(|(group_id, node_id, _)| (group_id, node_id))
    }

    /// Node of `group` containing the point's projection, otherwise the node
    /// with the nearest centroid.
    pub fn closest_node(
        &self,
        group: GroupId,
        point: Vec3,
        tolerance: &LocateTolerance,
    ) -> Option<&NavNode> {
        let nodes = &self.group(group)?.nodes;
        if let Some(id) = self.locate_in_group(group, point, tolerance) {
            return nodes.get(id);
        }
        nodes.iter().min_by(|a, b| {
            a.centroid
                .distance_squared(point)
                .total_cmp(&b.centroid.distance_squared(point))
        })
    }

    /// Waypoints from `start` to `end` inside `group`, excluding `start`.
    /// The last waypoint is `end` dropped onto the walkable surface.
    ///
    /// Fails when either point cannot be localized in the group or when no
    /// corridor connects them.
    pub fn find_path(
        &self,
        start: Vec3,
        end: Vec3,
        group: GroupId,
        tolerance: &LocateTolerance,
    ) -> Option<Vec<Vec3>> {
        let start_node = self.locate_in_group(group, start, tolerance)?;
        let end_node = self.locate_in_group(group, end, tolerance)?;

        let nodes = &self.group(group)?.nodes;
        let end = self.onto_surface(nodes.get(end_node)?, end);
        if start_node == end_node {
            return Some(vec![end]);
        }

        let corridor = find_corridor(nodes, start_node, end_node)?;
        let portals = self.corridor_portals(nodes, &corridor, start, end);

        let mut waypoints = string_pull(&portals);
        if !waypoints.is_empty() {
            waypoints.remove(0);
        }
        match waypoints.last_mut() {
            Some(last) if points_equal_xz(*last, end) => *last = end,
            _ => waypoints.push(end),
        }

        Some(waypoints)
    }

    /// Oriented portals along a corridor, bracketed by degenerate start and end portals.
    fn corridor_portals(
        &self,
        nodes: &[NavNode],
        corridor: &[usize],
        start: Vec3,
        end: Vec3,
    ) -> Vec<Portal> {
        let mut portals = Vec::with_capacity(corridor.len() + 1);
        portals.push(Portal::point(start));

        for pair in corridor.windows(2) {
            let from = &nodes[pair[0]];
            let to = &nodes[pair[1]];
            let Some([a, b]) = from.portal_to(to.id) else { continue };
            portals.push(Portal::oriented(
                self.vertices[a],
                self.vertices[b],
                from.centroid,
                to.centroid,
            ));
        }

        portals.push(Portal::point(end));
        portals
    }
}

/// Bevy Resource containing every registered navigation zone.
#[derive(Resource, Default, Debug)]
pub struct Pathfinder {
    zones: HashMap<String, Zone>,
    tolerance: LocateTolerance,
}

impl Pathfinder {
    /// Creates a new empty pathfinder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: LocateTolerance) -> Self {
        Self {
            zones: HashMap::new(),
            tolerance,
        }
    }

    /// Builds a zone from geometry and stores it under `name`.
    /// Registering an existing name replaces the previous zone.
    pub fn register_zone(
        &mut self,
        name: impl Into<String>,
        geometry: &NavGeometry,
    ) -> Result<ZoneStats, ZoneError> {
        let zone = build_zone(geometry)?;
        let stats = zone.stats();
        self.insert_zone(name, zone);
        Ok(stats)
    }

    /// Stores an already built zone under `name`.
    pub fn insert_zone(&mut self, name: impl Into<String>, zone: Zone) {
        let name = name.into();
        if self.zones.insert(name.clone(), zone).is_some() {
            debug!("Zone '{}' replaced", name);
        }
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        let zone = self.zones.get(name);
        if zone.is_none() {
            warn!("Unknown navigation zone '{}'", name);
        }
        zone
    }

    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    /// Returns true if any zone is registered.
    pub fn is_ready(&self) -> bool {
        !self.zones.is_empty()
    }

    /// Group of the zone the point stands on, or `None` if it is ungrounded.
    pub fn resolve_group(&self, zone_name: &str, point: Vec3) -> Option<GroupId> {
        self.zone(zone_name)?
            .locate(point, &self.tolerance)
            .map(|(group, _)| group)
    }

    /// Finds a path from start to end within one group of a zone.
    pub fn find_path(
        &self,
        start: Vec3,
        end: Vec3,
        zone_name: &str,
        group: GroupId,
    ) -> Option<Vec<Vec3>> {
        self.zone(zone_name)?.find_path(start, end, group, &self.tolerance)
    }

    /// Node nearest to `point` in the given group.
    pub fn closest_node(&self, point: Vec3, zone_name: &str, group: GroupId) -> Option<&NavNode> {
        self.zone(zone_name)?.closest_node(group, point, &self.tolerance)
    }

    /// Finds a path from `start`, retrying once from the centroid of the
    /// closest node when `start` itself cannot be localized.
    pub fn find_path_or_closest(
        &self,
        start: Vec3,
        end: Vec3,
        zone_name: &str,
        group: GroupId,
    ) -> Option<Vec<Vec3>> {
        if let Some(path) = self.find_path(start, end, zone_name, group) {
            return Some(path);
        }

        let fallback = self.closest_node(start, zone_name, group)?.centroid;
        debug!(
            "Path from ({:.2}, {:.2}, {:.2}) failed, retrying from node centroid ({:.2}, {:.2}, {:.2})",
            start.x, start.y, start.z, fallback.x, fallback.y, fallback.z
        );
        self.find_path(fallback, end, zone_name, group)
    }
}
