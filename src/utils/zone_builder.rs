//! Builds navigation zones from triangle soup.
//!
//! Vertices are welded, triangles connected through shared edges, and the
//! resulting graph is flood-filled into groups of mutually reachable nodes.

use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;

use crate::resources::navmesh::{NavGeometry, NavGroup, NavNode, Zone};
use crate::utils::geometry::triangle_centroid;

/// Positions closer than this on every axis are merged into one vertex.
pub const WELD_PRECISION: f32 = 1e-4;

/// Malformed walkable geometry. Fatal for the zone being built.
#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("navigation geometry has no vertices or no triangles")]
    EmptyGeometry,
    #[error("index count {0} is not a multiple of three")]
    IndexCount(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("vertex {0} has a non-finite position")]
    NonFiniteVertex(usize),
    #[error("mesh has no Float32x3 position attribute")]
    MissingPositions,
    #[error("no usable triangles left after welding vertices")]
    NoUsableTriangles,
    #[error("mesh topology {0:?} is not a triangle list")]
    UnsupportedTopology(PrimitiveTopology),
}

fn validate(geometry: &NavGeometry) -> Result<(), ZoneError> {
    if geometry.positions.is_empty() || geometry.indices.is_empty() {
        return Err(ZoneError::EmptyGeometry);
    }
    if geometry.indices.len() % 3 != 0 {
        return Err(ZoneError::IndexCount(geometry.indices.len()));
    }
    if let Some(i) = geometry.positions.iter().position(|p| !p.is_finite()) {
        return Err(ZoneError::NonFiniteVertex(i));
    }
    let vertex_count = geometry.positions.len();
    if let Some(&index) = geometry.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ZoneError::IndexOutOfRange { index, vertex_count });
    }
    Ok(())
}

/// Merges coincident positions. Returns the welded vertex list and, for each
/// input position, its index in that list.
///
/// Positions are bucketed into cells of `WELD_PRECISION`; a position is merged
/// with the earliest vertex within precision found in its own or a
/// neighbouring cell, so near points straddling a cell boundary still weld.
fn weld_vertices(positions: &[Vec3]) -> (Vec<Vec3>, Vec<usize>) {
    let mut cells: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut remap = Vec::with_capacity(positions.len());

    for p in positions {
        let cell = (
            (p.x / WELD_PRECISION).floor() as i64,
            (p.y / WELD_PRECISION).floor() as i64,
            (p.z / WELD_PRECISION).floor() as i64,
        );

        let mut welded: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = cells.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz)) else {
                        continue;
                    };
                    for &v in candidates {
                        let close = (vertices[v] - *p).abs().max_element() <= WELD_PRECISION;
                        if close && welded.map_or(true, |w| v < w) {
                            welded = Some(v);
                        }
                    }
                }
            }
        }

        let index = welded.unwrap_or_else(|| {
            vertices.push(*p);
            let index = vertices.len() - 1;
            cells.entry(cell).or_default().push(index);
            index
        });
        remap.push(index);
    }

    (vertices, remap)
}

/// Converts walkable geometry into a [`Zone`].
///
/// Deterministic: the same geometry always yields the same groups and node order.
pub fn build_zone(geometry: &NavGeometry) -> Result<Zone, ZoneError> {
    validate(geometry)?;

    let (vertices, remap) = weld_vertices(&geometry.positions);

    // Triangles collapsed by welding have no interior and are dropped.
    let triangles: Vec<[usize; 3]> = geometry
        .indices
        .chunks_exact(3)
        .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]])
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    if triangles.is_empty() {
        return Err(ZoneError::NoUsableTriangles);
    }

    // Edge -> triangles using it. BTreeMap keeps neighbour order stable.
    let mut edges: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (t, tri) in triangles.iter().enumerate() {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            edges.entry((a.min(b), a.max(b))).or_default().push(t);
        }
    }

    // Duplicates share all three edges, not exactly one.
    let vertex_sets: Vec<[usize; 3]> = triangles
        .iter()
        .map(|tri| {
            let mut sorted = *tri;
            sorted.sort_unstable();
            sorted
        })
        .collect();

    let mut adjacency: Vec<Vec<(usize, [usize; 2])>> = vec![Vec::new(); triangles.len()];
    for (&(a, b), users) in &edges {
        for (i, &t1) in users.iter().enumerate() {
            for &t2 in &users[i + 1..] {
                if t1 == t2
                    || vertex_sets[t1] == vertex_sets[t2]
                    || adjacency[t1].iter().any(|(n, _)| *n == t2)
                {
                    continue;
                }
                adjacency[t1].push((t2, [a, b]));
                adjacency[t2].push((t1, [a, b]));
            }
        }
    }
    for neighbours in &mut adjacency {
        neighbours.sort_by_key(|(n, _)| *n);
    }

    // Flood fill into groups, seeded in triangle order.
    let mut group_of = vec![usize::MAX; triangles.len()];
    let mut local_id = vec![0usize; triangles.len()];
    let mut members: Vec<Vec<usize>> = Vec::new();

    for seed in 0..triangles.len() {
        if group_of[seed] != usize::MAX {
            continue;
        }
        let group = members.len();
        let mut visited = Vec::new();
        let mut queue = VecDeque::from([seed]);
        group_of[seed] = group;

        while let Some(t) = queue.pop_front() {
            local_id[t] = visited.len();
            visited.push(t);
            for &(n, _) in &adjacency[t] {
                if group_of[n] == usize::MAX {
                    group_of[n] = group;
                    queue.push_back(n);
                }
            }
        }
        members.push(visited);
    }

    let groups: Vec<NavGroup> = members
        .iter()
        .map(|tris| NavGroup {
            nodes: tris
                .iter()
                .map(|&t| {
                    let [a, b, c] = triangles[t];
                    NavNode {
                        id: local_id[t],
                        vertex_ids: [a, b, c],
                        centroid: triangle_centroid(vertices[a], vertices[b], vertices[c]),
                        neighbours: adjacency[t].iter().map(|(n, _)| local_id[*n]).collect(),
                        portals: adjacency[t].iter().map(|(_, edge)| *edge).collect(),
                    }
                })
                .collect(),
        })
        .collect();

    debug!(
        "Built zone: {} vertices, {} triangles, {} groups",
        vertices.len(),
        triangles.len(),
        groups.len()
    );

    Ok(Zone { vertices, groups })
}
