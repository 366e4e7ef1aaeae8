//! Geometry utilities for navigation triangles and walkable-area meshes.
//!
//! All "horizontal" helpers work on the XZ plane (Y is up), which is the plane
//! navigation queries project onto.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};
use std::collections::HashMap;

use crate::resources::navmesh::NavGeometry;

/// Two points closer than this (squared, XZ) are treated as the same funnel vertex.
pub const POINT_EQUAL_EPSILON_SQ: f32 = 1e-6;

/// Returns the centroid of a triangle.
pub fn triangle_centroid(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (a + b + c) / 3.0
}

/// 2D cross product of two vectors projected on the XZ plane.
pub fn cross_xz(u: Vec3, v: Vec3) -> f32 {
    u.x * v.z - u.z * v.x
}

/// Twice the signed area of triangle `abc` on the XZ plane.
///
/// Sign convention matches the funnel: a negative value means `c` lies on
/// the "right" of the ray `a -> b`.
pub fn triarea2(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    -cross_xz(b - a, c - a)
}

/// True when two points coincide on the XZ plane.
pub fn points_equal_xz(a: Vec3, b: Vec3) -> bool {
    let d = (a - b).xz();
    d.length_squared() < POINT_EQUAL_EPSILON_SQ
}

/// Barycentric coordinates of `p` in triangle `abc`, projected on XZ.
///
/// Returns `None` for triangles that are degenerate in projection (vertical
/// walls or zero area).
pub fn barycentric_xz(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let v0 = (b - a).xz();
    let v1 = (c - a).xz();
    let v2 = (p - a).xz();

    let den = v0.x * v1.y - v1.x * v0.y;
    if den.abs() <= f32::EPSILON {
        return None;
    }

    let v = (v2.x * v1.y - v1.x * v2.y) / den;
    let w = (v0.x * v2.y - v2.x * v0.y) / den;
    Some(Vec3::new(1.0 - v - w, v, w))
}

/// Distance on the XZ plane between a point and a segment.
fn distance_to_segment_xz(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Horizontal distance from `p` to triangle `abc` (zero when the projection
/// of `p` lies inside the triangle).
pub fn distance_to_triangle_xz(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let bary = barycentric_xz(p, a, b, c)?;
    if bary.min_element() >= 0.0 {
        return Some(0.0);
    }

    let (p2, a2, b2, c2) = (p.xz(), a.xz(), b.xz(), c.xz());
    Some(
        distance_to_segment_xz(p2, a2, b2)
            .min(distance_to_segment_xz(p2, b2, c2))
            .min(distance_to_segment_xz(p2, c2, a2)),
    )
}

/// Height of the triangle's plane directly below (or above) `p`.
pub fn surface_height(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let bary = barycentric_xz(p, a, b, c)?;
    Some(bary.x * a.y + bary.y * b.y + bary.z * c.y)
}

/// Tests if a point is inside a polygon using ray casting.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;

    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// A flat walkable region described by its outline and the obstacles cut out of it.
///
/// Polygons are given on the XZ plane (`Vec2.x` = X, `Vec2.y` = Z).
#[derive(Debug, Clone)]
pub struct WalkableArea {
    pub outline: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
    /// World-space Y of the surface.
    pub height: f32,
}

impl WalkableArea {
    pub fn new(outline: Vec<Vec2>, height: f32) -> Self {
        Self {
            outline,
            holes: Vec::new(),
            height,
        }
    }

    pub fn with_hole(mut self, hole: Vec<Vec2>) -> Self {
        self.holes.push(hole);
        self
    }
}

/// Axis-aligned rectangle on the XZ plane, counter-clockwise.
pub fn rect_xz(min: Vec2, max: Vec2) -> Vec<Vec2> {
    vec![
        Vec2::new(min.x, min.y),
        Vec2::new(max.x, min.y),
        Vec2::new(max.x, max.y),
        Vec2::new(min.x, max.y),
    ]
}

/// Triangulates a walkable area with a constrained Delaunay triangulation.
///
/// Outline and hole edges are inserted as constraints, then triangles whose
/// centroid falls inside a hole (or outside the outline) are discarded.
/// Triangles are wound so their normal points up (+Y).
pub fn triangulate_walkable_area(area: &WalkableArea) -> Option<NavGeometry> {
    if area.outline.len() < 3 {
        return None;
    }

    let mut cdt: ConstrainedDelaunayTriangulation<Point2<f64>> =
        ConstrainedDelaunayTriangulation::new();

    for ring in std::iter::once(&area.outline).chain(area.holes.iter()) {
        if ring.len() < 3 {
            continue;
        }
        let mut handles = Vec::with_capacity(ring.len());
        for p in ring {
            match cdt.insert(Point2::new(p.x as f64, p.y as f64)) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!("Walkable area vertex ({:.2}, {:.2}) rejected: {:?}", p.x, p.y, e);
                    return None;
                }
            }
        }
        for i in 0..handles.len() {
            let from = handles[i];
            let to = handles[(i + 1) % handles.len()];
            if from != to {
                cdt.add_constraint(from, to);
            }
        }
    }

    let positions: Vec<Vec3> = cdt
        .vertices()
        .map(|v| {
            let p = v.position();
            Vec3::new(p.x as f32, area.height, p.y as f32)
        })
        .collect();

    let vertex_lookup: HashMap<_, _> = cdt
        .vertices()
        .enumerate()
        .map(|(i, v)| (v.fix(), i))
        .collect();

    let mut indices: Vec<u32> = Vec::new();

    for face in cdt.inner_faces() {
        let verts = face.vertices();

        let Some(&i0) = vertex_lookup.get(&verts[0].fix()) else { continue };
        let Some(&i1) = vertex_lookup.get(&verts[1].fix()) else { continue };
        let Some(&i2) = vertex_lookup.get(&verts[2].fix()) else { continue };

        let centroid = triangle_centroid(positions[i0], positions[i1], positions[i2]).xz();

        let inside_outline = point_in_polygon(centroid, &area.outline);
        let inside_hole = area.holes.iter().any(|hole| point_in_polygon(centroid, hole));

        if !inside_outline || inside_hole {
            continue;
        }

        // Up-facing winding: (b - a) x (c - a) must point along +Y.
        let normal_y = (positions[i1] - positions[i0])
            .cross(positions[i2] - positions[i0])
            .y;
        if normal_y >= 0.0 {
            indices.extend_from_slice(&[i0 as u32, i1 as u32, i2 as u32]);
        } else {
            indices.extend_from_slice(&[i0 as u32, i2 as u32, i1 as u32]);
        }
    }

    if indices.is_empty() {
        return None;
    }

    Some(NavGeometry::new(positions, indices))
}

/// Builds a renderable triangle-list mesh from navigation geometry.
///
/// Normals are averaged from the faces sharing each vertex.
pub fn mesh_from_geometry(geometry: &NavGeometry) -> Mesh {
    let mut normals = vec![Vec3::ZERO; geometry.positions.len()];
    for tri in geometry.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= normals.len() || b >= normals.len() || c >= normals.len() {
            continue;
        }
        let p = &geometry.positions;
        let face = (p[b] - p[a]).cross(p[c] - p[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    let positions: Vec<[f32; 3]> = geometry.positions.iter().map(|p| p.to_array()).collect();
    let normals: Vec<[f32; 3]> = normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(geometry.indices.clone()))
}
