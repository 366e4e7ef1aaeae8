//! Polygon-graph pathfinding for navigation zones.
//!
//! Two stages:
//! - A* over triangle adjacency yields a corridor of nodes.
//! - The simple stupid funnel algorithm pulls the corridor's portals into
//!   the shortest sequence of straight segments.

use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::resources::navmesh::NavNode;
use crate::utils::geometry::{cross_xz, points_equal_xz, triarea2};

/// Wrapper for f32 that implements Ord for use in BinaryHeap.
/// Uses total ordering where NaN is treated as greater than all other values.
#[derive(Clone, Copy, PartialEq)]
struct OrderedF32(f32);

impl Eq for OrderedF32 {}

impl Ord for OrderedF32 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for OrderedF32 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A node in the A* open set.
#[derive(Clone, Copy, PartialEq, Eq)]
struct SearchNode {
    node: usize,
    priority: OrderedF32, // f: g + h (heuristic)
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds the corridor of nodes from `start` to `goal` using A*.
///
/// Edge cost and heuristic are both centroid-to-centroid distance.
/// Returns `Some(Vec<usize>)` with node ids from start to goal (inclusive),
/// or `None` if no adjacency route exists.
pub fn find_corridor(nodes: &[NavNode], start: usize, goal: usize) -> Option<Vec<usize>> {
    if start >= nodes.len() || goal >= nodes.len() {
        return None;
    }

    if start == goal {
        return Some(vec![goal]);
    }

    let goal_centroid = nodes[goal].centroid;
    let heuristic = |node: usize| nodes[node].centroid.distance(goal_centroid);

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<usize, usize> = HashMap::new();
    let mut g_score: HashMap<usize, f32> = HashMap::new();
    let mut closed_set: HashSet<usize> = HashSet::new();

    g_score.insert(start, 0.0);
    open_set.push(SearchNode {
        node: start,
        priority: OrderedF32(heuristic(start)),
    });

    while let Some(current) = open_set.pop() {
        if current.node == goal {
            return Some(reconstruct_path(&came_from, current.node));
        }

        // Skip if already processed with better cost
        if !closed_set.insert(current.node) {
            continue;
        }

        let current_g = g_score.get(&current.node).copied().unwrap_or(f32::INFINITY);
        let current_centroid = nodes[current.node].centroid;

        for &neighbour in &nodes[current.node].neighbours {
            if closed_set.contains(&neighbour) {
                continue;
            }

            let new_g = current_g + current_centroid.distance(nodes[neighbour].centroid);
            let known_g = g_score.get(&neighbour).copied().unwrap_or(f32::INFINITY);

            if new_g < known_g {
                came_from.insert(neighbour, current.node);
                g_score.insert(neighbour, new_g);
                open_set.push(SearchNode {
                    node: neighbour,
                    priority: OrderedF32(new_g + heuristic(neighbour)),
                });
            }
        }
    }

    None // No path found
}

/// Reconstructs the path from the came_from map.
fn reconstruct_path(came_from: &HashMap<usize, usize>, mut current: usize) -> Vec<usize> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// An edge crossed by the corridor, oriented relative to the travel direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    pub left: Vec3,
    pub right: Vec3,
}

impl Portal {
    /// Degenerate portal used for the start and end of a corridor.
    pub fn point(p: Vec3) -> Self {
        Self { left: p, right: p }
    }

    /// Orients the shared edge `a`-`b` for travel from the node centred at
    /// `from` to the node centred at `to`.
    pub fn oriented(a: Vec3, b: Vec3, from: Vec3, to: Vec3) -> Self {
        let side = cross_xz(a - from, b - from);
        let a_is_left = if side.abs() > f32::EPSILON {
            side < 0.0
        } else {
            // Degenerate source triangle: judge from the far side, where the sign flips.
            cross_xz(a - to, b - to) > 0.0
        };

        if a_is_left {
            Self { left: a, right: b }
        } else {
            Self { left: b, right: a }
        }
    }
}

fn push_point(points: &mut Vec<Vec3>, p: Vec3) {
    if points.last().map_or(true, |last| !points_equal_xz(*last, p)) {
        points.push(p);
    }
}

/// Pulls a string through the portals, returning the corner points of the
/// shortest path (including the first portal's point).
pub fn string_pull(portals: &[Portal]) -> Vec<Vec3> {
    let Some(first) = portals.first() else {
        return Vec::new();
    };

    let mut points = Vec::new();

    let mut apex = first.left;
    let mut left = first.left;
    let mut right = first.right;
    let mut apex_index = 0;
    let mut left_index = 0;
    let mut right_index = 0;

    push_point(&mut points, apex);

    let mut i = 1;
    while i < portals.len() {
        let portal = portals[i];

        // Update right vertex
        if triarea2(apex, right, portal.right) <= 0.0 {
            if points_equal_xz(apex, right) || triarea2(apex, left, portal.right) > 0.0 {
                // Tighten the funnel
                right = portal.right;
                right_index = i;
            } else {
                // Right over left: left becomes the new apex, restart from it
                push_point(&mut points, left);
                apex = left;
                apex_index = left_index;
                right = apex;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        // Update left vertex
        if triarea2(apex, left, portal.left) >= 0.0 {
            if points_equal_xz(apex, left) || triarea2(apex, right, portal.left) < 0.0 {
                // Tighten the funnel
                left = portal.left;
                left_index = i;
            } else {
                // Left over right: right becomes the new apex, restart from it
                push_point(&mut points, right);
                apex = right;
                apex_index = right_index;
                left = apex;
                left_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    if let Some(last) = portals.last() {
        push_point(&mut points, last.left);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A strip of nodes where node `i` neighbours `i - 1` and `i + 1`.
    fn strip(len: usize) -> Vec<NavNode> {
        (0..len)
            .map(|i| {
                let mut neighbours = Vec::new();
                let mut portals = Vec::new();
                if i > 0 {
                    neighbours.push(i - 1);
                    portals.push([0, 1]);
                }
                if i + 1 < len {
                    neighbours.push(i + 1);
                    portals.push([0, 1]);
                }
                NavNode {
                    id: i,
                    vertex_ids: [0, 1, 2],
                    centroid: Vec3::new(i as f32, 0.0, 0.0),
                    neighbours,
                    portals,
                }
            })
            .collect()
    }

    #[test]
    fn test_corridor_along_strip() {
        let nodes = strip(5);
        assert_eq!(find_corridor(&nodes, 0, 4), Some(vec![0, 1, 2, 3, 4]));
        assert_eq!(find_corridor(&nodes, 3, 1), Some(vec![3, 2, 1]));
        assert_eq!(find_corridor(&nodes, 2, 2), Some(vec![2]));
    }

    #[test]
    fn test_corridor_missing_link() {
        let mut nodes = strip(4);
        // Cut the strip between nodes 1 and 2
        nodes[1].neighbours.retain(|&n| n != 2);
        nodes[2].neighbours.retain(|&n| n != 1);
        assert!(find_corridor(&nodes, 0, 3).is_none());
        assert!(find_corridor(&nodes, 0, 9).is_none());
    }

    #[test]
    fn test_corridor_prefers_shorter_branch() {
        // 0 connects to goal 3 through either 1 (close) or 2 (far away).
        let node = |id: usize, centroid: Vec3, neighbours: Vec<usize>| NavNode {
            id,
            vertex_ids: [0, 1, 2],
            centroid,
            portals: vec![[0, 1]; neighbours.len()],
            neighbours,
        };
        let nodes = vec![
            node(0, Vec3::new(0.0, 0.0, 0.0), vec![1, 2]),
            node(1, Vec3::new(1.0, 0.0, 0.5), vec![0, 3]),
            node(2, Vec3::new(1.0, 0.0, 20.0), vec![0, 3]),
            node(3, Vec3::new(2.0, 0.0, 0.0), vec![1, 2]),
        ];
        assert_eq!(find_corridor(&nodes, 0, 3), Some(vec![0, 1, 3]));
    }

    #[test]
    fn test_portal_orientation() {
        let from = Vec3::new(0.0, 0.0, 0.0);
        let to = Vec3::new(2.0, 0.0, 0.0);
        let a = Vec3::new(1.0, 0.0, -1.0);
        let b = Vec3::new(1.0, 0.0, 1.0);

        let portal = Portal::oriented(a, b, from, to);
        assert_eq!(portal.left, b);
        assert_eq!(portal.right, a);

        // Travelling the other way swaps sides
        let back = Portal::oriented(a, b, to, from);
        assert_eq!(back.left, a);
        assert_eq!(back.right, b);
    }

    #[test]
    fn test_string_pull_straight_corridor() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(4.0, 0.0, 0.0);
        let portals = vec![
            Portal::point(start),
            Portal { left: Vec3::new(1.0, 0.0, 1.0), right: Vec3::new(1.0, 0.0, -1.0) },
            Portal { left: Vec3::new(2.0, 0.0, 1.0), right: Vec3::new(2.0, 0.0, -1.0) },
            Portal { left: Vec3::new(3.0, 0.0, 1.0), right: Vec3::new(3.0, 0.0, -1.0) },
            Portal::point(end),
        ];
        assert_eq!(string_pull(&portals), vec![start, end]);
    }

    #[test]
    fn test_string_pull_wraps_corner() {
        // Corridor turns left around the corner (2, 0, 1)
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(2.5, 0.0, 4.0);
        let corner = Vec3::new(2.0, 0.0, 1.0);
        let portals = vec![
            Portal::point(start),
            Portal { left: corner, right: Vec3::new(2.0, 0.0, -1.0) },
            Portal { left: corner, right: Vec3::new(3.0, 0.0, 1.0) },
            Portal::point(end),
        ];
        assert_eq!(string_pull(&portals), vec![start, corner, end]);
    }

    #[test]
    fn test_string_pull_empty() {
        assert!(string_pull(&[]).is_empty());
    }
}
