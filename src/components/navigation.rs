use bevy::prelude::*;

use crate::resources::navmesh::GroupId;

/// What the agent is heading for. Entity targets are considered reached
/// within the arrival radius instead of at their exact position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetKind {
    #[default]
    Ground,
    Entity(Entity),
}

impl TargetKind {
    pub fn is_entity(&self) -> bool {
        matches!(self, TargetKind::Entity(_))
    }
}

/// Component holding the agent's current destination.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    /// Target position in world coordinates.
    pub target: Vec3,
    pub kind: TargetKind,
}

/// Component holding the calculated path waypoints for navigation.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct NavigationPath {
    /// List of waypoints from current position to destination.
    /// First element is the next waypoint to move toward.
    pub waypoints: Vec<Vec3>,
}

impl NavigationPath {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self { waypoints }
    }

    /// Returns the next waypoint to navigate toward, if any.
    pub fn next_waypoint(&self) -> Option<Vec3> {
        self.waypoints.first().copied()
    }

    /// Removes the first waypoint (called when reached).
    pub fn pop_waypoint(&mut self) {
        if !self.waypoints.is_empty() {
            self.waypoints.remove(0);
        }
    }

    /// Replaces the whole path.
    pub fn replace(&mut self, waypoints: Vec<Vec3>) {
        self.waypoints = waypoints;
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    /// Returns true if there are no more waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }
}

/// Last known navigation group of the agent. `None` while ungrounded.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavGroupId(pub Option<GroupId>);

/// Marker for the destination indicator. At most one exists.
#[derive(Component, Debug, Default)]
pub struct TargetMarker;
