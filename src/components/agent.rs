use bevy::prelude::*;

use crate::components::navigation::{NavGroupId, NavigationPath};
use crate::resources::config::NavigationConfig;
use crate::utils::steering::SteeringParams;

/// Marker component that identifies the player-controlled character.
#[derive(Component, Debug, Default)]
pub struct Player;

/// Marker component for non-player characters the player can walk up to.
#[derive(Component, Debug, Default)]
pub struct Npc;

/// Locomotion tuning of a navigating character.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(Transform, Facing, NavigationPath, NavGroupId, Locomotion)]
pub struct NavAgent {
    /// Walking speed in world units per second.
    pub speed: f32,
    /// Turn rate, as a multiple of `speed`, in radians per second.
    pub rotation_multiplier: f32,
    /// Distance at which an entity target counts as reached.
    pub arrival_radius: f32,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            speed: 5.0,
            rotation_multiplier: 1.5,
            arrival_radius: 1.0,
        }
    }
}

impl NavAgent {
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            speed: config.speed,
            rotation_multiplier: config.rotation_multiplier,
            arrival_radius: config.arrival_radius,
        }
    }

    pub fn steering_params(&self, epsilon: f32) -> SteeringParams {
        SteeringParams {
            speed: self.speed,
            rotation_multiplier: self.rotation_multiplier,
            arrival_radius: self.arrival_radius,
            epsilon,
        }
    }
}

/// Orientation the character is turning toward.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    pub target: Quat,
}

impl Default for Facing {
    fn default() -> Self {
        Self {
            target: Quat::IDENTITY,
        }
    }
}

/// Whether the character is walking a path this frame.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locomotion {
    #[default]
    Idle,
    Moving,
}

/// Camera policy: stay at `offset` from the followed entity and look at it.
#[derive(Component, Debug, Clone, Copy)]
pub struct CameraFollow {
    pub target: Entity,
    pub offset: Vec3,
}
