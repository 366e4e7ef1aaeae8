use bevy::prelude::*;

use crate::plugins::navigation::NavigationSet;
use crate::systems::animation::{
    link_animation_players_system, locomotion_crossfade_system, setup_locomotion_clips,
};

/// Crossfades the character between idle and run as its locomotion changes.
pub struct LocomotionAnimationPlugin;

impl Plugin for LocomotionAnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_locomotion_clips).add_systems(
            Update,
            (link_animation_players_system, locomotion_crossfade_system)
                .chain()
                .after(NavigationSet),
        );
    }
}
