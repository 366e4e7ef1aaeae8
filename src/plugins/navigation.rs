use bevy::prelude::*;

use crate::events::{LocomotionChanged, MoveCommand};
use crate::resources::{NavigationConfig, NavmeshOverlay, Pathfinder};
use crate::systems::navigation::{
    navigation_movement_system, navmesh_debug_draw_system, path_visualization_system,
    pathfinding_system, toggle_navmesh_overlay_system,
};

/// Path queries followed by steering, in that order, every frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationSet;

/// Pathfinder, move commands and per-frame steering. Runs headless.
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        let tolerance = app
            .world()
            .get_resource::<NavigationConfig>()
            .map(|config| config.tolerance)
            .unwrap_or_default();
        if !app.world().contains_resource::<Pathfinder>() {
            app.insert_resource(Pathfinder::with_tolerance(tolerance));
        }

        app.init_resource::<NavigationConfig>()
            .add_event::<MoveCommand>()
            .add_event::<LocomotionChanged>()
            .add_systems(
                Update,
                (pathfinding_system, navigation_movement_system)
                    .chain()
                    .in_set(NavigationSet),
            );
    }
}

/// Gizmo overlays for the navmesh and the active route.
pub struct NavigationDebugPlugin;

impl Plugin for NavigationDebugPlugin {
    fn build(&self, app: &mut App) {
        let visible = app
            .world()
            .get_resource::<NavigationConfig>()
            .is_some_and(|config| config.show_navmesh);

        app.insert_resource(NavmeshOverlay { visible }).add_systems(
            Update,
            (
                toggle_navmesh_overlay_system,
                navmesh_debug_draw_system,
                path_visualization_system,
            )
                .chain()
                .after(NavigationSet),
        );
    }
}
