use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;

use crate::components::{Destination, Facing, Locomotion, NavAgent, NavGroupId, NavigationPath};
use crate::events::{LocomotionChanged, MoveCommand};
use crate::plugins::input::NavAction;
use crate::resources::{NavigationConfig, NavmeshOverlay, Pathfinder};
use crate::utils::steering::steer;

/// System that turns move commands into paths.
/// Only the latest command per agent in a frame is honoured; it replaces
/// whatever path the agent was following.
pub fn pathfinding_system(
    mut commands: Commands,
    mut move_commands: EventReader<MoveCommand>,
    mut agents: Query<(&Transform, &mut NavigationPath, &mut NavGroupId), With<NavAgent>>,
    pathfinder: Res<Pathfinder>,
    config: Res<NavigationConfig>,
) {
    let mut latest: HashMap<Entity, MoveCommand> = HashMap::new();
    for command in move_commands.read() {
        latest.insert(command.agent, *command);
    }

    for (agent, command) in latest {
        let Ok((transform, mut path, mut group)) = agents.get_mut(agent) else {
            warn!("Move command for {:?}, which is not a navigation agent", agent);
            continue;
        };

        let start = transform.translation;
        let target = command.hit.position();
        commands.entity(agent).insert(Destination {
            target,
            kind: command.hit.target_kind(),
        });

        // Keep the last known group while the agent is momentarily ungrounded
        if let Some(resolved) = pathfinder.resolve_group(&config.zone_name, start) {
            group.set_if_neq(NavGroupId(Some(resolved)));
        }
        let Some(group_id) = group.0 else {
            warn!(
                "Agent at ({:.2}, {:.2}, {:.2}) is not on the navmesh",
                start.x, start.y, start.z
            );
            path.clear();
            continue;
        };

        match pathfinder.find_path_or_closest(start, target, &config.zone_name, group_id) {
            Some(waypoints) => {
                info!(
                    "Path to ({:.1}, {:.1}, {:.1}) found with {} waypoints",
                    target.x,
                    target.y,
                    target.z,
                    waypoints.len()
                );
                path.replace(waypoints);
            }
            None => {
                info!(
                    "No path to ({:.1}, {:.1}, {:.1}) in group {}",
                    target.x, target.y, target.z, group_id
                );
                path.clear();
            }
        }
    }
}

/// System that moves agents along their paths and reports idle/moving
/// transitions.
pub fn navigation_movement_system(
    mut query: Query<(
        Entity,
        &NavAgent,
        &mut Transform,
        &mut Facing,
        &mut NavigationPath,
        &mut Locomotion,
        Option<&Destination>,
    )>,
    mut changes: EventWriter<LocomotionChanged>,
    config: Res<NavigationConfig>,
    time: Res<Time>,
) {
    for (entity, agent, mut transform, mut facing, mut path, mut locomotion, destination) in &mut query {
        let kind = destination.map(|d| d.kind).unwrap_or_default();
        let params = agent.steering_params(config.waypoint_epsilon);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            kind,
            time.delta_secs(),
            &params,
        );

        if outcome.popped && path.is_empty() {
            debug!("{:?} arrived", entity);
        }

        let from = *locomotion;
        if locomotion.set_if_neq(outcome.locomotion) {
            changes.send(LocomotionChanged {
                agent: entity,
                from,
                to: outcome.locomotion,
            });
        }
    }
}

/// Flips the navmesh overlay when the toggle action fires.
pub fn toggle_navmesh_overlay_system(
    query: Query<&ActionState<NavAction>>,
    mut overlay: ResMut<NavmeshOverlay>,
) {
    if query
        .iter()
        .any(|action_state| action_state.just_pressed(&NavAction::ToggleNavmesh))
    {
        overlay.visible = !overlay.visible;
        info!("Navmesh overlay {}", if overlay.visible { "on" } else { "off" });
    }
}

/// System that draws the remaining route from each agent to its destination.
pub fn path_visualization_system(
    query: Query<(&Transform, &NavigationPath, &Destination), With<NavAgent>>,
    mut gizmos: Gizmos,
) {
    let line_color = Color::srgba(1.0, 0.85, 0.2, 0.9);
    let lift = Vec3::Y * 0.05;

    for (transform, path, destination) in &query {
        if path.is_empty() {
            continue;
        }

        let route = std::iter::once(transform.translation)
            .chain(path.waypoints.iter().copied())
            .map(|p| p + lift);
        gizmos.linestrip(route, line_color);

        for waypoint in &path.waypoints {
            gizmos.sphere(Isometry3d::from_translation(*waypoint + lift), 0.08, line_color);
        }

        gizmos.circle(
            Isometry3d::new(destination.target + lift, Quat::from_rotation_x(FRAC_PI_2)),
            0.3,
            line_color,
        );
    }
}

/// System that draws every triangle of the active zone as a wireframe.
pub fn navmesh_debug_draw_system(
    overlay: Res<NavmeshOverlay>,
    pathfinder: Res<Pathfinder>,
    config: Res<NavigationConfig>,
    mut gizmos: Gizmos,
) {
    if !overlay.visible || !pathfinder.is_ready() {
        return;
    }
    let Some(zone) = pathfinder.zone(&config.zone_name) else {
        return;
    };

    let wire_color = Color::srgba(0.5, 0.5, 0.5, 0.5);
    let lift = Vec3::Y * 0.02;

    for group in zone.groups() {
        for node in &group.nodes {
            let [a, b, c] = zone.triangle(node);
            gizmos.linestrip([a + lift, b + lift, c + lift, a + lift], wire_color);
        }
    }
}
