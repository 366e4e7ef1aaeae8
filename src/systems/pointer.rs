//! Cursor picking: click-to-move commands, the destination marker and NPC
//! hover feedback.

use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, RayCastSettings};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use leafwing_input_manager::prelude::*;
use rand::Rng;
use std::collections::HashSet;

use crate::components::{Npc, Player, TargetMarker};
use crate::events::{MoveCommand, PointerHit};
use crate::plugins::core::MainCamera;
use crate::plugins::input::NavAction;

/// Mesh and material shared by every destination marker.
#[derive(Resource, Debug, Clone)]
pub struct TargetMarkerAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

pub fn setup_target_marker_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(TargetMarkerAssets {
        mesh: meshes.add(Cuboid::new(0.1, 1.0, 0.1)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.0, 1.0, 0.0),
            unlit: true,
            ..default()
        }),
    });
}

/// Classifies a ray hit: anything under an `Npc` entity is a dynamic target
/// located at the NPC's origin, everything else is a point on the level.
fn classify_hit(
    hit_entity: Entity,
    point: Vec3,
    parents: &Query<&Parent>,
    npcs: &Query<&GlobalTransform, With<Npc>>,
) -> PointerHit {
    std::iter::once(hit_entity)
        .chain(parents.iter_ancestors(hit_entity))
        .find_map(|e| npcs.get(e).ok().map(|transform| (e, transform.translation())))
        .map_or(PointerHit::StaticPoint(point), |(npc, origin)| {
            PointerHit::DynamicEntity(npc, origin)
        })
}

/// Returns the ray under the cursor, if the cursor is over the window.
fn cursor_ray(window: &Window, camera: &Camera, camera_transform: &GlobalTransform) -> Option<Ray3d> {
    let cursor = window.cursor_position()?;
    camera.viewport_to_world(camera_transform, cursor).ok()
}

/// System that handles clicks: casts a ray under the cursor and sends a
/// move command for the player toward whatever it hit.
#[allow(clippy::too_many_arguments)]
pub fn click_to_move_system(
    mut ray_cast: MeshRayCast,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform, &ActionState<NavAction>), With<MainCamera>>,
    player_query: Query<Entity, With<Player>>,
    children: Query<&Children>,
    parents: Query<&Parent>,
    npcs: Query<&GlobalTransform, With<Npc>>,
    markers: Query<Entity, With<TargetMarker>>,
    mut move_commands: EventWriter<MoveCommand>,
) {
    let Ok((camera, camera_transform, action_state)) = camera_query.get_single() else { return };
    if !action_state.just_pressed(&NavAction::Select) {
        return;
    }

    let Ok(window) = window_query.get_single() else { return };
    let Ok(player) = player_query.get_single() else { return };
    let Some(ray) = cursor_ray(window, camera, camera_transform) else { return };

    // The character and the marker are never click targets
    let excluded: HashSet<Entity> = std::iter::once(player)
        .chain(children.iter_descendants(player))
        .chain(markers.iter())
        .collect();
    let filter = |entity: Entity| !excluded.contains(&entity);
    let settings = RayCastSettings::default().with_filter(&filter);

    let Some((hit_entity, hit)) = ray_cast.cast_ray(ray, &settings).first() else {
        debug!("Click hit nothing");
        return;
    };

    let pointer_hit = classify_hit(*hit_entity, hit.point, &parents, &npcs);
    debug!("Click resolved to {:?}", pointer_hit);
    move_commands.send(MoveCommand {
        agent: player,
        hit: pointer_hit,
    });
}

/// System that keeps a single marker at the most recent destination.
pub fn target_marker_system(
    mut commands: Commands,
    mut move_commands: EventReader<MoveCommand>,
    markers: Query<Entity, With<TargetMarker>>,
    assets: Option<Res<TargetMarkerAssets>>,
) {
    let Some(command) = move_commands.read().last() else { return };
    let Some(assets) = assets else { return };

    for marker in &markers {
        commands.entity(marker).despawn_recursive();
    }

    commands.spawn((
        TargetMarker,
        Mesh3d(assets.mesh.clone()),
        MeshMaterial3d(assets.material.clone()),
        Transform::from_translation(command.hit.position()),
        Name::new("Target Marker"),
    ));
}

/// System that recolours NPC meshes with a random tint while the cursor
/// moves over them.
#[allow(clippy::too_many_arguments)]
pub fn npc_hover_tint_system(
    mut cursor_moved: EventReader<CursorMoved>,
    mut ray_cast: MeshRayCast,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    parents: Query<&Parent>,
    npcs: Query<&GlobalTransform, With<Npc>>,
    tinted: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if cursor_moved.read().last().is_none() {
        return;
    }

    let Ok(window) = window_query.get_single() else { return };
    let Ok((camera, camera_transform)) = camera_query.get_single() else { return };
    let Some(ray) = cursor_ray(window, camera, camera_transform) else { return };

    let Some((hit_entity, hit)) = ray_cast.cast_ray(ray, &RayCastSettings::default()).first() else {
        return;
    };
    let hit_entity = *hit_entity;

    if !matches!(
        classify_hit(hit_entity, hit.point, &parents, &npcs),
        PointerHit::DynamicEntity(..)
    ) {
        return;
    }

    let Ok(material_handle) = tinted.get(hit_entity) else { return };
    if let Some(material) = materials.get_mut(&material_handle.0) {
        let mut rng = rand::thread_rng();
        material.base_color = Color::srgb(rng.gen(), rng.gen(), rng.gen());
    }
}
