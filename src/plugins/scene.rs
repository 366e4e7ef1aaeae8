//! Demo level: a walled courtyard with obstacles, a raised platform that is
//! not reachable from the ground, the player character and one NPC.

use bevy::prelude::*;

use crate::components::{NavAgent, Npc, Player};
use crate::resources::{NavGeometry, NavigationConfig, Pathfinder};
use crate::systems::pointer::{setup_target_marker_assets, target_marker_system};
use crate::utils::geometry::{mesh_from_geometry, rect_xz, triangulate_walkable_area, WalkableArea};

const GROUND_MIN: Vec2 = Vec2::new(-15.0, -15.0);
const GROUND_MAX: Vec2 = Vec2::new(15.0, 15.0);

/// Footprints (min, max on XZ) of the solid blocks cut out of the ground.
const OBSTACLES: [(Vec2, Vec2); 3] = [
    (Vec2::new(-8.0, -8.0), Vec2::new(-4.0, -4.0)),
    (Vec2::new(-2.0, 2.0), Vec2::new(10.0, 4.0)),
    (Vec2::new(8.0, -10.0), Vec2::new(11.0, -6.0)),
];
const OBSTACLE_HEIGHT: f32 = 1.5;

const PLATFORM_MIN: Vec2 = Vec2::new(20.0, -4.0);
const PLATFORM_MAX: Vec2 = Vec2::new(26.0, 4.0);
const PLATFORM_HEIGHT: f32 = 1.5;

pub const NPC_POSITION: Vec3 = Vec3::new(5.0, 0.0, -5.0);

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_level, setup_target_marker_assets))
            .add_systems(Update, target_marker_system);
    }
}

/// Walkable surfaces of the level: the ground around the obstacles, and the
/// raised platform.
pub fn level_areas() -> (WalkableArea, WalkableArea) {
    let ground = OBSTACLES.iter().fold(
        WalkableArea::new(rect_xz(GROUND_MIN, GROUND_MAX), 0.0),
        |area, (min, max)| area.with_hole(rect_xz(*min, *max)),
    );
    let platform = WalkableArea::new(rect_xz(PLATFORM_MIN, PLATFORM_MAX), PLATFORM_HEIGHT);
    (ground, platform)
}

fn block(min: Vec2, max: Vec2, height: f32) -> (Cuboid, Transform) {
    let size = max - min;
    let center = (min + max) * 0.5;
    (
        Cuboid::new(size.x, height, size.y),
        Transform::from_xyz(center.x, height * 0.5, center.y),
    )
}

fn setup_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut pathfinder: ResMut<Pathfinder>,
    asset_server: Res<AssetServer>,
    config: Res<NavigationConfig>,
) {
    let (ground_area, platform_area) = level_areas();
    let Some(ground) = triangulate_walkable_area(&ground_area) else {
        error!("Failed to triangulate the ground");
        return;
    };
    let Some(platform) = triangulate_walkable_area(&platform_area) else {
        error!("Failed to triangulate the platform");
        return;
    };

    // The navmesh is read back from the rendered ground mesh
    let ground_mesh = mesh_from_geometry(&ground);
    let mut walkable = match NavGeometry::from_mesh(&ground_mesh) {
        Ok(geometry) => geometry,
        Err(e) => {
            error!("Ground mesh is not usable as a navmesh: {}", e);
            return;
        }
    };
    walkable.merge(&platform);

    match pathfinder.register_zone(config.zone_name.clone(), &walkable) {
        Ok(stats) => info!(
            "Registered zone '{}': {} vertices, {} nodes, {} groups",
            config.zone_name, stats.vertex_count, stats.node_count, stats.group_count
        ),
        Err(e) => {
            error!("Failed to build zone '{}': {}", config.zone_name, e);
            return;
        }
    }

    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(ground_mesh)),
        MeshMaterial3d(materials.add(Color::srgb(0.45, 0.55, 0.4))),
    ));

    let block_material = materials.add(Color::srgb(0.55, 0.5, 0.45));
    for (min, max) in OBSTACLES {
        let (cuboid, transform) = block(min, max, OBSTACLE_HEIGHT);
        commands.spawn((
            Name::new("Obstacle"),
            Mesh3d(meshes.add(cuboid)),
            MeshMaterial3d(block_material.clone()),
            transform,
        ));
    }
    let (cuboid, transform) = block(PLATFORM_MIN, PLATFORM_MAX, PLATFORM_HEIGHT);
    commands.spawn((
        Name::new("Platform"),
        Mesh3d(meshes.add(cuboid)),
        MeshMaterial3d(materials.add(Color::srgb(0.6, 0.45, 0.35))),
        transform,
    ));

    commands.spawn((
        Name::new("Player"),
        Player,
        NavAgent::from_config(&config),
        Transform::default(),
        SceneRoot(
            asset_server.load(GltfAssetLabel::Scene(0).from_asset(config.character_model.clone())),
        ),
    ));

    commands
        .spawn((
            Name::new("Npc"),
            Npc,
            Transform::from_translation(NPC_POSITION),
            Visibility::default(),
        ))
        .with_children(|npc| {
            npc.spawn((
                Mesh3d(meshes.add(Capsule3d::new(0.3, 1.2))),
                MeshMaterial3d(materials.add(Color::srgb(0.8, 0.3, 0.3))),
                Transform::from_xyz(0.0, 0.9, 0.0),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::LocateTolerance;

    fn level_pathfinder() -> Pathfinder {
        let (ground, platform) = level_areas();
        let mut geometry = triangulate_walkable_area(&ground).unwrap();
        geometry.merge(&triangulate_walkable_area(&platform).unwrap());

        let mut pathfinder = Pathfinder::with_tolerance(LocateTolerance::default());
        pathfinder.register_zone("ground", &geometry).unwrap();
        pathfinder
    }

    #[test]
    fn test_level_has_ground_and_platform_groups() {
        let pathfinder = level_pathfinder();
        assert_eq!(pathfinder.zone("ground").unwrap().group_count(), 2);

        let ground = pathfinder.resolve_group("ground", Vec3::ZERO).unwrap();
        let platform = pathfinder
            .resolve_group("ground", Vec3::new(23.0, PLATFORM_HEIGHT, 0.0))
            .unwrap();
        assert_ne!(ground, platform);
        assert_eq!(pathfinder.resolve_group("ground", NPC_POSITION), Some(ground));

        // Inside an obstacle footprint
        assert_eq!(pathfinder.resolve_group("ground", Vec3::new(-6.0, 0.0, -6.0)), None);
    }

    #[test]
    fn test_path_around_wall() {
        let pathfinder = level_pathfinder();
        let group = pathfinder.resolve_group("ground", Vec3::ZERO).unwrap();
        let end = Vec3::new(4.0, 0.0, 8.0);

        let path = pathfinder.find_path(Vec3::ZERO, end, "ground", group).unwrap();
        assert_eq!(path.last(), Some(&end));
        // The wall spans x in [-2, 10] at z in [2, 4]; the route bends at its end
        assert!(path.len() >= 2);
        assert!(path.iter().any(|p| (p.x + 2.0).abs() < 1e-3 || (p.x - 10.0).abs() < 1e-3));

        let platform = Vec3::new(23.0, PLATFORM_HEIGHT, 0.0);
        assert!(pathfinder.find_path(Vec3::ZERO, platform, "ground", group).is_none());
    }

    #[test]
    fn test_ground_mesh_reads_back_as_same_geometry() {
        let (ground, _) = level_areas();
        let geometry = triangulate_walkable_area(&ground).unwrap();
        let from_mesh = NavGeometry::from_mesh(&mesh_from_geometry(&geometry)).unwrap();
        assert_eq!(from_mesh, geometry);
    }
}
