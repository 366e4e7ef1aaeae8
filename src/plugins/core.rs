use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::components::{CameraFollow, Player};
use crate::plugins::input::get_default_input_map;
use crate::plugins::navigation::NavigationSet;
use crate::resources::NavigationConfig;
use crate::systems::camera::camera_follow_system;

/// Marker for the camera used for picking and following the player.
#[derive(Component, Debug, Default)]
pub struct MainCamera;

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::srgb_u8(0x87, 0xCE, 0xFA)))
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: 400.0,
            })
            .add_systems(Startup, (spawn_camera, spawn_lights))
            .add_systems(
                Update,
                (attach_camera_follow, camera_follow_system)
                    .chain()
                    .after(NavigationSet),
            );
    }
}

fn spawn_camera(mut commands: Commands, config: Res<NavigationConfig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            ..default()
        }),
        Transform::from_translation(config.camera_offset()).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
        InputManagerBundle::with_map(get_default_input_map()),
    ));
}

fn spawn_lights(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Points the main camera at the player once it exists.
fn attach_camera_follow(
    mut commands: Commands,
    players: Query<Entity, Added<Player>>,
    cameras: Query<Entity, With<MainCamera>>,
    config: Res<NavigationConfig>,
) {
    let Some(player) = players.iter().next() else { return };

    for camera in &cameras {
        commands.entity(camera).insert(CameraFollow {
            target: player,
            offset: config.camera_offset(),
        });
    }
}
