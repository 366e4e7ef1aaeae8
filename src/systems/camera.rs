// Camera follow for the navigating character.

use bevy::prelude::*;

use crate::components::CameraFollow;

/// Keeps each following camera at its offset from the target and looking at it.
pub fn camera_follow_system(
    mut cameras: Query<(&mut Transform, &CameraFollow)>,
    targets: Query<&Transform, Without<CameraFollow>>,
) {
    for (mut transform, follow) in &mut cameras {
        let Ok(target) = targets.get(follow.target) else {
            continue;
        };
        let focus = target.translation;
        *transform = Transform::from_translation(focus + follow.offset).looking_at(focus, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_tracks_target_at_offset() {
        let mut app = App::new();
        app.add_systems(Update, camera_follow_system);

        let target = app
            .world_mut()
            .spawn(Transform::from_xyz(2.0, 0.0, -3.0))
            .id();
        let camera = app
            .world_mut()
            .spawn((
                Transform::default(),
                CameraFollow {
                    target,
                    offset: Vec3::splat(5.0),
                },
            ))
            .id();

        app.update();

        let transform = app.world().get::<Transform>(camera).unwrap();
        assert!((transform.translation - Vec3::new(7.0, 5.0, 2.0)).length() < 1e-5);
        let forward = transform.forward();
        assert!((forward.as_vec3() + Vec3::splat(5.0).normalize()).length() < 1e-4);
    }
}
