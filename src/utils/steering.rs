//! Per-tick locomotion along a waypoint path.
//!
//! Kept free of ECS types beyond `Transform` so the step can be exercised
//! directly; `navigation_movement_system` wraps it for every agent.

use bevy::prelude::*;

use crate::components::agent::{Facing, Locomotion};
use crate::components::navigation::{NavigationPath, TargetKind};

/// Tuning for one steering step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringParams {
    pub speed: f32,
    pub rotation_multiplier: f32,
    pub arrival_radius: f32,
    /// Waypoints closer than this are treated as reached.
    pub epsilon: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            speed: 5.0,
            rotation_multiplier: 1.5,
            arrival_radius: 1.0,
            epsilon: 1e-4,
        }
    }
}

/// Result of one steering step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerOutcome {
    /// State for this tick, decided before any movement.
    pub locomotion: Locomotion,
    /// Distance travelled this tick.
    pub advanced: f32,
    /// Whether the head waypoint was consumed.
    pub popped: bool,
}

impl SteerOutcome {
    fn idle() -> Self {
        Self {
            locomotion: Locomotion::Idle,
            advanced: 0.0,
            popped: false,
        }
    }

    fn moving(advanced: f32, popped: bool) -> Self {
        Self {
            locomotion: Locomotion::Moving,
            advanced,
            popped,
        }
    }
}

/// Negative, NaN and infinite frame times count as no time at all.
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// Upright orientation whose +Z axis (the character's forward) points from
/// `from` toward `to`. `None` when `to` is straight above or below.
pub fn facing_towards(from: Vec3, to: Vec3) -> Option<Quat> {
    let flat = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    if flat.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Turns `current` toward `target` by at most `max_angle` radians.
pub fn rotate_towards(current: Quat, target: Quat, max_angle: f32) -> Quat {
    if max_angle <= 0.0 {
        return current;
    }
    let angle = current.angle_between(target);
    if angle <= max_angle {
        return target;
    }
    current.slerp(target, max_angle / angle).normalize()
}

/// Advances an agent one tick along its path.
///
/// Never moves further than `speed * dt` nor past the head waypoint. A lone
/// waypoint that marks an entity is dropped once within the arrival radius.
pub fn steer(
    transform: &mut Transform,
    facing: &mut Facing,
    path: &mut NavigationPath,
    target: TargetKind,
    dt: f32,
    params: &SteeringParams,
) -> SteerOutcome {
    let dt = sanitize_dt(dt);

    let Some(next_waypoint) = path.next_waypoint() else {
        return SteerOutcome::idle();
    };

    if let Some(rotation) = facing_towards(transform.translation, next_waypoint) {
        facing.target = rotation;
    }
    let max_turn = dt * params.speed * params.rotation_multiplier;
    transform.rotation = rotate_towards(transform.rotation, facing.target, max_turn);

    let offset = next_waypoint - transform.translation;
    let dist_max = offset.length();

    if dist_max <= params.epsilon {
        path.pop_waypoint();
        return SteerOutcome::moving(0.0, true);
    }

    if path.len() == 1 && target.is_entity() && dist_max < params.arrival_radius {
        path.pop_waypoint();
        return SteerOutcome::moving(0.0, true);
    }

    let step = (params.speed * dt).min(dist_max);
    if step >= dist_max {
        transform.translation = next_waypoint;
    } else {
        transform.translation += offset / dist_max * step;
    }

    SteerOutcome::moving(step, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn agent_at(p: Vec3) -> (Transform, Facing) {
        (Transform::from_translation(p), Facing::default())
    }

    #[test]
    fn test_advance_is_clamped_to_speed() {
        let (mut transform, mut facing) = agent_at(Vec3::ZERO);
        let mut path = NavigationPath::new(vec![Vec3::new(10.0, 0.0, 0.0)]);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Ground,
            1.0,
            &SteeringParams::default(),
        );

        assert_eq!(outcome.locomotion, Locomotion::Moving);
        assert!((transform.translation - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_never_overshoots_waypoint() {
        let (mut transform, mut facing) = agent_at(Vec3::ZERO);
        let mut path = NavigationPath::new(vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 9.0)]);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Ground,
            1.0,
            &SteeringParams::default(),
        );

        assert_eq!(transform.translation, Vec3::new(2.0, 0.0, 0.0));
        assert!((outcome.advanced - 2.0).abs() < 1e-6);
        // Reached waypoints are consumed on the following tick
        assert_eq!(path.len(), 2);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Ground,
            0.016,
            &SteeringParams::default(),
        );
        assert!(outcome.popped);
        assert_eq!(path.next_waypoint(), Some(Vec3::new(2.0, 0.0, 9.0)));
    }

    #[test]
    fn test_entity_target_arrival_radius() {
        let (mut transform, mut facing) = agent_at(Vec3::ZERO);
        let npc = Entity::from_raw(7);
        let mut path = NavigationPath::new(vec![Vec3::new(0.5, 0.0, 0.0)]);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Entity(npc),
            0.1,
            &SteeringParams::default(),
        );

        assert!(outcome.popped);
        assert_eq!(outcome.locomotion, Locomotion::Moving);
        assert!(path.is_empty());
        assert_eq!(transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_ground_target_walks_inside_arrival_radius() {
        let (mut transform, mut facing) = agent_at(Vec3::ZERO);
        let mut path = NavigationPath::new(vec![Vec3::new(0.5, 0.0, 0.0)]);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Ground,
            0.05,
            &SteeringParams::default(),
        );

        assert!(!outcome.popped);
        assert!((transform.translation.x - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_entity_arrival_only_for_last_waypoint() {
        let (mut transform, mut facing) = agent_at(Vec3::ZERO);
        let npc = Entity::from_raw(3);
        let mut path = NavigationPath::new(vec![Vec3::new(0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 5.0)]);

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Entity(npc),
            0.05,
            &SteeringParams::default(),
        );

        assert!(!outcome.popped);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_empty_path_is_idle() {
        let (mut transform, mut facing) = agent_at(Vec3::ONE);
        let mut path = NavigationPath::default();

        let outcome = steer(
            &mut transform,
            &mut facing,
            &mut path,
            TargetKind::Ground,
            1.0,
            &SteeringParams::default(),
        );

        assert_eq!(outcome.locomotion, Locomotion::Idle);
        assert_eq!(transform.translation, Vec3::ONE);
    }

    #[test]
    fn test_degenerate_dt_does_not_move() {
        for dt in [-1.0, f32::NAN, f32::INFINITY, 0.0] {
            let (mut transform, mut facing) = agent_at(Vec3::ZERO);
            let mut path = NavigationPath::new(vec![Vec3::new(10.0, 0.0, 0.0)]);

            let outcome = steer(
                &mut transform,
                &mut facing,
                &mut path,
                TargetKind::Ground,
                dt,
                &SteeringParams::default(),
            );

            assert_eq!(outcome.locomotion, Locomotion::Moving);
            assert_eq!(transform.translation, Vec3::ZERO);
            assert_eq!(transform.rotation, Quat::IDENTITY);
        }
    }

    #[test]
    fn test_facing_points_forward_axis_at_target() {
        let rotation = facing_towards(Vec3::ZERO, Vec3::new(3.0, 2.0, 0.0)).unwrap();
        assert!((rotation * Vec3::Z - Vec3::X).length() < 1e-5);

        let behind = facing_towards(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0)).unwrap();
        assert!((behind * Vec3::Z + Vec3::Z).length() < 1e-5);
        // Upright even when turning around
        assert!((behind * Vec3::Y - Vec3::Y).length() < 1e-5);

        assert!(facing_towards(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)).is_none());
    }

    #[test]
    fn test_rotation_is_rate_limited() {
        let target = Quat::from_rotation_y(PI * 0.9);
        let turned = rotate_towards(Quat::IDENTITY, target, FRAC_PI_2);
        assert!((Quat::IDENTITY.angle_between(turned) - FRAC_PI_2).abs() < 1e-4);

        let snapped = rotate_towards(Quat::IDENTITY, target, PI);
        assert_eq!(snapped, target);
    }

    #[test]
    fn test_turn_per_tick_bounded() {
        let (mut transform, mut facing) = agent_at(Vec3::ZERO);
        let mut path = NavigationPath::new(vec![Vec3::new(-10.0, 0.0, 0.0)]);
        let params = SteeringParams::default();
        let dt = 0.1;

        steer(&mut transform, &mut facing, &mut path, TargetKind::Ground, dt, &params);

        let turned = Quat::IDENTITY.angle_between(transform.rotation);
        assert!(turned <= dt * params.speed * params.rotation_multiplier + 1e-4);
        assert!(turned > 0.0);
    }

    #[test]
    fn test_random_ticks_respect_speed_limit() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = SteeringParams::default();

        for _ in 0..200 {
            let start = Vec3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0));
            let waypoint = Vec3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0));
            let dt = rng.gen_range(0.0..0.5);

            let (mut transform, mut facing) = agent_at(start);
            let mut path = NavigationPath::new(vec![waypoint]);
            let before = start.distance(waypoint);

            steer(&mut transform, &mut facing, &mut path, TargetKind::Ground, dt, &params);

            let after = transform.translation.distance(waypoint);
            assert!(after >= 0.0);
            assert!(before - after <= params.speed * dt + 1e-4);
        }
    }
}
