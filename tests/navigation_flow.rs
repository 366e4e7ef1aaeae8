//! Headless navigation flow: move commands in, agent motion and locomotion
//! changes out.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use navwalker::components::{Locomotion, NavAgent, NavGroupId, NavigationPath, Npc, Player};
use navwalker::events::{LocomotionChanged, MoveCommand, PointerHit};
use navwalker::plugins::navigation::{NavigationPlugin, NavigationSet};
use navwalker::plugins::scene::{level_areas, NPC_POSITION};
use navwalker::resources::{NavigationConfig, Pathfinder};
use navwalker::utils::geometry::triangulate_walkable_area;

const TICK: Duration = Duration::from_millis(50);
const MAX_TICKS: usize = 600;

#[derive(Resource, Default)]
struct ChangeLog(Vec<LocomotionChanged>);

fn record_changes(mut events: EventReader<LocomotionChanged>, mut log: ResMut<ChangeLog>) {
    log.0.extend(events.read().copied());
}

/// Helper: headless app with the demo level registered as the zone
fn create_navigation_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(TICK))
        .add_plugins(NavigationPlugin)
        .init_resource::<ChangeLog>()
        .add_systems(Update, record_changes.after(NavigationSet));

    let (ground, platform) = level_areas();
    let mut geometry = triangulate_walkable_area(&ground).unwrap();
    geometry.merge(&triangulate_walkable_area(&platform).unwrap());

    let zone_name = app.world().resource::<NavigationConfig>().zone_name.clone();
    app.world_mut()
        .resource_mut::<Pathfinder>()
        .register_zone(zone_name, &geometry)
        .unwrap();

    app
}

fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((Player, NavAgent::default(), Transform::from_translation(position)))
        .id()
}

/// Runs until the agent has no path left and reports idle.
fn run_until_idle(app: &mut App, agent: Entity) -> usize {
    for tick in 0..MAX_TICKS {
        app.update();
        let world = app.world();
        let idle = world.get::<Locomotion>(agent) == Some(&Locomotion::Idle);
        let done = world.get::<NavigationPath>(agent).is_some_and(|p| p.is_empty());
        if tick > 0 && idle && done {
            return tick;
        }
    }
    panic!("agent did not come to rest within {} ticks", MAX_TICKS);
}

#[test]
fn test_walks_around_wall_to_clicked_point() {
    let mut app = create_navigation_app();
    let agent = spawn_player(&mut app, Vec3::ZERO);
    let target = Vec3::new(4.0, 0.0, 8.0);

    app.world_mut().send_event(MoveCommand {
        agent,
        hit: PointerHit::StaticPoint(target),
    });
    run_until_idle(&mut app, agent);

    let position = app.world().get::<Transform>(agent).unwrap().translation;
    assert!(position.distance(target) < 1e-3, "ended at {position}");
    assert!(app.world().get::<NavGroupId>(agent).unwrap().0.is_some());

    let log = &app.world().resource::<ChangeLog>().0;
    assert_eq!(log.len(), 2);
    assert_eq!((log[0].from, log[0].to), (Locomotion::Idle, Locomotion::Moving));
    assert_eq!((log[1].from, log[1].to), (Locomotion::Moving, Locomotion::Idle));
    assert!(log.iter().all(|change| change.agent == agent));
}

#[test]
fn test_stops_short_of_npc() {
    let mut app = create_navigation_app();
    let agent = spawn_player(&mut app, Vec3::ZERO);
    let npc = app
        .world_mut()
        .spawn((Npc, Transform::from_translation(NPC_POSITION)))
        .id();

    app.world_mut().send_event(MoveCommand {
        agent,
        hit: PointerHit::DynamicEntity(npc, NPC_POSITION),
    });
    run_until_idle(&mut app, agent);

    let position = app.world().get::<Transform>(agent).unwrap().translation;
    let gap = position.distance(NPC_POSITION);
    assert!(gap < NavAgent::default().arrival_radius, "stopped {gap} away");
    assert!(gap > 0.5, "walked into the npc ({gap})");
}

#[test]
fn test_unreachable_platform_keeps_agent_idle() {
    let mut app = create_navigation_app();
    let agent = spawn_player(&mut app, Vec3::ZERO);

    app.world_mut().send_event(MoveCommand {
        agent,
        hit: PointerHit::StaticPoint(Vec3::new(23.0, 1.5, 0.0)),
    });
    for _ in 0..10 {
        app.update();
    }

    let world = app.world();
    assert_eq!(world.get::<Transform>(agent).unwrap().translation, Vec3::ZERO);
    assert!(world.get::<NavigationPath>(agent).unwrap().is_empty());
    assert_eq!(world.get::<Locomotion>(agent), Some(&Locomotion::Idle));
    assert!(world.resource::<ChangeLog>().0.is_empty());
}

#[test]
fn test_new_command_replaces_path() {
    let mut app = create_navigation_app();
    let agent = spawn_player(&mut app, Vec3::ZERO);

    app.world_mut().send_event(MoveCommand {
        agent,
        hit: PointerHit::StaticPoint(Vec3::new(4.0, 0.0, 8.0)),
    });
    for _ in 0..5 {
        app.update();
    }

    let second = Vec3::new(-10.0, 0.0, -12.0);
    app.world_mut().send_event(MoveCommand {
        agent,
        hit: PointerHit::StaticPoint(second),
    });
    app.update();
    assert_eq!(
        app.world().get::<NavigationPath>(agent).unwrap().waypoints.last(),
        Some(&second)
    );

    run_until_idle(&mut app, agent);
    let position = app.world().get::<Transform>(agent).unwrap().translation;
    assert!(position.distance(second) < 1e-3);

    // Re-routing while moving is not a locomotion change
    assert_eq!(app.world().resource::<ChangeLog>().0.len(), 2);
}
