use bevy::prelude::*;
use navwalker::plugins::animation::LocomotionAnimationPlugin;
use navwalker::plugins::core::CorePlugin;
use navwalker::plugins::input::InputPlugin;
use navwalker::plugins::navigation::{NavigationDebugPlugin, NavigationPlugin};
use navwalker::plugins::scene::ScenePlugin;
use navwalker::resources::CliArgs;

fn main() {
    let config = CliArgs::parse().navigation_config();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "navwalker".to_string(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(config)
        .add_plugins(CorePlugin)
        .add_plugins(InputPlugin)
        .add_plugins(NavigationPlugin)
        .add_plugins(NavigationDebugPlugin)
        .add_plugins(LocomotionAnimationPlugin)
        .add_plugins(ScenePlugin)
        .run();
}
