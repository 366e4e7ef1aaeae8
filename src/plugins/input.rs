use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::plugins::navigation::NavigationSet;
use crate::systems::pointer::{click_to_move_system, npc_hover_tint_system};

#[derive(Actionlike, PartialEq, Eq, Clone, Copy, Hash, Debug, Reflect)]
pub enum NavAction {
    /// Pick a destination under the cursor.
    Select,
    ToggleNavmesh,
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<NavAction>::default())
            .add_systems(
                Update,
                (click_to_move_system.before(NavigationSet), npc_hover_tint_system),
            );
    }
}

pub fn get_default_input_map() -> InputMap<NavAction> {
    let mut input_map = InputMap::default();

    input_map.insert(NavAction::Select, MouseButton::Left);
    input_map.insert(NavAction::ToggleNavmesh, KeyCode::KeyN);

    input_map
}
