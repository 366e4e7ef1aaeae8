//! Idle/run crossfading driven by locomotion changes.

use bevy::prelude::*;

use crate::components::{Locomotion, NavAgent};
use crate::events::LocomotionChanged;
use crate::resources::NavigationConfig;

/// Animation graph of the character model and the nodes of its two clips.
#[derive(Resource, Debug, Clone)]
pub struct LocomotionClips {
    pub graph: Handle<AnimationGraph>,
    pub idle: AnimationNodeIndex,
    pub run: AnimationNodeIndex,
}

impl LocomotionClips {
    pub fn node_for(&self, locomotion: Locomotion) -> AnimationNodeIndex {
        match locomotion {
            Locomotion::Idle => self.idle,
            Locomotion::Moving => self.run,
        }
    }
}

/// Points from an agent to the `AnimationPlayer` inside its model.
#[derive(Component, Debug, Clone, Copy)]
pub struct LocomotionAnimationLink {
    pub player: Entity,
}

pub fn setup_locomotion_clips(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    config: Res<NavigationConfig>,
) {
    let model = config.character_model.clone();
    let (graph, nodes) = AnimationGraph::from_clips([
        asset_server.load(GltfAssetLabel::Animation(config.idle_animation).from_asset(model.clone())),
        asset_server.load(GltfAssetLabel::Animation(config.run_animation).from_asset(model)),
    ]);

    let (Some(&idle), Some(&run)) = (nodes.first(), nodes.get(1)) else {
        error!("Animation graph is missing locomotion clips");
        return;
    };

    commands.insert_resource(LocomotionClips {
        graph: graphs.add(graph),
        idle,
        run,
    });
}

/// System that hooks up animation players as character scenes finish
/// spawning, starting the clip that matches the agent's current state.
pub fn link_animation_players_system(
    mut commands: Commands,
    mut players: Query<(Entity, &mut AnimationPlayer), Added<AnimationPlayer>>,
    parents: Query<&Parent>,
    agents: Query<&Locomotion, With<NavAgent>>,
    clips: Option<Res<LocomotionClips>>,
) {
    let Some(clips) = clips else { return };

    for (player_entity, mut player) in &mut players {
        let Some((agent, locomotion)) = parents
            .iter_ancestors(player_entity)
            .find_map(|e| agents.get(e).ok().map(|l| (e, *l)))
        else {
            continue;
        };

        let mut transitions = AnimationTransitions::new();
        transitions
            .play(&mut player, clips.node_for(locomotion), std::time::Duration::ZERO)
            .repeat();

        commands
            .entity(player_entity)
            .insert((AnimationGraphHandle(clips.graph.clone()), transitions));
        commands
            .entity(agent)
            .insert(LocomotionAnimationLink { player: player_entity });

        info!("Linked animation player {:?} to agent {:?}", player_entity, agent);
    }
}

/// System that crossfades to the clip of the new locomotion state.
pub fn locomotion_crossfade_system(
    mut changes: EventReader<LocomotionChanged>,
    links: Query<&LocomotionAnimationLink>,
    mut players: Query<(&mut AnimationPlayer, &mut AnimationTransitions)>,
    clips: Option<Res<LocomotionClips>>,
    config: Res<NavigationConfig>,
) {
    let Some(clips) = clips else {
        changes.clear();
        return;
    };

    for change in changes.read() {
        if change.from == change.to {
            continue;
        }
        let Ok(link) = links.get(change.agent) else { continue };
        let Ok((mut player, mut transitions)) = players.get_mut(link.player) else { continue };

        let node = clips.node_for(change.to);
        if transitions.get_main_animation() == Some(node) {
            continue;
        }

        transitions
            .play(&mut player, node, config.animation_blend())
            .repeat();
        debug!("{:?}: {:?} -> {:?}", change.agent, change.from, change.to);
    }
}
