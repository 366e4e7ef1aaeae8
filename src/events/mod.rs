use bevy::prelude::*;

use crate::components::agent::Locomotion;
use crate::components::navigation::TargetKind;

/// What the cursor ray hit when the player clicked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerHit {
    /// A point on static level geometry.
    StaticPoint(Vec3),
    /// A point on a dynamic entity (an NPC).
    DynamicEntity(Entity, Vec3),
}

impl PointerHit {
    pub fn position(&self) -> Vec3 {
        match *self {
            PointerHit::StaticPoint(p) | PointerHit::DynamicEntity(_, p) => p,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        match *self {
            PointerHit::StaticPoint(_) => TargetKind::Ground,
            PointerHit::DynamicEntity(entity, _) => TargetKind::Entity(entity),
        }
    }
}

/// Event emitted when the player picks a new destination for an agent.
#[derive(Event, Debug, Clone, Copy)]
pub struct MoveCommand {
    pub agent: Entity,
    pub hit: PointerHit,
}

/// Event emitted when an agent switches between idle and moving.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LocomotionChanged {
    pub agent: Entity,
    pub from: Locomotion,
    pub to: Locomotion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_hit_kinds() {
        let p = Vec3::new(1.0, 0.0, 2.0);
        assert_eq!(PointerHit::StaticPoint(p).position(), p);
        assert_eq!(PointerHit::StaticPoint(p).target_kind(), TargetKind::Ground);

        let npc = Entity::from_raw(4);
        let hit = PointerHit::DynamicEntity(npc, p);
        assert_eq!(hit.position(), p);
        assert_eq!(hit.target_kind(), TargetKind::Entity(npc));
    }
}
