//! Effect targeting.
//!
//! A `TargetSelector` names who an effect applies to. Selectors that need a
//! choice (`enemy`, `ally`, `card`) pick from the targets chosen when the
//! effect was submitted; the rest are computed from the state.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{CardId, EntityId, GameState};

/// Who an effect applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetSelector {
    /// The source itself.
    SelfTarget,
    /// One chosen opponent.
    Enemy,
    AllEnemies,
    /// One living opponent, drawn from the game RNG.
    RandomEnemy,
    /// One chosen entity on the source's side.
    Ally,
    /// Every living entity on the source's side, source included.
    AllAllies,
    /// Chosen cards in the source's piles.
    Card,
    None,
}

impl TargetSelector {
    pub const ALL: [TargetSelector; 8] = [
        Self::SelfTarget,
        Self::Enemy,
        Self::AllEnemies,
        Self::RandomEnemy,
        Self::Ally,
        Self::AllAllies,
        Self::Card,
        Self::None,
    ];

    /// Wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SelfTarget => "self",
            Self::Enemy => "enemy",
            Self::AllEnemies => "all_enemies",
            Self::RandomEnemy => "random_enemy",
            Self::Ally => "ally",
            Self::AllAllies => "all_allies",
            Self::Card => "card",
            Self::None => "none",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sel| sel.name() == name)
    }

    /// Selectors that pick from explicitly chosen targets.
    #[must_use]
    pub const fn needs_choice(self) -> bool {
        matches!(self, Self::Enemy | Self::Ally | Self::Card)
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Entity(EntityId),
    Card(CardId),
}

impl Target {
    #[must_use]
    pub fn entity(self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            Self::Card(_) => None,
        }
    }

    #[must_use]
    pub fn card(self) -> Option<CardId> {
        match self {
            Self::Card(id) => Some(id),
            Self::Entity(_) => None,
        }
    }
}

impl From<EntityId> for Target {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<CardId> for Target {
    fn from(id: CardId) -> Self {
        Self::Card(id)
    }
}

/// Target list. Almost always four or fewer.
pub type Targets = SmallVec<[Target; 4]>;

/// Resolve `selector` for an effect from `source`.
///
/// `chosen` holds the targets picked at submission. `enemy` falls back to
/// the first living opponent and `ally` to the source when nothing suitable
/// was chosen. `random_enemy` consumes one RNG draw.
pub fn select_targets(
    selector: TargetSelector,
    source: EntityId,
    chosen: &[Target],
    state: &mut GameState,
) -> Targets {
    let side = state.entity(source).map(|e| e.side);
    let chosen_entities = || chosen.iter().filter_map(|t| t.entity());

    match selector {
        TargetSelector::None => Targets::new(),
        TargetSelector::SelfTarget => Targets::from_elem(Target::Entity(source), 1),
        TargetSelector::Card => chosen.iter().filter(|t| t.card().is_some()).copied().collect(),
        TargetSelector::Enemy => {
            let picked: Targets = chosen_entities()
                .filter(|id| match (side, state.entity(*id)) {
                    (Some(side), Some(e)) => e.opposes(side),
                    (None, Some(_)) => true,
                    (_, None) => false,
                })
                .map(Target::Entity)
                .collect();
            if !picked.is_empty() {
                return picked;
            }
            side.and_then(|side| state.living_opponents(side).first().copied())
                .map(Target::Entity)
                .into_iter()
                .collect()
        }
        TargetSelector::Ally => {
            let picked: Targets = chosen_entities()
                .filter(|id| {
                    side.is_some() && state.entity(*id).map(|e| e.side) == side
                })
                .map(Target::Entity)
                .collect();
            if picked.is_empty() {
                Targets::from_elem(Target::Entity(source), 1)
            } else {
                picked
            }
        }
        TargetSelector::AllEnemies => side
            .map(|side| state.living_opponents(side))
            .unwrap_or_default()
            .into_iter()
            .map(Target::Entity)
            .collect(),
        TargetSelector::AllAllies => side
            .map(|side| state.living_allies(side))
            .unwrap_or_default()
            .into_iter()
            .map(Target::Entity)
            .collect(),
        TargetSelector::RandomEnemy => {
            let candidates = side.map(|side| state.living_opponents(side)).unwrap_or_default();
            state
                .rng
                .choose(&candidates)
                .copied()
                .map(Target::Entity)
                .into_iter()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Entity, Side};

    fn arena() -> GameState {
        GameState::new(7)
            .with_entity(Entity::new(EntityId(0), Side::Player, 50))
            .with_entity(Entity::new(EntityId(1), Side::Player, 30))
            .with_entity(Entity::new(EntityId(10), Side::Enemy, 20))
            .with_entity(Entity::new(EntityId(11), Side::Enemy, 20))
            .with_entity(Entity::new(EntityId(12), Side::Enemy, 20).with_hp(0))
    }

    fn ids(targets: &Targets) -> Vec<Target> {
        targets.to_vec()
    }

    #[test]
    fn test_names_round_trip() {
        for sel in TargetSelector::ALL {
            assert_eq!(TargetSelector::from_name(sel.name()), Some(sel));
        }
        assert_eq!(TargetSelector::from_name("everyone"), None);
    }

    #[test]
    fn test_self_and_none() {
        let mut state = arena();
        let t = select_targets(TargetSelector::SelfTarget, EntityId(0), &[], &mut state);
        assert_eq!(ids(&t), vec![Target::Entity(EntityId(0))]);
        assert!(select_targets(TargetSelector::None, EntityId(0), &[], &mut state).is_empty());
    }

    #[test]
    fn test_enemy_uses_choice_then_falls_back() {
        let mut state = arena();
        let chosen = [Target::Entity(EntityId(11))];
        let t = select_targets(TargetSelector::Enemy, EntityId(0), &chosen, &mut state);
        assert_eq!(ids(&t), vec![Target::Entity(EntityId(11))]);

        // An ally is not a valid enemy choice.
        let chosen = [Target::Entity(EntityId(1))];
        let t = select_targets(TargetSelector::Enemy, EntityId(0), &chosen, &mut state);
        assert_eq!(ids(&t), vec![Target::Entity(EntityId(10))]);
    }

    #[test]
    fn test_ally_falls_back_to_source() {
        let mut state = arena();
        let t = select_targets(TargetSelector::Ally, EntityId(0), &[], &mut state);
        assert_eq!(ids(&t), vec![Target::Entity(EntityId(0))]);

        let chosen = [Target::Entity(EntityId(1)), Target::Entity(EntityId(10))];
        let t = select_targets(TargetSelector::Ally, EntityId(0), &chosen, &mut state);
        assert_eq!(ids(&t), vec![Target::Entity(EntityId(1))]);
    }

    #[test]
    fn test_all_enemies_skips_dead() {
        let mut state = arena();
        let t = select_targets(TargetSelector::AllEnemies, EntityId(0), &[], &mut state);
        assert_eq!(
            ids(&t),
            vec![Target::Entity(EntityId(10)), Target::Entity(EntityId(11))]
        );
        let t = select_targets(TargetSelector::AllAllies, EntityId(10), &[], &mut state);
        assert_eq!(
            ids(&t),
            vec![Target::Entity(EntityId(10)), Target::Entity(EntityId(11))]
        );
    }

    #[test]
    fn test_random_enemy_is_seeded() {
        let mut a = arena();
        let mut b = arena();
        for _ in 0..10 {
            let ta = select_targets(TargetSelector::RandomEnemy, EntityId(0), &[], &mut a);
            let tb = select_targets(TargetSelector::RandomEnemy, EntityId(0), &[], &mut b);
            assert_eq!(ta, tb);
            assert_eq!(ta.len(), 1);
            assert_ne!(ta[0], Target::Entity(EntityId(12)));
        }
    }

    #[test]
    fn test_card_selector_keeps_cards_only() {
        let mut state = arena();
        let chosen = [Target::Card(CardId(3)), Target::Entity(EntityId(10))];
        let t = select_targets(TargetSelector::Card, EntityId(0), &chosen, &mut state);
        assert_eq!(ids(&t), vec![Target::Card(CardId(3))]);
    }
}
