//! Game events.
//!
//! Events record something that happened. The resolver produces them, the
//! `TriggerManager` matches triggers against them, and every one of them is
//! appended to the state's event log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{CardId, EntityId, StatusId};

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DamageDealt,
    DamageTaken,
    BlockLost,
    BlockGained,
    HpLost,
    Healed,
    CardDrawn,
    CardDiscarded,
    DeckReshuffled,
    ResourceChanged,
    StatusApplied,
    StatusRemoved,
    EntityDied,
    TurnStart,
    TurnEnd,
    CombatStart,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        Self::DamageDealt,
        Self::DamageTaken,
        Self::BlockLost,
        Self::BlockGained,
        Self::HpLost,
        Self::Healed,
        Self::CardDrawn,
        Self::CardDiscarded,
        Self::DeckReshuffled,
        Self::ResourceChanged,
        Self::StatusApplied,
        Self::StatusRemoved,
        Self::EntityDied,
        Self::TurnStart,
        Self::TurnEnd,
        Self::CombatStart,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DamageDealt => "damage_dealt",
            Self::DamageTaken => "damage_taken",
            Self::BlockLost => "block_lost",
            Self::BlockGained => "block_gained",
            Self::HpLost => "hp_lost",
            Self::Healed => "healed",
            Self::CardDrawn => "card_drawn",
            Self::CardDiscarded => "card_discarded",
            Self::DeckReshuffled => "deck_reshuffled",
            Self::ResourceChanged => "resource_changed",
            Self::StatusApplied => "status_applied",
            Self::StatusRemoved => "status_removed",
            Self::EntityDied => "entity_died",
            Self::TurnStart => "turn_start",
            Self::TurnEnd => "turn_end",
            Self::CombatStart => "combat_start",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event with its context.
///
/// Entities are referenced by ID, never owned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,

    /// Entity that caused the event.
    pub source: Option<EntityId>,

    /// Entity the event happened to.
    pub target: Option<EntityId>,

    /// Amount: damage, block, stacks, cards reshuffled.
    pub value: i64,

    pub status: Option<StatusId>,

    /// Card drawn or discarded.
    pub card: Option<CardId>,

    /// Set by a trigger that stops lower-priority triggers from seeing it.
    pub cancelled: bool,

    /// Trigger chain depth of the effect that raised this event.
    pub chain_depth: u32,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            value: 0,
            status: None,
            card: None,
            cancelled: false,
            chain_depth: 0,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusId) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_card(mut self, card: CardId) -> Self {
        self.card = Some(card);
        self
    }

    #[must_use]
    pub fn at_depth(mut self, depth: u32) -> Self {
        self.chain_depth = depth;
        self
    }

    /// Does `entity` take part in this event as source or target?
    #[must_use]
    pub fn involves(&self, entity: EntityId) -> bool {
        self.source == Some(entity) || self.target == Some(entity)
    }
}
