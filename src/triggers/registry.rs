//! Trigger definitions.
//!
//! A trigger is a reactive rule: when an event of its kind fires and its
//! filters, guard and limits allow it, its effect is queued on behalf of
//! the entity it is bound to.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{CardId, EntityId, GameState, Side, StatusId};
use crate::effects::EffectNode;
use crate::expr::Expression;

use super::event::{Event, EventKind};

/// Unique identifier for a trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    /// Create a new trigger ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// The game object that registered a trigger.
///
/// When the owner leaves play all of its triggers are removed together.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerOwner {
    Card(CardId),
    Status { entity: EntityId, status: StatusId },
    /// Relic, potion or other equipment, by game-assigned ID.
    Item(u32),
    Entity(EntityId),
    Global,
}

/// Which entity an event's source or target must be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityFilter {
    #[default]
    Any,
    /// The trigger's bound entity.
    Bound,
    /// Anything but the bound entity. An absent entity passes.
    NotBound,
    Entity(EntityId),
    /// A living or dead entity on this side.
    Side(Side),
}

impl EntityFilter {
    /// Check `entity` (an event's source or target) against this filter.
    #[must_use]
    pub fn matches(self, entity: Option<EntityId>, bound: EntityId, state: &GameState) -> bool {
        match self {
            Self::Any => true,
            Self::Bound => entity == Some(bound),
            Self::NotBound => entity != Some(bound),
            Self::Entity(id) => entity == Some(id),
            Self::Side(side) => entity
                .and_then(|id| state.entity(id))
                .is_some_and(|e| e.side == side),
        }
    }
}

/// A registered reactive rule.
///
/// ## Usage
///
/// ```
/// use ccg_effects::core::EntityId;
/// use ccg_effects::effects::EffectNode;
/// use ccg_effects::triggers::{EntityFilter, EventKind, Trigger, TriggerOwner};
///
/// // "Whenever you take damage, gain 2 block. Once per turn."
/// let trigger = Trigger::new(
///     TriggerOwner::Entity(EntityId(0)),
///     EntityId(0),
///     EventKind::DamageTaken,
///     EffectNode::block(2),
/// )
/// .with_target_filter(EntityFilter::Bound)
/// .with_turn_limit(1);
///
/// assert!(trigger.has_capacity());
/// ```
#[derive(Clone, Debug)]
pub struct Trigger {
    /// Assigned on registration.
    pub id: TriggerId,

    pub owner: TriggerOwner,

    /// Entity the reaction acts on behalf of.
    pub bound: EntityId,

    pub event: EventKind,

    /// Guard evaluated against the bound entity and the event's target.
    pub condition: Option<Expression>,

    pub source_filter: EntityFilter,
    pub target_filter: EntityFilter,

    /// Higher fires first. Ties keep registration order.
    pub priority: i32,

    pub per_turn_limit: Option<u32>,
    pub per_combat_limit: Option<u32>,

    /// When set, firing marks the event cancelled so lower-priority
    /// triggers don't see it.
    pub cancels_event: bool,

    pub effect: Arc<EffectNode>,

    fired_this_turn: u32,
    fired_this_combat: u32,
}

impl Trigger {
    pub fn new(owner: TriggerOwner, bound: EntityId, event: EventKind, effect: EffectNode) -> Self {
        Self {
            id: TriggerId::default(),
            owner,
            bound,
            event,
            condition: None,
            source_filter: EntityFilter::Any,
            target_filter: EntityFilter::Any,
            priority: 0,
            per_turn_limit: None,
            per_combat_limit: None,
            cancels_event: false,
            effect: Arc::new(effect),
            fired_this_turn: 0,
            fired_this_combat: 0,
        }
    }

    /// Set the guard (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_source_filter(mut self, filter: EntityFilter) -> Self {
        self.source_filter = filter;
        self
    }

    #[must_use]
    pub fn with_target_filter(mut self, filter: EntityFilter) -> Self {
        self.target_filter = filter;
        self
    }

    /// Set priority (builder pattern).
    /// Higher priority triggers fire first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_turn_limit(mut self, limit: u32) -> Self {
        self.per_turn_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_combat_limit(mut self, limit: u32) -> Self {
        self.per_combat_limit = Some(limit);
        self
    }

    /// Make this trigger cancel the event it reacts to (builder pattern).
    #[must_use]
    pub fn cancelling(mut self) -> Self {
        self.cancels_event = true;
        self
    }

    #[must_use]
    pub fn fired_this_turn(&self) -> u32 {
        self.fired_this_turn
    }

    #[must_use]
    pub fn fired_this_combat(&self) -> u32 {
        self.fired_this_combat
    }

    /// Neither limit is used up.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.per_turn_limit.map_or(true, |n| self.fired_this_turn < n)
            && self.per_combat_limit.map_or(true, |n| self.fired_this_combat < n)
    }

    /// Source and target filters both pass.
    #[must_use]
    pub fn filters_pass(&self, event: &Event, state: &GameState) -> bool {
        self.source_filter.matches(event.source, self.bound, state)
            && self.target_filter.matches(event.target, self.bound, state)
    }

    pub(crate) fn record_fire(&mut self) {
        self.fired_this_turn += 1;
        self.fired_this_combat += 1;
    }

    pub(crate) fn reset_turn(&mut self) {
        self.fired_this_turn = 0;
    }

    pub(crate) fn reset_combat(&mut self) {
        self.fired_this_turn = 0;
        self.fired_this_combat = 0;
    }
}
