//! Game state: combatants, piles, turn counters, RNG and the event log.
//!
//! `GameState` is the single mutable object the engine works on. The
//! resolver is its only writer during resolution.
//!
//! Storage uses `im` persistent structures, so `clone()` is cheap. The stack
//! takes a clone before each item resolves and restores it if the item
//! fails to evaluate.

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, Side};
use super::rng::{GameRng, GameRngState};
use crate::triggers::Event;
use crate::zones::ZoneManager;

/// Turn counters readable from expressions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    /// Turn number (0 before the first turn starts).
    pub number: u32,
    /// Entity whose turn it is.
    pub active: Option<EntityId>,
    /// Cards played so far this turn.
    pub cards_played: u32,
}

/// Full game state.
#[derive(Clone, Debug)]
pub struct GameState {
    entities: OrdMap<EntityId, Entity>,

    /// Card piles per owner.
    pub zones: ZoneManager,

    pub turn: TurnInfo,

    /// Deterministic RNG.
    pub rng: GameRng,

    /// Every event fired so far, in order.
    events: Vector<Event>,
}

impl GameState {
    /// Create an empty state.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            entities: OrdMap::new(),
            zones: ZoneManager::new(),
            turn: TurnInfo::default(),
            rng: GameRng::new(seed),
            events: Vector::new(),
        }
    }

    // === Entities ===

    /// Add or replace a combatant.
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    /// Add a combatant (builder pattern).
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.add_entity(entity);
        self
    }

    /// Remove a combatant.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Iterate over all combatants in ID order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Living entities on the opposite side of `side`, in ID order.
    #[must_use]
    pub fn living_opponents(&self, side: Side) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_alive() && e.opposes(side))
            .map(|e| e.id)
            .collect()
    }

    /// Living entities on `side`, in ID order.
    #[must_use]
    pub fn living_allies(&self, side: Side) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_alive() && e.side == side)
            .map(|e| e.id)
            .collect()
    }

    // === Events ===

    /// Append an event to the log.
    pub fn record_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// All events fired so far.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events fired after the first `from` entries.
    #[must_use]
    pub fn events_since(&self, from: usize) -> Vec<Event> {
        self.events.iter().skip(from).cloned().collect()
    }

    /// Remove and return the whole log.
    ///
    /// The engine never trims the log itself. Callers that keep a state
    /// across many combats drain it at combat boundaries.
    pub fn take_events(&mut self) -> Vector<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    // === Snapshots ===

    /// Capture everything that defines this state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            entities: self.entities.clone(),
            zones: self.zones.clone(),
            turn: self.turn,
            rng: self.rng.state(),
            events: self.events.clone(),
        }
    }

    /// Canonical byte image of the state.
    ///
    /// Two states are identical exactly when their byte images are.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&self.snapshot())
    }

    /// Rebuild a state from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            entities: snapshot.entities,
            zones: snapshot.zones,
            turn: snapshot.turn,
            rng: GameRng::from_state(&snapshot.rng),
            events: snapshot.events,
        }
    }
}

/// Serializable image of a `GameState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub entities: OrdMap<EntityId, Entity>,
    pub zones: ZoneManager,
    pub turn: TurnInfo,
    pub rng: GameRngState,
    pub events: Vector<Event>,
}
