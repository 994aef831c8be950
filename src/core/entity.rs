//! Entity identification and combatant data.
//!
//! Every combatant (the player character, each enemy, summoned allies) has a
//! unique `EntityId`. Cards inside piles are identified separately by
//! `CardId`; they are never entities.
//!
//! ## Usage
//!
//! ```
//! use ccg_effects::core::{Entity, EntityId, Side};
//!
//! let mut hero = Entity::new(EntityId(0), Side::Player, 80);
//! hero.block = 5;
//!
//! assert!(hero.is_alive());
//! assert_eq!(hero.hp, 80);
//! assert!(hero.opposes(Side::Enemy));
//! ```

use im::OrdMap;
use serde::{Deserialize, Serialize};

use super::status::{StatusId, StatusStack};

/// Unique identifier for a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
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

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Identifier for a card sitting in a pile.
///
/// The engine only moves cards around; what a card does is decided by
/// whoever submits its effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
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

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Which side of the fight an entity is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

/// A combatant.
///
/// The engine reads and mutates these fields but does not decide when
/// entities are created or removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub side: Side,
    pub hp: i64,
    pub max_hp: i64,
    pub block: i64,
    /// Energy, mana, or whatever the game spends to play cards.
    pub resource: i64,
    statuses: OrdMap<StatusId, StatusStack>,
}

impl Entity {
    /// Create a combatant at full health.
    #[must_use]
    pub fn new(id: EntityId, side: Side, max_hp: i64) -> Self {
        Self {
            id,
            side,
            hp: max_hp,
            max_hp,
            block: 0,
            resource: 0,
            statuses: OrdMap::new(),
        }
    }

    /// Set the current resource pool (builder pattern).
    #[must_use]
    pub fn with_resource(mut self, resource: i64) -> Self {
        self.resource = resource;
        self
    }

    /// Set current HP (builder pattern).
    #[must_use]
    pub fn with_hp(mut self, hp: i64) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    /// Apply a status (builder pattern).
    #[must_use]
    pub fn with_status(mut self, status: impl Into<StatusId>, stacks: i64) -> Self {
        self.apply_status(status.into(), stacks, None);
        self
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Is `other` on the opposite side?
    #[must_use]
    pub fn opposes(&self, other: Side) -> bool {
        self.side != other
    }

    // === Statuses ===

    /// Stack count of a status, 0 when absent.
    #[must_use]
    pub fn status_stacks(&self, status: &StatusId) -> i64 {
        self.statuses.get(status).map_or(0, |s| s.stacks)
    }

    #[must_use]
    pub fn has_status(&self, status: &StatusId) -> bool {
        self.statuses.contains_key(status)
    }

    /// Get the full stack record of a status.
    #[must_use]
    pub fn status(&self, status: &StatusId) -> Option<&StatusStack> {
        self.statuses.get(status)
    }

    /// Add stacks of a status, extending its duration to the longer one.
    ///
    /// `None` is permanent, so it outlasts any countdown: applying a status
    /// without a duration stops an existing one from expiring. A status whose
    /// stacks reach zero is removed.
    pub fn apply_status(&mut self, status: StatusId, stacks: i64, duration: Option<u32>) {
        let fresh = !self.statuses.contains_key(&status);
        let entry = self.statuses.entry(status.clone()).or_insert(StatusStack {
            stacks: 0,
            duration,
        });
        entry.stacks += stacks;
        if !fresh {
            entry.duration = match (entry.duration, duration) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
        }
        if entry.stacks == 0 {
            self.statuses.remove(&status);
        }
    }

    /// Remove stacks of a status. `None` removes it entirely.
    ///
    /// Returns the number of stacks actually removed.
    pub fn remove_status(&mut self, status: &StatusId, stacks: Option<i64>) -> i64 {
        let Some(current) = self.statuses.get(status).map(|s| s.stacks) else {
            return 0;
        };
        match stacks {
            Some(n) if n > 0 && n < current => {
                if let Some(entry) = self.statuses.get_mut(status) {
                    entry.stacks -= n;
                }
                n
            }
            _ => {
                self.statuses.remove(status);
                current
            }
        }
    }

    /// Iterate over active statuses in identifier order.
    pub fn statuses(&self) -> impl Iterator<Item = (&StatusId, &StatusStack)> {
        self.statuses.iter()
    }

    /// Count down status durations by one.
    ///
    /// Returns the statuses that expired and were removed.
    pub fn tick_durations(&mut self) -> Vec<(StatusId, i64)> {
        let mut expired = Vec::new();
        let ids: Vec<StatusId> = self.statuses.keys().cloned().collect();
        for id in ids {
            if let Some(entry) = self.statuses.get_mut(&id) {
                if let Some(turns) = entry.duration {
                    let left = turns.saturating_sub(1);
                    entry.duration = Some(left);
                    if left == 0 {
                        expired.push((id.clone(), entry.stacks));
                    }
                }
            }
        }
        for (id, _) in &expired {
            self.statuses.remove(id);
        }
        expired
    }
}
