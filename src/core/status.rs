//! Status identifiers and the known-status registry.
//!
//! Statuses (strength, vulnerable, poison, ...) are named by `StatusId`.
//! Which names are legal is decided by a `StatusRegistry` that the game
//! builds at startup and hands to the engine. Effect nodes referring to a
//! status the registry doesn't know are rejected at construction.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Status identifier, e.g. `"vulnerable"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(String);

impl StatusId {
    /// Create a new status ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatusId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StatusId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stacks and remaining duration of one active status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStack {
    pub stacks: i64,
    /// Turns left. `None` = lasts until removed.
    pub duration: Option<u32>,
}

/// Whether a status helps or hurts its holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPolarity {
    Buff,
    Debuff,
}

/// Static description of a status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDef {
    pub id: StatusId,
    pub polarity: StatusPolarity,
    /// Human-readable description (for tooling).
    pub description: String,
}

impl StatusDef {
    pub fn new(id: impl Into<StatusId>, polarity: StatusPolarity) -> Self {
        Self {
            id: id.into(),
            polarity,
            description: String::new(),
        }
    }

    /// Add a description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

/// Well-known status names the resolver applies modifiers for.
pub mod names {
    pub const STRENGTH: &str = "strength";
    pub const DEXTERITY: &str = "dexterity";
    pub const VULNERABLE: &str = "vulnerable";
    pub const WEAK: &str = "weak";
    pub const FRAIL: &str = "frail";
}

/// Registry of known statuses.
///
/// ## Example
///
/// ```
/// use ccg_effects::core::{StatusDef, StatusId, StatusPolarity, StatusRegistry};
///
/// let mut registry = StatusRegistry::with_defaults();
/// registry.register(StatusDef::new("burn", StatusPolarity::Debuff));
///
/// assert!(registry.contains(&StatusId::new("vulnerable")));
/// assert!(registry.contains(&StatusId::new("burn")));
/// assert!(!registry.contains(&StatusId::new("petrified")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StatusRegistry {
    statuses: FxHashMap<StatusId, StatusDef>,
    /// Registration order, so variable tables are built deterministically.
    order: Vec<StatusId>,
}

impl StatusRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard deckbuilder statuses.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for def in [
            StatusDef::new(names::STRENGTH, StatusPolarity::Buff)
                .with_description("Adds to attack damage"),
            StatusDef::new(names::DEXTERITY, StatusPolarity::Buff)
                .with_description("Adds to block gained"),
            StatusDef::new(names::VULNERABLE, StatusPolarity::Debuff)
                .with_description("Takes more attack damage"),
            StatusDef::new(names::WEAK, StatusPolarity::Debuff)
                .with_description("Deals less attack damage"),
            StatusDef::new(names::FRAIL, StatusPolarity::Debuff)
                .with_description("Gains less block"),
            StatusDef::new("poison", StatusPolarity::Debuff),
            StatusDef::new("thorns", StatusPolarity::Buff),
            StatusDef::new("regen", StatusPolarity::Buff),
        ] {
            registry.register(def);
        }
        registry
    }

    /// Register a status. Re-registering replaces the definition.
    pub fn register(&mut self, def: StatusDef) {
        if !self.statuses.contains_key(&def.id) {
            self.order.push(def.id.clone());
        }
        self.statuses.insert(def.id.clone(), def);
    }

    #[must_use]
    pub fn get(&self, id: &StatusId) -> Option<&StatusDef> {
        self.statuses.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &StatusId) -> bool {
        self.statuses.contains_key(id)
    }

    /// Check a raw name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.statuses.contains_key(&StatusId::new(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over status IDs in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &StatusId> {
        self.order.iter()
    }
}
