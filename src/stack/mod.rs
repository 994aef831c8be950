//! Stack and resolution system.
//!
//! Effects queue on an [`EffectStack`] and resolve in LIFO order. Reactions
//! raised while an item resolves are pushed on top of whatever is left, so
//! they finish before the item below gets its turn.
//!
//! ## Example Usage
//!
//! ```
//! use ccg_effects::core::{EngineConfig, Entity, EntityId, GameState, Side, StatusRegistry};
//! use ccg_effects::effects::{EffectNode, EffectResolver, Target};
//! use ccg_effects::stack::{EffectStack, StackItem};
//! use ccg_effects::triggers::TriggerManager;
//!
//! let config = EngineConfig::default();
//! let statuses = StatusRegistry::with_defaults();
//! let resolver = EffectResolver::new(&config, &statuses);
//! let mut triggers = TriggerManager::new(config.max_chain_depth);
//!
//! let mut state = GameState::new(42)
//!     .with_entity(Entity::new(EntityId(0), Side::Player, 70))
//!     .with_entity(Entity::new(EntityId(1), Side::Enemy, 40));
//!
//! let mut stack = EffectStack::new();
//! let foe = [Target::Entity(EntityId(1))];
//! let first = stack.push(StackItem::new(EffectNode::damage(3), EntityId(0), foe));
//! let second = stack.push(StackItem::new(EffectNode::damage(5), EntityId(0), foe));
//!
//! let report = stack.resolve_all(&mut state, &resolver, &mut triggers);
//! assert_eq!(report.resolved, vec![second, first]);
//! assert_eq!(state.entity(EntityId(1)).unwrap().hp, 32);
//! ```

mod item;
mod lifo;

pub use item::{ItemModifiers, ItemState, StackItem};
pub use lifo::{EffectStack, PostResolveHook, PreResolveHook};

use thiserror::Error;

use crate::expr::EvalError;
use crate::triggers::{EventKind, TriggerId};

/// Invalid use of a stack item.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack item {order} cannot go from {from} to {to}")]
    InvalidTransition { order: u64, from: ItemState, to: ItemState },
}

/// A non-fatal problem met during resolution.
///
/// None of these stop the stack. Each one means a single item or trigger
/// had no effect.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Diagnostic {
    /// The item's value or guard failed to evaluate. Its changes were
    /// rolled back.
    #[error("stack item {order} failed to evaluate: {error}")]
    Evaluation { order: u64, error: EvalError },

    /// A trigger guard failed to evaluate. The trigger did not fire.
    #[error("guard of {trigger} failed to evaluate: {error}")]
    Guard { trigger: TriggerId, error: EvalError },

    /// An event reached the chain ceiling and fired no triggers.
    #[error("`{kind}` at chain depth {depth} reached the ceiling")]
    ChainDepthExceeded { kind: EventKind, depth: u32 },

    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Outcome of draining the stack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolutionReport {
    /// Insertion tags of resolved items, in resolution order.
    pub resolved: Vec<u64>,
    /// Insertion tags of cancelled items, in the order they were popped.
    pub cancelled: Vec<u64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolutionReport {
    /// Nothing went wrong.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The chain ceiling stopped at least one event.
    #[must_use]
    pub fn hit_chain_ceiling(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::ChainDepthExceeded { .. }))
    }

    /// Fold a later report into this one.
    pub fn merge(&mut self, other: ResolutionReport) {
        self.resolved.extend(other.resolved);
        self.cancelled.extend(other.cancelled);
        self.diagnostics.extend(other.diagnostics);
    }
}
