//! Stack items and their lifecycle.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::EntityId;
use crate::effects::{EffectNode, Target, Targets};
use crate::triggers::{Reaction, TriggerId};

use super::StackError;

/// Lifecycle of a stack item.
///
/// ```text
/// Pending ──> Cancelled
///    │
///    └──> Resolving ──> Resolved
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    #[default]
    Pending,
    Cancelled,
    Resolving,
    Resolved,
}

impl ItemState {
    #[must_use]
    pub const fn can_transition_to(self, next: ItemState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Resolving)
                | (Self::Resolving, Self::Resolved)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Resolved)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
        })
    }
}

/// Flat adjustments hooks may apply before an item resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemModifiers {
    /// Added to each hit before vulnerable and weak.
    pub damage_delta: i64,
    /// Added to each block gain before frail.
    pub block_delta: i64,
}

/// One pending effect application.
#[derive(Clone, Debug)]
pub struct StackItem {
    /// Insertion tag, assigned by [`EffectStack::push`](super::EffectStack::push).
    order: u64,

    pub node: Arc<EffectNode>,

    /// Entity the effect acts on behalf of.
    pub source: EntityId,

    /// Targets chosen at submission.
    pub targets: Targets,

    pub modifiers: ItemModifiers,

    /// Trigger chain depth. Zero for submitted effects.
    pub chain_depth: u32,

    /// Trigger that queued this item, if it is a reaction.
    pub trigger: Option<TriggerId>,

    state: ItemState,
    pub(super) hooks_ran: bool,
}

impl StackItem {
    pub fn new(
        node: impl Into<Arc<EffectNode>>,
        source: EntityId,
        targets: impl IntoIterator<Item = Target>,
    ) -> Self {
        Self {
            order: 0,
            node: node.into(),
            source,
            targets: targets.into_iter().collect(),
            modifiers: ItemModifiers::default(),
            chain_depth: 0,
            trigger: None,
            state: ItemState::Pending,
            hooks_ran: false,
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: ItemModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn at_depth(mut self, depth: u32) -> Self {
        self.chain_depth = depth;
        self
    }

    /// Insertion tag. Only meaningful once pushed.
    #[must_use]
    pub fn order(&self) -> u64 {
        self.order
    }

    pub(super) fn set_order(&mut self, order: u64) {
        self.order = order;
    }

    #[must_use]
    pub fn state(&self) -> ItemState {
        self.state
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state == ItemState::Cancelled
    }

    /// Move to `next`, or fail if the lifecycle doesn't allow it.
    pub fn transition(&mut self, next: ItemState) -> Result<(), StackError> {
        if !self.state.can_transition_to(next) {
            return Err(StackError::InvalidTransition {
                order: self.order,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Cancel a pending item.
    pub fn cancel(&mut self) -> Result<(), StackError> {
        self.transition(ItemState::Cancelled)
    }
}

impl From<Reaction> for StackItem {
    fn from(reaction: Reaction) -> Self {
        let mut item = StackItem::new(reaction.effect, reaction.source, reaction.targets)
            .at_depth(reaction.chain_depth);
        item.trigger = Some(reaction.trigger);
        item
    }
}
