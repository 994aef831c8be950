//! # ccg-effects
//!
//! A deterministic card-effect resolution engine for deckbuilder combat.
//!
//! ## Design Principles
//!
//! 1. **Data-Driven**: Card abilities are declarative effect trees loaded
//!    from JSON. Dynamic values are expressions in a small sandboxed
//!    language that can only read numbers.
//!
//! 2. **Deterministic**: Same seed, same state, same submissions, same
//!    result. All randomness goes through the state's seeded `GameRng`.
//!
//! 3. **Strict Ordering**: The stack resolves LIFO. Reactions raised by an
//!    item resolve before the item below it. Triggers fire in priority order.
//!
//! 4. **Nothing Fatal**: Bad content is rejected when it is parsed. A failure
//!    during resolution rolls back one item and is reported as a
//!    [`stack::Diagnostic`]. Trigger loops stop at the chain ceiling.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: `GameState` is backed by `im`, so the
//!   per-item checkpoint used for rollback is a cheap clone.
//!
//! - **Queued Reactions**: Firing an event never resolves anything inline.
//!   Reactions are queued with their chain depth and pushed on the stack.
//!
//! ## Modules
//!
//! - `core`: Entities, statuses, state, RNG, configuration
//! - `zones`: Per-owner card piles (deck, hand, discard, exhaust)
//! - `expr`: Expression language
//! - `effects`: Effect trees, targeting, validation, resolver
//! - `triggers`: Events and the trigger manager
//! - `stack`: LIFO resolution stack with hooks
//! - `engine`: Facade tying it all together

pub mod core;
pub mod zones;
pub mod expr;
pub mod effects;
pub mod triggers;
pub mod stack;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{
    CardId, EngineConfig, Entity, EntityId, GameRng, GameState, Side, StatusId, StatusRegistry,
};

pub use crate::zones::{Zone, ZoneManager};

pub use crate::expr::{EvalError, ExprError, Expression, VarTable};

pub use crate::effects::{
    EffectError, EffectKind, EffectNode, EffectResolver, EffectValue, ResolverContext, Target,
    TargetSelector, ValidationError,
};

pub use crate::triggers::{
    EntityFilter, Event, EventKind, Trigger, TriggerId, TriggerManager, TriggerOwner,
};

pub use crate::stack::{Diagnostic, EffectStack, ItemState, ResolutionReport, StackItem};

pub use crate::engine::Engine;
