//! Core engine types: entities, statuses, state, RNG, configuration.
//!
//! These are the collaborators the resolver works against. The engine reads
//! and writes them but never decides when entities join or leave a fight.

pub mod entity;
pub mod status;
pub mod rng;
pub mod config;
pub mod state;

pub use entity::{CardId, Entity, EntityId, Side};
pub use status::{StatusDef, StatusId, StatusPolarity, StatusRegistry, StatusStack};
pub use rng::{GameRng, GameRngState};
pub use config::{EngineConfig, ExpressionLimits};
pub use state::{GameState, StateSnapshot, TurnInfo};
