//! Effect system for card abilities.
//!
//! Effects are declarative trees built from the wire format or in code:
//! - `EffectNode`: One effect with its value, guard and `then` chain
//! - `TargetSelector`: How an effect picks its targets
//! - `validate`: Static checks run before anything reaches the stack
//! - `EffectResolver`: Executes nodes against game state
//!
//! ## Wire format
//!
//! ```
//! use ccg_effects::core::{EngineConfig, StatusRegistry};
//! use ccg_effects::effects::{EffectKind, EffectNode, TargetSelector};
//!
//! let node = EffectNode::from_json(
//!     r#"{"type": "damage", "value": "6 + strength", "then": {"type": "draw", "value": 1}}"#,
//!     &StatusRegistry::with_defaults(),
//!     &EngineConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(node.kind, EffectKind::Damage);
//! assert_eq!(node.target, TargetSelector::Enemy);
//! assert_eq!(node.chain_len(), 2);
//! ```

mod effect;
mod resolver;
mod targeting;
mod validate;
mod vars;
mod wire;

pub use effect::{EffectKind, EffectNode, EffectValue};
pub use resolver::{EffectResolver, ResolverContext};
pub use targeting::{select_targets, Target, TargetSelector, Targets};
pub use validate::{validate, EffectError, ValidationError, ValidationIssue};
pub use vars::variable_table;
pub use wire::{EffectSpec, SpecValue};
