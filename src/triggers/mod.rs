//! Trigger system for event-driven abilities.
//!
//! Triggers let cards, statuses and items react to what happens during
//! resolution. The resolver fires an [`Event`] for every state change; the
//! [`TriggerManager`] matches registered [`Trigger`]s against it and queues
//! a [`Reaction`] for each one that is eligible.
//!
//! ## Key Components
//!
//! - [`EventKind`]: The fixed set of event kinds
//! - [`Event`]: An event that occurred with contextual data
//! - [`Trigger`]: A reactive rule with filters, guard and limits
//! - [`TriggerManager`]: Storage, priority ordering and firing
//!
//! ## Example Usage
//!
//! ```
//! use ccg_effects::core::{Entity, EntityId, GameState, Side, StatusRegistry};
//! use ccg_effects::effects::EffectNode;
//! use ccg_effects::triggers::{
//!     EntityFilter, Event, EventKind, Trigger, TriggerManager, TriggerOwner,
//! };
//!
//! let hero = EntityId(0);
//! let foe = EntityId(1);
//! let mut state = GameState::new(42)
//!     .with_entity(Entity::new(hero, Side::Player, 70))
//!     .with_entity(Entity::new(foe, Side::Enemy, 40));
//!
//! // "Whenever you take damage, deal 3 back."
//! let mut manager = TriggerManager::new(50);
//! manager.register(
//!     Trigger::new(
//!         TriggerOwner::Entity(hero),
//!         hero,
//!         EventKind::DamageTaken,
//!         EffectNode::damage(3),
//!     )
//!     .with_target_filter(EntityFilter::Bound),
//! );
//!
//! let hit = Event::new(EventKind::DamageTaken).with_source(foe).with_target(hero).with_value(5);
//! manager.fire(hit, &mut state, &StatusRegistry::with_defaults());
//!
//! let reactions = manager.take_pending();
//! assert_eq!(reactions.len(), 1);
//! assert_eq!(reactions[0].chain_depth, 1);
//! ```

mod event;
mod manager;
mod registry;

pub use event::{Event, EventKind};
pub use manager::{Reaction, TriggerCheckpoint, TriggerManager};
pub use registry::{EntityFilter, Trigger, TriggerId, TriggerOwner};
