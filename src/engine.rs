//! Engine facade.
//!
//! `Engine` owns the configuration, the status registry, the trigger
//! manager and the effect stack. Callers own the `GameState` and pass it in
//! for each call, so one engine can drive any number of saved states.
//!
//! Every entry point that changes state drains the stack before returning:
//! when it comes back, all cascading reactions have resolved or were cut
//! off at the chain ceiling.

use std::sync::Arc;

use tracing::debug;

use crate::core::{EngineConfig, EntityId, GameState, StatusRegistry};
use crate::effects::{validate, EffectError, EffectNode, EffectResolver, Target, ValidationError};
use crate::stack::{EffectStack, ResolutionReport, StackItem};
use crate::triggers::{Event, EventKind, Trigger, TriggerId, TriggerManager, TriggerOwner};

/// Card-effect resolution engine.
///
/// ## Example
///
/// ```
/// use ccg_effects::core::{Entity, EntityId, GameState, Side};
/// use ccg_effects::effects::Target;
/// use ccg_effects::Engine;
///
/// let mut engine = Engine::default();
/// let mut state = GameState::new(42)
///     .with_entity(Entity::new(EntityId(0), Side::Player, 70).with_status("strength", 3))
///     .with_entity(Entity::new(EntityId(1), Side::Enemy, 40).with_status("vulnerable", 1));
///
/// let strike = engine.parse_effect(r#"{"type": "damage", "value": 6}"#).unwrap();
/// let report = engine.submit(strike, EntityId(0), [Target::Entity(EntityId(1))], &mut state);
///
/// assert!(report.is_clean());
/// // (6 + 3) * 1.5
/// assert_eq!(state.entity(EntityId(1)).unwrap().hp, 40 - 13);
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    statuses: StatusRegistry,
    triggers: TriggerManager,
    stack: EffectStack,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), StatusRegistry::with_defaults())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig, statuses: StatusRegistry) -> Self {
        let triggers = TriggerManager::new(config.max_chain_depth);
        Self {
            config,
            statuses,
            triggers,
            stack: EffectStack::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    #[must_use]
    pub fn triggers(&self) -> &TriggerManager {
        &self.triggers
    }

    pub fn triggers_mut(&mut self) -> &mut TriggerManager {
        &mut self.triggers
    }

    #[must_use]
    pub fn stack(&self) -> &EffectStack {
        &self.stack
    }

    /// Access the stack, e.g. to install hooks.
    pub fn stack_mut(&mut self) -> &mut EffectStack {
        &mut self.stack
    }

    // === Content ===

    /// Parse and validate an effect from its JSON wire format.
    pub fn parse_effect(&self, json: &str) -> Result<EffectNode, EffectError> {
        EffectNode::from_json(json, &self.statuses, &self.config)
    }

    /// Static check. Reads nothing but the node and the registries.
    #[must_use]
    pub fn validate(&self, node: &EffectNode) -> Vec<ValidationError> {
        validate(node, &self.statuses, &self.config)
    }

    // === Resolution ===

    /// Push one effect and drain the stack.
    pub fn submit(
        &mut self,
        node: impl Into<Arc<EffectNode>>,
        source: EntityId,
        targets: impl IntoIterator<Item = Target>,
        state: &mut GameState,
    ) -> ResolutionReport {
        self.push(node, source, targets);
        self.resolve(state)
    }

    /// Push one effect without resolving it. Returns its insertion tag.
    pub fn push(
        &mut self,
        node: impl Into<Arc<EffectNode>>,
        source: EntityId,
        targets: impl IntoIterator<Item = Target>,
    ) -> u64 {
        self.stack.push(StackItem::new(node, source, targets))
    }

    /// Drain the stack, including everything queued by triggers.
    pub fn resolve(&mut self, state: &mut GameState) -> ResolutionReport {
        let resolver = EffectResolver::new(&self.config, &self.statuses);
        let report = self.stack.resolve_all(state, &resolver, &mut self.triggers);
        debug!(
            resolved = report.resolved.len(),
            cancelled = report.cancelled.len(),
            diagnostics = report.diagnostics.len(),
            "stack drained"
        );
        report
    }

    /// Fire an event raised outside of resolution and drain its reactions.
    pub fn fire_event(&mut self, event: Event, state: &mut GameState) -> ResolutionReport {
        self.triggers.fire(event, state, &self.statuses);
        self.resolve(state)
    }

    // === Triggers ===

    pub fn register_trigger(&mut self, trigger: Trigger) -> TriggerId {
        self.triggers.register(trigger)
    }

    pub fn unregister_trigger(&mut self, id: TriggerId) -> Option<Trigger> {
        self.triggers.unregister(id)
    }

    /// Remove all triggers of an owner that left play.
    pub fn unregister_by_owner(&mut self, owner: &TriggerOwner) -> usize {
        self.triggers.unregister_by_owner(owner)
    }

    // === Phases ===

    /// Reset all trigger limits and fire `combat_start`.
    pub fn start_combat(&mut self, state: &mut GameState) -> ResolutionReport {
        self.triggers.reset_combat();
        state.turn = Default::default();
        self.fire_event(Event::new(EventKind::CombatStart), state)
    }

    /// Begin `entity`'s turn: reset per-turn limits, clear its block, bump
    /// the turn counter and fire `turn_start`.
    pub fn start_turn(&mut self, entity: EntityId, state: &mut GameState) -> ResolutionReport {
        self.triggers.reset_turn();
        if let Some(e) = state.entity_mut(entity) {
            e.block = 0;
        }
        state.turn.number += 1;
        state.turn.active = Some(entity);
        state.turn.cards_played = 0;
        debug!(%entity, turn = state.turn.number, "turn started");
        self.fire_event(
            Event::new(EventKind::TurnStart).with_source(entity).with_target(entity),
            state,
        )
    }

    /// End `entity`'s turn: fire `turn_end`, then tick its status
    /// durations, firing `status_removed` for each that expires.
    pub fn end_turn(&mut self, entity: EntityId, state: &mut GameState) -> ResolutionReport {
        let mut report = self.fire_event(
            Event::new(EventKind::TurnEnd).with_source(entity).with_target(entity),
            state,
        );

        let expired = state.entity_mut(entity).map(|e| e.tick_durations()).unwrap_or_default();
        for (status, stacks) in expired {
            debug!(%entity, %status, "status expired");
            self.triggers.fire(
                Event::new(EventKind::StatusRemoved)
                    .with_source(entity)
                    .with_target(entity)
                    .with_value(stacks)
                    .with_status(status),
                state,
                &self.statuses,
            );
        }
        report.merge(self.resolve(state));
        report
    }

    /// Count a card play for `cards_played` in expressions.
    pub fn record_card_played(&self, state: &mut GameState) {
        state.turn.cards_played += 1;
    }
}
