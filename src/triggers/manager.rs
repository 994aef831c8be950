//! Trigger manager.
//!
//! Holds registered triggers per event kind, sorted by descending priority
//! (stable on ties), and matches them against fired events.
//!
//! Firing never resolves effects inline. Each eligible trigger queues a
//! [`Reaction`] one chain level deeper than the event, and the stack pushes
//! the queue after the current item finishes. The chain depth travels with
//! events and reactions, so a runaway loop is cut off at
//! `max_chain_depth` without any recursion.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::core::{EntityId, GameState, StatusRegistry};
use crate::effects::{variable_table, EffectNode, Target, Targets};
use crate::stack::Diagnostic;

use super::event::{Event, EventKind};
use super::registry::{Trigger, TriggerId, TriggerOwner};

/// A triggered effect waiting to be pushed onto the stack.
#[derive(Clone, Debug)]
pub struct Reaction {
    pub trigger: TriggerId,
    pub effect: Arc<EffectNode>,
    /// The trigger's bound entity.
    pub source: EntityId,
    /// The triggering event's participants, for `enemy` and `ally`.
    pub targets: Targets,
    pub chain_depth: u32,
}

/// Saved trigger bookkeeping, restored when an item is rolled back.
#[derive(Clone, Debug)]
pub struct TriggerCheckpoint {
    triggers: FxHashMap<EventKind, Vec<Trigger>>,
    pending: usize,
    diagnostics: usize,
}

/// Registry and dispatcher for triggers.
#[derive(Clone, Debug)]
pub struct TriggerManager {
    triggers: FxHashMap<EventKind, Vec<Trigger>>,
    next_id: u32,
    max_chain_depth: u32,
    pending: Vec<Reaction>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for TriggerManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl TriggerManager {
    /// Create an empty manager. Events at `max_chain_depth` or deeper
    /// don't fire triggers.
    #[must_use]
    pub fn new(max_chain_depth: u32) -> Self {
        Self {
            triggers: FxHashMap::default(),
            next_id: 1,
            max_chain_depth,
            pending: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[must_use]
    pub fn max_chain_depth(&self) -> u32 {
        self.max_chain_depth
    }

    // === Registration ===

    /// Register a trigger and return its assigned ID.
    pub fn register(&mut self, mut trigger: Trigger) -> TriggerId {
        let id = TriggerId::new(self.next_id);
        self.next_id += 1;
        trigger.id = id;

        let list = self.triggers.entry(trigger.event).or_default();
        let pos = list
            .iter()
            .position(|t| t.priority < trigger.priority)
            .unwrap_or(list.len());
        debug!(%id, event = %trigger.event, priority = trigger.priority, "registered trigger");
        list.insert(pos, trigger);
        id
    }

    /// Remove one trigger.
    pub fn unregister(&mut self, id: TriggerId) -> Option<Trigger> {
        for list in self.triggers.values_mut() {
            if let Some(pos) = list.iter().position(|t| t.id == id) {
                return Some(list.remove(pos));
            }
        }
        None
    }

    /// Remove every trigger registered by `owner`. Returns how many.
    pub fn unregister_by_owner(&mut self, owner: &TriggerOwner) -> usize {
        let mut removed = 0;
        for list in self.triggers.values_mut() {
            let before = list.len();
            list.retain(|t| &t.owner != owner);
            removed += before - list.len();
        }
        self.triggers.retain(|_, list| !list.is_empty());
        if removed > 0 {
            debug!(?owner, removed, "unregistered triggers");
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.values().flatten().find(|t| t.id == id)
    }

    /// Triggers for `kind` in firing order.
    pub fn triggers_for(&self, kind: EventKind) -> impl Iterator<Item = &Trigger> {
        self.triggers.get(&kind).into_iter().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // === Firing ===

    /// Record `event` and queue reactions from every eligible trigger.
    ///
    /// Triggers are tried in priority order until one cancels the event.
    /// A trigger is eligible when its limits aren't used up, both filters
    /// pass, and its guard (if any) holds. Guards see the bound entity as
    /// source, the event's target as target, and `event_value`.
    ///
    /// An event at or past the chain ceiling is recorded but fires nothing,
    /// and a [`Diagnostic::ChainDepthExceeded`] is kept.
    pub fn fire(
        &mut self,
        mut event: Event,
        state: &mut GameState,
        statuses: &StatusRegistry,
    ) -> Event {
        if event.chain_depth >= self.max_chain_depth {
            warn!(
                kind = %event.kind,
                depth = event.chain_depth,
                "trigger chain depth ceiling reached, not firing triggers"
            );
            self.diagnostics.push(Diagnostic::ChainDepthExceeded {
                kind: event.kind,
                depth: event.chain_depth,
            });
            state.record_event(event.clone());
            return event;
        }

        if let Some(list) = self.triggers.get_mut(&event.kind) {
            for trigger in list.iter_mut() {
                if event.cancelled {
                    break;
                }
                if !trigger.has_capacity() || !trigger.filters_pass(&event, state) {
                    continue;
                }
                if let Some(guard) = &trigger.condition {
                    let mut vars = variable_table(state, statuses, trigger.bound, event.target);
                    vars.set("event_value", event.value as f64);
                    match guard.evaluate_bool(&vars) {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(error) => {
                            warn!(
                                trigger = %trigger.id,
                                %error,
                                "trigger guard failed to evaluate"
                            );
                            self.diagnostics.push(Diagnostic::Guard {
                                trigger: trigger.id,
                                error,
                            });
                            continue;
                        }
                    }
                }

                trigger.record_fire();
                debug!(
                    trigger = %trigger.id,
                    event = %event.kind,
                    depth = event.chain_depth,
                    "trigger fired"
                );
                self.pending.push(Reaction {
                    trigger: trigger.id,
                    effect: Arc::clone(&trigger.effect),
                    source: trigger.bound,
                    targets: event
                        .source
                        .into_iter()
                        .chain(event.target)
                        .filter(|id| *id != trigger.bound)
                        .map(Target::Entity)
                        .collect(),
                    chain_depth: event.chain_depth + 1,
                });
                if trigger.cancels_event {
                    event.cancelled = true;
                }
            }
        }

        state.record_event(event.clone());
        event
    }

    /// Reactions queued since the last call, in firing order.
    pub fn take_pending(&mut self) -> Vec<Reaction> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn pending(&self) -> &[Reaction] {
        &self.pending
    }

    /// Diagnostics raised since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // === Phase boundaries ===

    /// Zero per-turn counters.
    pub fn reset_turn(&mut self) {
        self.triggers.values_mut().flatten().for_each(Trigger::reset_turn);
    }

    /// Zero per-turn and per-combat counters.
    pub fn reset_combat(&mut self) {
        self.triggers.values_mut().flatten().for_each(Trigger::reset_combat);
    }

    // === Rollback ===

    #[must_use]
    pub fn checkpoint(&self) -> TriggerCheckpoint {
        TriggerCheckpoint {
            triggers: self.triggers.clone(),
            pending: self.pending.len(),
            diagnostics: self.diagnostics.len(),
        }
    }

    /// Undo counter changes and drop reactions and diagnostics queued
    /// since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: TriggerCheckpoint) {
        self.triggers = checkpoint.triggers;
        self.pending.truncate(checkpoint.pending);
        self.diagnostics.truncate(checkpoint.diagnostics);
    }
}
