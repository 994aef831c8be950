//! LIFO effect stack.
//!
//! Items resolve top first. Before an item is popped, pre-resolve hooks may
//! cancel it, adjust its modifiers or push responses that land on top of it.
//! After it resolves, the reactions its events queued are pushed and
//! drained before the next item below.

use std::fmt;

use tracing::{debug, warn};

use crate::core::GameState;
use crate::effects::{EffectResolver, ResolverContext};
use crate::triggers::TriggerManager;

use super::item::{ItemState, StackItem};
use super::{Diagnostic, ResolutionReport};

/// Runs once per item while it is on top. Responses pushed into the buffer
/// go on the stack above the item and resolve first.
pub type PreResolveHook = Box<dyn FnMut(&mut StackItem, &GameState, &mut Vec<StackItem>)>;

/// Runs after each item is popped, whether it resolved or was cancelled.
pub type PostResolveHook = Box<dyn FnMut(&StackItem, &GameState)>;

/// The effect stack.
#[derive(Default)]
pub struct EffectStack {
    /// Index 0 is the bottom.
    items: Vec<StackItem>,
    next_order: u64,
    pre_hooks: Vec<PreResolveHook>,
    post_hooks: Vec<PostResolveHook>,
}

impl fmt::Debug for EffectStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectStack")
            .field("items", &self.items)
            .field("next_order", &self.next_order)
            .field("pre_hooks", &self.pre_hooks.len())
            .field("post_hooks", &self.post_hooks.len())
            .finish()
    }
}

impl EffectStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Hooks ===

    pub fn add_pre_resolve_hook(
        &mut self,
        hook: impl FnMut(&mut StackItem, &GameState, &mut Vec<StackItem>) + 'static,
    ) {
        self.pre_hooks.push(Box::new(hook));
    }

    pub fn add_post_resolve_hook(&mut self, hook: impl FnMut(&StackItem, &GameState) + 'static) {
        self.post_hooks.push(Box::new(hook));
    }

    pub fn clear_hooks(&mut self) {
        self.pre_hooks.clear();
        self.post_hooks.clear();
    }

    // === Container ===

    /// Push an item and return its insertion tag. Tags strictly increase.
    pub fn push(&mut self, mut item: StackItem) -> u64 {
        self.next_order += 1;
        let order = self.next_order;
        item.set_order(order);
        debug!(order, kind = %item.node.kind, depth = item.chain_depth, "pushed stack item");
        self.items.push(item);
        order
    }

    #[must_use]
    pub fn peek(&self) -> Option<&StackItem> {
        self.items.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut StackItem> {
        self.items.last_mut()
    }

    pub fn pop(&mut self) -> Option<StackItem> {
        self.items.pop()
    }

    /// Find an item by insertion tag.
    pub fn get_mut(&mut self, order: u64) -> Option<&mut StackItem> {
        self.items.iter_mut().find(|item| item.order() == order)
    }

    /// Items from bottom to top.
    #[must_use]
    pub fn items(&self) -> &[StackItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Push queued reactions so the first one queued ends up on top.
    pub fn push_reactions(&mut self, triggers: &mut TriggerManager) {
        for reaction in triggers.take_pending().into_iter().rev() {
            self.push(StackItem::from(reaction));
        }
    }

    // === Resolution ===

    /// Drain the stack.
    ///
    /// Each item resolves against a checkpoint. If evaluation fails, the
    /// state and trigger bookkeeping go back to the checkpoint and the
    /// failure is reported as [`Diagnostic::Evaluation`].
    pub fn resolve_all(
        &mut self,
        state: &mut GameState,
        resolver: &EffectResolver<'_>,
        triggers: &mut TriggerManager,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        report.diagnostics.extend(triggers.take_diagnostics());
        self.push_reactions(triggers);

        while let Some(top) = self.items.last_mut() {
            if !top.hooks_ran {
                top.hooks_ran = true;
                let mut responses = Vec::new();
                for hook in &mut self.pre_hooks {
                    hook(&mut *top, &*state, &mut responses);
                }
                if !responses.is_empty() {
                    debug!(count = responses.len(), "pre-resolve hooks pushed responses");
                    for response in responses {
                        self.push(response);
                    }
                    continue;
                }
            }

            let Some(mut item) = self.items.pop() else {
                break;
            };

            if item.is_cancelled() {
                debug!(order = item.order(), "stack item cancelled");
                report.cancelled.push(item.order());
            } else if let Err(error) = item.transition(ItemState::Resolving) {
                report.diagnostics.push(Diagnostic::Stack(error));
            } else {
                resolve_item(&item, state, resolver, triggers, &mut report);
                match item.transition(ItemState::Resolved) {
                    Ok(()) => report.resolved.push(item.order()),
                    Err(error) => report.diagnostics.push(Diagnostic::Stack(error)),
                }
            }

            for hook in &mut self.post_hooks {
                hook(&item, &*state);
            }

            report.diagnostics.extend(triggers.take_diagnostics());
            self.push_reactions(triggers);
        }

        report
    }
}

/// Resolve one item against a checkpoint, rolling back on evaluation error.
fn resolve_item(
    item: &StackItem,
    state: &mut GameState,
    resolver: &EffectResolver<'_>,
    triggers: &mut TriggerManager,
    report: &mut ResolutionReport,
) {
    debug!(order = item.order(), kind = %item.node.kind, "resolving stack item");
    let saved_state = state.clone();
    let saved_triggers = triggers.checkpoint();

    let result = {
        let mut ctx = ResolverContext::new(triggers, item.source, &item.targets)
            .with_chain_depth(item.chain_depth)
            .with_deltas(item.modifiers.damage_delta, item.modifiers.block_delta);
        resolver.resolve(state, &item.node, &mut ctx)
    };

    if let Err(error) = result {
        warn!(order = item.order(), %error, "stack item failed to evaluate, rolling back");
        *state = saved_state;
        triggers.rollback(saved_triggers);
        report.diagnostics.push(Diagnostic::Evaluation {
            order: item.order(),
            error,
        });
    }
}
