//! Effect resolution - executing effects on game state.
//!
//! `EffectResolver` is the only writer of `GameState` during resolution.
//! Each effect kind has one handler. Handlers evaluate the node's value,
//! apply the deckbuilder modifier rules, mutate the state and fire events
//! through the `TriggerManager`.
//!
//! Triggers don't run inline. `fire` queues their reactions and the stack
//! pushes them once the current item is done, so handlers never re-enter.

use tracing::debug;

use crate::core::status::names;
use crate::core::{EngineConfig, EntityId, GameState, StatusId, StatusRegistry};
use crate::expr::EvalError;
use crate::triggers::{Event, EventKind, TriggerManager};
use crate::zones::Zone;

use super::effect::{EffectKind, EffectNode, EffectValue};
use super::targeting::{select_targets, Target, TargetSelector, Targets};
use super::vars::variable_table;

/// Per-application inputs to the resolver.
pub struct ResolverContext<'a> {
    /// Receives every event the handlers fire.
    pub triggers: &'a mut TriggerManager,
    /// Entity the effect acts on behalf of.
    pub source: EntityId,
    /// Targets picked at submission.
    pub chosen: &'a [Target],
    /// Chain depth stamped on fired events.
    pub chain_depth: u32,
    /// Flat adjustment to damage, set by stack hooks.
    pub damage_delta: i64,
    /// Flat adjustment to block, set by stack hooks.
    pub block_delta: i64,
}

impl<'a> ResolverContext<'a> {
    pub fn new(triggers: &'a mut TriggerManager, source: EntityId, chosen: &'a [Target]) -> Self {
        Self {
            triggers,
            source,
            chosen,
            chain_depth: 0,
            damage_delta: 0,
            block_delta: 0,
        }
    }

    #[must_use]
    pub fn with_chain_depth(mut self, depth: u32) -> Self {
        self.chain_depth = depth;
        self
    }

    #[must_use]
    pub fn with_deltas(mut self, damage_delta: i64, block_delta: i64) -> Self {
        self.damage_delta = damage_delta;
        self.block_delta = block_delta;
        self
    }
}

/// Applies effect nodes to game state.
#[derive(Clone, Copy, Debug)]
pub struct EffectResolver<'a> {
    config: &'a EngineConfig,
    statuses: &'a StatusRegistry,
}

impl<'a> EffectResolver<'a> {
    pub fn new(config: &'a EngineConfig, statuses: &'a StatusRegistry) -> Self {
        Self { config, statuses }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    #[must_use]
    pub fn statuses(&self) -> &StatusRegistry {
        self.statuses
    }

    /// Resolve `node` and its `then` chain.
    ///
    /// On `Err` the state may be partly modified; callers that need
    /// all-or-nothing semantics restore a checkpoint.
    pub fn resolve(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        self.resolve_node(state, node, None, ctx)
    }

    fn resolve_node(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        parent: Option<(TargetSelector, &[Target])>,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        // A successor with the same selector acts on the same targets, so a
        // random pick isn't redrawn.
        let targets: Targets = match parent {
            Some((selector, resolved)) if selector == node.target => {
                resolved.iter().copied().collect()
            }
            _ => select_targets(node.target, ctx.source, ctx.chosen, state),
        };

        let applies = match &node.condition {
            Some(guard) => {
                let vars = variable_table(state, self.statuses, ctx.source, first_entity(&targets));
                guard.evaluate_bool(&vars)?
            }
            None => true,
        };

        if applies {
            self.apply(state, node, &targets, ctx)?;
        } else {
            debug!(kind = %node.kind, "guard is false, skipping");
        }

        if let Some(next) = node.then.as_deref() {
            self.resolve_node(state, next, Some((node.target, targets.as_slice())), ctx)?;
        }
        Ok(())
    }

    fn apply(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        match node.kind {
            EffectKind::Damage => self.damage(state, node, targets, ctx),
            EffectKind::LoseHp => self.lose_hp(state, node, targets, ctx),
            EffectKind::Heal => self.heal(state, node, targets, ctx),
            EffectKind::Block => self.block(state, node, targets, ctx),
            EffectKind::Draw => self.draw(state, node, targets, ctx),
            EffectKind::Discard => self.discard(state, node, targets, ctx),
            EffectKind::GainResource => self.gain_resource(state, node, targets, ctx),
            EffectKind::ApplyStatus => self.apply_status(state, node, targets, ctx),
            EffectKind::RemoveStatus => self.remove_status(state, node, targets, ctx),
            EffectKind::Conditional | EffectKind::Composite => {
                self.children(state, node, targets, ctx)
            }
            EffectKind::Repeat => {
                let times = self.amount(state, node, ctx.source, first_entity(targets))?;
                for _ in 0..times {
                    self.children(state, node, targets, ctx)?;
                }
                Ok(())
            }
        }
    }

    fn children(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        for child in &node.effects {
            self.resolve_node(state, child, Some((node.target, targets.as_slice())), ctx)?;
        }
        Ok(())
    }

    // === Values ===

    /// Value times multiplier plus bonus, before any rounding.
    ///
    /// Expression results are clamped to the kind's bounds first.
    fn base_amount(
        &self,
        state: &GameState,
        node: &EffectNode,
        source: EntityId,
        target: Option<EntityId>,
    ) -> Result<f64, EvalError> {
        let raw = match &node.value {
            None => 0.0,
            Some(EffectValue::Literal(n)) => *n as f64,
            Some(EffectValue::Expr(expr)) => {
                let vars = variable_table(state, self.statuses, source, target);
                let value = expr.evaluate(&vars)?;
                match node.kind.value_bounds() {
                    Some((lo, hi)) => value.clamp(lo as f64, hi as f64),
                    None => value,
                }
            }
        };
        Ok(raw * node.multiplier.unwrap_or(1.0) + node.bonus.unwrap_or(0) as f64)
    }

    /// Rounded-down amount, clamped to the kind's bounds.
    fn amount(
        &self,
        state: &GameState,
        node: &EffectNode,
        source: EntityId,
        target: Option<EntityId>,
    ) -> Result<i64, EvalError> {
        let n = self.base_amount(state, node, source, target)?.floor() as i64;
        Ok(match node.kind.value_bounds() {
            Some((lo, hi)) => n.clamp(lo, hi),
            None => n,
        })
    }

    fn fire(&self, state: &mut GameState, ctx: &mut ResolverContext<'_>, event: Event) -> Event {
        let event = event.with_source(ctx.source).at_depth(ctx.chain_depth);
        ctx.triggers.fire(event, state, self.statuses)
    }

    // === Handlers ===

    fn damage(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        let vulnerable = StatusId::new(names::VULNERABLE);
        let weak = StatusId::new(names::WEAK);
        let strength = StatusId::new(names::STRENGTH);

        for target in living(state, targets) {
            let base = self.base_amount(state, node, ctx.source, Some(target))?;
            let (bonus, weakened) = state
                .entity(ctx.source)
                .map_or((0, false), |s| (s.status_stacks(&strength), s.has_status(&weak)));
            let exposed = state.entity(target).is_some_and(|t| t.has_status(&vulnerable));

            let mut total = (base + bonus as f64 + ctx.damage_delta as f64).max(0.0);
            if exposed {
                total *= self.config.vulnerable_multiplier;
            }
            if weakened {
                total *= self.config.weak_multiplier;
            }
            self.deal_damage(state, target, total.floor() as i64, ctx);
        }
        Ok(())
    }

    /// Block absorbs first, the rest comes off HP.
    fn deal_damage(
        &self,
        state: &mut GameState,
        target: EntityId,
        amount: i64,
        ctx: &mut ResolverContext<'_>,
    ) {
        let Some(victim) = state.entity_mut(target) else {
            return;
        };
        let absorbed = victim.block.min(amount);
        victim.block -= absorbed;
        let lost = (amount - absorbed).min(victim.hp);
        victim.hp -= lost;
        let died = lost > 0 && victim.hp == 0;

        if absorbed > 0 {
            self.fire(
                state,
                ctx,
                Event::new(EventKind::BlockLost)
                    .with_target(target)
                    .with_value(absorbed),
            );
        }
        if lost > 0 {
            self.fire(
                state,
                ctx,
                Event::new(EventKind::DamageTaken)
                    .with_target(target)
                    .with_value(lost),
            );
        }
        if amount > 0 {
            self.fire(
                state,
                ctx,
                Event::new(EventKind::DamageDealt)
                    .with_target(target)
                    .with_value(amount),
            );
        }
        if died {
            self.fire(state, ctx, Event::new(EventKind::EntityDied).with_target(target));
        }
    }

    fn lose_hp(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        for target in living(state, targets) {
            let amount = self.amount(state, node, ctx.source, Some(target))?;
            let Some(victim) = state.entity_mut(target) else {
                continue;
            };
            let lost = amount.min(victim.hp);
            victim.hp -= lost;
            let died = lost > 0 && victim.hp == 0;

            if lost > 0 {
                self.fire(
                    state,
                    ctx,
                    Event::new(EventKind::HpLost)
                        .with_target(target)
                        .with_value(lost),
                );
            }
            if died {
                self.fire(state, ctx, Event::new(EventKind::EntityDied).with_target(target));
            }
        }
        Ok(())
    }

    fn heal(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        for target in living(state, targets) {
            let amount = self.amount(state, node, ctx.source, Some(target))?;
            let Some(entity) = state.entity_mut(target) else {
                continue;
            };
            let healed = amount.min(entity.max_hp - entity.hp).max(0);
            entity.hp += healed;
            if healed > 0 {
                self.fire(
                    state,
                    ctx,
                    Event::new(EventKind::Healed)
                        .with_target(target)
                        .with_value(healed),
                );
            }
        }
        Ok(())
    }

    fn block(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        let dexterity = StatusId::new(names::DEXTERITY);
        let frail = StatusId::new(names::FRAIL);

        for target in living(state, targets) {
            let base = self.base_amount(state, node, ctx.source, Some(target))?;
            let bonus = state.entity(ctx.source).map_or(0, |s| s.status_stacks(&dexterity));
            let Some(entity) = state.entity_mut(target) else {
                continue;
            };

            let mut total = (base + bonus as f64 + ctx.block_delta as f64).max(0.0);
            if entity.has_status(&frail) {
                total *= self.config.frail_multiplier;
            }
            let gained = total.floor() as i64;
            entity.block += gained;
            if gained > 0 {
                self.fire(
                    state,
                    ctx,
                    Event::new(EventKind::BlockGained)
                        .with_target(target)
                        .with_value(gained),
                );
            }
        }
        Ok(())
    }

    fn draw(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        for owner in targets.iter().filter_map(|t| t.entity()) {
            let count = self.amount(state, node, ctx.source, Some(owner))?;
            for _ in 0..count {
                if !self.draw_one(state, owner, ctx) {
                    debug!(%owner, "deck and discard are empty, draw yields nothing");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Draw one card, reshuffling the discard pile once if the deck is empty.
    fn draw_one(
        &self,
        state: &mut GameState,
        owner: EntityId,
        ctx: &mut ResolverContext<'_>,
    ) -> bool {
        let card = match state.zones.pop_front(owner, Zone::Deck) {
            Some(card) => card,
            None => {
                let moved = state.zones.reshuffle_discard_into_deck(owner, &mut state.rng);
                if moved == 0 {
                    return false;
                }
                debug!(%owner, moved, "reshuffled discard into deck");
                self.fire(
                    state,
                    ctx,
                    Event::new(EventKind::DeckReshuffled)
                        .with_target(owner)
                        .with_value(moved as i64),
                );
                match state.zones.pop_front(owner, Zone::Deck) {
                    Some(card) => card,
                    None => return false,
                }
            }
        };

        if state.zones.len(owner, Zone::Hand) >= self.config.max_hand_size {
            state.zones.append(owner, Zone::Discard, card);
            self.fire(
                state,
                ctx,
                Event::new(EventKind::CardDiscarded)
                    .with_target(owner)
                    .with_card(card),
            );
        } else {
            state.zones.append(owner, Zone::Hand, card);
            self.fire(
                state,
                ctx,
                Event::new(EventKind::CardDrawn)
                    .with_target(owner)
                    .with_card(card),
            );
        }
        true
    }

    fn discard(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        for target in targets.iter() {
            match *target {
                Target::Card(card) => {
                    if state.zones.move_card(ctx.source, card, Zone::Hand, Zone::Discard) {
                        self.fire(
                            state,
                            ctx,
                            Event::new(EventKind::CardDiscarded)
                                .with_target(ctx.source)
                                .with_card(card),
                        );
                    }
                }
                Target::Entity(owner) => {
                    let count = self.amount(state, node, ctx.source, Some(owner))?;
                    for _ in 0..count {
                        let Some(card) = state.zones.pop_back(owner, Zone::Hand) else {
                            break;
                        };
                        state.zones.append(owner, Zone::Discard, card);
                        self.fire(
                            state,
                            ctx,
                            Event::new(EventKind::CardDiscarded)
                                .with_target(owner)
                                .with_card(card),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn gain_resource(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        for target in living(state, targets) {
            let amount = self.amount(state, node, ctx.source, Some(target))?;
            let Some(entity) = state.entity_mut(target) else {
                continue;
            };
            let before = entity.resource;
            entity.resource = (before + amount).max(0);
            let delta = entity.resource - before;
            if delta != 0 {
                self.fire(
                    state,
                    ctx,
                    Event::new(EventKind::ResourceChanged)
                        .with_target(target)
                        .with_value(delta),
                );
            }
        }
        Ok(())
    }

    fn apply_status(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        let Some(status) = &node.status else {
            return Ok(());
        };
        for target in living(state, targets) {
            let stacks = self.amount(state, node, ctx.source, Some(target))?;
            if stacks == 0 {
                continue;
            }
            let Some(entity) = state.entity_mut(target) else {
                continue;
            };
            entity.apply_status(status.clone(), stacks, node.duration);
            self.fire(
                state,
                ctx,
                Event::new(EventKind::StatusApplied)
                    .with_target(target)
                    .with_value(stacks)
                    .with_status(status.clone()),
            );
        }
        Ok(())
    }

    fn remove_status(
        &self,
        state: &mut GameState,
        node: &EffectNode,
        targets: &Targets,
        ctx: &mut ResolverContext<'_>,
    ) -> Result<(), EvalError> {
        let Some(status) = &node.status else {
            return Ok(());
        };
        for target in living(state, targets) {
            let stacks = self.amount(state, node, ctx.source, Some(target))?;
            let Some(entity) = state.entity_mut(target) else {
                continue;
            };
            let removed = entity.remove_status(status, (stacks > 0).then_some(stacks));
            if removed > 0 {
                self.fire(
                    state,
                    ctx,
                    Event::new(EventKind::StatusRemoved)
                        .with_target(target)
                        .with_value(removed)
                        .with_status(status.clone()),
                );
            }
        }
        Ok(())
    }
}

fn first_entity(targets: &[Target]) -> Option<EntityId> {
    targets.iter().find_map(|t| t.entity())
}

/// Entity targets that are alive right now.
fn living(state: &GameState, targets: &[Target]) -> Vec<EntityId> {
    targets
        .iter()
        .filter_map(|t| t.entity())
        .filter(|id| state.entity(*id).is_some_and(|e| e.is_alive()))
        .collect()
}
