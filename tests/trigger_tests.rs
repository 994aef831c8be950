//! Trigger system integration tests.
//!
//! These tests verify that triggers react to events raised during
//! resolution, in priority order, within their limits, and that reaction
//! chains always terminate.

use ccg_effects::core::{CardId, EngineConfig, Entity, EntityId, GameState, Side, StatusRegistry};
use ccg_effects::effects::{EffectNode, Target, TargetSelector};
use ccg_effects::expr::Expression;
use ccg_effects::stack::Diagnostic;
use ccg_effects::triggers::{EntityFilter, Event, EventKind, Trigger, TriggerOwner};
use ccg_effects::Engine;

const HERO: EntityId = EntityId(0);
const FOE: EntityId = EntityId(1);
const NO_TARGETS: [Target; 0] = [];

fn state() -> GameState {
    GameState::new(11)
        .with_entity(Entity::new(HERO, Side::Player, 100))
        .with_entity(Entity::new(FOE, Side::Enemy, 100))
}

/// "Whenever `bound` takes damage, deal `amount` back."
fn thorns(bound: EntityId, amount: i64) -> Trigger {
    Trigger::new(
        TriggerOwner::Status {
            entity: bound,
            status: "thorns".into(),
        },
        bound,
        EventKind::DamageTaken,
        EffectNode::damage(amount),
    )
    .with_target_filter(EntityFilter::Bound)
}

fn hits(state: &GameState) -> Vec<(Option<EntityId>, i64, u32)> {
    state
        .events()
        .filter(|e| e.kind == EventKind::DamageTaken)
        .map(|e| (e.target, e.value, e.chain_depth))
        .collect()
}

// =============================================================================
// Reaction Tests
// =============================================================================

/// A reaction aims at the entity that caused the event.
#[test]
fn test_thorns_hits_attacker() {
    let mut engine = Engine::default();
    let mut state = state();
    engine.register_trigger(thorns(FOE, 3));

    let report = engine.submit(EffectNode::damage(6), HERO, [Target::Entity(FOE)], &mut state);

    assert_eq!(report.resolved.len(), 2);
    assert_eq!(hits(&state), vec![(Some(FOE), 6, 0), (Some(HERO), 3, 1)]);
}

/// Reactions to an item resolve before the item below it.
#[test]
fn test_reaction_resolves_before_item_below() {
    let mut engine = Engine::default();
    let mut state = state();
    engine.register_trigger(thorns(FOE, 1).with_combat_limit(1));

    engine.push(EffectNode::block(5), HERO, NO_TARGETS);
    engine.push(EffectNode::damage(4), HERO, [Target::Entity(FOE)]);
    engine.resolve(&mut state);

    let kinds: Vec<_> = state
        .events()
        .filter(|e| matches!(e.kind, EventKind::DamageTaken | EventKind::BlockGained))
        .map(|e| (e.kind, e.target))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (EventKind::DamageTaken, Some(FOE)),
            (EventKind::DamageTaken, Some(HERO)),
            (EventKind::BlockGained, Some(HERO)),
        ]
    );
}

/// Higher priority reacts first; equal priority keeps registration order.
#[test]
fn test_priority_order() {
    let mut engine = Engine::default();
    let mut state = state();
    let react = |amount: i64, priority: i32| {
        Trigger::new(
            TriggerOwner::Entity(HERO),
            HERO,
            EventKind::CombatStart,
            EffectNode::block(amount),
        )
        .with_priority(priority)
    };
    engine.register_trigger(react(1, 0));
    engine.register_trigger(react(2, 10));
    engine.register_trigger(react(3, 0));

    engine.start_combat(&mut state);

    let gains: Vec<_> = state
        .events()
        .filter(|e| e.kind == EventKind::BlockGained)
        .map(|e| e.value)
        .collect();
    assert_eq!(gains, vec![2, 1, 3]);
}

#[test]
fn test_cancelling_trigger_hides_event() {
    let mut engine = Engine::default();
    let mut state = state();
    engine.register_trigger(
        Trigger::new(TriggerOwner::Item(1), HERO, EventKind::TurnStart, EffectNode::draw(0))
            .with_priority(5)
            .cancelling(),
    );
    engine.register_trigger(Trigger::new(
        TriggerOwner::Item(2),
        HERO,
        EventKind::TurnStart,
        EffectNode::gain_resource(3),
    ));

    engine.start_turn(HERO, &mut state);

    assert_eq!(state.entity(HERO).unwrap().resource, 0);
    let start = state.events().find(|e| e.kind == EventKind::TurnStart).unwrap();
    assert!(start.cancelled);
}

#[test]
fn test_guard_sees_event_value() {
    let mut engine = Engine::default();
    let mut state = state();
    engine.register_trigger(
        Trigger::new(TriggerOwner::Entity(FOE), FOE, EventKind::DamageTaken, EffectNode::block(4))
            .with_target_filter(EntityFilter::Bound)
            .with_condition(Expression::parse("event_value >= 10").unwrap()),
    );

    engine.submit(EffectNode::damage(5), HERO, [Target::Entity(FOE)], &mut state);
    assert_eq!(state.entity(FOE).unwrap().block, 0);

    engine.submit(EffectNode::damage(12), HERO, [Target::Entity(FOE)], &mut state);
    assert_eq!(state.entity(FOE).unwrap().block, 4);
}

#[test]
fn test_failing_guard_is_reported() {
    let mut engine = Engine::default();
    let mut state = state();
    let id = engine.register_trigger(
        thorns(FOE, 3).with_condition(Expression::parse("rage > 2").unwrap()),
    );

    let report = engine.submit(EffectNode::damage(6), HERO, [Target::Entity(FOE)], &mut state);

    assert_eq!(report.resolved.len(), 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::Guard { trigger, .. } if *trigger == id)));
    assert_eq!(state.entity(HERO).unwrap().hp, 100);
}

// =============================================================================
// Limit Tests
// =============================================================================

#[test]
fn test_per_turn_limit_resets_on_turn_start() {
    let mut engine = Engine::default();
    let mut state = state();
    engine.register_trigger(thorns(FOE, 2).with_turn_limit(1));

    engine.start_turn(HERO, &mut state);
    for _ in 0..3 {
        engine.submit(EffectNode::damage(1), HERO, [Target::Entity(FOE)], &mut state);
    }
    assert_eq!(state.entity(HERO).unwrap().hp, 98);

    engine.start_turn(HERO, &mut state);
    engine.submit(EffectNode::damage(1), HERO, [Target::Entity(FOE)], &mut state);
    assert_eq!(state.entity(HERO).unwrap().hp, 96);
}

#[test]
fn test_unregister_owner() {
    let mut engine = Engine::default();
    let mut state = state();
    let card = TriggerOwner::Card(CardId(77));
    engine.register_trigger(
        Trigger::new(card.clone(), HERO, EventKind::CardDrawn, EffectNode::block(1)),
    );
    engine.register_trigger(
        Trigger::new(card.clone(), HERO, EventKind::TurnEnd, EffectNode::block(1)),
    );
    assert_eq!(engine.triggers().len(), 2);

    assert_eq!(engine.unregister_by_owner(&card), 2);
    engine.end_turn(HERO, &mut state);
    assert_eq!(state.entity(HERO).unwrap().block, 0);
}

#[test]
fn test_status_events_trigger() {
    let mut engine = Engine::default();
    let mut state = state();
    // "Whenever an enemy becomes vulnerable, gain 1 resource."
    engine.register_trigger(
        Trigger::new(
            TriggerOwner::Item(3),
            HERO,
            EventKind::StatusApplied,
            EffectNode::gain_resource(1),
        )
        .with_target_filter(EntityFilter::Side(Side::Enemy))
        .with_condition(Expression::parse("target_vulnerable > 0").unwrap()),
    );

    let node = EffectNode::apply_status("vulnerable", 2).with_target(TargetSelector::Enemy);
    engine.submit(node, HERO, [Target::Entity(FOE)], &mut state);
    let node = EffectNode::apply_status("strength", 1);
    engine.submit(node, HERO, NO_TARGETS, &mut state);

    assert_eq!(state.entity(HERO).unwrap().resource, 1);
}

// =============================================================================
// Termination Tests
// =============================================================================

/// Two thorns triggers bounce damage forever; the chain ceiling ends it.
#[test]
fn test_mutual_thorns_terminates() {
    let config = EngineConfig::default().with_max_chain_depth(5);
    let mut engine = Engine::new(config, StatusRegistry::with_defaults());
    let mut state = state();
    engine.register_trigger(thorns(HERO, 1));
    engine.register_trigger(thorns(FOE, 1));

    let report = engine.submit(EffectNode::damage(1), HERO, [Target::Entity(FOE)], &mut state);

    assert!(report.hit_chain_ceiling());
    assert!(engine.stack().is_empty());
    let depths: Vec<_> = hits(&state).iter().map(|h| h.2).collect();
    assert_eq!(depths, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(state.entity(FOE).unwrap().hp, 97);
    assert_eq!(state.entity(HERO).unwrap().hp, 97);
}

#[test]
fn test_ceiling_events_are_still_logged() {
    let config = EngineConfig::default().with_max_chain_depth(0);
    let mut engine = Engine::new(config, StatusRegistry::with_defaults());
    let mut state = state();
    engine.register_trigger(thorns(FOE, 1));

    let report = engine.fire_event(
        Event::new(EventKind::DamageTaken).with_source(HERO).with_target(FOE).with_value(3),
        &mut state,
    );

    assert_eq!(report.resolved.len(), 0);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::ChainDepthExceeded {
            kind: EventKind::DamageTaken,
            depth: 0
        }]
    );
    assert_eq!(state.event_count(), 1);
}
