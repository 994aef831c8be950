//! Effect system integration tests.
//!
//! These tests drive effects through the engine the way a game would:
//! JSON in, state changes and events out.

use ccg_effects::core::{CardId, EngineConfig, Entity, EntityId, GameState, Side, StatusRegistry};
use ccg_effects::effects::{
    validate, EffectError, EffectKind, EffectNode, Target, TargetSelector, ValidationIssue,
};
use ccg_effects::expr::Expression;
use ccg_effects::triggers::EventKind;
use ccg_effects::zones::Zone;
use ccg_effects::Engine;
use proptest::prelude::*;

const HERO: EntityId = EntityId(0);
const SLIME: EntityId = EntityId(1);
const CULTIST: EntityId = EntityId(2);

fn fight(seed: u64) -> GameState {
    let mut state = GameState::new(seed)
        .with_entity(Entity::new(HERO, Side::Player, 80).with_resource(3))
        .with_entity(Entity::new(SLIME, Side::Enemy, 40))
        .with_entity(Entity::new(CULTIST, Side::Enemy, 50));
    state.zones.set_pile(HERO, Zone::Deck, (1..=5).map(CardId));
    state.zones.set_pile(HERO, Zone::Discard, (6..=10).map(CardId));
    state
}

fn play(engine: &mut Engine, state: &mut GameState, json: &str, targets: &[Target]) {
    let node = engine.parse_effect(json).unwrap();
    let report = engine.submit(node, HERO, targets.iter().copied(), state);
    assert!(report.is_clean(), "{:?}", report.diagnostics);
}

fn events_of(state: &GameState, kind: EventKind) -> Vec<(Option<EntityId>, i64)> {
    state
        .events()
        .filter(|e| e.kind == kind)
        .map(|e| (e.target, e.value))
        .collect()
}

// =============================================================================
// Modifier Tests
// =============================================================================

/// Strength 3, damage 6, vulnerable target: (6 + 3) * 1.5 = 13.
#[test]
fn test_strength_and_vulnerable() {
    let mut engine = Engine::default();
    let mut state = fight(1);
    state.entity_mut(HERO).unwrap().apply_status("strength".into(), 3, None);
    state.entity_mut(SLIME).unwrap().apply_status("vulnerable".into(), 1, Some(2));

    play(&mut engine, &mut state, r#"{"type": "damage", "value": 6}"#, &[Target::Entity(SLIME)]);

    assert_eq!(state.entity(SLIME).unwrap().hp, 27);
    assert_eq!(events_of(&state, EventKind::DamageTaken), vec![(Some(SLIME), 13)]);
}

/// Target with 5 block takes 8: block goes to 0, HP drops by 3.
#[test]
fn test_block_absorbs_before_hp() {
    let mut engine = Engine::default();
    let mut state = fight(1);
    state.entity_mut(SLIME).unwrap().block = 5;

    play(&mut engine, &mut state, r#"{"type": "damage", "value": 8}"#, &[Target::Entity(SLIME)]);

    let slime = state.entity(SLIME).unwrap();
    assert_eq!((slime.block, slime.hp), (0, 37));
    assert_eq!(events_of(&state, EventKind::BlockLost), vec![(Some(SLIME), 5)]);
    assert_eq!(events_of(&state, EventKind::DamageTaken), vec![(Some(SLIME), 3)]);
}

#[test]
fn test_weak_and_dexterity() {
    let mut engine = Engine::default();
    let mut state = fight(1);
    state.entity_mut(HERO).unwrap().apply_status("weak".into(), 1, None);
    state.entity_mut(HERO).unwrap().apply_status("dexterity".into(), 2, None);

    play(
        &mut engine,
        &mut state,
        r#"{"type": "damage", "value": 10, "then": {"type": "block", "value": 5}}"#,
        &[Target::Entity(SLIME)],
    );

    assert_eq!(state.entity(SLIME).unwrap().hp, 40 - 7);
    assert_eq!(state.entity(HERO).unwrap().block, 7);
}

#[test]
fn test_expression_values() {
    let mut engine = Engine::default();
    let mut state = fight(1);
    state.entity_mut(HERO).unwrap().hp = 30;

    play(
        &mut engine,
        &mut state,
        r#"{"type": "damage", "value": "(max_hp - hp) / 10"}"#,
        &[Target::Entity(SLIME)],
    );
    assert_eq!(state.entity(SLIME).unwrap().hp, 35);
}

// =============================================================================
// Targeting Tests
// =============================================================================

#[test]
fn test_all_enemies() {
    let mut engine = Engine::default();
    let mut state = fight(1);

    play(
        &mut engine,
        &mut state,
        r#"{"type": "damage", "target": "all_enemies", "value": 4}"#,
        &[],
    );
    assert_eq!(state.entity(SLIME).unwrap().hp, 36);
    assert_eq!(state.entity(CULTIST).unwrap().hp, 46);
}

#[test]
fn test_enemy_without_choice_uses_first_living() {
    let mut engine = Engine::default();
    let mut state = fight(1);
    state.entity_mut(SLIME).unwrap().hp = 0;

    play(&mut engine, &mut state, r#"{"type": "damage", "value": 4}"#, &[]);
    assert_eq!(state.entity(CULTIST).unwrap().hp, 46);
}

#[test]
fn test_then_chain_shares_targets() {
    let mut engine = Engine::default();
    let mut state = fight(1);

    play(
        &mut engine,
        &mut state,
        r#"{"type": "damage", "value": 2,
            "then": {"type": "apply_status", "target": "enemy", "value": 1, "status": "weak"}}"#,
        &[Target::Entity(CULTIST)],
    );
    assert_eq!(state.entity(CULTIST).unwrap().hp, 48);
    assert!(state.entity(CULTIST).unwrap().has_status(&"weak".into()));
    assert!(!state.entity(SLIME).unwrap().has_status(&"weak".into()));
}

// =============================================================================
// Card Tests
// =============================================================================

#[test]
fn test_draw_then_reshuffle() {
    let mut engine = Engine::default();
    let mut state = fight(1);

    play(&mut engine, &mut state, r#"{"type": "draw", "value": 7}"#, &[]);

    assert_eq!(state.zones.len(HERO, Zone::Hand), 7);
    assert_eq!(state.zones.len(HERO, Zone::Discard), 0);
    assert_eq!(state.zones.len(HERO, Zone::Deck), 3);
    assert_eq!(events_of(&state, EventKind::DeckReshuffled), vec![(Some(HERO), 5)]);
    assert_eq!(events_of(&state, EventKind::CardDrawn).len(), 7);
}

#[test]
fn test_draw_from_nothing_is_not_an_error() {
    let mut engine = Engine::default();
    let mut state = GameState::new(1).with_entity(Entity::new(HERO, Side::Player, 80));

    let report = engine.submit(EffectNode::draw(3), HERO, Vec::<Target>::new(), &mut state);
    assert!(report.is_clean());
    assert_eq!(report.resolved.len(), 1);
    assert_eq!(state.zones.len(HERO, Zone::Hand), 0);
}

#[test]
fn test_discard_chosen_card() {
    let mut engine = Engine::default();
    let mut state = fight(1);
    state.zones.set_pile(HERO, Zone::Hand, [CardId(20), CardId(21)]);

    play(
        &mut engine,
        &mut state,
        r#"{"type": "discard", "target": "card", "value": 1}"#,
        &[Target::Card(CardId(21))],
    );
    assert_eq!(state.zones.cards(HERO, Zone::Hand), vec![CardId(20)]);
    assert!(state.zones.cards(HERO, Zone::Discard).contains(&CardId(21)));
}

// =============================================================================
// Compound Tests
// =============================================================================

#[test]
fn test_repeat_composite_conditional() {
    let mut engine = Engine::default();
    let mut state = fight(1);

    play(
        &mut engine,
        &mut state,
        r#"{"type": "composite", "effects": [
            {"type": "repeat", "value": 3,
             "effects": [{"type": "damage", "target": "enemy", "value": 2}]},
            {"type": "conditional", "if": "resource >= 3",
             "effects": [{"type": "gain_resource", "value": -3}]},
            {"type": "conditional", "if": "resource >= 3",
             "effects": [{"type": "heal", "value": 5}]}
        ]}"#,
        &[Target::Entity(SLIME)],
    );

    assert_eq!(state.entity(SLIME).unwrap().hp, 34);
    assert_eq!(state.entity(HERO).unwrap().resource, 0);
    assert!(events_of(&state, EventKind::Healed).is_empty());
}

// =============================================================================
// Determinism Tests
// =============================================================================

fn scripted_run(seed: u64) -> Vec<u8> {
    let mut engine = Engine::default();
    let mut state = fight(seed);
    for json in [
        r#"{"type": "damage", "target": "random_enemy", "value": 7,
            "then": {"type": "damage", "target": "random_enemy", "value": 1}}"#,
        r#"{"type": "draw", "value": 8}"#,
        r#"{"type": "apply_status", "target": "random_enemy", "value": 2, "status": "vulnerable",
            "duration": 2}"#,
        r#"{"type": "damage", "target": "random_enemy", "value": 5}"#,
    ] {
        play(&mut engine, &mut state, json, &[]);
    }
    engine.end_turn(HERO, &mut state);
    state.snapshot_bytes().unwrap()
}

#[test]
fn test_same_seed_same_bytes() {
    assert_eq!(scripted_run(2024), scripted_run(2024));
    assert_eq!(scripted_run(7), scripted_run(7));
}

#[test]
fn test_snapshot_round_trip() {
    let mut engine = Engine::default();
    let mut state = fight(5);
    play(&mut engine, &mut state, r#"{"type": "draw", "value": 2}"#, &[]);

    let restored = GameState::from_snapshot(state.snapshot());
    assert_eq!(restored.snapshot_bytes().unwrap(), state.snapshot_bytes().unwrap());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_wire_rejections() {
    let engine = Engine::default();
    let cases = [
        r#"{"type": "damage", "value": 1000}"#,
        r#"{"type": "damage"}"#,
        r#"{"type": "apply_status", "value": 0, "status": "weak"}"#,
        r#"{"type": "apply_status", "value": 1}"#,
        r#"{"type": "heal", "value": 1, "status": "weak"}"#,
        r#"{"type": "block", "value": 1, "multiplier": 11.0}"#,
        r#"{"type": "conditional", "effects": []}"#,
        r#"{"type": "repeat", "value": 11, "effects": []}"#,
        r#"{"type": "draw", "value": "hand_size.real"}"#,
    ];
    for json in cases {
        assert!(
            matches!(engine.parse_effect(json), Err(EffectError::Invalid(_))),
            "{json} should be rejected"
        );
    }
}

#[test]
fn test_validation_reports_paths() {
    let engine = Engine::default();
    let node = EffectNode::composite([
        EffectNode::damage(1),
        EffectNode::apply_status("petrified", 1).with_target(TargetSelector::Enemy),
    ]);
    let errors = engine.validate(&node);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "effect.effects[1]");
    assert_eq!(errors[0].issue, ValidationIssue::UnknownStatus("petrified".into()));
}

#[test]
fn test_nesting_limit() {
    let config = EngineConfig::default().with_max_nesting_depth(3);
    let node = EffectNode::damage(1)
        .with_then(EffectNode::damage(1))
        .with_then(EffectNode::damage(1))
        .with_then(EffectNode::damage(1));
    let errors = validate(&node, &StatusRegistry::with_defaults(), &config);
    assert!(errors
        .iter()
        .any(|e| matches!(e.issue, ValidationIssue::TooDeep { max: 3 })));
}

fn arb_node() -> impl Strategy<Value = EffectNode> {
    let leaf = (
        prop::sample::select(EffectKind::ALL.to_vec()),
        -1100i64..1100,
        prop::option::of(prop::sample::select(vec!["weak", "strength", "petrified"])),
        prop::option::of(0u32..150),
        prop::option::of(-2000i64..2000),
        prop::option::of(prop::sample::select(vec!["hp > 3", "target_weak", "mystery * 2"])),
    )
        .prop_map(|(kind, value, status, duration, bonus, condition)| {
            let mut node = EffectNode::new(kind).with_value(value);
            node.status = status.map(Into::into);
            node.duration = duration;
            node.bonus = bonus;
            node.condition = condition.and_then(|c| Expression::parse(c).ok());
            node
        });
    leaf.prop_recursive(3, 12, 3, |inner| {
        (inner.clone(), prop::collection::vec(inner, 0..3)).prop_map(|(head, children)| {
            let mut head = head;
            head.effects = children;
            head
        })
    })
}

proptest! {
    /// Validation reads only the node: same input, same answer, no mutation.
    #[test]
    fn validation_is_idempotent(node in arb_node()) {
        let statuses = StatusRegistry::with_defaults();
        let config = EngineConfig::default();
        let before = node.clone();
        let first = validate(&node, &statuses, &config);
        let second = validate(&node, &statuses, &config);
        prop_assert_eq!(first, second);
        prop_assert_eq!(node, before);
    }
}
