//! Benchmarks for effect resolution.
//!
//! Run with: `cargo bench --bench resolve`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ccg_effects::core::{CardId, EngineConfig, Entity, EntityId, GameState, Side, StatusRegistry};
use ccg_effects::effects::{EffectNode, Target};
use ccg_effects::expr::{Expression, VarTable};
use ccg_effects::triggers::{EntityFilter, EventKind, Trigger, TriggerOwner};
use ccg_effects::zones::Zone;
use ccg_effects::Engine;

const HERO: EntityId = EntityId(0);
const FOE: EntityId = EntityId(1);

fn state() -> GameState {
    let mut state = GameState::new(42)
        .with_entity(Entity::new(HERO, Side::Player, 10_000).with_status("strength", 2))
        .with_entity(Entity::new(FOE, Side::Enemy, 10_000).with_status("vulnerable", 1));
    state.zones.set_pile(HERO, Zone::Deck, (0..40).map(CardId));
    state
}

fn thorns(bound: EntityId) -> Trigger {
    Trigger::new(TriggerOwner::Entity(bound), bound, EventKind::DamageTaken, EffectNode::damage(1))
        .with_target_filter(EntityFilter::Bound)
}

/// Single cards of increasing size.
fn benchmark_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("Submit");

    let strike = EffectNode::damage(6);
    let flurry = EffectNode::repeat(5, [EffectNode::damage(2).with_then(EffectNode::block(1))]);
    let scaling = EffectNode::damage(0)
        .with_value(Expression::parse("(max_hp - hp) / 10 + strength * 2").unwrap());

    for (name, node) in [("strike", strike), ("flurry", flurry), ("scaling", scaling)] {
        group.bench_function(name, |b| {
            let mut engine = Engine::default();
            b.iter(|| {
                let mut state = state();
                black_box(engine.submit(node.clone(), HERO, [Target::Entity(FOE)], &mut state))
            });
        });
    }
    group.finish();
}

/// Mutual thorns bouncing until the chain ceiling.
fn benchmark_reaction_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reaction Chain");

    for depth in [10u32, 50, 200] {
        group.bench_with_input(BenchmarkId::new("thorns/depth", depth), &depth, |b, &depth| {
            let config = EngineConfig::default().with_max_chain_depth(depth);
            let mut engine = Engine::new(config, StatusRegistry::with_defaults());
            engine.register_trigger(thorns(HERO));
            engine.register_trigger(thorns(FOE));
            b.iter(|| {
                let mut state = state();
                let targets = [Target::Entity(FOE)];
                black_box(engine.submit(EffectNode::damage(1), HERO, targets, &mut state))
            });
        });
    }
    group.finish();
}

fn benchmark_expressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("Expressions");
    let source = "hp < max_hp / 2 ? clamp(strength * 3, 0, 20) : min(hp, 10) + 1";
    let vars = VarTable::new().with("hp", 30.0).with("max_hp", 80.0).with("strength", 4.0);

    group.bench_function("parse", |b| b.iter(|| black_box(Expression::parse(black_box(source)))));

    let expr = Expression::parse(source).unwrap();
    group.bench_function("evaluate", |b| b.iter(|| black_box(expr.evaluate(black_box(&vars)))));
    group.finish();
}

criterion_group!(benches, benchmark_submit, benchmark_reaction_chain, benchmark_expressions);
criterion_main!(benches);
