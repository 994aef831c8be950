//! Variable tables for expressions.
//!
//! Names visible to an expression:
//!
//! | name | value |
//! |------|-------|
//! | `hp`, `max_hp`, `block`, `resource` | source entity |
//! | `<status>` | source stacks of each known status, 0 when absent |
//! | `target_hp`, `target_max_hp`, `target_block`, `target_resource` | target entity |
//! | `target_<status>` | target stacks |
//! | `hand_size`, `deck_size`, `discard_size` | source's piles |
//! | `turn`, `cards_played` | turn counters |
//!
//! Trigger guards also see `event_value`.

use crate::core::{Entity, EntityId, GameState, StatusRegistry};
use crate::expr::VarTable;
use crate::zones::Zone;

/// Build the table for an effect from `source` aimed at `target`.
///
/// Missing entities read as zeros so a guard can still be evaluated after
/// its subject has left play.
#[must_use]
pub fn variable_table(
    state: &GameState,
    statuses: &StatusRegistry,
    source: EntityId,
    target: Option<EntityId>,
) -> VarTable {
    let mut vars = VarTable::new();
    let source_entity = state.entity(source);
    let target_entity = target.and_then(|id| state.entity(id));

    put_entity(&mut vars, "", source_entity);
    put_entity(&mut vars, "target_", target_entity);

    for status in statuses.ids() {
        let stacks = |e: Option<&Entity>| e.map_or(0, |e| e.status_stacks(status)) as f64;
        vars.set(status.as_str(), stacks(source_entity));
        vars.set(format!("target_{status}"), stacks(target_entity));
    }

    vars.set("hand_size", state.zones.len(source, Zone::Hand) as f64);
    vars.set("deck_size", state.zones.len(source, Zone::Deck) as f64);
    vars.set("discard_size", state.zones.len(source, Zone::Discard) as f64);
    vars.set("turn", f64::from(state.turn.number));
    vars.set("cards_played", f64::from(state.turn.cards_played));
    vars
}

fn put_entity(vars: &mut VarTable, prefix: &str, entity: Option<&Entity>) {
    let field = |f: fn(&Entity) -> i64| entity.map_or(0, f) as f64;
    vars.set(format!("{prefix}hp"), field(|e| e.hp));
    vars.set(format!("{prefix}max_hp"), field(|e| e.max_hp));
    vars.set(format!("{prefix}block"), field(|e| e.block));
    vars.set(format!("{prefix}resource"), field(|e| e.resource));
}
