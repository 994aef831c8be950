//! Effect definitions.
//!
//! An `EffectNode` is pure data: what should happen, to whom, and how much.
//! Nodes are immutable once built. A node owns its `then` successor and its
//! children outright, so every chain is a finite tree and can never point
//! back at an ancestor.

use std::fmt;

use crate::core::StatusId;
use crate::expr::Expression;

use super::targeting::TargetSelector;

/// The closed set of effect kinds.
///
/// Each kind has exactly one handler in the resolver, so adding a kind is a
/// compile-time change rather than a lookup that can miss at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Attack damage. Block absorbs it first.
    Damage,
    Heal,
    /// Gain block.
    Block,
    Draw,
    Discard,
    /// Change the resource pool (may be negative).
    GainResource,
    ApplyStatus,
    /// Remove stacks of a status. A value of 0 removes every stack.
    RemoveStatus,
    /// HP loss that ignores block and damage modifiers.
    LoseHp,
    /// Resolve children when the `if` guard holds.
    Conditional,
    /// Resolve children `value` times.
    Repeat,
    /// Resolve children in order.
    Composite,
}

impl EffectKind {
    pub const ALL: [EffectKind; 12] = [
        Self::Damage,
        Self::Heal,
        Self::Block,
        Self::Draw,
        Self::Discard,
        Self::GainResource,
        Self::ApplyStatus,
        Self::RemoveStatus,
        Self::LoseHp,
        Self::Conditional,
        Self::Repeat,
        Self::Composite,
    ];

    /// Wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Damage => "damage",
            Self::Heal => "heal",
            Self::Block => "block",
            Self::Draw => "draw",
            Self::Discard => "discard",
            Self::GainResource => "gain_resource",
            Self::ApplyStatus => "apply_status",
            Self::RemoveStatus => "remove_status",
            Self::LoseHp => "lose_hp",
            Self::Conditional => "conditional",
            Self::Repeat => "repeat",
            Self::Composite => "composite",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Kinds that carry child effects.
    #[must_use]
    pub const fn is_compound(self) -> bool {
        matches!(self, Self::Conditional | Self::Repeat | Self::Composite)
    }

    /// Whether a `value` must be given.
    #[must_use]
    pub const fn requires_value(self) -> bool {
        !matches!(self, Self::RemoveStatus | Self::Conditional | Self::Composite)
    }

    #[must_use]
    pub const fn requires_status(self) -> bool {
        matches!(self, Self::ApplyStatus | Self::RemoveStatus)
    }

    /// Inclusive bounds on the magnitude, for kinds that have one.
    #[must_use]
    pub const fn value_bounds(self) -> Option<(i64, i64)> {
        match self {
            Self::Damage | Self::Heal | Self::Block | Self::LoseHp => Some((0, 999)),
            Self::Draw | Self::Discard => Some((0, 20)),
            Self::GainResource | Self::ApplyStatus => Some((-99, 99)),
            Self::RemoveStatus => Some((0, 99)),
            Self::Repeat => Some((1, 10)),
            Self::Conditional | Self::Composite => None,
        }
    }

    /// Selector used when none is given.
    #[must_use]
    pub const fn default_target(self) -> TargetSelector {
        match self {
            Self::Damage | Self::LoseHp => TargetSelector::Enemy,
            _ => TargetSelector::SelfTarget,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A magnitude: a fixed integer or an expression evaluated at resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectValue {
    Literal(i64),
    Expr(Expression),
}

impl From<i64> for EffectValue {
    fn from(n: i64) -> Self {
        Self::Literal(n)
    }
}

impl From<Expression> for EffectValue {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

/// One declarative effect, plus an optional successor.
///
/// ## Usage
///
/// ```
/// use ccg_effects::effects::{EffectKind, EffectNode, TargetSelector};
/// use ccg_effects::expr::Expression;
///
/// // "Deal 6 damage. If the enemy is vulnerable, draw 1 card."
/// let node = EffectNode::damage(6).with_then(
///     EffectNode::draw(1).with_condition(Expression::parse("target_vulnerable > 0").unwrap()),
/// );
///
/// assert_eq!(node.kind, EffectKind::Damage);
/// assert_eq!(node.target, TargetSelector::Enemy);
/// assert_eq!(node.chain_len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EffectNode {
    pub kind: EffectKind,
    pub target: TargetSelector,
    pub value: Option<EffectValue>,
    pub status: Option<StatusId>,
    /// Status duration in turns. `None` lasts until removed.
    pub duration: Option<u32>,
    /// Guard. When false the node's own action is skipped.
    pub condition: Option<Expression>,
    pub multiplier: Option<f64>,
    pub bonus: Option<i64>,
    pub then: Option<Box<EffectNode>>,
    /// Children of compound kinds.
    pub effects: Vec<EffectNode>,
}

impl EffectNode {
    /// Create a bare node of `kind` with its default target.
    #[must_use]
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            target: kind.default_target(),
            value: None,
            status: None,
            duration: None,
            condition: None,
            multiplier: None,
            bonus: None,
            then: None,
            effects: Vec::new(),
        }
    }

    fn valued(kind: EffectKind, value: i64) -> Self {
        Self::new(kind).with_value(value)
    }

    pub fn damage(amount: i64) -> Self {
        Self::valued(EffectKind::Damage, amount)
    }

    pub fn heal(amount: i64) -> Self {
        Self::valued(EffectKind::Heal, amount)
    }

    pub fn block(amount: i64) -> Self {
        Self::valued(EffectKind::Block, amount)
    }

    pub fn draw(count: i64) -> Self {
        Self::valued(EffectKind::Draw, count)
    }

    pub fn discard(count: i64) -> Self {
        Self::valued(EffectKind::Discard, count)
    }

    pub fn gain_resource(amount: i64) -> Self {
        Self::valued(EffectKind::GainResource, amount)
    }

    pub fn lose_hp(amount: i64) -> Self {
        Self::valued(EffectKind::LoseHp, amount)
    }

    /// Apply `stacks` of a status to the target.
    pub fn apply_status(status: impl Into<StatusId>, stacks: i64) -> Self {
        Self::valued(EffectKind::ApplyStatus, stacks).with_status(status)
    }

    /// Remove a status entirely.
    pub fn remove_status(status: impl Into<StatusId>) -> Self {
        Self::new(EffectKind::RemoveStatus).with_status(status)
    }

    /// Resolve `children` when `condition` holds.
    pub fn conditional(
        condition: Expression,
        children: impl IntoIterator<Item = EffectNode>,
    ) -> Self {
        Self::new(EffectKind::Conditional)
            .with_condition(condition)
            .with_children(children)
    }

    /// Resolve `children` `times` times.
    pub fn repeat(times: i64, children: impl IntoIterator<Item = EffectNode>) -> Self {
        Self::valued(EffectKind::Repeat, times).with_children(children)
    }

    /// Resolve `children` in order.
    pub fn composite(children: impl IntoIterator<Item = EffectNode>) -> Self {
        Self::new(EffectKind::Composite).with_children(children)
    }

    // === Builders ===

    #[must_use]
    pub fn with_target(mut self, target: TargetSelector) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<EffectValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<StatusId>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, turns: u32) -> Self {
        self.duration = Some(turns);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    #[must_use]
    pub fn with_bonus(mut self, bonus: i64) -> Self {
        self.bonus = Some(bonus);
        self
    }

    /// Append `next` to the end of this node's chain.
    #[must_use]
    pub fn with_then(mut self, next: EffectNode) -> Self {
        self.append_then(next);
        self
    }

    fn append_then(&mut self, next: EffectNode) {
        match self.then.as_deref_mut() {
            Some(tail) => tail.append_then(next),
            None => self.then = Some(Box::new(next)),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = EffectNode>) -> Self {
        self.effects.extend(children);
        self
    }

    // === Queries ===

    /// Number of nodes in the `then` chain, counting this one.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        std::iter::successors(Some(self), |node| node.then.as_deref()).count()
    }

    /// Deepest nesting through `then` links and children, counting this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        let then = self.then.as_deref().map_or(0, EffectNode::depth);
        let children = self.effects.iter().map(EffectNode::depth).max().unwrap_or(0);
        1 + then.max(children)
    }
}
