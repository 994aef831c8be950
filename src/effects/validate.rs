//! Static validation of effect nodes.
//!
//! `validate` reads the node and the registries and nothing else. It never
//! touches game state, so it gives the same answer every time it is called
//! on the same node.

use thiserror::Error;

use crate::core::{EngineConfig, ExpressionLimits, StatusId, StatusRegistry};
use crate::expr::{tree_depth, ExprError, Expression};

use super::effect::{EffectKind, EffectNode, EffectValue};

/// Bounds on `duration`.
pub const DURATION_BOUNDS: (i64, i64) = (0, 99);
/// Bounds on `bonus`.
pub const BONUS_BOUNDS: (i64, i64) = (-999, 999);
/// Bounds on `multiplier`.
pub const MULTIPLIER_BOUNDS: (f64, f64) = (0.0, 10.0);

/// What is wrong with a node.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("unknown effect type `{0}`")]
    UnknownKind(String),

    #[error("unknown target `{0}`")]
    UnknownTarget(String),

    #[error("`{kind}` requires `{field}`")]
    MissingField {
        kind: EffectKind,
        field: &'static str,
    },

    #[error("`{kind}` does not take `{field}`")]
    UnexpectedField {
        kind: EffectKind,
        field: &'static str,
    },

    #[error("unknown status `{0}`")]
    UnknownStatus(StatusId),

    #[error("`{field}` is {value}, allowed range is {min}..={max}")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("`apply_status` with zero stacks does nothing")]
    ZeroStacks,

    #[error("multiplier {0} must be finite and within 0..=10")]
    InvalidMultiplier(f64),

    #[error("bad expression in `{field}`: {error}")]
    Expression {
        field: &'static str,
        error: ExprError,
    },

    #[error("effect nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// A problem at a location in the effect tree.
///
/// `path` reads like `effect.then.effects[1]`.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{path}: {issue}")]
pub struct ValidationError {
    pub path: String,
    pub issue: ValidationIssue,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, issue: ValidationIssue) -> Self {
        Self {
            path: path.into(),
            issue,
        }
    }
}

/// Errors from decoding an effect off the wire.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("malformed effect JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("effect rejected with {} problem(s): {}", .0.len(), summarize(.0))]
    Invalid(Vec<ValidationError>),
}

impl From<Vec<ValidationError>> for EffectError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Invalid(errors)
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `node` and everything under it.
///
/// Returns every problem found, in tree order. An empty list means the node
/// can be submitted.
#[must_use]
pub fn validate(
    node: &EffectNode,
    statuses: &StatusRegistry,
    config: &EngineConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_node(node, "effect", 1, statuses, config, &mut errors);
    errors
}

fn check_node(
    node: &EffectNode,
    path: &str,
    depth: usize,
    statuses: &StatusRegistry,
    config: &EngineConfig,
    errors: &mut Vec<ValidationError>,
) {
    let mut report = |issue| errors.push(ValidationError::new(path, issue));
    let kind = node.kind;

    if depth > config.max_nesting_depth {
        report(ValidationIssue::TooDeep {
            max: config.max_nesting_depth,
        });
        return;
    }

    match &node.value {
        None if kind.requires_value() => {
            report(ValidationIssue::MissingField { kind, field: "value" });
        }
        None => {}
        Some(_) if kind.value_bounds().is_none() => {
            report(ValidationIssue::UnexpectedField { kind, field: "value" });
        }
        Some(EffectValue::Literal(n)) => {
            if let Some((min, max)) = kind.value_bounds() {
                if !(min..=max).contains(n) {
                    report(ValidationIssue::OutOfBounds {
                        field: "value",
                        value: *n,
                        min,
                        max,
                    });
                }
            }
            if kind == EffectKind::ApplyStatus && *n == 0 {
                report(ValidationIssue::ZeroStacks);
            }
        }
        Some(EffectValue::Expr(expr)) => {
            if let Some(error) = check_expression(expr, &config.expression_limits) {
                report(ValidationIssue::Expression { field: "value", error });
            }
        }
    }

    match &node.status {
        None if kind.requires_status() => {
            report(ValidationIssue::MissingField { kind, field: "status" });
        }
        None => {}
        Some(_) if !kind.requires_status() => {
            report(ValidationIssue::UnexpectedField { kind, field: "status" });
        }
        Some(status) if !statuses.contains(status) => {
            report(ValidationIssue::UnknownStatus(status.clone()));
        }
        Some(_) => {}
    }

    if let Some(duration) = node.duration {
        check_bounds("duration", i64::from(duration), DURATION_BOUNDS, &mut report);
    }
    if let Some(bonus) = node.bonus {
        check_bounds("bonus", bonus, BONUS_BOUNDS, &mut report);
    }
    if let Some(m) = node.multiplier {
        let (lo, hi) = MULTIPLIER_BOUNDS;
        if !m.is_finite() || m < lo || m > hi {
            report(ValidationIssue::InvalidMultiplier(m));
        }
    }

    match &node.condition {
        None if kind == EffectKind::Conditional => {
            report(ValidationIssue::MissingField { kind, field: "if" });
        }
        None => {}
        Some(expr) => {
            if let Some(error) = check_expression(expr, &config.expression_limits) {
                report(ValidationIssue::Expression { field: "if", error });
            }
        }
    }

    if kind.is_compound() && node.effects.is_empty() {
        report(ValidationIssue::MissingField { kind, field: "effects" });
    } else if !kind.is_compound() && !node.effects.is_empty() {
        report(ValidationIssue::UnexpectedField { kind, field: "effects" });
    }

    for (i, child) in node.effects.iter().enumerate() {
        check_node(child, &format!("{path}.effects[{i}]"), depth + 1, statuses, config, errors);
    }
    if let Some(next) = node.then.as_deref() {
        check_node(next, &format!("{path}.then"), depth + 1, statuses, config, errors);
    }
}

fn check_bounds(
    field: &'static str,
    value: i64,
    (min, max): (i64, i64),
    report: &mut impl FnMut(ValidationIssue),
) {
    if !(min..=max).contains(&value) {
        report(ValidationIssue::OutOfBounds { field, value, min, max });
    }
}

/// Re-check an already parsed expression against `limits`.
fn check_expression(expr: &Expression, limits: &ExpressionLimits) -> Option<ExprError> {
    let len = expr.source().len();
    if len > limits.max_length {
        return Some(ExprError::TooLong {
            len,
            max: limits.max_length,
        });
    }
    if tree_depth(expr.root()) > limits.max_depth {
        return Some(ExprError::TooDeep {
            max: limits.max_depth,
        });
    }
    None
}
