//! JSON wire format for effects.
//!
//! ```json
//! {"type": "damage", "target": "enemy", "value": "6 + strength",
//!  "then": {"type": "draw", "value": 1}}
//! ```
//!
//! Fields: `type`, `target`, `value` (integer or expression string),
//! `status`, `duration`, `if`, `multiplier`, `bonus`, `then`, and `effects`
//! for the children of `conditional`, `repeat` and `composite`.
//!
//! `EffectSpec` is the raw shape. It is converted to an `EffectNode` with
//! [`EffectNode::from_spec`], which parses expressions and runs
//! [`validate`](super::validate).

use serde::{Deserialize, Serialize};

use crate::core::{EngineConfig, StatusId, StatusRegistry};
use crate::expr::Expression;

use super::effect::{EffectKind, EffectNode, EffectValue};
use super::targeting::TargetSelector;
use super::validate::{validate, EffectError, ValidationError, ValidationIssue, DURATION_BOUNDS};

/// A literal or an expression string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Int(i64),
    Expr(String),
}

/// Raw wire shape of an effect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectSpec {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SpecValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Box<EffectSpec>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
}

impl EffectNode {
    /// Build a node from its wire shape.
    ///
    /// Every problem is collected: unknown names and bad expressions first,
    /// then the full [`validate`] pass once the tree could be built.
    pub fn from_spec(
        spec: &EffectSpec,
        statuses: &StatusRegistry,
        config: &EngineConfig,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let node = build(spec, "effect", config, &mut errors);
        match node {
            Some(node) if errors.is_empty() => {
                let errors = validate(&node, statuses, config);
                if errors.is_empty() {
                    Ok(node)
                } else {
                    Err(errors)
                }
            }
            _ => Err(errors),
        }
    }

    /// Parse a node from JSON.
    pub fn from_json(
        json: &str,
        statuses: &StatusRegistry,
        config: &EngineConfig,
    ) -> Result<Self, EffectError> {
        let spec: EffectSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(&spec, statuses, config)?)
    }

    /// Convert back to the wire shape.
    ///
    /// `target` is omitted when it equals the kind's default.
    #[must_use]
    pub fn to_spec(&self) -> EffectSpec {
        EffectSpec {
            kind: self.kind.name().to_string(),
            target: (self.target != self.kind.default_target())
                .then(|| self.target.name().to_string()),
            value: self.value.as_ref().map(|v| match v {
                EffectValue::Literal(n) => SpecValue::Int(*n),
                EffectValue::Expr(expr) => SpecValue::Expr(expr.source().to_string()),
            }),
            status: self.status.as_ref().map(|s| s.as_str().to_string()),
            duration: self.duration.map(i64::from),
            condition: self.condition.as_ref().map(|c| c.source().to_string()),
            multiplier: self.multiplier,
            bonus: self.bonus,
            then: self.then.as_deref().map(|next| Box::new(next.to_spec())),
            effects: self.effects.iter().map(EffectNode::to_spec).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_spec())
    }
}

fn build(
    spec: &EffectSpec,
    path: &str,
    config: &EngineConfig,
    errors: &mut Vec<ValidationError>,
) -> Option<EffectNode> {
    let start = errors.len();
    let mut report = |issue| errors.push(ValidationError::new(path, issue));
    let limits = &config.expression_limits;

    let kind = EffectKind::from_name(&spec.kind);
    if kind.is_none() {
        report(ValidationIssue::UnknownKind(spec.kind.clone()));
    }

    let target = match spec.target.as_deref() {
        None => None,
        Some(name) => {
            let sel = TargetSelector::from_name(name);
            if sel.is_none() {
                report(ValidationIssue::UnknownTarget(name.to_string()));
            }
            sel
        }
    };

    let value = match &spec.value {
        None => None,
        Some(SpecValue::Int(n)) => Some(EffectValue::Literal(*n)),
        Some(SpecValue::Expr(source)) => match Expression::with_limits(source, limits) {
            Ok(expr) => Some(EffectValue::Expr(expr)),
            Err(error) => {
                report(ValidationIssue::Expression { field: "value", error });
                None
            }
        },
    };

    let condition = match spec.condition.as_deref() {
        None => None,
        Some(source) => match Expression::with_limits(source, limits) {
            Ok(expr) => Some(expr),
            Err(error) => {
                report(ValidationIssue::Expression { field: "if", error });
                None
            }
        },
    };

    let duration = match spec.duration {
        None => None,
        Some(d) => {
            let (min, max) = DURATION_BOUNDS;
            match u32::try_from(d) {
                Ok(turns) if d <= max => Some(turns),
                _ => {
                    report(ValidationIssue::OutOfBounds {
                        field: "duration",
                        value: d,
                        min,
                        max,
                    });
                    None
                }
            }
        }
    };

    let then = spec
        .then
        .as_deref()
        .and_then(|next| build(next, &format!("{path}.then"), config, errors));
    let effects: Vec<EffectNode> = spec
        .effects
        .iter()
        .enumerate()
        .filter_map(|(i, child)| build(child, &format!("{path}.effects[{i}]"), config, errors))
        .collect();

    if errors.len() > start {
        return None;
    }
    let kind = kind?;
    Some(EffectNode {
        kind,
        target: target.unwrap_or_else(|| kind.default_target()),
        value,
        status: spec.status.as_deref().map(StatusId::new),
        duration,
        condition,
        multiplier: spec.multiplier,
        bonus: spec.bonus,
        then: then.map(Box::new),
        effects,
    })
}
