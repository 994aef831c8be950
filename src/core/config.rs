//! Engine configuration.
//!
//! Games configure rule constants at startup by building an `EngineConfig`,
//! either with the `with_*` builders or from a JSON document. Unspecified
//! fields fall back to the standard deckbuilder values.

use serde::{Deserialize, Serialize};

/// Limits applied when parsing expression strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionLimits {
    /// Maximum source length in bytes.
    pub max_length: usize,
    /// Maximum syntax nesting depth.
    pub max_depth: usize,
}

impl Default for ExpressionLimits {
    fn default() -> Self {
        Self {
            max_length: 256,
            max_depth: 32,
        }
    }
}

/// Rule constants for the resolution engine.
///
/// ## Example
///
/// ```
/// use ccg_effects::core::EngineConfig;
///
/// let config = EngineConfig::default().with_max_chain_depth(20);
/// assert_eq!(config.max_chain_depth, 20);
/// assert_eq!(config.vulnerable_multiplier, 1.5);
///
/// let loaded = EngineConfig::from_json(r#"{"max_hand_size": 12}"#).unwrap();
/// assert_eq!(loaded.max_hand_size, 12);
/// assert_eq!(loaded.max_chain_depth, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trigger chain ceiling. Events at this depth don't fire triggers.
    pub max_chain_depth: u32,

    /// Maximum nesting of `then` chains and child effects in one node.
    pub max_nesting_depth: usize,

    /// Damage multiplier when the target is vulnerable.
    pub vulnerable_multiplier: f64,

    /// Damage multiplier when the source is weak.
    pub weak_multiplier: f64,

    /// Block multiplier when the recipient is frail.
    pub frail_multiplier: f64,

    /// Cards drawn past this hand size go to the discard pile.
    pub max_hand_size: usize,

    pub expression_limits: ExpressionLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 50,
            max_nesting_depth: 16,
            vulnerable_multiplier: 1.5,
            weak_multiplier: 0.75,
            frail_multiplier: 0.75,
            max_hand_size: 10,
            expression_limits: ExpressionLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from JSON. Missing fields use defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the trigger chain ceiling.
    #[must_use]
    pub fn with_max_chain_depth(mut self, depth: u32) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// Set the maximum effect nesting depth.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the maximum hand size.
    #[must_use]
    pub fn with_max_hand_size(mut self, size: usize) -> Self {
        self.max_hand_size = size;
        self
    }

    /// Set expression parsing limits.
    #[must_use]
    pub fn with_expression_limits(mut self, limits: ExpressionLimits) -> Self {
        self.expression_limits = limits;
        self
    }
}
