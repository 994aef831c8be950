//! Sandboxed expression language for effect magnitudes and trigger guards.
//!
//! An [`Expression`] is parsed and validated once, at construction. Anything
//! outside the fixed grammar (unknown functions, attribute access,
//! assignment, loops, indexing) is rejected there, so evaluation can only
//! fail on a missing variable or an arithmetic fault.
//!
//! Evaluation reads only the [`VarTable`] passed in. There is no other
//! shared state, so one expression can be evaluated any number of times.
//!
//! ## Usage
//!
//! ```
//! use ccg_effects::expr::{Expression, VarTable};
//!
//! let expr = Expression::parse("14 + strength * 2").unwrap();
//! let vars = VarTable::new().with("strength", 3.0);
//! assert_eq!(expr.evaluate(&vars).unwrap(), 20.0);
//!
//! // Rejected before it can ever run.
//! assert!(Expression::parse("__import__('os')").is_err());
//! assert!(Expression::parse("state.hp").is_err());
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::ExpressionLimits;

pub use ast::{Arity, BinaryOp, Expr, Function, UnaryOp};
pub use error::{EvalError, ExprError};
pub use eval::VarTable;
pub use parser::{parse, tree_depth};

/// A validated expression together with its source text.
///
/// Cloning is cheap; the tree is shared.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression {
    source: Arc<str>,
    root: Arc<Expr>,
}

impl Expression {
    /// Parse with the default limits.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        Self::with_limits(source, &ExpressionLimits::default())
    }

    /// Parse with explicit length and depth limits.
    pub fn with_limits(source: &str, limits: &ExpressionLimits) -> Result<Self, ExprError> {
        let root = parse(source, limits)?;
        Ok(Self {
            source: Arc::from(source.trim()),
            root: Arc::new(root),
        })
    }

    /// Evaluate to a number.
    pub fn evaluate(&self, vars: &VarTable) -> Result<f64, EvalError> {
        eval::evaluate(&self.root, vars)
    }

    /// Evaluate as a condition.
    pub fn evaluate_bool(&self, vars: &VarTable) -> Result<bool, EvalError> {
        eval::evaluate_bool(&self.root, vars)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Variables the expression reads.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        self.root.variables()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Expression {
    type Error = ExprError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl TryFrom<&str> for Expression {
    type Error = ExprError;

    fn try_from(source: &str) -> Result<Self, Self::Error> {
        Self::parse(source)
    }
}

impl From<Expression> for String {
    fn from(expr: Expression) -> Self {
        expr.source.to_string()
    }
}
