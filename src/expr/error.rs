//! Expression errors.

use thiserror::Error;

use super::ast::{Arity, Function};

/// Rejected at construction: the source is not in the grammar.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,

    #[error("expression is {len} bytes long, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("expression nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("unexpected character {ch:?} at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number {text:?} at {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("attribute access is not allowed (at {pos})")]
    AttributeAccess { pos: usize },

    #[error("assignment is not allowed (at {pos})")]
    Assignment { pos: usize },

    #[error("indexing is not allowed (at {pos})")]
    Indexing { pos: usize },

    #[error("`{word}` is not allowed in expressions (at {pos})")]
    ForbiddenKeyword { word: String, pos: usize },

    #[error("unknown function `{name}` at {pos}")]
    UnknownFunction { name: String, pos: usize },

    #[error("only named functions can be called (at {pos})")]
    NotCallable { pos: usize },

    #[error("`{}` takes {expected} argument(s), got {found}", .func.name())]
    WrongArity {
        func: Function,
        expected: Arity,
        found: usize,
    },

    #[error("unexpected {found} at {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

/// Raised while evaluating an already-validated expression.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}
