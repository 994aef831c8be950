//! Expression evaluation.
//!
//! Evaluation is a pure function of the tree and a `VarTable`. It reads
//! nothing else and writes nothing. The grammar has no loops, so every
//! evaluation finishes in time linear in the tree size.

use rustc_hash::FxHashMap;

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::error::EvalError;

/// Named numbers an expression may read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VarTable {
    vars: FxHashMap<String, f64>,
}

impl VarTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    /// Set a variable (builder pattern).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for VarTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Intermediate value during evaluation.
#[derive(Clone, Debug, PartialEq)]
enum Value {
    Number(f64),
    Bool(bool),
    List(Vec<f64>),
}

impl Value {
    fn number(&self) -> Result<f64, EvalError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::List(_) => Err(EvalError::UnsupportedConstruct("list in scalar position")),
        }
    }

    fn truthy(&self) -> Result<bool, EvalError> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Number(n) => Ok(*n != 0.0),
            Self::List(_) => Err(EvalError::UnsupportedConstruct("list used as a condition")),
        }
    }
}

/// Every number produced during evaluation passes through here, so NaN and
/// infinities stop at the step that made them.
fn finite(n: f64) -> Result<f64, EvalError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(EvalError::NonFinite)
    }
}

/// Evaluate to a number. Booleans become 1 or 0.
pub fn evaluate(expr: &Expr, vars: &VarTable) -> Result<f64, EvalError> {
    finite(eval(expr, vars)?.number()?)
}

/// Evaluate as a condition. Non-zero numbers are true.
pub fn evaluate_bool(expr: &Expr, vars: &VarTable) -> Result<bool, EvalError> {
    eval(expr, vars)?.truthy()
}

fn eval(expr: &Expr, vars: &VarTable) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => finite(*n).map(Value::Number),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Var(name) => {
            let value = vars
                .get(name)
                .ok_or_else(|| EvalError::UnknownVariable(name.clone()))?;
            finite(value).map(Value::Number)
        }
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, vars)?.number())
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Unary { op, operand } => {
            let value = eval(operand, vars)?;
            match op {
                UnaryOp::Neg => Ok(Value::Number(-value.number()?)),
                UnaryOp::Not => Ok(Value::Bool(!value.truthy()?)),
            }
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, vars),
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, vars)?.truthy()? {
                eval(then, vars)
            } else {
                eval(otherwise, vars)
            }
        }
        Expr::Call { func, args } => eval_call(*func, args, vars),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    vars: &VarTable,
) -> Result<Value, EvalError> {
    // Short-circuit connectives first.
    match op {
        BinaryOp::And => {
            return Ok(Value::Bool(
                eval(lhs, vars)?.truthy()? && eval(rhs, vars)?.truthy()?,
            ));
        }
        BinaryOp::Or => {
            return Ok(Value::Bool(
                eval(lhs, vars)?.truthy()? || eval(rhs, vars)?.truthy()?,
            ));
        }
        BinaryOp::In => {
            let needle = eval(lhs, vars)?.number()?;
            return match eval(rhs, vars)? {
                Value::List(items) => Ok(Value::Bool(items.contains(&needle))),
                _ => Err(EvalError::UnsupportedConstruct("`in` needs a list on the right")),
            };
        }
        _ => {}
    }

    let a = eval(lhs, vars)?.number()?;
    let b = eval(rhs, vars)?.number()?;
    Ok(match op {
        BinaryOp::Add => Value::Number(finite(a + b)?),
        BinaryOp::Sub => Value::Number(finite(a - b)?),
        BinaryOp::Mul => Value::Number(finite(a * b)?),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Number(finite(a / b)?)
        }
        BinaryOp::Rem => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Number(finite(a % b)?)
        }
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::And | BinaryOp::Or | BinaryOp::In => {
            return Err(EvalError::UnsupportedConstruct("connective reached arithmetic"));
        }
    })
}

fn eval_call(func: Function, args: &[Expr], vars: &VarTable) -> Result<Value, EvalError> {
    if !func.arity().accepts(args.len()) {
        return Err(EvalError::UnsupportedConstruct("call with wrong arity"));
    }

    // Aggregates flatten list arguments.
    let flatten = |args: &[Expr]| -> Result<Vec<f64>, EvalError> {
        let mut out = Vec::new();
        for arg in args {
            match eval(arg, vars)? {
                Value::List(items) => out.extend(items),
                other => out.push(other.number()?),
            }
        }
        Ok(out)
    };
    let scalar = |idx: usize| -> Result<f64, EvalError> { eval(&args[idx], vars)?.number() };

    let result = match func {
        Function::Min => {
            let items = flatten(args)?;
            if items.is_empty() {
                return Err(EvalError::UnsupportedConstruct("min of an empty list"));
            }
            items.into_iter().fold(f64::INFINITY, f64::min)
        }
        Function::Max => {
            let items = flatten(args)?;
            if items.is_empty() {
                return Err(EvalError::UnsupportedConstruct("max of an empty list"));
            }
            items.into_iter().fold(f64::NEG_INFINITY, f64::max)
        }
        Function::Sum => flatten(args)?.into_iter().sum(),
        Function::Len => match eval(&args[0], vars)? {
            Value::List(items) => items.len() as f64,
            _ => return Err(EvalError::UnsupportedConstruct("len of a scalar")),
        },
        Function::Abs => scalar(0)?.abs(),
        Function::Floor => scalar(0)?.floor(),
        Function::Ceil => scalar(0)?.ceil(),
        Function::Round => scalar(0)?.round(),
        Function::Clamp => {
            let (x, lo, hi) = (scalar(0)?, scalar(1)?, scalar(2)?);
            if lo > hi {
                hi
            } else {
                x.clamp(lo, hi)
            }
        }
    };
    finite(result).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExpressionLimits;
    use crate::expr::parser::parse;

    fn run(source: &str, vars: &VarTable) -> Result<f64, EvalError> {
        let expr = parse(source, &ExpressionLimits::default()).unwrap();
        evaluate(&expr, vars)
    }

    #[test]
    fn test_arithmetic_with_vars() {
        let vars = VarTable::new().with("strength", 3.0);
        assert_eq!(run("14 + strength*2", &vars), Ok(20.0));
        assert_eq!(run("-strength + 1", &vars), Ok(-2.0));
        assert_eq!(run("7 % 4", &vars), Ok(3.0));
    }

    #[test]
    fn test_unknown_variable() {
        assert_eq!(
            run("hp + 1", &VarTable::new()),
            Err(EvalError::UnknownVariable("hp".into()))
        );
    }

    #[test]
    fn test_short_circuit_skips_unknown() {
        // The right side is never looked at.
        assert_eq!(run("false and missing > 0", &VarTable::new()), Ok(0.0));
        assert_eq!(run("true or missing > 0", &VarTable::new()), Ok(1.0));
    }

    #[test]
    fn test_comparisons_and_ternary() {
        let vars = VarTable::new().with("hp", 10.0).with("max_hp", 40.0);
        assert_eq!(run("hp * 2 < max_hp ? 8 : 4", &vars), Ok(8.0));
        assert_eq!(run("hp >= 10 && !(hp == 11)", &vars), Ok(1.0));
        assert_eq!(run("hp in [5, 10, 15]", &vars), Ok(1.0));
        assert_eq!(run("hp in [1]", &vars), Ok(0.0));
    }

    #[test]
    fn test_functions() {
        let vars = VarTable::new().with("x", -4.5);
        assert_eq!(run("abs(x)", &vars), Ok(4.5));
        assert_eq!(run("floor(x)", &vars), Ok(-5.0));
        assert_eq!(run("ceil(x)", &vars), Ok(-4.0));
        assert_eq!(run("round(2.5)", &vars), Ok(3.0));
        assert_eq!(run("clamp(x, 0, 10)", &vars), Ok(0.0));
        assert_eq!(run("min(3, [1, 2], 5)", &vars), Ok(1.0));
        assert_eq!(run("max([1, 9], 2)", &vars), Ok(9.0));
        assert_eq!(run("sum([1, 2, 3])", &vars), Ok(6.0));
        assert_eq!(run("len([1, 2, 3])", &vars), Ok(3.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(run("1 / 0", &VarTable::new()), Err(EvalError::DivisionByZero));
        assert_eq!(run("1 % 0", &VarTable::new()), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_list_in_scalar_position() {
        assert!(matches!(
            run("[1, 2] + 1", &VarTable::new()),
            Err(EvalError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            run("len(3)", &VarTable::new()),
            Err(EvalError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            run("min([])", &VarTable::new()),
            Err(EvalError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_nan_arguments_are_rejected() {
        let vars = VarTable::new().with("x", f64::NAN).with("y", 2.0);
        for source in ["clamp(1, x, 2)", "clamp(x, 0, 1)", "clamp(1, 0, x)"] {
            assert_eq!(run(source, &vars), Err(EvalError::NonFinite), "{source}");
        }
        for source in ["min(x, y)", "max([y, x])", "round(x)", "sum([x])", "x > 0 ? 1 : 2"] {
            assert_eq!(run(source, &vars), Err(EvalError::NonFinite), "{source}");
        }
    }

    #[test]
    fn test_infinities_are_rejected() {
        let vars = VarTable::new()
            .with("big", f64::MAX)
            .with("inf", f64::INFINITY);
        assert_eq!(run("big * 2", &vars), Err(EvalError::NonFinite));
        assert_eq!(run("big + big - big", &vars), Err(EvalError::NonFinite));
        assert_eq!(run("inf - inf", &vars), Err(EvalError::NonFinite));
        assert_eq!(run("0 * inf", &vars), Err(EvalError::NonFinite));
        assert_eq!(run("sum([big, big])", &vars), Err(EvalError::NonFinite));
        assert_eq!(run("1 / big", &vars), Ok(1.0 / f64::MAX));
    }

    #[test]
    fn test_hand_built_nan_literal_is_rejected() {
        let expr = Expr::Call {
            func: Function::Clamp,
            args: vec![Expr::Number(1.0), Expr::Number(f64::NAN), Expr::Number(2.0)],
        };
        assert_eq!(evaluate(&expr, &VarTable::new()), Err(EvalError::NonFinite));
    }

    #[test]
    fn test_hand_built_bad_arity_is_caught() {
        let expr = Expr::Call {
            func: Function::Abs,
            args: vec![],
        };
        assert!(matches!(
            evaluate(&expr, &VarTable::new()),
            Err(EvalError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_var_table_from_iter() {
        let vars: VarTable = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("b"), Some(2.0));
    }
}
