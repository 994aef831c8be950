//! Recursive-descent parser.
//!
//! Precedence, lowest first:
//!
//! ```text
//! ternary     := or ('?' ternary ':' ternary)?
//! or          := and (('or' | '||') and)*
//! and         := not (('and' | '&&') not)*
//! not         := ('not' | '!') not | comparison
//! comparison  := additive (('==' | '!=' | '<' | '<=' | '>' | '>=' | 'in') additive)?
//! additive    := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/' | '%') unary)*
//! unary       := ('-' | '+') unary | primary
//! primary     := number | 'true' | 'false' | name | name '(' args ')'
//!              | '(' ternary ')' | '[' (ternary (',' ternary)*)? ']'
//! ```
//!
//! Comparisons don't chain: `a < b < c` is rejected.

use crate::core::ExpressionLimits;

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::error::ExprError;
use super::lexer::{tokenize, Spanned, Token};

/// Parse and validate `source` into a syntax tree.
pub fn parse(source: &str, limits: &ExpressionLimits) -> Result<Expr, ExprError> {
    if source.len() > limits.max_length {
        return Err(ExprError::TooLong {
            len: source.len(),
            max: limits.max_length,
        });
    }
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        max_depth: limits.max_depth,
    };
    let expr = parser.ternary()?;
    if let Some(extra) = parser.peek() {
        return Err(parser.unexpected(extra));
    }
    if tree_depth(&expr) > limits.max_depth {
        return Err(ExprError::TooDeep {
            max: limits.max_depth,
        });
    }
    Ok(expr)
}

/// Height of the syntax tree.
#[must_use]
pub fn tree_depth(expr: &Expr) -> usize {
    1 + match expr {
        Expr::Number(_) | Expr::Bool(_) | Expr::Var(_) => 0,
        Expr::List(items) | Expr::Call { args: items, .. } => {
            items.iter().map(tree_depth).max().unwrap_or(0)
        }
        Expr::Unary { operand, .. } => tree_depth(operand),
        Expr::Binary { lhs, rhs, .. } => tree_depth(lhs).max(tree_depth(rhs)),
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => tree_depth(cond)
            .max(tree_depth(then))
            .max(tree_depth(otherwise)),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn unexpected(&self, tok: &Spanned) -> ExprError {
        ExprError::UnexpectedToken {
            found: tok.token.to_string(),
            pos: tok.pos,
        }
    }

    fn expect(&mut self, want: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(tok) if &tok.token == want => Ok(()),
            Some(tok) => Err(self.unexpected(&tok)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExprError::TooDeep {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn ternary(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let cond = self.or()?;
        let expr = if self.peek_token() == Some(&Token::Question) {
            self.advance();
            let then = self.ternary()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.ternary()?;
            Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            cond
        };
        self.leave();
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.and()?;
        while self.peek_token() == Some(&Token::Or) {
            self.advance();
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.not()?;
        while self.peek_token() == Some(&Token::And) {
            self.advance();
            let rhs = self.not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, ExprError> {
        if self.peek_token() == Some(&Token::Not) {
            self.advance();
            self.enter()?;
            let operand = self.not()?;
            self.leave();
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.additive()?;
        let Some(op) = self.peek_token().and_then(comparison_op) else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.additive()?;
        if let Some(tok) = self.peek() {
            if comparison_op(&tok.token).is_some() {
                return Err(self.unexpected(tok));
            }
        }
        Ok(binary(op, lhs, rhs))
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek_token() {
            Some(Token::Minus) => {
                self.advance();
                self.enter()?;
                let operand = self.unary()?;
                self.leave();
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Plus) => {
                self.advance();
                self.enter()?;
                let operand = self.unary()?;
                self.leave();
                Ok(operand)
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let expr = self.primary()?;
        match self.peek() {
            Some(tok) if tok.token == Token::LParen => Err(ExprError::NotCallable { pos: tok.pos }),
            Some(tok) if tok.token == Token::LBracket => Err(ExprError::Indexing { pos: tok.pos }),
            _ => Ok(expr),
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let Some(tok) = self.advance() else {
            return Err(ExprError::UnexpectedEnd);
        };
        match tok.token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Ident(name) => {
                if self.peek_token() == Some(&Token::LParen) {
                    self.call(name, tok.pos)
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.ternary()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let items = self.list_items(&Token::RBracket)?;
                Ok(Expr::List(items))
            }
            _ => Err(self.unexpected(&tok)),
        }
    }

    fn call(&mut self, name: String, pos: usize) -> Result<Expr, ExprError> {
        let func = Function::from_name(&name).ok_or(ExprError::UnknownFunction { name, pos })?;
        self.expect(&Token::LParen)?;
        let args = self.list_items(&Token::RParen)?;
        let expected = func.arity();
        if !expected.accepts(args.len()) {
            return Err(ExprError::WrongArity {
                func,
                expected,
                found: args.len(),
            });
        }
        Ok(Expr::Call { func, args })
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn list_items(&mut self, close: &Token) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.peek_token() == Some(close) {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.ternary()?);
            match self.advance() {
                Some(tok) if tok.token == Token::Comma => continue,
                Some(tok) if &tok.token == close => return Ok(items),
                Some(tok) => return Err(self.unexpected(&tok)),
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
    }
}

fn comparison_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::In => BinaryOp::In,
        _ => return None,
    })
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
