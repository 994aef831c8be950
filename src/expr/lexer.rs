//! Tokenizer for the expression language.
//!
//! Anything outside the token set is rejected here, before parsing.

use std::fmt;

use super::error::ExprError;

/// Reserved words that name constructs the language doesn't have.
const FORBIDDEN_WORDS: &[&str] = &[
    "as", "async", "await", "break", "class", "continue", "def", "del", "else", "eval", "except",
    "exec", "fn", "for", "from", "global", "if", "import", "lambda", "let", "loop", "match",
    "pass", "raise", "return", "try", "while", "with", "yield",
];

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Question,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Ident(name) => write!(f, "name `{name}`"),
            Self::True => f.write_str("`true`"),
            Self::False => f.write_str("`false`"),
            Self::And => f.write_str("`and`"),
            Self::Or => f.write_str("`or`"),
            Self::Not => f.write_str("`not`"),
            Self::In => f.write_str("`in`"),
            Self::Plus => f.write_str("`+`"),
            Self::Minus => f.write_str("`-`"),
            Self::Star => f.write_str("`*`"),
            Self::Slash => f.write_str("`/`"),
            Self::Percent => f.write_str("`%`"),
            Self::EqEq => f.write_str("`==`"),
            Self::NotEq => f.write_str("`!=`"),
            Self::Lt => f.write_str("`<`"),
            Self::Le => f.write_str("`<=`"),
            Self::Gt => f.write_str("`>`"),
            Self::Ge => f.write_str("`>=`"),
            Self::Question => f.write_str("`?`"),
            Self::Colon => f.write_str("`:`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::LBracket => f.write_str("`[`"),
            Self::RBracket => f.write_str("`]`"),
            Self::Comma => f.write_str("`,`"),
        }
    }
}

/// A token and its byte offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let pos = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text = &source[pos..i];
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ExprError::InvalidNumber {
                    text: text.to_string(),
                    pos,
                })?;
            if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
                return Err(ExprError::InvalidNumber {
                    text: source[pos..=i].to_string(),
                    pos,
                });
            }
            tokens.push(Spanned { token: Token::Number(value), pos });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &source[pos..i];
            let token = match word {
                "true" => Token::True,
                "false" => Token::False,
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "in" => Token::In,
                w if FORBIDDEN_WORDS.contains(&w) => {
                    return Err(ExprError::ForbiddenKeyword {
                        word: w.to_string(),
                        pos,
                    });
                }
                w => Token::Ident(w.to_string()),
            };
            tokens.push(Spanned { token, pos });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (token, width) = match (c, next) {
            (b'=', Some(b'=')) => (Token::EqEq, 2),
            (b'=', _) => return Err(ExprError::Assignment { pos }),
            (b'!', Some(b'=')) => (Token::NotEq, 2),
            (b'!', _) => (Token::Not, 1),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'<', _) => (Token::Lt, 1),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'>', _) => (Token::Gt, 1),
            (b'&', Some(b'&')) => (Token::And, 2),
            (b'|', Some(b'|')) => (Token::Or, 2),
            (b'+', Some(b'=')) | (b'-', Some(b'=')) | (b'*', Some(b'=')) | (b'/', Some(b'=')) => {
                return Err(ExprError::Assignment { pos });
            }
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'?', _) => (Token::Question, 1),
            (b':', _) => (Token::Colon, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b'[', _) => (Token::LBracket, 1),
            (b']', _) => (Token::RBracket, 1),
            (b',', _) => (Token::Comma, 1),
            (b'.', _) => return Err(ExprError::AttributeAccess { pos }),
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('\u{fffd}');
                return Err(ExprError::UnexpectedChar { ch, pos });
            }
        };
        tokens.push(Spanned { token, pos });
        i += width;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            kinds("14 + strength*2"),
            vec![
                Token::Number(14.0),
                Token::Plus,
                Token::Ident("strength".into()),
                Token::Star,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_decimal_and_operators() {
        assert_eq!(
            kinds("1.5 <= x && !y"),
            vec![
                Token::Number(1.5),
                Token::Le,
                Token::Ident("x".into()),
                Token::And,
                Token::Not,
                Token::Ident("y".into()),
            ]
        );
    }

    #[test]
    fn test_rejects_assignment() {
        assert_eq!(tokenize("hp = 0"), Err(ExprError::Assignment { pos: 3 }));
        assert_eq!(tokenize("hp += 1"), Err(ExprError::Assignment { pos: 3 }));
    }

    #[test]
    fn test_rejects_attribute_access() {
        assert_eq!(tokenize("state.hp"), Err(ExprError::AttributeAccess { pos: 5 }));
    }

    #[test]
    fn test_rejects_keywords() {
        assert!(matches!(
            tokenize("while 1"),
            Err(ExprError::ForbiddenKeyword { ref word, pos: 0 }) if word == "while"
        ));
        assert!(matches!(tokenize("lambda"), Err(ExprError::ForbiddenKeyword { .. })));
    }

    #[test]
    fn test_rejects_strange_characters() {
        assert_eq!(
            tokenize("1 ; 2"),
            Err(ExprError::UnexpectedChar { ch: ';', pos: 2 })
        );
        assert!(matches!(tokenize("\"x\""), Err(ExprError::UnexpectedChar { .. })));
        assert!(matches!(tokenize("a & b"), Err(ExprError::UnexpectedChar { .. })));
    }

    #[test]
    fn test_rejects_number_glued_to_name() {
        assert!(matches!(tokenize("3x"), Err(ExprError::InvalidNumber { .. })));
    }

    #[test]
    fn test_rejects_literal_that_overflows() {
        let huge = "9".repeat(320);
        assert_eq!(
            tokenize(&format!("0 * {huge}")),
            Err(ExprError::InvalidNumber { text: huge, pos: 4 })
        );
        assert!(tokenize(&"9".repeat(300)).is_ok());
    }
}
