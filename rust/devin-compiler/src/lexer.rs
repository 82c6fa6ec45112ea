//! Lexer for Devin source code.

use devin_core::Span;
use num_bigint::BigInt;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("invalid number literal at byte {pos}")]
    InvalidNumber { pos: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntegerLit(BigInt),
    RationalLit(BigInt, BigInt), // sign-folded numerator, positive denominator-power-of-ten component kept as (whole*scale+frac, scale)
    Ident(String),
    True,
    False,

    // Keywords
    Var,
    Def,
    If,
    Else,
    While,
    Do,
    Return,
    Assert,
    Ref,
    And,
    Or,
    Xor,
    Not,
    Len,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::IntegerLit(_) => "integer literal",
            TokenKind::RationalLit(_, _) => "rational literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Var => "'var'",
            TokenKind::Def => "'def'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::Return => "'return'",
            TokenKind::Assert => "'assert'",
            TokenKind::Ref => "'ref'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Xor => "'xor'",
            TokenKind::Not => "'not'",
            TokenKind::Len => "'len'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Eq => "'='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::PercentEq => "'%='",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Identifier start/continue classes from spec §4.1, approximated with
/// `char`'s Unicode category queries (connector-punctuation has no direct
/// `char` predicate, so `_` stands in for it as the one connector punctuation
/// mark Devin programs actually use).
fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || is_combining_mark(ch)
}

fn is_combining_mark(ch: char) -> bool {
    matches!(ch as u32, 0x0300..=0x036F | 0x0900..=0x0903)
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|&(_, c)| c)
    }

    fn current_byte(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(b, _)| b)
            .unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.current() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Tokenize the entire input, stopping at the first lex error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.current_byte();
            let Some(ch) = self.current() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                });
                break;
            };

            let kind = if ch.is_ascii_digit() {
                self.lex_number()?
            } else if is_ident_start(ch) {
                self.lex_ident_or_keyword()
            } else {
                self.lex_operator(ch, start)?
            };

            let end = self.current_byte();
            tokens.push(Token {
                kind,
                span: Span::new(start, end),
            });
        }
        Ok(tokens)
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.current_byte();
        let mut digits = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.current() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // '.'
            let mut frac = String::new();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    frac.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let scale = BigInt::from(10u32).pow(frac.len() as u32);
            let whole: BigInt = digits.parse().map_err(|_| LexError::InvalidNumber { pos: start })?;
            let frac_val: BigInt = if frac.is_empty() {
                BigInt::from(0)
            } else {
                frac.parse().map_err(|_| LexError::InvalidNumber { pos: start })?
            };
            let numerator = whole * &scale + frac_val;
            Ok(TokenKind::RationalLit(numerator, scale))
        } else {
            let value: BigInt = digits.parse().map_err(|_| LexError::InvalidNumber { pos: start })?;
            Ok(TokenKind::IntegerLit(value))
        }
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.current() {
            if (text.is_empty() && is_ident_start(c)) || (!text.is_empty() && is_ident_continue(c))
            {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match text.as_str() {
            "var" => TokenKind::Var,
            "def" => TokenKind::Def,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "return" => TokenKind::Return,
            "assert" => TokenKind::Assert,
            "ref" => TokenKind::Ref,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "xor" => TokenKind::Xor,
            "not" => TokenKind::Not,
            "len" => TokenKind::Len,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Ident(text),
        }
    }

    fn lex_operator(&mut self, ch: char, pos: usize) -> Result<TokenKind, LexError> {
        self.advance();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '+' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexError::UnexpectedChar { ch, pos });
                }
            }
            '<' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            _ => return Err(LexError::UnexpectedChar { ch, pos }),
        };
        Ok(kind)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_idents() {
        assert_eq!(
            kinds("var x def f"),
            vec![
                TokenKind::Var,
                TokenKind::Ident("x".into()),
                TokenKind::Def,
                TokenKind::Ident("f".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_integer_and_rational() {
        let ks = kinds("42 3.14");
        assert_eq!(ks[0], TokenKind::IntegerLit(BigInt::from(42)));
        assert!(matches!(ks[1], TokenKind::RationalLit(_, _)));
    }

    #[test]
    fn disambiguates_eq_and_eqeq() {
        assert_eq!(
            kinds("= =="),
            vec![TokenKind::Eq, TokenKind::EqEq, TokenKind::Eof]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("1 // comment\n2"),
            vec![
                TokenKind::IntegerLit(BigInt::from(1)),
                TokenKind::IntegerLit(BigInt::from(2)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unknown_char() {
        assert!(tokenize("@").is_err());
    }
}
