//! Lexer for the scene DSL.
//!
//! Converts source text into a stream of [`Token`]s. Whitespace (including
//! newlines) and comments are skipped; every token records the line and
//! column it starts on so later stages can report positions.

use super::error::ParseError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia()?;

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '[' => self.single_char(TokenKind::LBracket),
                ']' => self.single_char(TokenKind::RBracket),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ':' => self.single_char(TokenKind::Colon),
                ',' => self.single_char(TokenKind::Comma),
                ';' => self.single_char(TokenKind::Semicolon),
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '*' => self.single_char(TokenKind::Star),
                '/' => self.single_char(TokenKind::Slash),
                '%' => self.single_char(TokenKind::Percent),
                '=' => self.one_or_two('=', TokenKind::Eq, TokenKind::EqEq),
                '!' => self.one_or_two('=', TokenKind::Bang, TokenKind::NotEq),
                '<' => self.one_or_two('=', TokenKind::Lt, TokenKind::LtEq),
                '>' => self.one_or_two('=', TokenKind::Gt, TokenKind::GtEq),
                '&' => self.doubled('&', TokenKind::AndAnd)?,
                '|' => self.doubled('|', TokenKind::OrOr)?,
                '.' => self.one_or_two('.', TokenKind::Dot, TokenKind::DotDot),
                '"' => self.lex_string()?,
                '0'..='9' => self.lex_number()?,
                c if is_ident_start(c) => self.lex_word(),
                _ => {
                    return Err(ParseError::new(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip whitespace, `//` line comments and `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            while !self.is_at_end() && self.peek().is_whitespace() {
                self.advance();
            }
            if self.peek() == '/' && self.peek_at(1) == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else if self.peek() == '/' && self.peek_at(1) == Some('*') {
                let line = self.line;
                let col = self.col;
                self.advance();
                self.advance();
                loop {
                    if self.is_at_end() {
                        return Err(ParseError::new("unterminated block comment", line, col));
                    }
                    if self.peek() == '*' && self.peek_at(1) == Some('/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
            } else {
                return Ok(());
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    /// Lex `c` or `c` followed by `second` (e.g. `<` / `<=`).
    fn one_or_two(&mut self, second: char, one: TokenKind, two: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        if !self.is_at_end() && self.peek() == second {
            self.advance();
            Token {
                kind: two,
                line,
                col,
            }
        } else {
            Token {
                kind: one,
                line,
                col,
            }
        }
    }

    /// Lex an operator that only exists doubled (`&&`, `||`).
    fn doubled(&mut self, ch: char, kind: TokenKind) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        self.advance();
        if !self.is_at_end() && self.peek() == ch {
            self.advance();
            Ok(Token { kind, line, col })
        } else {
            Err(ParseError::new(
                format!("expected '{ch}{ch}', found single '{ch}'"),
                line,
                col,
            ))
        }
    }

    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume opening '"'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            s.push(self.advance());
        }
        if self.is_at_end() {
            return Err(ParseError::new("unclosed string literal", line, col));
        }
        self.advance(); // consume closing '"'
        Ok(Token {
            kind: TokenKind::Str(s),
            line,
            col,
        })
    }

    /// Lex a non-negative decimal, promoting it to a duration in seconds when
    /// followed by `ms` or `s` that does not continue into an identifier.
    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        // `1.5` is a fraction, `0..3` is a range.
        if self.peek() == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            s.push(self.advance());
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        let val: f64 = s
            .parse()
            .map_err(|_| ParseError::new(format!("invalid number: {s}"), line, col))?;

        let kind = if self.suffix_is("ms") {
            self.advance();
            self.advance();
            TokenKind::Duration(val / 1000.0)
        } else if self.suffix_is("s") {
            self.advance();
            TokenKind::Duration(val)
        } else {
            TokenKind::Number(val)
        };

        Ok(Token { kind, line, col })
    }

    /// Whether the upcoming characters spell `suffix` and are not followed by
    /// another identifier character.
    fn suffix_is(&self, suffix: &str) -> bool {
        let len = suffix.chars().count();
        suffix
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
            && !self.peek_at(len).is_some_and(is_ident_continue)
    }

    fn lex_word(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && is_ident_continue(self.peek()) {
            s.push(self.advance());
        }

        Token {
            kind: TokenKind::from_word(&s),
            line,
            col,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
