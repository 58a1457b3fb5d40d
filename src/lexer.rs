use std::{iter::Peekable, str::Chars};

use tracing::debug;

use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

/// Single forward pass over the source text. Yields tokens lazily and stops
/// for good after the first lexical error.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    index: usize,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            index: 0,
            line: 0,
            column: 0,
            failed: false,
        }
    }

    pub fn next_token(&mut self) -> Option<LexResult<Token>> {
        if self.failed {
            return None;
        }
        self.skip_trivia();

        let &ch = self.chars.peek()?;
        let start = self.index;
        let line = self.line;
        let column = self.column;

        let result = match ch {
            '"' => self.read_string(start, line, column),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier(start, line, column)),
            c if c.is_ascii_digit() => self.read_number(start, line, column),
            _ => self.read_operator(ch, start, line, column),
        };
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\r' || c == '\n' {
                        break;
                    }
                    self.advance_char();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance_char();
            } else {
                break;
            }
        }

        let span = self.span_from(start, line, column);
        match TokenKind::keyword(&ident) {
            Some(kind) => Token::new(kind, span),
            None => Token::with_text(TokenKind::Identifier, ident, span),
        }
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        let mut literal = String::new();
        self.read_digits(&mut literal);

        if self.chars.peek() == Some(&'.') && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            literal.push('.');
            self.advance_char();
            self.read_digits(&mut literal);
        }

        if let Some(&e @ ('e' | 'E')) = self.chars.peek() {
            literal.push(e);
            self.advance_char();
            if let Some(&sign @ ('+' | '-')) = self.chars.peek() {
                literal.push(sign);
                self.advance_char();
            }
            if !self.read_digits(&mut literal) {
                return Err(LexError::MalformedNumber {
                    literal,
                    span: self.span_from(start, line, column),
                });
            }
        }

        Ok(Token::with_text(
            TokenKind::Number,
            literal,
            self.span_from(start, line, column),
        ))
    }

    /// Consumes a run of ASCII digits; returns whether any were read.
    fn read_digits(&mut self, literal: &mut String) -> bool {
        let before = literal.len();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
                self.advance_char();
            } else {
                break;
            }
        }
        literal.len() > before
    }

    fn read_string(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        self.advance_char(); // Consume opening quote
        let mut value = String::new();
        loop {
            let Some(c) = self.advance_char() else {
                return Err(LexError::UnterminatedString {
                    span: self.span_from(start, line, column),
                });
            };
            match c {
                '"' => break,
                '\r' | '\n' => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start, line, column),
                    });
                }
                '\\' => {
                    let escape_span = self.span_from(start, line, column);
                    let escaped = match self.advance_char() {
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('n') => '\n',
                        Some('b') => '\u{8}',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(escape) => {
                            return Err(LexError::InvalidEscape {
                                escape,
                                span: escape_span,
                            });
                        }
                        None => {
                            return Err(LexError::UnterminatedString { span: escape_span });
                        }
                    };
                    value.push(escaped);
                }
                _ => value.push(c),
            }
        }

        Ok(Token::with_text(
            TokenKind::String,
            value,
            self.span_from(start, line, column),
        ))
    }

    fn read_operator(
        &mut self,
        ch: char,
        start: usize,
        line: usize,
        column: usize,
    ) -> LexResult<Token> {
        self.advance_char();
        let kind = match ch {
            '+' => self.one_of(
                TokenKind::Plus,
                &[('+', TokenKind::PlusPlus), ('=', TokenKind::PlusAssign)],
            ),
            '-' => self.one_of(
                TokenKind::Minus,
                &[('-', TokenKind::MinusMinus), ('=', TokenKind::MinusAssign)],
            ),
            '*' => self.one_of(TokenKind::Star, &[('*', TokenKind::Pow)]),
            '/' => self.one_of(TokenKind::Slash, &[('/', TokenKind::SlashSlash)]),
            '>' => self.one_of(TokenKind::Greater, &[('=', TokenKind::GreaterEq)]),
            '<' => self.one_of(TokenKind::Less, &[('=', TokenKind::LessEq)]),
            '=' => self.one_of(TokenKind::Assign, &[('=', TokenKind::Equal)]),
            '!' => self.one_of(TokenKind::Not, &[('=', TokenKind::NotEqual)]),
            '.' => self.one_of(TokenKind::Dot, &[('.', TokenKind::DotDot)]),
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            character => {
                return Err(LexError::UnexpectedCharacter {
                    character,
                    span: self.span_from(start, line, column),
                });
            }
        };
        Ok(Token::new(kind, self.span_from(start, line, column)))
    }

    /// Two-character lookahead: consumes the follower when it matches one of
    /// `pairs`, otherwise keeps the single-character kind.
    fn one_of(&mut self, single: TokenKind, pairs: &[(char, TokenKind)]) -> TokenKind {
        if let Some(&next) = self.chars.peek()
            && let Some(&(_, kind)) = pairs.iter().find(|(c, _)| *c == next)
        {
            self.advance_char();
            return kind;
        }
        single
    }
}

impl Lexer<'_> {
    fn advance_char(&mut self) -> Option<char> {
        let next = self.chars.next()?;
        self.index += 1;
        match next {
            '\r' => {
                if self.chars.peek() == Some(&'\n') {
                    self.chars.next();
                    self.index += 1;
                }
                self.line += 1;
                self.column = 0;
            }
            '\n' => {
                self.line += 1;
                self.column = 0;
            }
            _ => self.column += 1,
        }
        Some(next)
    }

    fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next()
    }

    fn span_from(&self, start: usize, line: usize, column: usize) -> Span {
        Span {
            start,
            end: self.index,
            line,
            column,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let tokens = Lexer::new(input).collect::<LexResult<Vec<_>>>()?;
    debug!(tokens = tokens.len(), "tokenized source");
    Ok(tokens)
}
