//! Statement-level rules: program, blocks, control processes and function
//! literals.

use std::rc::Rc;

use crate::ast::{Block, Expr, FunctionLiteral, Process, Program};
use crate::token::TokenKind;

use super::{ParseResult, ParseStatus, Parser};

impl<'t> Parser<'t> {
    /// Top-level rule. Stops at the first token that cannot start a
    /// statement; the caller decides whether leftovers are an error.
    pub fn match_program(&mut self) -> ParseResult<Program> {
        self.attempt(|parser| {
            let statements = parser.match_statements()?;
            Ok(Program {
                body: Block::new(statements),
            })
        })
    }

    fn match_statements(&mut self) -> ParseResult<Vec<Expr>> {
        let mut statements = Vec::new();
        while let Some(statement) = self.optional(Parser::match_expr)? {
            statements.push(statement);
        }
        Ok(statements)
    }

    fn match_block(&mut self, construct: &str) -> ParseResult<Block> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::LBrace, true).map_err(|status| {
                status.intercepted(format!("Expect '{{' while parsing '{construct}'"))
            })?;
            let statements = parser.match_statements()?;
            parser.token_match(TokenKind::RBrace, true).map_err(|status| {
                status.intercepted(format!("Expect '}}' after block while parsing '{construct}'"))
            })?;
            Ok(Block::new(statements))
        })
    }

    pub(super) fn match_process(&mut self, required: bool) -> ParseResult<Process> {
        let Some(token) = self.peek() else {
            return Err(ParseStatus::no_match(None).required(required));
        };
        match token.kind {
            TokenKind::If => self.match_if(),
            TokenKind::While => self.match_while(),
            TokenKind::Loop => self.match_loop(),
            TokenKind::For => self.match_for(),
            TokenKind::Return => self.match_return(),
            TokenKind::Continue => {
                self.cursor += 1;
                Ok(Process::Continue)
            }
            TokenKind::Break => {
                self.cursor += 1;
                Ok(Process::Break)
            }
            TokenKind::Require => Err(ParseStatus::no_match(Some(token.span))
                .intercepted("'require' is not supported while parsing 'require-expression'")),
            _ => Err(ParseStatus::no_match(Some(token.span)).required(required)),
        }
    }

    fn match_condition(&mut self, keyword: &str, construct: &str) -> ParseResult<Expr> {
        self.match_expr(true).map_err(|status| {
            status.intercepted(format!(
                "Expect condition after '{keyword}' while parsing '{construct}'"
            ))
        })
    }

    fn match_if(&mut self) -> ParseResult<Process> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::If, true)?;
            let condition = parser.match_condition("if", "if-expression")?;
            let mut branches = vec![(condition, parser.match_block("if-expression")?)];
            while parser.token_match(TokenKind::Elif, false).is_ok() {
                let condition = parser.match_condition("elif", "if-expression")?;
                branches.push((condition, parser.match_block("if-expression")?));
            }
            let otherwise = if parser.token_match(TokenKind::Else, false).is_ok() {
                Some(parser.match_block("if-expression")?)
            } else {
                None
            };
            Ok(Process::If {
                branches,
                otherwise,
            })
        })
    }

    fn match_while(&mut self) -> ParseResult<Process> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::While, true)?;
            let condition = parser.match_condition("while", "while-expression")?;
            let body = parser.match_block("while-expression")?;
            Ok(Process::While { condition, body })
        })
    }

    fn match_loop(&mut self) -> ParseResult<Process> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::Loop, true)?;
            let body = parser.match_block("loop-expression")?;
            Ok(Process::Loop { body })
        })
    }

    /// `for v[, k] in expr { }` or `for i of start..end[..step] { }`.
    fn match_for(&mut self) -> ParseResult<Process> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::For, true)?;
            let name = parser.identifier(true).map_err(|status| {
                status.intercepted(
                    "Expect variable name after 'for' while parsing 'for-expression'",
                )
            })?;
            let key = if parser.token_match(TokenKind::Comma, false).is_ok() {
                Some(parser.identifier(true).map_err(|status| {
                    status.intercepted("Expect key name after ',' while parsing 'for-expression'")
                })?)
            } else {
                None
            };

            if parser.token_match(TokenKind::In, false).is_ok() {
                let iterable = parser.match_expr(true).map_err(|status| {
                    status.intercepted(
                        "Expect expression after 'in' while parsing 'for-expression'",
                    )
                })?;
                let body = parser.match_block("for-expression")?;
                return Ok(Process::ForIn {
                    value: name,
                    key,
                    iterable,
                    body,
                });
            }

            parser.token_match(TokenKind::Of, true).map_err(|status| {
                status.intercepted("Expect 'in' or 'of' after names while parsing 'for-expression'")
            })?;
            if key.is_some() {
                let span = parser.current_span();
                return Err(ParseStatus::no_match(span).intercepted(
                    "Numeric 'for' takes a single variable while parsing 'for-expression'",
                ));
            }
            let start = parser.match_expr(true).map_err(|status| {
                status.intercepted(
                    "Expect start expression after 'of' while parsing 'for-expression'",
                )
            })?;
            parser.token_match(TokenKind::DotDot, true).map_err(|status| {
                status.intercepted("Expect '..' after start while parsing 'for-expression'")
            })?;
            let end = parser.match_expr(true).map_err(|status| {
                status.intercepted(
                    "Expect end expression after '..' while parsing 'for-expression'",
                )
            })?;
            let step = if parser.token_match(TokenKind::DotDot, false).is_ok() {
                Some(parser.match_expr(true).map_err(|status| {
                    status.intercepted(
                        "Expect step expression after '..' while parsing 'for-expression'",
                    )
                })?)
            } else {
                None
            };
            let body = parser.match_block("for-expression")?;
            Ok(Process::ForOf {
                name,
                start,
                end,
                step,
                body,
            })
        })
    }

    /// `return` or `return: expr`.
    fn match_return(&mut self) -> ParseResult<Process> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::Return, true)?;
            if parser.token_match(TokenKind::Colon, false).is_err() {
                return Ok(Process::Return(None));
            }
            let value = parser.match_expr(true).map_err(|status| {
                status.intercepted(
                    "Expect expression after 'return:' while parsing 'return-expression'",
                )
            })?;
            Ok(Process::Return(Some(value)))
        })
    }

    /// `func [name](params) { body }`.
    pub(super) fn match_function(&mut self) -> ParseResult<FunctionLiteral> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::Func, true)?;
            let name = parser.optional(Parser::identifier)?;
            parser.token_match(TokenKind::LParen, true).map_err(|status| {
                status.intercepted("Expect '(' after 'func' while parsing 'func-expression'")
            })?;
            let mut params = Vec::new();
            if let Some(first) = parser.optional(Parser::identifier)? {
                params.push(first);
                while parser.token_match(TokenKind::Comma, false).is_ok() {
                    params.push(parser.identifier(true).map_err(|status| {
                        status.intercepted(
                            "Expect parameter name after ',' while parsing 'func-expression'",
                        )
                    })?);
                }
            }
            parser.token_match(TokenKind::RParen, true).map_err(|status| {
                status.intercepted("Expect ')' after parameters while parsing 'func-expression'")
            })?;
            let body = parser.match_block("func-expression")?;
            Ok(FunctionLiteral {
                name,
                params,
                body: Rc::new(body),
            })
        })
    }
}
