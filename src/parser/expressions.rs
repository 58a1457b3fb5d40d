//! Expression rules: assignment and the precedence chain
//! `or → and → compare → add → multiply → unary → primary → value access`.

use std::rc::Rc;

use crate::ast::{
    Accessor, AddOperator, AssignTail, AssignTarget, CompareOperator, Expr, MulOperator,
    TableEntry, TableKeyExpr, UnaryOperator,
};
use crate::token::TokenKind;

use super::{ParseResult, ParseStatus, Parser};

impl<'t> Parser<'t> {
    /// Entry rule for a single expression or statement. An assignment is
    /// recognised after the fact: the left side is parsed as an ordinary
    /// expression and must turn out to be a variable, index or member access.
    pub fn match_expr(&mut self, required: bool) -> ParseResult<Expr> {
        self.nested("expression", |parser| parser.match_expr_inner(required))
    }

    fn match_expr_inner(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            if parser.check(TokenKind::Global) {
                return parser.match_global();
            }
            if let Some(process) = parser.optional(Parser::match_process)? {
                return Ok(Expr::process(process));
            }
            let target_span = parser.current_span();
            let lhs = parser.match_or(required)?;
            let Some(tail) = parser.optional(Parser::match_assign_tail)? else {
                return Ok(lhs);
            };
            let Some(target) = assign_target(lhs) else {
                let mut status = ParseStatus::no_match(target_span);
                status.require_more_tokens = false;
                return Err(status
                    .intercepted("Invalid assignment target while parsing 'assign-expression'"));
            };
            Ok(Expr::Assign { target, tail })
        })
    }

    fn match_global(&mut self) -> ParseResult<Expr> {
        self.token_match(TokenKind::Global, true)?;
        let name = self.identifier(true).map_err(|status| {
            status.intercepted("Expect name after 'global' while parsing 'global-expression'")
        })?;
        self.token_match(TokenKind::Assign, true).map_err(|status| {
            status.intercepted("Expect '=' after name while parsing 'global-expression'")
        })?;
        let value = self.match_expr(true).map_err(|status| {
            status.intercepted("Expect expression after '=' while parsing 'global-expression'")
        })?;
        Ok(Expr::Global {
            name,
            value: Box::new(value),
        })
    }

    fn match_assign_tail(&mut self, required: bool) -> ParseResult<AssignTail> {
        self.attempt(|parser| {
            let kind = parser.peek_kind();
            let tail: fn(Box<Expr>) -> AssignTail = match kind {
                Some(TokenKind::Assign) => AssignTail::Set,
                Some(TokenKind::PlusAssign) => AssignTail::AddAssign,
                Some(TokenKind::MinusAssign) => AssignTail::SubAssign,
                Some(TokenKind::PlusPlus) => {
                    parser.cursor += 1;
                    return Ok(AssignTail::Increment);
                }
                Some(TokenKind::MinusMinus) => {
                    parser.cursor += 1;
                    return Ok(AssignTail::Decrement);
                }
                _ => {
                    return Err(ParseStatus::no_match(parser.current_span()).required(required));
                }
            };
            parser.cursor += 1;
            let value = parser.match_expr(true).map_err(|status| {
                status.intercepted(
                    "Expect expression after '=','+=','-=' while parsing 'assign-expression'",
                )
            })?;
            Ok(tail(Box::new(value)))
        })
    }

    fn match_or(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let first = parser.match_and(required)?;
            let rest = parser.optional(Parser::match_or_tail)?.unwrap_or_default();
            Ok(if rest.is_empty() {
                first
            } else {
                Expr::Or {
                    first: Box::new(first),
                    rest,
                }
            })
        })
    }

    fn match_or_tail(&mut self, required: bool) -> ParseResult<Vec<Expr>> {
        self.match_logic_tail(
            required,
            TokenKind::Or,
            Parser::match_and,
            "Expect 'and-expression' after 'or' keyword",
        )
    }

    fn match_and(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let first = parser.match_compare(required)?;
            let rest = parser.optional(Parser::match_and_tail)?.unwrap_or_default();
            Ok(if rest.is_empty() {
                first
            } else {
                Expr::And {
                    first: Box::new(first),
                    rest,
                }
            })
        })
    }

    fn match_and_tail(&mut self, required: bool) -> ParseResult<Vec<Expr>> {
        self.match_logic_tail(
            required,
            TokenKind::And,
            Parser::match_compare,
            "Expect 'compare-expression' after 'and' keyword",
        )
    }

    fn match_logic_tail(
        &mut self,
        required: bool,
        keyword: TokenKind,
        operand: fn(&mut Self, bool) -> ParseResult<Expr>,
        message: &str,
    ) -> ParseResult<Vec<Expr>> {
        self.attempt(|parser| {
            parser.token_match(keyword, required)?;
            let mut operands = Vec::new();
            loop {
                operands.push(operand(parser, true).map_err(|status| status.intercepted(message))?);
                if parser.token_match(keyword, false).is_err() {
                    return Ok(operands);
                }
            }
        })
    }

    fn match_compare(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let first = parser.match_add(required)?;
            let rest = parser
                .optional(|parser, required| {
                    parser.match_binary_tail(
                        required,
                        compare_operator,
                        Parser::match_add,
                        "Expect expression after '==','!=','<','<=','>','>=' while parsing 'compare-expression'",
                    )
                })?
                .unwrap_or_default();
            Ok(if rest.is_empty() {
                first
            } else {
                Expr::Compare {
                    first: Box::new(first),
                    rest,
                }
            })
        })
    }

    fn match_add(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let first = parser.match_mul(required)?;
            let rest = parser
                .optional(|parser, required| {
                    parser.match_binary_tail(
                        required,
                        add_operator,
                        Parser::match_mul,
                        "Expect expression after '+','-' while parsing 'add-expression'",
                    )
                })?
                .unwrap_or_default();
            Ok(if rest.is_empty() {
                first
            } else {
                Expr::Add {
                    first: Box::new(first),
                    rest,
                }
            })
        })
    }

    fn match_mul(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let first = parser.match_unary(required)?;
            let rest = parser
                .optional(|parser, required| {
                    parser.match_binary_tail(
                        required,
                        mul_operator,
                        Parser::match_unary,
                        "Expect expression after '*','/','**','//','%' while parsing 'mul-expression'",
                    )
                })?
                .unwrap_or_default();
            Ok(if rest.is_empty() {
                first
            } else {
                Expr::Mul {
                    first: Box::new(first),
                    rest,
                }
            })
        })
    }

    /// Tail of a binary level: one or more `(operator, operand)` pairs. The
    /// first operator decides whether the tail matched at all; once it has,
    /// a missing operand is a hard error.
    fn match_binary_tail<Op>(
        &mut self,
        required: bool,
        operator: fn(TokenKind) -> Option<Op>,
        operand: fn(&mut Self, bool) -> ParseResult<Expr>,
        message: &str,
    ) -> ParseResult<Vec<(Op, Expr)>> {
        self.attempt(|parser| {
            let mut tail = Vec::new();
            while let Some(op) = parser.peek_kind().and_then(operator) {
                parser.cursor += 1;
                let right = operand(parser, true).map_err(|status| status.intercepted(message))?;
                tail.push((op, right));
            }
            if tail.is_empty() {
                return Err(ParseStatus::no_match(parser.current_span()).required(required));
            }
            Ok(tail)
        })
    }

    fn match_unary(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let op = match parser.peek_kind() {
                Some(TokenKind::Minus) => UnaryOperator::Negate,
                Some(TokenKind::Not) => UnaryOperator::Not,
                _ => return parser.match_primary(required),
            };
            parser.cursor += 1;
            let operand = parser
                .nested("unary-expression", |parser| parser.match_unary(true))
                .map_err(|status| {
                    status.intercepted(
                        "Expect expression after '-','not' while parsing 'unary-expression'",
                    )
                })?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            })
        })
    }

    /// Processes (control statements) or a value access chain.
    fn match_primary(&mut self, required: bool) -> ParseResult<Expr> {
        if let Some(process) = self.optional(Parser::match_process)? {
            return Ok(Expr::process(process));
        }
        self.match_value_access(required)
    }

    fn match_value_access(&mut self, required: bool) -> ParseResult<Expr> {
        self.attempt(|parser| {
            let target = parser.match_value(required)?;
            let mut chain = Vec::new();
            while let Some(accessor) = parser.optional(Parser::match_accessor)? {
                chain.push(accessor);
            }
            Ok(if chain.is_empty() {
                target
            } else {
                Expr::Access {
                    target: Box::new(target),
                    chain,
                }
            })
        })
    }

    fn match_accessor(&mut self, required: bool) -> ParseResult<Accessor> {
        if !self.continues_line() {
            return Err(ParseStatus::no_match(self.current_span()).required(required));
        }
        self.attempt(|parser| match parser.peek_kind() {
            Some(TokenKind::LBracket) => {
                parser.cursor += 1;
                let index = parser.match_expr(true).map_err(|status| {
                    status.intercepted(
                        "Require index after '[' while parsing 'value-access-expression'",
                    )
                })?;
                parser.token_match(TokenKind::RBracket, true).map_err(|status| {
                    status.intercepted(
                        "Require ']' after index while parsing 'value-access-expression'",
                    )
                })?;
                Ok(Accessor::Index(index))
            }
            Some(TokenKind::Dot) => {
                parser.cursor += 1;
                let name = parser.identifier(true).map_err(|status| {
                    status.intercepted(
                        "Require member name after '.' while parsing 'value-access-expression'",
                    )
                })?;
                Ok(Accessor::Member(name))
            }
            Some(TokenKind::LParen) => {
                parser.cursor += 1;
                let args = parser
                    .optional(|parser, required| parser.match_chain(required, "call-expression"))?
                    .unwrap_or_default();
                parser.token_match(TokenKind::RParen, true).map_err(|status| {
                    status.intercepted("Expect ')' after arguments while parsing 'call-expression'")
                })?;
                Ok(Accessor::Call(args))
            }
            _ => Err(ParseStatus::no_match(parser.current_span()).required(required)),
        })
    }

    fn match_value(&mut self, required: bool) -> ParseResult<Expr> {
        let Some(token) = self.peek() else {
            return Err(ParseStatus::no_match(None).required(required));
        };
        let literal = match token.kind {
            TokenKind::Null => Some(Expr::Null),
            TokenKind::True => Some(Expr::Boolean(true)),
            TokenKind::False => Some(Expr::Boolean(false)),
            TokenKind::Identifier => Some(Expr::Variable(
                token.text().unwrap_or_default().to_string(),
            )),
            TokenKind::String => Some(Expr::String(Rc::from(token.text().unwrap_or_default()))),
            TokenKind::Number => {
                let text = token.text().unwrap_or_default();
                let value = text.parse::<f64>().map_err(|_| {
                    ParseStatus::no_match(Some(token.span))
                        .intercepted(format!("Invalid number literal '{text}'"))
                })?;
                Some(Expr::Number(value))
            }
            _ => None,
        };
        if let Some(literal) = literal {
            self.cursor += 1;
            return Ok(literal);
        }

        match token.kind {
            TokenKind::LBracket => self.match_list(),
            TokenKind::LBrace => self.match_table(),
            TokenKind::LParen => self.match_parenthesized(),
            TokenKind::Func => self.match_function().map(Expr::Function),
            _ => Err(ParseStatus::no_match(Some(token.span)).required(required)),
        }
    }

    fn match_list(&mut self) -> ParseResult<Expr> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::LBracket, true)?;
            let elements = parser
                .optional(|parser, required| parser.match_chain(required, "list-expression"))?;
            parser.token_match(TokenKind::RBracket, true).map_err(|status| {
                status.intercepted(if elements.is_some() {
                    "Expect ']' after '[' while parsing 'list-expression'"
                } else {
                    "Expect expression after '[' while parsing 'list-expression'"
                })
            })?;
            Ok(Expr::List(elements.unwrap_or_default()))
        })
    }

    /// Comma separated expressions; `construct` names the enclosing rule in
    /// diagnostics.
    pub(super) fn match_chain(
        &mut self,
        required: bool,
        construct: &str,
    ) -> ParseResult<Vec<Expr>> {
        self.attempt(|parser| {
            let mut expressions = vec![parser.match_expr(required)?];
            while parser.token_match(TokenKind::Comma, false).is_ok() {
                let next = parser.match_expr(true).map_err(|status| {
                    status.intercepted(format!(
                        "Expect expression after ',' while parsing '{construct}'"
                    ))
                })?;
                expressions.push(next);
            }
            Ok(expressions)
        })
    }

    fn match_table(&mut self) -> ParseResult<Expr> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::LBrace, true)?;
            let mut entries = Vec::new();
            if parser.token_match(TokenKind::RBrace, false).is_ok() {
                return Ok(Expr::Table(entries));
            }
            loop {
                entries.push(parser.match_table_entry()?);
                if parser.token_match(TokenKind::Comma, false).is_ok() {
                    if parser.token_match(TokenKind::RBrace, false).is_ok() {
                        return Ok(Expr::Table(entries));
                    }
                    continue;
                }
                parser.token_match(TokenKind::RBrace, true).map_err(|status| {
                    status.intercepted("Expect '}' after entries while parsing 'table-expression'")
                })?;
                return Ok(Expr::Table(entries));
            }
        })
    }

    fn match_table_entry(&mut self) -> ParseResult<TableEntry> {
        let Some(token) = self.peek() else {
            return Err(ParseStatus::no_match(None)
                .intercepted("Expect key while parsing 'table-expression'"));
        };
        let key = match token.kind {
            TokenKind::Identifier => {
                self.cursor += 1;
                TableKeyExpr::Name(token.text().unwrap_or_default().to_string())
            }
            TokenKind::String | TokenKind::Number => {
                TableKeyExpr::Computed(self.match_value(true)?)
            }
            TokenKind::LBracket => {
                self.cursor += 1;
                let key = self.match_expr(true).map_err(|status| {
                    status.intercepted(
                        "Expect key expression after '[' while parsing 'table-expression'",
                    )
                })?;
                self.token_match(TokenKind::RBracket, true).map_err(|status| {
                    status.intercepted("Expect ']' after key while parsing 'table-expression'")
                })?;
                TableKeyExpr::Computed(key)
            }
            _ => {
                return Err(ParseStatus::no_match(Some(token.span))
                    .intercepted("Expect key while parsing 'table-expression'"));
            }
        };
        self.token_match(TokenKind::Colon, true).map_err(|status| {
            status.intercepted("Expect ':' after key while parsing 'table-expression'")
        })?;
        let value = self.match_expr(true).map_err(|status| {
            status.intercepted("Expect value after ':' while parsing 'table-expression'")
        })?;
        Ok(TableEntry { key, value })
    }

    fn match_parenthesized(&mut self) -> ParseResult<Expr> {
        self.attempt(|parser| {
            parser.token_match(TokenKind::LParen, true)?;
            let inner = parser.match_expr(true).map_err(|status| {
                status.intercepted("Expect expression after '(' while parsing 'quote-expression'")
            })?;
            parser.token_match(TokenKind::RParen, true).map_err(|status| {
                status.intercepted("Expect ')' after expression while parsing 'quote-expression'")
            })?;
            Ok(inner)
        })
    }
}

impl Parser<'_> {
    /// True when the current token sits on the line where the previous one
    /// ended. `[` and `(` on a new line start a new statement instead of
    /// indexing or calling the value before them.
    fn continues_line(&self) -> bool {
        let Some(current) = self.peek() else {
            return false;
        };
        if !matches!(current.kind, TokenKind::LBracket | TokenKind::LParen) {
            return true;
        }
        self.cursor
            .checked_sub(1)
            .and_then(|previous| self.tokens.get(previous))
            .is_some_and(|previous| previous.span.line == current.span.line)
    }
}

fn assign_target(expr: Expr) -> Option<AssignTarget> {
    match expr {
        Expr::Variable(name) => Some(AssignTarget::Variable(name)),
        Expr::Access { target, mut chain } => {
            let last = chain.pop()?;
            let container = if chain.is_empty() {
                target
            } else {
                Box::new(Expr::Access { target, chain })
            };
            match last {
                Accessor::Index(index) => Some(AssignTarget::Index {
                    container,
                    index: Box::new(index),
                }),
                Accessor::Member(name) => Some(AssignTarget::Member { container, name }),
                Accessor::Call(_) => None,
            }
        }
        _ => None,
    }
}

fn compare_operator(kind: TokenKind) -> Option<CompareOperator> {
    match kind {
        TokenKind::Equal => Some(CompareOperator::Equal),
        TokenKind::NotEqual => Some(CompareOperator::NotEqual),
        TokenKind::Less => Some(CompareOperator::Less),
        TokenKind::LessEq => Some(CompareOperator::LessEqual),
        TokenKind::Greater => Some(CompareOperator::Greater),
        TokenKind::GreaterEq => Some(CompareOperator::GreaterEqual),
        _ => None,
    }
}

fn add_operator(kind: TokenKind) -> Option<AddOperator> {
    match kind {
        TokenKind::Plus => Some(AddOperator::Add),
        TokenKind::Minus => Some(AddOperator::Sub),
        _ => None,
    }
}

fn mul_operator(kind: TokenKind) -> Option<MulOperator> {
    match kind {
        TokenKind::Star => Some(MulOperator::Mul),
        TokenKind::Slash => Some(MulOperator::Div),
        TokenKind::Pow => Some(MulOperator::Pow),
        TokenKind::SlashSlash => Some(MulOperator::FloorDiv),
        TokenKind::Percent => Some(MulOperator::Mod),
        _ => None,
    }
}
