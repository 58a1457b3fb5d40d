use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::ast::Program;
use crate::lexer;
use crate::token::{Span, Token, TokenKind};

mod expressions;
mod statements;
pub mod status;

pub use status::{ParseResult, ParseStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{message} at {span}")]
    Syntax { message: String, span: Span },
    #[error("{message} at end of input")]
    Incomplete { message: String },
    #[error("Unexpected token {found} at {span}")]
    UnexpectedToken { found: String, span: Span },
}

impl ParseError {
    /// True when the input ended mid-construct; a REPL may read another line.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete { .. })
    }

    fn from_status(status: ParseStatus) -> Self {
        let message = status
            .message
            .unwrap_or_else(|| "Invalid syntax".to_string());
        match status.span {
            Some(span) if !status.require_more_tokens => ParseError::Syntax { message, span },
            _ => ParseError::Incomplete { message },
        }
    }
}

/// Recursive-descent recognizer over a token slice. Every `match_*` rule
/// leaves the cursor untouched when it fails.
pub struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    depth: usize,
}

/// Deepest expression nesting the recursive rules accept before failing.
pub const MAX_NESTING_DEPTH: usize = 64;

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Runs `rule` and rewinds the cursor if it does not match.
    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let start = self.cursor;
        let result = rule(self);
        if result.is_err() {
            self.cursor = start;
        }
        result
    }

    /// Runs a rule one nesting level deeper, failing hard past
    /// [`MAX_NESTING_DEPTH`] instead of exhausting the native stack.
    fn nested<T>(
        &mut self,
        construct: &str,
        rule: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            let mut status = ParseStatus::no_match(self.current_span());
            status.require_more_tokens = false;
            return Err(status.intercepted(format!(
                "Expression nested too deeply while parsing '{construct}'"
            )));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Runs a rule as a non-required alternative: a clean non-match becomes
    /// `None`, an intercepted status is propagated.
    fn optional<T>(
        &mut self,
        rule: impl FnOnce(&mut Self, bool) -> ParseResult<T>,
    ) -> ParseResult<Option<T>> {
        match self.attempt(|parser| rule(parser, false)) {
            Ok(value) => Ok(Some(value)),
            Err(status) if status.is_fatal() => Err(status),
            Err(_) => Ok(None),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(Token::kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn current_span(&self) -> Option<Span> {
        self.peek().map(Token::span)
    }

    /// Consumes the current token if it has the given kind.
    fn token_match(&mut self, kind: TokenKind, required: bool) -> ParseResult<&'t Token> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.cursor += 1;
                Ok(token)
            }
            _ => Err(ParseStatus::no_match(self.current_span()).required(required)),
        }
    }

    /// Consumes an identifier and returns its name.
    fn identifier(&mut self, required: bool) -> ParseResult<String> {
        let token = self.token_match(TokenKind::Identifier, required)?;
        Ok(token.text().unwrap_or_default().to_string())
    }

    fn unexpected_token(&self) -> Option<ParseError> {
        self.peek().map(|token| ParseError::UnexpectedToken {
            found: match token.text() {
                Some(text) => format!("{} '{text}'", token.kind.describe()),
                None => token.kind.describe().to_string(),
            },
            span: token.span,
        })
    }
}

pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(&tokens);
    let program = parser.match_program().map_err(ParseError::from_status)?;
    if let Some(error) = parser.unexpected_token() {
        return Err(error);
    }
    debug!(
        statements = program.body.statements.len(),
        "parsed program"
    );
    Ok(program)
}

pub fn parse(input: &str) -> Result<Program> {
    let tokens = lexer::tokenize(input)?;
    Ok(parse_tokens(tokens)?)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::ast::{
        Accessor, AddOperator, AssignTail, AssignTarget, Block, CompareOperator, Expr,
        FunctionLiteral, MulOperator, Process, TableEntry, TableKeyExpr, UnaryOperator,
    };
    use indoc::indoc;

    fn parse_source(input: &str) -> Result<Program, ParseError> {
        let tokens = lexer::tokenize(input).expect("tokenize should succeed");
        parse_tokens(tokens)
    }

    fn single(input: &str) -> Expr {
        let mut program = parse_source(input).expect("parse failed");
        assert_eq!(program.body.statements.len(), 1, "expected one statement");
        program.body.statements.remove(0)
    }

    fn num(value: f64) -> Expr {
        Expr::Number(value)
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn multiply_binds_tighter_than_add() {
        assert_eq!(
            single("1 + 2 * 3"),
            Expr::Add {
                first: Box::new(num(1.0)),
                rest: vec![(
                    AddOperator::Add,
                    Expr::Mul {
                        first: Box::new(num(2.0)),
                        rest: vec![(MulOperator::Mul, num(3.0))],
                    },
                )],
            }
        );
    }

    #[test]
    fn binary_tails_are_flat_sequences() {
        assert_eq!(
            single("2 ** 3 ** 2 // 4"),
            Expr::Mul {
                first: Box::new(num(2.0)),
                rest: vec![
                    (MulOperator::Pow, num(3.0)),
                    (MulOperator::Pow, num(2.0)),
                    (MulOperator::FloorDiv, num(4.0)),
                ],
            }
        );
        assert_eq!(
            single("a or b or c"),
            Expr::Or {
                first: Box::new(var("a")),
                rest: vec![var("b"), var("c")],
            }
        );
    }

    #[test]
    fn parses_precedence_chain_levels() {
        assert_eq!(
            single("not a and b == -c"),
            Expr::And {
                first: Box::new(Expr::Unary {
                    op: UnaryOperator::Not,
                    operand: Box::new(var("a")),
                }),
                rest: vec![Expr::Compare {
                    first: Box::new(var("b")),
                    rest: vec![(
                        CompareOperator::Equal,
                        Expr::Unary {
                            op: UnaryOperator::Negate,
                            operand: Box::new(var("c")),
                        },
                    )],
                }],
            }
        );
    }

    #[test]
    fn parses_access_chains() {
        assert_eq!(
            single("t.items[0](1, 2)"),
            Expr::Access {
                target: Box::new(var("t")),
                chain: vec![
                    Accessor::Member("items".to_string()),
                    Accessor::Index(num(0.0)),
                    Accessor::Call(vec![num(1.0), num(2.0)]),
                ],
            }
        );
    }

    #[test]
    fn parses_assignment_forms() {
        assert_eq!(
            single("x = 1"),
            Expr::Assign {
                target: AssignTarget::Variable("x".to_string()),
                tail: AssignTail::Set(Box::new(num(1.0))),
            }
        );
        assert_eq!(
            single("xs[1] += 2"),
            Expr::Assign {
                target: AssignTarget::Index {
                    container: Box::new(var("xs")),
                    index: Box::new(num(1.0)),
                },
                tail: AssignTail::AddAssign(Box::new(num(2.0))),
            }
        );
        assert_eq!(
            single("a.b.c--"),
            Expr::Assign {
                target: AssignTarget::Member {
                    container: Box::new(Expr::Access {
                        target: Box::new(var("a")),
                        chain: vec![Accessor::Member("b".to_string())],
                    }),
                    name: "c".to_string(),
                },
                tail: AssignTail::Decrement,
            }
        );
        assert_eq!(
            single("global g = 3"),
            Expr::Global {
                name: "g".to_string(),
                value: Box::new(num(3.0)),
            }
        );
    }

    #[test]
    fn rejects_invalid_assignment_target() {
        let err = parse_source("f() = 1").expect_err("expected parse failure");
        assert!(err.to_string().contains("assign-expression"), "{err}");
    }

    #[test]
    fn parses_list_and_table_literals() {
        assert_eq!(single("[]"), Expr::List(vec![]));
        assert_eq!(
            single("[1, \"two\", [3]]"),
            Expr::List(vec![
                num(1.0),
                Expr::String(Rc::from("two")),
                Expr::List(vec![num(3.0)]),
            ])
        );
        assert_eq!(
            single("{ a: 1, [k]: 2 }"),
            Expr::Table(vec![
                TableEntry {
                    key: TableKeyExpr::Name("a".to_string()),
                    value: num(1.0),
                },
                TableEntry {
                    key: TableKeyExpr::Computed(var("k")),
                    value: num(2.0),
                },
            ])
        );
    }

    #[test]
    fn list_parse_error_is_intercepted() {
        let tokens = lexer::tokenize("[1, , 3]").expect("tokenize should succeed");
        let mut parser = Parser::new(&tokens);
        let status = parser.match_program().expect_err("expected parse failure");
        assert!(status.intercept);
        assert!(
            status.message.as_deref().unwrap_or_default().contains("list-expression"),
            "{status:?}"
        );
        assert_eq!(parser.cursor(), 0);

        let err = parse_source("[1, , 3]").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::Syntax {
                message: "Expect expression after ',' while parsing 'list-expression'"
                    .to_string(),
                span: Span {
                    start: 4,
                    end: 5,
                    line: 0,
                    column: 4,
                },
            }
        );
    }

    #[test]
    fn unclosed_list_requests_more_tokens() {
        let err = parse_source("[1, 2").expect_err("expected parse failure");
        assert!(err.is_incomplete(), "{err}");
        assert!(err.to_string().contains("Expect ']'"), "{err}");
    }

    #[test]
    fn parses_if_elif_else() {
        let program = parse_source(indoc! {"
            if a { 1 } elif b { 2 } else { 3 }
        "})
        .expect("parse failed");
        assert_eq!(
            program.body.statements,
            vec![Expr::process(Process::If {
                branches: vec![
                    (var("a"), Block::new(vec![num(1.0)])),
                    (var("b"), Block::new(vec![num(2.0)])),
                ],
                otherwise: Some(Block::new(vec![num(3.0)])),
            })]
        );
    }

    #[test]
    fn parses_for_of_with_step() {
        assert_eq!(
            single("for i of 10..1..3 { continue }"),
            Expr::process(Process::ForOf {
                name: "i".to_string(),
                start: num(10.0),
                end: num(1.0),
                step: Some(num(3.0)),
                body: Block::new(vec![Expr::process(Process::Continue)]),
            })
        );
    }

    #[test]
    fn parses_for_in_with_key() {
        assert_eq!(
            single("for v, k in t { break }"),
            Expr::process(Process::ForIn {
                value: "v".to_string(),
                key: Some("k".to_string()),
                iterable: var("t"),
                body: Block::new(vec![Expr::process(Process::Break)]),
            })
        );
    }

    #[test]
    fn parses_functions_and_return() {
        let program = parse_source(indoc! {"
            func add(a, b) {
                return: a + b
            }
            inc = func(x) { return: x + 1 }
            return
        "})
        .expect("parse failed");
        let statements = program.body.statements;
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0],
            Expr::Function(FunctionLiteral {
                name: Some("add".to_string()),
                params: vec!["a".to_string(), "b".to_string()],
                body: Rc::new(Block::new(vec![Expr::process(Process::Return(Some(
                    Expr::Add {
                        first: Box::new(var("a")),
                        rest: vec![(AddOperator::Add, var("b"))],
                    }
                )))])),
            })
        );
        assert!(matches!(
            &statements[1],
            Expr::Assign {
                tail: AssignTail::Set(value),
                ..
            } if matches!(value.as_ref(), Expr::Function(FunctionLiteral { name: None, .. }))
        ));
        assert_eq!(statements[2], Expr::process(Process::Return(None)));
    }

    #[test]
    fn reports_missing_operand_after_operator() {
        let err = parse_source("1 +").expect_err("expected parse failure");
        assert!(err.is_incomplete());
        assert!(err.to_string().contains("add-expression"), "{err}");

        let err = parse_source("1 * )").expect_err("expected parse failure");
        assert!(err.to_string().contains("mul-expression"), "{err}");
        assert!(!err.is_incomplete());
    }

    #[test]
    fn reports_unexpected_trailing_token() {
        let err = parse_source("a = 1 )").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }), "{err}");
        assert!(err.to_string().contains("')'"), "{err}");
    }

    #[test]
    fn rejects_require() {
        let err = parse_source("require \"mod\"").expect_err("expected parse failure");
        assert!(err.to_string().contains("require"), "{err}");
    }

    #[test]
    fn rejects_nesting_past_the_depth_limit() {
        let levels = MAX_NESTING_DEPTH + 100;
        let sources = [
            format!("{}1{}", "(".repeat(levels), ")".repeat(levels)),
            format!("x = {}{}", "[".repeat(levels), "]".repeat(levels)),
            format!("{}1", "not ".repeat(levels)),
            "if true { ".repeat(levels),
        ];
        for source in &sources {
            let err = parse_source(source).expect_err("expected parse failure");
            assert!(err.to_string().contains("nested too deeply"), "{err}");
            assert!(!err.is_incomplete());
        }

        let shallow = format!("{}1{}", "(".repeat(30), ")".repeat(30));
        assert_eq!(single(&shallow), num(1.0));
    }

    #[test]
    fn empty_program_has_no_statements() {
        let program = parse_source("# only a comment\n").expect("parse failed");
        assert!(program.body.statements.is_empty());
    }
}
