//! Syntax tree shared by both execution backends.
//!
//! The parser builds these nodes once; the interpreter walks them directly
//! while the compiler lowers them into a closure tree. Binary operator levels
//! are stored flat as a first operand plus an ordered list of
//! `(operator, operand)` tails and are folded left to right.

use std::rc::Rc;

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub body: Block,
}

/// Sequence of statements evaluated in order until a control-flow signal.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Block {
    pub statements: Vec<Expr>,
}

impl Block {
    pub fn new(statements: Vec<Expr>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Variable(String),
    List(Vec<Expr>),
    Table(Vec<TableEntry>),
    Function(FunctionLiteral),
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Or {
        first: Box<Expr>,
        rest: Vec<Expr>,
    },
    And {
        first: Box<Expr>,
        rest: Vec<Expr>,
    },
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOperator, Expr)>,
    },
    Add {
        first: Box<Expr>,
        rest: Vec<(AddOperator, Expr)>,
    },
    Mul {
        first: Box<Expr>,
        rest: Vec<(MulOperator, Expr)>,
    },
    Access {
        target: Box<Expr>,
        chain: Vec<Accessor>,
    },
    Assign {
        target: AssignTarget,
        tail: AssignTail,
    },
    Global {
        name: String,
        value: Box<Expr>,
    },
    Process(Box<Process>),
}

impl Expr {
    pub fn process(process: Process) -> Self {
        Expr::Process(Box::new(process))
    }
}

/// Statements that can signal non-local control flow.
#[derive(Debug, PartialEq, Clone)]
pub enum Process {
    If {
        branches: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Loop {
        body: Block,
    },
    ForIn {
        value: String,
        key: Option<String>,
        iterable: Expr,
        body: Block,
    },
    ForOf {
        name: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Block,
    },
    Return(Option<Expr>),
    Continue,
    Break,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Shared with every function value created from this literal.
    pub body: Rc<Block>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TableEntry {
    pub key: TableKeyExpr,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TableKeyExpr {
    Name(String),
    Computed(Expr),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Accessor {
    Index(Expr),
    Member(String),
    Call(Vec<Expr>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum AssignTarget {
    Variable(String),
    Index { container: Box<Expr>, index: Box<Expr> },
    Member { container: Box<Expr>, name: String },
}

#[derive(Debug, PartialEq, Clone)]
pub enum AssignTail {
    Set(Box<Expr>),
    AddAssign(Box<Expr>),
    SubAssign(Box<Expr>),
    Increment,
    Decrement,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddOperator {
    Add,
    Sub,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MulOperator {
    Mul,
    Div,
    Pow,
    FloorDiv,
    Mod,
}
