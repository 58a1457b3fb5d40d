use std::fmt;

/// Source position of a token. Offsets are character indices with an
/// exclusive `end`; `line` and `column` are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    String,

    // Keywords
    Require,
    If,
    Else,
    Elif,
    For,
    In,
    Of,
    Loop,
    While,
    Continue,
    Break,
    Null,
    True,
    False,
    Not, // not, !
    And,
    Or,
    Func,
    Return,
    Global,

    // Operators
    Plus,        // +
    PlusPlus,    // ++
    PlusAssign,  // +=
    Minus,       // -
    MinusMinus,  // --
    MinusAssign, // -=
    Star,        // *
    Pow,         // **
    Slash,       // /
    SlashSlash,  // //
    Percent,     // %
    Greater,     // >
    GreaterEq,   // >=
    Less,        // <
    LessEq,      // <=
    Assign,      // =
    Equal,       // ==
    NotEqual,    // !=

    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Colon,    // :
    Comma,    // ,
    Dot,      // .
    DotDot,   // ..
}

impl TokenKind {
    pub fn keyword(ident: &str) -> Option<Self> {
        let kind = match ident {
            "require" => TokenKind::Require,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "elif" => TokenKind::Elif,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "of" => TokenKind::Of,
            "loop" => TokenKind::Loop,
            "while" => TokenKind::While,
            "continue" => TokenKind::Continue,
            "break" => TokenKind::Break,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "func" => TokenKind::Func,
            "return" => TokenKind::Return,
            "global" => TokenKind::Global,
            _ => return None,
        };
        Some(kind)
    }

    /// Human readable form used in parse diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Require => "'require'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Elif => "'elif'",
            TokenKind::For => "'for'",
            TokenKind::In => "'in'",
            TokenKind::Of => "'of'",
            TokenKind::Loop => "'loop'",
            TokenKind::While => "'while'",
            TokenKind::Continue => "'continue'",
            TokenKind::Break => "'break'",
            TokenKind::Null => "'null'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Not => "'not'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Func => "'func'",
            TokenKind::Return => "'return'",
            TokenKind::Global => "'global'",
            TokenKind::Plus => "'+'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::PlusAssign => "'+='",
            TokenKind::Minus => "'-'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::MinusAssign => "'-='",
            TokenKind::Star => "'*'",
            TokenKind::Pow => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::SlashSlash => "'//'",
            TokenKind::Percent => "'%'",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEq => "'>='",
            TokenKind::Less => "'<'",
            TokenKind::LessEq => "'<='",
            TokenKind::Assign => "'='",
            TokenKind::Equal => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            text: None,
            span,
        }
    }

    pub fn with_text(kind: TokenKind, text: String, span: Span) -> Self {
        Self {
            kind,
            text: Some(text),
            span,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
