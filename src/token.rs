#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(i64),

    // Keywords
    Program,
    Begin,
    End,
    Var,
    Read,
    Write,
    Do,
    While,

    // Operators
    Assign, // :=
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Punctuation
    Semicolon,
    Comma,
    LParen,
    RParen,

    // Identifier (variable or program name)
    Ident(String),

    // Special
    Eof,
}

impl Token {
    /// Returns true if this token can join two operands in an expression.
    ///
    /// All binary operators share a single precedence level.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Program => write!(f, "program"),
            Token::Begin => write!(f, "begin"),
            Token::End => write!(f, "end"),
            Token::Var => write!(f, "var"),
            Token::Read => write!(f, "read"),
            Token::Write => write!(f, "write"),
            Token::Do => write!(f, "do"),
            Token::While => write!(f, "while"),
            Token::Assign => write!(f, ":="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Eq => write!(f, "="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Eof => write!(f, "EOF"),
        }
    }
}
