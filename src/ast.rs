/// A parsed cinder program. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub body: Vec<Stmt>,
}

/// One `var` list entry. Addresses are assigned later, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var a, b;`
    Variable { declarations: Vec<VarDecl> },

    /// `read(a);`
    Read { target: String },

    /// `write(expr);`
    Write { value: Expr },

    /// `do begin ... end while (expr);` — post-test, body runs at least once.
    DoWhile { body: Vec<Stmt>, condition: Expr },

    /// `a := expr;`
    Assignment { target: String, value: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        operator: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Identifier(String),
    Number(i64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::NotEq => "!=",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::GtEq => ">=",
            BinOp::LtEq => "<=",
        };
        write!(f, "{}", s)
    }
}
