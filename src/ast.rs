use std::fmt;

use crate::error::SourceLocation;

/// A parsed program. Each collection keeps source order, which is execution order.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub begin_blocks: Vec<Action>,
    pub main_blocks: Vec<Action>,
    pub end_blocks: Vec<Action>,
    pub functions: Vec<FunctionDef>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An optionally guarded block. BEGIN and END actions never carry a guard.
#[derive(Debug, Clone)]
pub struct Action {
    pub guard: Option<Expr>,
    pub body: Block,
}

/// User-defined function
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub location: SourceLocation,
}

/// A block of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub location: SourceLocation,
}

impl Block {
    pub fn new(statements: Vec<Stmt>, location: SourceLocation) -> Self {
        Self {
            statements,
            location,
        }
    }
}

/// Statement types
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression statement; `print`, `getline`, `next` and `exit` land here as calls.
    Expr(Expr),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        location: SourceLocation,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
        location: SourceLocation,
    },

    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
        location: SourceLocation,
    },

    /// C-style for loop; every clause is optional.
    For {
        init: Option<Expr>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
        location: SourceLocation,
    },

    /// `for (var in array)`. The iterable is kept as an expression so that a
    /// non-array target can be reported at run time.
    ForIn {
        var: String,
        iterable: Expr,
        body: Box<Stmt>,
        location: SourceLocation,
    },

    Block(Block),

    Break { location: SourceLocation },

    Continue { location: SourceLocation },

    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },

    /// `delete arr` or `delete arr[index]`
    Delete {
        target: Expr,
        location: SourceLocation,
    },

    /// Lone `;`
    Empty,
}

/// Expression types
#[derive(Debug, Clone)]
pub enum Expr {
    /// Numeric literal, kept as text
    Number(String, SourceLocation),

    /// String literal
    String(String, SourceLocation),

    /// Pattern literal: `/re/` or a backtick-delimited pattern
    Regex(String, SourceLocation),

    /// Variable reference; an index makes it an array element access
    Var {
        name: String,
        index: Option<Box<Expr>>,
        location: SourceLocation,
    },

    /// Field access: $expr
    Field(Box<Expr>, SourceLocation),

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        location: SourceLocation,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },

    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
        location: SourceLocation,
    },

    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        location: SourceLocation,
    },

    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Number(_, loc)
            | Expr::String(_, loc)
            | Expr::Regex(_, loc)
            | Expr::Field(_, loc)
            | Expr::Var { location: loc, .. }
            | Expr::Binary { location: loc, .. }
            | Expr::Unary { location: loc, .. }
            | Expr::Assign { location: loc, .. }
            | Expr::Ternary { location: loc, .. }
            | Expr::Call { location: loc, .. } => *loc,
        }
    }

    /// Shorthand for an unindexed variable reference.
    pub fn var(name: impl Into<String>, location: SourceLocation) -> Self {
        Expr::Var {
            name: name.into(),
            index: None,
            location,
        }
    }

    /// Whether this expression can be written to (a variable, element or field).
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Var { .. } | Expr::Field(..))
    }
}

/// Renders an expression back to source-like text for error messages.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n, _) => write!(f, "{n}"),
            Expr::String(s, _) => write!(f, "\"{s}\""),
            Expr::Regex(r, _) => write!(f, "/{r}/"),
            Expr::Var {
                name, index: None, ..
            } => write!(f, "{name}"),
            Expr::Var {
                name,
                index: Some(index),
                ..
            } => write!(f, "{name}[{index}]"),
            Expr::Field(inner, _) => write!(f, "${inner}"),
            Expr::Binary {
                left, op, right, ..
            } => match op {
                BinaryOp::Concat => write!(f, "({left} {right})"),
                _ => write!(f, "({left} {} {right})", op.symbol()),
            },
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::PostIncrement => write!(f, "{operand}++"),
                UnaryOp::PostDecrement => write!(f, "{operand}--"),
                _ => write!(f, "{}{operand}", op.symbol()),
            },
            Expr::Assign {
                target, op, value, ..
            } => write!(f, "{target} {} {value}", op.symbol()),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => write!(f, "({condition} ? {then_expr} : {else_expr})"),
            Expr::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Logical
    And,
    Or,

    // Regex
    Match,
    NotMatch,

    /// `key in array`
    In,

    /// Implicit concatenation by adjacency
    Concat,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Match => "~",
            BinaryOp::NotMatch => "!~",
            BinaryOp::In => "in",
            BinaryOp::Concat => " ",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,           // !x
    Neg,           // -x
    Pos,           // +x
    PreIncrement,  // ++x
    PreDecrement,  // --x
    PostIncrement, // x++
    PostDecrement, // x--
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,    // =
    AddAssign, // +=
    SubAssign, // -=
    MulAssign, // *=
    DivAssign, // /=
    ModAssign, // %=
    PowAssign, // ^=
}

impl AssignOp {
    /// The arithmetic operator a compound assignment applies, if any.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::ModAssign => Some(BinaryOp::Mod),
            AssignOp::PowAssign => Some(BinaryOp::Pow),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::PowAssign => "^=",
        }
    }
}
