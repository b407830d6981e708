//! Abstract Syntax Tree for fragment expressions

use serde::{Deserialize, Serialize};

/// A fragment expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal constant
    Literal(Literal),

    /// A variable reference
    Name(String),

    /// A list or tuple display
    List(Vec<Expr>),

    /// Unary arithmetic (`-x`, `+x`)
    Unary(UnaryOp, Box<Expr>),

    /// Arithmetic chain, folded left to right: `a + b - c` holds `a` and
    /// `[(+, b), (-, c)]`. Kept flat so long chains do not nest.
    Binary(Box<Expr>, Vec<(BinaryOp, Expr)>),

    /// A comparison
    Compare(Box<Expr>, CompareOp, Box<Expr>),

    /// Logical AND over two or more operands (short-circuit)
    And(Vec<Expr>),

    /// Logical OR over two or more operands (short-circuit)
    Or(Vec<Expr>),

    /// Logical NOT
    Not(Box<Expr>),

    /// Subscript (`v[i]`)
    Index(Box<Expr>, Box<Expr>),

    /// A built-in function call
    Call(FunctionCall),
}

impl Expr {
    pub fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary(Box::new(lhs), vec![(op, rhs)])
    }

    pub fn compare(lhs: Expr, op: CompareOp, rhs: Expr) -> Self {
        Expr::Compare(Box::new(lhs), op, Box::new(rhs))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(vec![left, right])
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(vec![left, right])
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary(op, Box::new(expr))
    }

    pub fn index(target: Expr, index: Expr) -> Self {
        Expr::Index(Box::new(target), Box::new(index))
    }

    pub fn name(name: &str) -> Self {
        Expr::Name(name.to_string())
    }

    pub fn int(i: i64) -> Self {
        Expr::Literal(Literal::Int(i))
    }
}

/// Literal constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Pos,
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition, string and list concatenation (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication, string and list repetition (*)
    Mul,
    /// True division (/)
    Div,
    /// Floor division (//)
    FloorDiv,
    /// Modulo, sign follows the divisor (%)
    Mod,
    /// Exponentiation (**)
    Pow,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    /// Membership (`in`)
    In,
    /// Negated membership (`not in`)
    NotIn,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        }
    }
}

/// A function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// Arguments
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}
