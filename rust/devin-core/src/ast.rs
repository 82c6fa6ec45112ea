//! The Devin concrete syntax tree.
//!
//! Nodes carry a [`Span`] and, on expressions, an `Option<Type>` populated by
//! the type checker (`None` until a program has been through `check`).

use crate::span::Span;
use crate::types::Type;
use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};

/// A complete Devin program: an ordered list of top-level declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Devin {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Declaration {
    Variable(VariableDecl),
    Function(FunctionDecl),
}

impl Declaration {
    pub fn span(&self) -> Span {
        match self {
            Declaration::Variable(v) => v.span,
            Declaration::Function(f) => f.span,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Variable(v) => &v.name,
            Declaration::Function(f) => &f.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub annotation: Option<TypeExpr>,
    pub initializer: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub is_ref: bool,
    pub annotation: Option<TypeExpr>,
    pub span: Span,
}

/// A written type annotation, as parsed — not yet resolved against the
/// checker's recognized-types table. `Named` holds whatever identifier was
/// written; the checker decides whether it names a real type or becomes an
/// `Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named(String, Span),
    Array(Box<TypeExpr>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named(_, s) => *s,
            TypeExpr::Array(_, s) => *s,
        }
    }
}

// ── Statements ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Box<Expr>, Span),
    If(Box<Expr>, Box<Stmt>, Span),
    IfElse(Box<Expr>, Box<Stmt>, Box<Stmt>, Span),
    While(Box<Expr>, Box<Stmt>, Span),
    DoWhile(Box<Stmt>, Box<Expr>, Span),
    Return(Option<Box<Expr>>, Span),
    Assert(Box<Expr>, Span),
    Block(Vec<BlockItem>, Span),
    Declaration(Box<Declaration>, Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(_, s)
            | Stmt::If(_, _, s)
            | Stmt::IfElse(_, _, _, s)
            | Stmt::While(_, _, s)
            | Stmt::DoWhile(_, _, s)
            | Stmt::Return(_, s)
            | Stmt::Assert(_, s)
            | Stmt::Block(_, s)
            | Stmt::Declaration(_, s) => *s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockItem {
    Declaration(Declaration),
    Statement(Stmt),
}

// ── Expressions ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    IntegerLit(BigInt, Span),
    RationalLit(BigRational, Span),
    BoolLit(bool, Span),
    Variable(VariableExpr),
    Array(ArrayExpr),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    Access(AccessExpr),
    Parenthesized(Box<Expr>, Span),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableExpr {
    pub name: String,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: String,
    pub callee_span: Span,
    pub args: Vec<Expr>,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Len,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

impl AssignOp {
    /// The arithmetic operator the compound form desugars to, if any.
    pub fn as_binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::RemAssign => Some(BinaryOp::Rem),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignExpr {
    pub op: AssignOp,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntegerLit(_, s) | Expr::RationalLit(_, s) | Expr::BoolLit(_, s) => *s,
            Expr::Variable(e) => e.span,
            Expr::Array(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::Access(e) => e.span,
            Expr::Parenthesized(_, s) => *s,
        }
    }

    /// The type the checker assigned this node, or `None` if the tree has
    /// not been checked (or this is a literal, whose type is syntactic and
    /// never needs an out-of-band slot).
    pub fn ty(&self) -> Option<Type> {
        match self {
            Expr::IntegerLit(_, _) => Some(Type::Int),
            Expr::RationalLit(_, _) => Some(Type::Float),
            Expr::BoolLit(_, _) => Some(Type::Bool),
            Expr::Variable(e) => e.ty.clone(),
            Expr::Array(e) => e.ty.clone(),
            Expr::Call(e) => e.ty.clone(),
            Expr::Unary(e) => e.ty.clone(),
            Expr::Binary(e) => e.ty.clone(),
            Expr::Assign(e) => e.ty.clone(),
            Expr::Access(e) => e.ty.clone(),
            Expr::Parenthesized(inner, _) => inner.ty(),
        }
    }

    /// Whether this expression denotes a storage slot (variable or array
    /// access chain) rather than a transient value (spec glossary: l-value).
    pub fn is_lvalue(&self) -> bool {
        match self {
            Expr::Variable(_) => true,
            Expr::Access(_) => true,
            Expr::Parenthesized(inner, _) => inner.is_lvalue(),
            _ => false,
        }
    }
}
