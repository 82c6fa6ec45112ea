//! Two-pass type checker for Devin.
//!
//! Pass 1 walks a declaration list and installs every function's signature
//! (so mutually recursive and forward-referenced functions resolve). Pass 2
//! walks the same list again and checks each declaration's body, consulting
//! the signatures Pass 1 already installed rather than re-resolving type
//! annotations a second time (which would double-report `UnknownType`).
//!
//! Blocks get the same treatment inline: nested function declarations are
//! hoisted across the whole block before any statement runs, the way Rust's
//! own `fn` items are hoisted inside a block while `let` bindings are not.

use devin_core::ast::*;
use devin_core::{Span, Type};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Overload {
    pub params: Vec<Type>,
    pub return_type: Type,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeDiagnostic {
    #[error("unknown type '{name}'")]
    UnknownType { name: String, span: Span },
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String, span: Span },
    #[error("no overload of '{name}' accepts argument types ({args})")]
    UnknownFunction { name: String, args: String, span: Span },
    #[error("function '{name}' redefined with a structurally identical parameter list")]
    FunctionRedefinition { name: String, span: Span },
    #[error("operator '{op}' is not defined for operand type {operand}")]
    InvalidUnary { op: &'static str, operand: String, span: Span },
    #[error("operator '{op}' is not defined for operand types {left} and {right}")]
    InvalidBinary {
        op: &'static str,
        left: String,
        right: String,
        span: Span,
    },
    #[error("'{op}' is not defined for target type {target} and value type {value}")]
    InvalidAssign {
        op: &'static str,
        target: String,
        value: String,
        span: Span,
    },
    #[error("expected type {expected}, found {found}")]
    InvalidType {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("return value has type {found}, expected {expected}")]
    InvalidReturnType {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("a return value is required here")]
    MissingReturnValue { span: Span },
    #[error("not every path through this function reaches a return")]
    MissingReturnPath { span: Span },
    #[error("expression statement has no effect")]
    NoSideEffects { span: Span },
}

impl TypeDiagnostic {
    pub fn span(&self) -> Span {
        match self {
            TypeDiagnostic::UnknownType { span, .. }
            | TypeDiagnostic::UnknownVariable { span, .. }
            | TypeDiagnostic::UnknownFunction { span, .. }
            | TypeDiagnostic::FunctionRedefinition { span, .. }
            | TypeDiagnostic::InvalidUnary { span, .. }
            | TypeDiagnostic::InvalidBinary { span, .. }
            | TypeDiagnostic::InvalidAssign { span, .. }
            | TypeDiagnostic::InvalidType { span, .. }
            | TypeDiagnostic::InvalidReturnType { span, .. }
            | TypeDiagnostic::MissingReturnValue { span }
            | TypeDiagnostic::MissingReturnPath { span }
            | TypeDiagnostic::NoSideEffects { span } => *span,
        }
    }
}

fn unary_op_str(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::Not => "not",
        UnaryOp::Len => "len",
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Xor => "xor",
    }
}

fn assign_op_str(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::RemAssign => "%=",
    }
}

fn is_pure(e: &Expr) -> bool {
    match e {
        Expr::IntegerLit(..) | Expr::RationalLit(..) | Expr::BoolLit(..) | Expr::Variable(_) => {
            true
        }
        Expr::Array(a) => a.elements.iter().all(is_pure),
        Expr::Call(_) => false,
        Expr::Unary(u) => is_pure(&u.operand),
        Expr::Binary(b) => is_pure(&b.left) && is_pure(&b.right),
        Expr::Assign(_) => false,
        Expr::Access(a) => is_pure(&a.array) && is_pure(&a.index),
        Expr::Parenthesized(inner, _) => is_pure(inner),
    }
}

fn format_arg_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

struct CheckerState {
    var_scopes: Vec<HashMap<String, Type>>,
    fn_scopes: Vec<HashMap<String, Vec<Overload>>>,
    resolved_signatures: HashMap<Span, Overload>,
    diagnostics: Vec<TypeDiagnostic>,
}

impl CheckerState {
    fn new() -> Self {
        Self {
            var_scopes: vec![HashMap::new()],
            fn_scopes: vec![HashMap::new()],
            resolved_signatures: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn push_var_scope(&mut self) {
        self.var_scopes.push(HashMap::new());
    }

    fn pop_var_scope(&mut self) {
        self.var_scopes.pop();
    }

    fn define_var(&mut self, name: &str, ty: Type) {
        self.var_scopes.last_mut().unwrap().insert(name.to_string(), ty);
    }

    fn lookup_var(&self, name: &str) -> Option<Type> {
        self.var_scopes.iter().rev().find_map(|scope| scope.get(name).cloned())
    }

    fn push_fn_scope(&mut self) {
        self.fn_scopes.push(HashMap::new());
    }

    fn pop_fn_scope(&mut self) {
        self.fn_scopes.pop();
    }

    fn define_function(&mut self, name: &str, overload: Overload, span: Span) {
        let scope = self.fn_scopes.last_mut().unwrap();
        let overloads = scope.entry(name.to_string()).or_default();
        let duplicate = overloads.iter().any(|o| {
            o.params.len() == overload.params.len()
                && o.params.iter().zip(&overload.params).all(|(a, b)| a.is_compatible(b))
        });
        if duplicate {
            self.diagnostics.push(TypeDiagnostic::FunctionRedefinition {
                name: name.to_string(),
                span,
            });
        } else {
            overloads.push(overload);
        }
    }

    fn install_placeholder_overload(&mut self, name: &str, params: Vec<Type>) {
        let scope = self.fn_scopes.last_mut().unwrap();
        scope.entry(name.to_string()).or_default().push(Overload {
            params,
            return_type: Type::Error,
        });
    }

    fn lookup_fn(&self, name: &str, arg_types: &[Type]) -> Option<Overload> {
        for scope in self.fn_scopes.iter().rev() {
            if let Some(overloads) = scope.get(name) {
                for ov in overloads {
                    if ov.params.len() == arg_types.len()
                        && ov.params.iter().zip(arg_types).all(|(p, a)| p.is_compatible(a))
                    {
                        return Some(ov.clone());
                    }
                }
            }
        }
        None
    }

    fn resolve_type_expr(&mut self, te: &TypeExpr) -> Type {
        match te {
            TypeExpr::Named(name, span) => match name.as_str() {
                "Unit" => Type::Unit,
                "Bool" => Type::Bool,
                "Int" => Type::Int,
                "Float" => Type::Float,
                other => {
                    self.diagnostics.push(TypeDiagnostic::UnknownType {
                        name: other.to_string(),
                        span: *span,
                    });
                    Type::Unknown(other.to_string())
                }
            },
            TypeExpr::Array(inner, _) => Type::array(self.resolve_type_expr(inner)),
        }
    }

    fn resolve_param_type(&mut self, p: &Param) -> Type {
        match &p.annotation {
            Some(te) => self.resolve_type_expr(te),
            None => Type::Unknown("_".to_string()),
        }
    }

    // ── Pass 1 ──

    fn install_function_signature(&mut self, f: &FunctionDecl) {
        let params: Vec<Type> = f.parameters.iter().map(|p| self.resolve_param_type(p)).collect();
        let return_type = f
            .return_type
            .as_ref()
            .map(|t| self.resolve_type_expr(t))
            .unwrap_or_else(|| Type::Unknown("_".to_string()));
        let overload = Overload { params, return_type };
        self.resolved_signatures.insert(f.span, overload.clone());
        self.define_function(&f.name, overload, f.span);
    }

    // ── Pass 2 ──

    fn check_declarations(&mut self, decls: &mut [Declaration]) {
        for decl in decls.iter() {
            if let Declaration::Function(f) = decl {
                self.install_function_signature(f);
            }
        }
        for decl in decls.iter_mut() {
            match decl {
                Declaration::Variable(v) => self.check_variable_decl(v),
                Declaration::Function(f) => self.check_function_body(f),
            }
        }
    }

    /// Checks a function body with its own params/locals visible but cut off
    /// from whatever block it is lexically nested in's *variables*: Devin
    /// functions are not closures over variables (the function table entry
    /// carries no captured environment), so a nested `def` must not see its
    /// enclosing function's locals even though the checker happens to still
    /// have them on the var scope stack at this point. Function *names* are a
    /// different matter: `check_block` has already hoisted this function's
    /// own signature and its local siblings into the current top of
    /// `fn_scopes`, and that scope stays live here (only a fresh scope is
    /// pushed on top, the same as `check_block` does for a nested block) so
    /// the body can call itself or a sibling recursively.
    fn check_function_body(&mut self, f: &mut FunctionDecl) {
        let overload = self
            .resolved_signatures
            .get(&f.span)
            .cloned()
            .expect("pass 1 installs every function's signature before pass 2 checks its body");
        let saved_vars = std::mem::replace(&mut self.var_scopes, vec![self.var_scopes[0].clone()]);
        self.push_var_scope();
        self.push_fn_scope();
        for (param, ty) in f.parameters.iter().zip(&overload.params) {
            self.define_var(&param.name, ty.clone());
        }
        let always_returns = self.check_statement(&mut f.body, &overload.return_type);
        if !overload.return_type.is_compatible(&Type::Unit) && !always_returns {
            self.diagnostics.push(TypeDiagnostic::MissingReturnPath { span: f.span });
        }
        self.pop_fn_scope();
        self.pop_var_scope();
        self.var_scopes = saved_vars;
    }

    fn check_variable_decl(&mut self, v: &mut VariableDecl) {
        let expected = v.annotation.as_ref().map(|te| self.resolve_type_expr(te));
        let value_ty = self.check_expr(&mut v.initializer, expected.as_ref());
        let bound_ty = match &expected {
            Some(t) => {
                if !value_ty.is_error() && !t.is_compatible(&value_ty) {
                    self.diagnostics.push(TypeDiagnostic::InvalidType {
                        expected: t.to_string(),
                        found: value_ty.to_string(),
                        span: v.initializer.span(),
                    });
                }
                t.clone()
            }
            None => value_ty,
        };
        self.define_var(&v.name, bound_ty);
    }

    fn check_predicate(&mut self, e: &mut Expr) {
        let t = self.check_expr(e, None);
        if !t.is_error() && !t.is_compatible(&Type::Bool) {
            self.diagnostics.push(TypeDiagnostic::InvalidType {
                expected: "Bool".to_string(),
                found: t.to_string(),
                span: e.span(),
            });
        }
    }

    /// Checks a statement; returns whether it structurally always returns.
    fn check_statement(&mut self, stmt: &mut Stmt, expected_return: &Type) -> bool {
        match stmt {
            Stmt::Expr(e, span) => {
                let t = self.check_expr(e, None);
                if !t.is_error() && is_pure(e) {
                    self.diagnostics.push(TypeDiagnostic::NoSideEffects { span: *span });
                }
                false
            }
            Stmt::If(cond, body, _) => {
                self.check_predicate(cond);
                self.check_statement(body, expected_return);
                false
            }
            Stmt::IfElse(cond, then_branch, else_branch, _) => {
                self.check_predicate(cond);
                let then_returns = self.check_statement(then_branch, expected_return);
                let else_returns = self.check_statement(else_branch, expected_return);
                then_returns && else_returns
            }
            Stmt::While(cond, body, _) => {
                self.check_predicate(cond);
                self.check_statement(body, expected_return);
                false
            }
            Stmt::DoWhile(body, cond, _) => {
                self.check_statement(body, expected_return);
                self.check_predicate(cond);
                false
            }
            Stmt::Return(value, span) => {
                match value {
                    Some(v) => {
                        let t = self.check_expr(v, Some(expected_return));
                        if !t.is_error() && !expected_return.is_compatible(&t) {
                            self.diagnostics.push(TypeDiagnostic::InvalidReturnType {
                                expected: expected_return.to_string(),
                                found: t.to_string(),
                                span: *span,
                            });
                        }
                    }
                    None => {
                        if !expected_return.is_compatible(&Type::Unit) {
                            self.diagnostics.push(TypeDiagnostic::MissingReturnValue { span: *span });
                        }
                    }
                }
                true
            }
            Stmt::Assert(e, _) => {
                self.check_predicate(e);
                false
            }
            Stmt::Block(items, _) => self.check_block(items, expected_return),
            Stmt::Declaration(decl, _) => {
                match decl.as_mut() {
                    Declaration::Variable(v) => self.check_variable_decl(v),
                    Declaration::Function(f) => {
                        self.install_function_signature(f);
                        self.check_function_body(f);
                    }
                }
                false
            }
        }
    }

    fn check_block(&mut self, items: &mut [BlockItem], expected_return: &Type) -> bool {
        self.push_var_scope();
        self.push_fn_scope();
        for item in items.iter() {
            if let BlockItem::Declaration(Declaration::Function(f)) = item {
                self.install_function_signature(f);
            }
        }
        let mut always_returns = false;
        for item in items.iter_mut() {
            let returns = match item {
                BlockItem::Declaration(Declaration::Variable(v)) => {
                    self.check_variable_decl(v);
                    false
                }
                BlockItem::Declaration(Declaration::Function(f)) => {
                    self.check_function_body(f);
                    false
                }
                BlockItem::Statement(s) => self.check_statement(s, expected_return),
            };
            always_returns |= returns;
        }
        self.pop_fn_scope();
        self.pop_var_scope();
        always_returns
    }

    /// Checks an expression bottom-up, populating its `ty` field, and
    /// returns the synthesized type. `expected` only ever feeds the element
    /// type of an otherwise-ambiguous empty array literal.
    fn check_expr(&mut self, expr: &mut Expr, expected: Option<&Type>) -> Type {
        match expr {
            Expr::IntegerLit(..) => Type::Int,
            Expr::RationalLit(..) => Type::Float,
            Expr::BoolLit(..) => Type::Bool,
            Expr::Variable(v) => {
                let ty = match self.lookup_var(&v.name) {
                    Some(t) => t,
                    None => {
                        self.diagnostics.push(TypeDiagnostic::UnknownVariable {
                            name: v.name.clone(),
                            span: v.span,
                        });
                        Type::Error
                    }
                };
                v.ty = Some(ty.clone());
                ty
            }
            Expr::Array(a) => {
                let mut elem_types = Vec::with_capacity(a.elements.len());
                for e in a.elements.iter_mut() {
                    elem_types.push(self.check_expr(e, None));
                }
                let ty = if elem_types.is_empty() {
                    let elem = expected
                        .and_then(|t| t.array_element())
                        .unwrap_or_else(|| Type::Unknown("_".to_string()));
                    Type::array(elem)
                } else {
                    let mut unified = elem_types[0].clone();
                    let mut tainted = unified.is_error();
                    for (t, e) in elem_types.iter().zip(a.elements.iter()).skip(1) {
                        if t.is_error() {
                            tainted = true;
                        } else if !unified.is_compatible(t) {
                            self.diagnostics.push(TypeDiagnostic::InvalidType {
                                expected: unified.to_string(),
                                found: t.to_string(),
                                span: e.span(),
                            });
                            tainted = true;
                        } else if matches!(unified, Type::Unknown(_)) {
                            unified = t.clone();
                        }
                    }
                    Type::array(if tainted { Type::Error } else { unified })
                };
                a.ty = Some(ty.clone());
                ty
            }
            Expr::Call(c) => {
                let mut arg_types = Vec::with_capacity(c.args.len());
                let mut any_error = false;
                for arg in c.args.iter_mut() {
                    let t = self.check_expr(arg, None);
                    if t.is_error() {
                        any_error = true;
                    }
                    arg_types.push(t);
                }
                let ty = if any_error {
                    Type::Error
                } else if let Some(ov) = self.lookup_fn(&c.callee, &arg_types) {
                    ov.return_type
                } else {
                    self.diagnostics.push(TypeDiagnostic::UnknownFunction {
                        name: c.callee.clone(),
                        args: format_arg_types(&arg_types),
                        span: c.callee_span,
                    });
                    self.install_placeholder_overload(&c.callee, arg_types);
                    Type::Error
                };
                c.ty = Some(ty.clone());
                ty
            }
            Expr::Unary(u) => {
                let operand_ty = self.check_expr(&mut u.operand, None);
                let ty = if operand_ty.is_error() {
                    Type::Error
                } else if matches!(operand_ty, Type::Unknown(_)) {
                    operand_ty.clone()
                } else {
                    match (u.op, &operand_ty) {
                        (UnaryOp::Plus, Type::Int) | (UnaryOp::Minus, Type::Int) => Type::Int,
                        (UnaryOp::Plus, Type::Float) | (UnaryOp::Minus, Type::Float) => Type::Float,
                        (UnaryOp::Not, Type::Bool) => Type::Bool,
                        (UnaryOp::Len, Type::Array(_)) => Type::Int,
                        _ => {
                            self.diagnostics.push(TypeDiagnostic::InvalidUnary {
                                op: unary_op_str(u.op),
                                operand: operand_ty.to_string(),
                                span: u.span,
                            });
                            Type::Error
                        }
                    }
                };
                u.ty = Some(ty.clone());
                ty
            }
            Expr::Binary(b) => {
                let lt = self.check_expr(&mut b.left, None);
                let rt = self.check_expr(&mut b.right, None);
                let ty = self.check_binary_op(b.op, &lt, &rt, b.span);
                b.ty = Some(ty.clone());
                ty
            }
            Expr::Assign(a) => {
                let is_lvalue = a.target.is_lvalue();
                let target_ty = self.check_expr(&mut a.target, None);
                let value_ty = self.check_expr(&mut a.value, None);
                let ty = if !is_lvalue {
                    self.diagnostics.push(TypeDiagnostic::InvalidAssign {
                        op: assign_op_str(a.op),
                        target: target_ty.to_string(),
                        value: value_ty.to_string(),
                        span: a.span,
                    });
                    Type::Error
                } else if target_ty.is_error() || value_ty.is_error() {
                    Type::Error
                } else {
                    let ok = match a.op {
                        AssignOp::Assign => target_ty.is_compatible(&value_ty),
                        _ => {
                            target_ty.is_compatible(&value_ty)
                                && matches!(target_ty, Type::Int | Type::Float | Type::Unknown(_))
                        }
                    };
                    if ok {
                        value_ty.clone()
                    } else {
                        self.diagnostics.push(TypeDiagnostic::InvalidAssign {
                            op: assign_op_str(a.op),
                            target: target_ty.to_string(),
                            value: value_ty.to_string(),
                            span: a.span,
                        });
                        Type::Error
                    }
                };
                a.ty = Some(ty.clone());
                ty
            }
            Expr::Access(ac) => {
                let arr_ty = self.check_expr(&mut ac.array, None);
                let idx_ty = self.check_expr(&mut ac.index, None);
                let ty = if arr_ty.is_error() || idx_ty.is_error() {
                    Type::Error
                } else if let Some(elem) = arr_ty.array_element() {
                    if idx_ty.is_compatible(&Type::Int) {
                        elem
                    } else {
                        self.diagnostics.push(TypeDiagnostic::InvalidType {
                            expected: "Int".to_string(),
                            found: idx_ty.to_string(),
                            span: ac.index.span(),
                        });
                        Type::Error
                    }
                } else {
                    self.diagnostics.push(TypeDiagnostic::InvalidType {
                        expected: "Array _".to_string(),
                        found: arr_ty.to_string(),
                        span: ac.array.span(),
                    });
                    Type::Error
                };
                ac.ty = Some(ty.clone());
                ty
            }
            Expr::Parenthesized(inner, _) => self.check_expr(inner, expected),
        }
    }

    /// `Unknown` (an unannotated parameter's placeholder type) is universally
    /// compatible, but only the arithmetic operators' *result* type actually
    /// depends on which concrete type it stands in for — `==`/`!=`, the
    /// relational group, and `and`/`or`/`xor` always synthesize `Bool`
    /// regardless of what their operands' types turn out to be, so `Unknown`
    /// is handled per arm rather than short-circuited up front.
    fn check_binary_op(&mut self, op: BinaryOp, lt: &Type, rt: &Type, span: Span) -> Type {
        if lt.is_error() || rt.is_error() {
            return Type::Error;
        }
        use BinaryOp::*;
        let result = match op {
            Add | Sub | Mul | Div | Rem => {
                if matches!(lt, Type::Unknown(_)) {
                    Some(lt.clone())
                } else if matches!(rt, Type::Unknown(_)) {
                    Some(rt.clone())
                } else {
                    match (lt, rt) {
                        (Type::Int, Type::Int) => Some(Type::Int),
                        (Type::Float, Type::Float) => Some(Type::Float),
                        (Type::Array(elem), Type::Int) if op == Mul => Some(Type::Array(elem.clone())),
                        (Type::Int, Type::Array(elem)) if op == Mul => Some(Type::Array(elem.clone())),
                        _ => None,
                    }
                }
            }
            Eq | Ne => {
                if lt.is_compatible(rt) {
                    Some(Type::Bool)
                } else {
                    None
                }
            }
            Lt | Le | Gt | Ge => match (lt, rt) {
                (Type::Int, Type::Int) | (Type::Float, Type::Float) => Some(Type::Bool),
                (Type::Unknown(_), _) | (_, Type::Unknown(_)) => Some(Type::Bool),
                _ => None,
            },
            And | Or | Xor => match (lt, rt) {
                (Type::Bool, Type::Bool) => Some(Type::Bool),
                (Type::Unknown(_), _) | (_, Type::Unknown(_)) => Some(Type::Bool),
                _ => None,
            },
        };
        match result {
            Some(t) => t,
            None => {
                self.diagnostics.push(TypeDiagnostic::InvalidBinary {
                    op: binary_op_str(op),
                    left: lt.to_string(),
                    right: rt.to_string(),
                    span,
                });
                Type::Error
            }
        }
    }
}

/// Checks a whole program, populating every expression's `ty` field and
/// collecting diagnostics, per the Core API in spec §6.
pub fn check(mut ast: Devin) -> (Devin, Vec<TypeDiagnostic>) {
    let mut state = CheckerState::new();
    state.check_declarations(&mut ast.declarations);
    (ast, state.diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check_src(src: &str) -> (Devin, Vec<TypeDiagnostic>) {
        let (ast, errors) = parse(src);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        check(ast.unwrap())
    }

    #[test]
    fn well_typed_program_has_no_diagnostics() {
        let (_, diags) = check_src("def main() { var x = 1; assert x == 1; }");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn unknown_variable_is_reported_once() {
        let (_, diags) = check_src("def main() { assert y == 1; }");
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], TypeDiagnostic::UnknownVariable { .. }));
    }

    #[test]
    fn mutual_recursion_resolves_via_pass_one() {
        let (_, diags) = check_src(
            "def main() { assert isEven(4); }
             def isEven(n) { if n==0 { return true; } return isOdd(n-1); }
             def isOdd(n) { if n==0 { return false; } return isEven(n-1); }",
        );
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn missing_return_path_is_detected() {
        let (_, diags) = check_src("def f(): Int { if true { return 1; } }");
        assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::MissingReturnPath { .. })));
    }

    #[test]
    fn function_redefinition_with_same_signature_is_reported() {
        let (_, diags) =
            check_src("def f(a: Int) { return; } def f(b: Int) { return; } def main() { }");
        assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::FunctionRedefinition { .. })));
    }

    #[test]
    fn array_repetition_types_check() {
        let (_, diags) = check_src("def main() { var a = [1,2] * 3; }");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn ref_unknown_parameter_does_not_cascade() {
        let (_, diags) = check_src("def id(ref x) { return x; } def main() { var y = 1; id(y); }");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn no_side_effects_warning_on_pure_expression_statement() {
        let (_, diags) = check_src("def main() { 1 + 1; }");
        assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::NoSideEffects { .. })));
    }
}
