//! Tree-walking evaluator (spec §4.3 "Evaluation", §4.4 "Shared heap").

use devin_core::ast::{
    AccessExpr, AssignExpr, BinaryExpr, BinaryOp, BlockItem, CallExpr, Declaration, Devin, Expr,
    FunctionDecl, Param, Stmt, TypeExpr, UnaryExpr, UnaryOp, VariableDecl,
};
use devin_core::{Span, Type};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::env::{Environment, FunctionEntry, FunctionTable, ParamSpec};
use crate::error::EvalError;
use crate::value::{ArrayId, FunctionId, Heap, Location, Value};

/// Call frames deeper than this abort with `StackOverflow` rather than
/// exhausting the host stack.
const MAX_CALL_DEPTH: usize = 4096;

/// Everything a running program needs: the variable/function environment,
/// the shared heap, the function table, and the current call depth. Owned
/// by the host across a whole `evaluate` call (spec's "state-in/state-out"
/// Core API shape).
pub struct State {
    pub env: Environment,
    pub heap: Heap,
    pub functions: FunctionTable,
    call_depth: usize,
}

impl State {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            heap: Heap::new(),
            functions: FunctionTable::new(),
            call_depth: 0,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the initial [`State`] an `evaluate` call starts from (spec §6's
/// `makePredefinedState`). The core defines no built-ins, so this is
/// presently identical to [`State::new`]; it exists as its own entry point
/// because a host should not assume those two will always coincide.
pub fn make_predefined_state() -> State {
    State::new()
}

enum StatementResult {
    Continuing,
    Returning(Value),
}

/// Runs a fully type-checked program: registers every top-level function and
/// binds every top-level `var` in declaration order, then looks up a
/// zero-argument `main` and invokes it. Returns `NoMain` if there is none.
pub fn evaluate(ast: &Devin, state: &mut State) -> Result<(), EvalError> {
    let mut top_level_fns = Vec::new();
    for decl in &ast.declarations {
        if let Declaration::Function(f) = decl {
            top_level_fns.push(register_function(state, f));
        }
    }
    let chain = state.env.current_fn_scope_chain();
    for id in top_level_fns {
        state.functions.set_fn_scope_chain(id, chain.clone());
    }
    for decl in &ast.declarations {
        if let Declaration::Variable(v) = decl {
            eval_variable_decl(state, v)?;
        }
    }
    let main_id = state
        .env
        .lookup_overloads("main")
        .into_iter()
        .find(|id| state.functions.get(*id).params.is_empty())
        .ok_or(EvalError::NoMain)?;
    call_function(state, main_id, Vec::new(), Span::dummy())?;
    Ok(())
}

fn resolve_type_expr(te: &TypeExpr) -> Type {
    match te {
        TypeExpr::Named(name, _) => match name.as_str() {
            "Unit" => Type::Unit,
            "Bool" => Type::Bool,
            "Int" => Type::Int,
            "Float" => Type::Float,
            other => Type::Unknown(other.to_string()),
        },
        TypeExpr::Array(inner, _) => Type::array(resolve_type_expr(inner)),
    }
}

fn resolve_param_type(p: &Param) -> Type {
    match &p.annotation {
        Some(te) => resolve_type_expr(te),
        None => Type::Unknown("_".to_string()),
    }
}

/// Registers one function's signature and body, without yet knowing its
/// `fn_scope_chain`: callers register every sibling in the same hoisting
/// batch first, then snapshot the now-complete scope and patch it into each
/// of the returned ids via `FunctionTable::set_fn_scope_chain`.
fn register_function(state: &mut State, f: &FunctionDecl) -> FunctionId {
    let params: Vec<ParamSpec> = f
        .parameters
        .iter()
        .map(|p| ParamSpec {
            name: p.name.clone(),
            is_ref: p.is_ref,
            ty: resolve_param_type(p),
        })
        .collect();
    let return_type = f
        .return_type
        .as_ref()
        .map(resolve_type_expr)
        .unwrap_or_else(|| Type::Unknown("_".to_string()));
    let id = state.functions.register(FunctionEntry {
        params,
        return_type,
        body: (*f.body).clone(),
        fn_scope_chain: Vec::new(),
    });
    state.env.define_function(&f.name, id);
    id
}

fn eval_variable_decl(state: &mut State, v: &VariableDecl) -> Result<(), EvalError> {
    let value = eval_expr(state, &v.initializer)?;
    let stored = state.heap.deep_copy(&value);
    let cell = state.heap.alloc_cell(stored);
    state.env.define_var(&v.name, Location::Cell(cell));
    Ok(())
}

fn call_function(
    state: &mut State,
    id: FunctionId,
    args: Vec<Location>,
    call_span: Span,
) -> Result<Value, EvalError> {
    state.call_depth += 1;
    if state.call_depth > MAX_CALL_DEPTH {
        state.call_depth -= 1;
        return Err(EvalError::StackOverflow { span: call_span });
    }

    let entry = state.functions.get(id);
    let params = entry.params.clone();
    let return_type = entry.return_type.clone();
    let body = entry.body.clone();
    let fn_scope_chain = entry.fn_scope_chain.clone();

    state.env.push_frame_with_fn_scopes(fn_scope_chain);
    for (param, location) in params.iter().zip(args) {
        let bound = if param.is_ref {
            location
        } else {
            let value = state.heap.read_location(location);
            Location::Cell(state.heap.alloc_cell(value))
        };
        state.env.define_var(&param.name, bound);
    }
    let result = exec_stmt(state, &body);
    state.env.pop_frame();
    state.call_depth -= 1;

    match result? {
        StatementResult::Returning(value) => Ok(value),
        StatementResult::Continuing => {
            if return_type.is_compatible(&Type::Unit) {
                Ok(Value::Unit)
            } else {
                Err(EvalError::MissingReturnValue { span: call_span })
            }
        }
    }
}

fn exec_stmt(state: &mut State, stmt: &Stmt) -> Result<StatementResult, EvalError> {
    match stmt {
        Stmt::Expr(e, _) => {
            eval_expr(state, e)?;
            Ok(StatementResult::Continuing)
        }
        Stmt::If(cond, body, _) => {
            if eval_bool(state, cond)? {
                exec_stmt(state, body)
            } else {
                Ok(StatementResult::Continuing)
            }
        }
        Stmt::IfElse(cond, then_branch, else_branch, _) => {
            if eval_bool(state, cond)? {
                exec_stmt(state, then_branch)
            } else {
                exec_stmt(state, else_branch)
            }
        }
        Stmt::While(cond, body, _) => {
            while eval_bool(state, cond)? {
                match exec_stmt(state, body)? {
                    StatementResult::Continuing => {}
                    returning @ StatementResult::Returning(_) => return Ok(returning),
                }
            }
            Ok(StatementResult::Continuing)
        }
        Stmt::DoWhile(body, cond, _) => loop {
            match exec_stmt(state, body)? {
                StatementResult::Continuing => {}
                returning @ StatementResult::Returning(_) => return Ok(returning),
            }
            if !eval_bool(state, cond)? {
                return Ok(StatementResult::Continuing);
            }
        },
        Stmt::Return(value, _) => {
            let result = match value {
                Some(e) => eval_expr(state, e)?,
                None => Value::Unit,
            };
            Ok(StatementResult::Returning(result))
        }
        Stmt::Assert(cond, span) => {
            if eval_bool(state, cond)? {
                Ok(StatementResult::Continuing)
            } else {
                Err(EvalError::AssertionFailure { span: *span })
            }
        }
        Stmt::Block(items, _) => exec_block(state, items),
        Stmt::Declaration(decl, _) => {
            match decl.as_ref() {
                Declaration::Variable(v) => eval_variable_decl(state, v)?,
                Declaration::Function(f) => {
                    let id = register_function(state, f);
                    let chain = state.env.current_fn_scope_chain();
                    state.functions.set_fn_scope_chain(id, chain);
                }
            }
            Ok(StatementResult::Continuing)
        }
    }
}

/// Nested function declarations inside a block are visible to the whole
/// block, so they are registered in a fresh function scope before any
/// statement runs — the same hoisting the checker performs statically.
fn exec_block(state: &mut State, items: &[BlockItem]) -> Result<StatementResult, EvalError> {
    state.env.push_var_scope();
    state.env.push_fn_scope();

    let mut fn_ids = Vec::new();
    for item in items {
        if let BlockItem::Declaration(Declaration::Function(f)) = item {
            fn_ids.push(register_function(state, f));
        }
    }
    let chain = state.env.current_fn_scope_chain();
    for id in fn_ids {
        state.functions.set_fn_scope_chain(id, chain.clone());
    }

    let mut result = Ok(StatementResult::Continuing);
    for item in items {
        match item {
            BlockItem::Declaration(Declaration::Function(_)) => {}
            BlockItem::Declaration(Declaration::Variable(v)) => {
                if let Err(e) = eval_variable_decl(state, v) {
                    result = Err(e);
                    break;
                }
            }
            BlockItem::Statement(s) => match exec_stmt(state, s) {
                Ok(StatementResult::Continuing) => {}
                Ok(returning @ StatementResult::Returning(_)) => {
                    result = Ok(returning);
                    break;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            },
        }
    }

    state.env.pop_fn_scope();
    state.env.pop_var_scope();
    result
}

fn eval_bool(state: &mut State, expr: &Expr) -> Result<bool, EvalError> {
    match eval_expr(state, expr)? {
        Value::Bool(b) => Ok(b),
        other => unreachable!("type checking guarantees a predicate is Bool, got {other:?}"),
    }
}

fn eval_expr(state: &mut State, expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::IntegerLit(n, _) => Ok(Value::Int(n.clone())),
        Expr::RationalLit(r, _) => Ok(Value::Float(r.clone())),
        Expr::BoolLit(b, _) => Ok(Value::Bool(*b)),
        Expr::Variable(v) => {
            let location = state
                .env
                .lookup_var(&v.name)
                .unwrap_or_else(|| unreachable!("type checking guarantees '{}' resolves", v.name));
            Ok(state.heap.read_location(location))
        }
        Expr::Array(a) => {
            let mut elements = Vec::with_capacity(a.elements.len());
            for e in &a.elements {
                elements.push(eval_expr(state, e)?);
            }
            let element_type = a
                .ty
                .as_ref()
                .and_then(|t| t.array_element())
                .unwrap_or(Type::Unknown("_".to_string()));
            Ok(Value::Array(state.heap.alloc_array(element_type, elements)))
        }
        Expr::Call(c) => eval_call(state, c),
        Expr::Unary(u) => eval_unary(state, u),
        Expr::Binary(b) => eval_binary(state, b),
        Expr::Assign(a) => eval_assign(state, a),
        Expr::Access(_) => {
            let location = resolve_lvalue_location(state, expr)?;
            Ok(state.heap.read_location(location))
        }
        Expr::Parenthesized(inner, _) => eval_expr(state, inner),
    }
}

fn eval_unary(state: &mut State, u: &UnaryExpr) -> Result<Value, EvalError> {
    match u.op {
        UnaryOp::Plus => eval_expr(state, &u.operand),
        UnaryOp::Minus => match eval_expr(state, &u.operand)? {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(r) => Ok(Value::Float(-r)),
            other => unreachable!("type checking guarantees unary '-' is numeric, got {other:?}"),
        },
        UnaryOp::Not => match eval_expr(state, &u.operand)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => unreachable!("type checking guarantees 'not' operand is Bool, got {other:?}"),
        },
        UnaryOp::Len => match eval_expr(state, &u.operand)? {
            Value::Array(id) => Ok(Value::Int(BigInt::from(state.heap.array(id).elements.len()))),
            other => unreachable!("type checking guarantees 'len' operand is an array, got {other:?}"),
        },
    }
}

fn eval_binary(state: &mut State, b: &BinaryExpr) -> Result<Value, EvalError> {
    let left = eval_expr(state, &b.left)?;
    let right = eval_expr(state, &b.right)?;
    match b.op {
        BinaryOp::Eq => Ok(Value::Bool(state.heap.values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!state.heap.values_equal(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => eval_comparison(b.op, left, right),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => eval_logical(b.op, left, right),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            eval_arithmetic(state, b.op, left, right, b.span)
        }
    }
}

fn eval_comparison(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let result = match (left, right) {
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            _ => unreachable!(),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            _ => unreachable!(),
        },
        (a, b) => unreachable!("type checking guarantees relational operands match, got {a:?}/{b:?}"),
    };
    Ok(Value::Bool(result))
}

/// `and`/`or`/`xor` always evaluate both operands (spec §5: no short-circuit,
/// for deterministic, side-effect-complete evaluation).
fn eval_logical(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => {
            let result = match op {
                BinaryOp::And => a && b,
                BinaryOp::Or => a || b,
                BinaryOp::Xor => a ^ b,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        (a, b) => unreachable!("type checking guarantees logical operands are Bool, got {a:?}/{b:?}"),
    }
}

fn eval_arithmetic(
    state: &mut State,
    op: BinaryOp,
    left: Value,
    right: Value,
    span: Span,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b.is_zero() {
                return Err(EvalError::DivisionByZero { span });
            }
            // BigInt's `/` and `%` truncate toward zero, matching the
            // truncated-modulo convention (result takes the dividend's sign).
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => unreachable!(),
            };
            Ok(Value::Int(result))
        }
        (Value::Float(a), Value::Float(b)) => {
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b.numer().is_zero() {
                return Err(EvalError::DivisionByZero { span });
            }
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => unreachable!(),
            };
            Ok(Value::Float(result))
        }
        (Value::Array(id), Value::Int(n)) | (Value::Int(n), Value::Array(id)) => {
            Ok(repeat_array(state, id, &n))
        }
        (a, b) => {
            unreachable!("type checking guarantees arithmetic operands are numeric or repetition, got {a:?}/{b:?}")
        }
    }
}

/// `a * n` / `n * a`: a fresh array with `max(0, n)` repetitions of `a`'s
/// elements. Element values are shared, not copied — for arrays-of-arrays
/// the inner arrays alias across every repeated slot (spec §4.3).
fn repeat_array(state: &mut State, id: ArrayId, n: &BigInt) -> Value {
    let count = if n.is_negative() { 0usize } else { bigint_to_index(n).max(0) as usize };
    let element_type = state.heap.array(id).element_type.clone();
    let source = state.heap.array(id).elements.clone();
    let mut elements = Vec::with_capacity(count.saturating_mul(source.len()));
    for _ in 0..count {
        elements.extend(source.iter().cloned());
    }
    Value::Array(state.heap.alloc_array(element_type, elements))
}

fn eval_assign(state: &mut State, a: &AssignExpr) -> Result<Value, EvalError> {
    let location = resolve_lvalue_location(state, &a.target)?;
    let rhs = eval_expr(state, &a.value)?;
    let new_value = match a.op.as_binary_op() {
        None => rhs,
        Some(op) => {
            let current = state.heap.read_location(location);
            eval_arithmetic(state, op, current, rhs, a.span)?
        }
    };
    state.heap.write_location(location, new_value.clone());
    Ok(new_value)
}

fn eval_call(state: &mut State, call: &CallExpr) -> Result<Value, EvalError> {
    let mut arg_values = Vec::with_capacity(call.args.len());
    let mut arg_locations = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        if arg.is_lvalue() {
            let location = resolve_lvalue_location(state, arg)?;
            arg_values.push(state.heap.read_location(location));
            arg_locations.push(Some(location));
        } else {
            arg_values.push(eval_expr(state, arg)?);
            arg_locations.push(None);
        }
    }
    let arg_types: Vec<Type> = arg_values.iter().map(|v| v.type_of(&state.heap)).collect();

    let id = state
        .env
        .lookup_overloads(&call.callee)
        .into_iter()
        .find(|id| {
            let params = &state.functions.get(*id).params;
            params.len() == arg_types.len()
                && params.iter().zip(&arg_types).all(|(p, a)| p.ty.is_compatible(a))
        })
        .unwrap_or_else(|| {
            unreachable!("type checking guarantees a matching overload of '{}' exists", call.callee)
        });

    let params = state.functions.get(id).params.clone();
    let mut locations = Vec::with_capacity(params.len());
    for (param, (value, location)) in params.iter().zip(arg_values.into_iter().zip(arg_locations)) {
        let bound = if param.is_ref {
            location.ok_or(EvalError::RefExpectsLValue { span: call.span })?
        } else {
            Location::Cell(state.heap.alloc_cell(value))
        };
        locations.push(bound);
    }
    call_function(state, id, locations, call.span)
}

/// Resolves an l-value expression (a variable or an access chain) to the
/// [`Location`] it names, without mutating anything. `ref` arguments and
/// assignment targets both go through this.
fn resolve_lvalue_location(state: &mut State, expr: &Expr) -> Result<Location, EvalError> {
    match expr {
        Expr::Variable(v) => Ok(state
            .env
            .lookup_var(&v.name)
            .unwrap_or_else(|| unreachable!("type checking guarantees '{}' resolves", v.name))),
        Expr::Access(ac) => resolve_access_location(state, ac),
        Expr::Parenthesized(inner, _) => resolve_lvalue_location(state, inner),
        _ => unreachable!("caller only resolves locations for expressions where is_lvalue() is true"),
    }
}

fn resolve_access_location(state: &mut State, ac: &AccessExpr) -> Result<Location, EvalError> {
    let array_value = eval_expr(state, &ac.array)?;
    let aid = match array_value {
        Value::Array(id) => id,
        other => unreachable!("type checking guarantees an indexed expression is an array, got {other:?}"),
    };
    let index = match eval_expr(state, &ac.index)? {
        Value::Int(n) => bigint_to_index(&n),
        other => unreachable!("type checking guarantees an index is Int, got {other:?}"),
    };
    let len = state.heap.array(aid).elements.len();
    if index < 0 || index as usize >= len {
        return Err(EvalError::IndexOutOfBounds { index, len, span: ac.span });
    }
    Ok(Location::ArrayElement(aid, index as usize))
}

/// Clamps an arbitrary-precision index to `i64`, saturating toward
/// whichever bound it overshoots; anything outside `i64`'s range is out of
/// bounds for any real array regardless of its exact magnitude.
fn bigint_to_index(n: &BigInt) -> i64 {
    n.to_i64().unwrap_or(if n.is_negative() { i64::MIN } else { i64::MAX })
}
