//! Variable environment and function table (spec §3 "Environment" / "Function
//! table").

use devin_core::ast::Stmt;
use devin_core::Type;
use std::collections::HashMap;

use crate::value::{FunctionId, Location};

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub is_ref: bool,
    pub ty: Type,
}

/// A registered function: resolved signature, its body, and a snapshot of
/// the function-name scope chain visible at its declaration site (its own
/// entry and any local siblings hoisted alongside it), keyed by
/// [`FunctionId`] in the global [`FunctionTable`].
pub struct FunctionEntry {
    pub params: Vec<ParamSpec>,
    pub return_type: Type,
    pub body: Stmt,
    pub fn_scope_chain: Vec<HashMap<String, Vec<FunctionId>>>,
}

#[derive(Default)]
pub struct FunctionTable {
    entries: Vec<FunctionEntry>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: FunctionEntry) -> FunctionId {
        self.entries.push(entry);
        FunctionId(self.entries.len() - 1)
    }

    pub fn get(&self, id: FunctionId) -> &FunctionEntry {
        &self.entries[id.0]
    }

    /// Patches in the declaring-scope function chain once every sibling in
    /// the same hoisting batch has been registered (see `register_function`
    /// call sites in `evaluator.rs`).
    pub fn set_fn_scope_chain(&mut self, id: FunctionId, chain: Vec<HashMap<String, Vec<FunctionId>>>) {
        self.entries[id.0].fn_scope_chain = chain;
    }
}

/// One call's variable and function-name scope chain. A fresh `Frame` is
/// pushed for every call, its `var_scopes` always starting empty — Devin
/// functions are not closures over variables, so a call never sees its
/// caller's locals, only the persistent global frame (index 0 in
/// [`Environment`]) and whatever it pushes for itself. Its `fn_scopes`,
/// though, are seeded from the callee's `fn_scope_chain` snapshot so a
/// nested function can still see itself and its local siblings: function
/// *names* are resolved lexically, at the declaration site, not dynamically
/// at the call site.
struct Frame {
    var_scopes: Vec<HashMap<String, Location>>,
    fn_scopes: Vec<HashMap<String, Vec<FunctionId>>>,
}

impl Frame {
    fn new() -> Self {
        Self::with_fn_scopes(vec![HashMap::new()])
    }

    fn with_fn_scopes(fn_scopes: Vec<HashMap<String, Vec<FunctionId>>>) -> Self {
        Self {
            var_scopes: vec![HashMap::new()],
            fn_scopes,
        }
    }
}

pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self { frames: vec![Frame::new()] }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::new());
    }

    /// Pushes a call frame seeded with `fn_scopes` (a callee's
    /// `fn_scope_chain` snapshot) instead of an empty one.
    pub fn push_frame_with_fn_scopes(&mut self, fn_scopes: Vec<HashMap<String, Vec<FunctionId>>>) {
        let fn_scopes = if fn_scopes.is_empty() { vec![HashMap::new()] } else { fn_scopes };
        self.frames.push(Frame::with_fn_scopes(fn_scopes));
    }

    /// Snapshots the current frame's whole function-scope chain, used right
    /// after a batch of sibling functions has been hoisted into it so each
    /// one's [`FunctionEntry::fn_scope_chain`] can be patched in.
    pub fn current_fn_scope_chain(&self) -> Vec<HashMap<String, Vec<FunctionId>>> {
        self.frames.last().unwrap().fn_scopes.clone()
    }

    pub fn pop_frame(&mut self) {
        assert!(self.frames.len() > 1, "the global frame is never popped");
        self.frames.pop();
    }

    pub fn push_var_scope(&mut self) {
        self.current_mut().var_scopes.push(HashMap::new());
    }

    pub fn pop_var_scope(&mut self) {
        self.current_mut().var_scopes.pop();
    }

    pub fn push_fn_scope(&mut self) {
        self.current_mut().fn_scopes.push(HashMap::new());
    }

    pub fn pop_fn_scope(&mut self) {
        self.current_mut().fn_scopes.pop();
    }

    fn current_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap()
    }

    /// Binds `name` to `location` in the innermost scope of the current
    /// frame. A `ref` parameter passes the argument's own `Location`
    /// (aliasing); a by-value parameter or a `var` passes a freshly
    /// allocated `Location::Cell`.
    pub fn define_var(&mut self, name: &str, location: Location) {
        self.current_mut().var_scopes.last_mut().unwrap().insert(name.to_string(), location);
    }

    /// Looks up `name` innermost-scope-first in the current frame, falling
    /// back to the global frame if not found (a function's own frame never
    /// sees its caller's locals, but everyone sees top-level globals).
    pub fn lookup_var(&self, name: &str) -> Option<Location> {
        let current = self.frames.last().unwrap();
        current
            .var_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .or_else(|| {
                self.frames[0]
                    .var_scopes
                    .iter()
                    .rev()
                    .find_map(|scope| scope.get(name).copied())
            })
    }

    pub fn define_function(&mut self, name: &str, id: FunctionId) {
        self.current_mut()
            .fn_scopes
            .last_mut()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(id);
    }

    /// Collects every overload visible for `name`: the current frame's
    /// function scopes (innermost first), then the global frame's.
    pub fn lookup_overloads(&self, name: &str) -> Vec<FunctionId> {
        let current = self.frames.last().unwrap();
        let mut ids: Vec<FunctionId> = current
            .fn_scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.get(name).cloned().unwrap_or_default())
            .collect();
        if !std::ptr::eq(current, &self.frames[0]) {
            ids.extend(
                self.frames[0]
                    .fn_scopes
                    .iter()
                    .rev()
                    .flat_map(|scope| scope.get(name).cloned().unwrap_or_default()),
            );
        }
        ids
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
