//! Thread memory: the scoped symbol table and per-thread execution context.

use std::collections::HashMap;

use blockflow_common::{Label, NodeId, Operand, Value};

/// A stack of lexical scopes mapping names to values.
///
/// There is always at least one scope; the root scope cannot be popped.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Value>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding one empty root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Number of scopes, always >= 1.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Discard the innermost scope. Returns false (and does nothing) at the root.
    pub fn pop_scope(&mut self) -> bool {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            true
        } else {
            false
        }
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings.
    pub fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Mutate the nearest binding of `name`, or declare it in the innermost scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.declare(name, value);
    }

    /// The nearest binding of `name`, if any.
    pub fn query(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// The nearest binding of `name`, or 0 when unbound.
    pub fn lookup(&self, name: &str) -> Value {
        self.query(name).cloned().unwrap_or(Value::ZERO)
    }
}

/// Everything one logical thread needs to resume where it left off.
///
/// Owned by exactly one thread; never shared.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub thread_id: String,
    pub memory: SymbolTable,
    /// Block currently executing.
    pub current_block: Label,
    /// Index of the next instruction within `current_block`.
    pub ip: usize,
    /// Source node of the last executed tagged instruction.
    pub current_node: Option<NodeId>,
    /// Breakpoint this context last stopped on.
    pub(crate) last_breakpoint: Option<NodeId>,
}

impl ExecutionContext {
    /// A fresh context positioned at the start of `entry`.
    pub fn new(thread_id: impl Into<String>, entry: Label) -> Self {
        Self {
            thread_id: thread_id.into(),
            memory: SymbolTable::new(),
            current_block: entry,
            ip: 0,
            current_node: None,
            last_breakpoint: None,
        }
    }

    /// Resolve an operand against this thread's memory.
    pub fn resolve(&self, operand: &Operand) -> Value {
        match operand {
            Operand::Literal(value) => value.clone(),
            Operand::Var(name) => self.memory.lookup(name),
        }
    }

    /// Transfer control to the start of `label`.
    pub fn jump_to(&mut self, label: Label) {
        self.current_block = label;
        self.ip = 0;
    }

    /// Breakpoint this context last stopped on, if it is still parked there.
    pub fn last_breakpoint(&self) -> Option<&str> {
        self.last_breakpoint.as_deref()
    }
}
