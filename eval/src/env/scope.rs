//! Lexical scopes.

use std::{fmt, sync::Arc};

use crate::{frame::Frame, node::FnDef, Value};

/// Scope created by applying a closure: argument values bound to the parameters
/// of the function definition, linked to the scope captured by the closure.
pub struct Scope {
    def: Arc<FnDef>,
    args: Vec<Value>,
    parent: Option<Arc<Scope>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Scope")
            .field("params", &self.def.params())
            .field("args", &self.args)
            .field("parent", &self.parent)
            .finish()
    }
}

impl Scope {
    pub(crate) fn new(def: Arc<FnDef>, args: Vec<Value>, parent: Option<Arc<Scope>>) -> Self {
        debug_assert_eq!(def.params().len(), args.len());
        Self { def, args, parent }
    }

    /// Looks up `name`, starting from this scope and proceeding to the enclosing ones.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            let position = scope.def.params().iter().position(|param| param == name);
            if let Some(idx) = position {
                return scope.args.get(idx);
            }
            scope = scope.parent.as_deref()?;
        }
    }

    /// Returns the enclosing scope.
    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// Returns the number of scopes in the chain starting from this one.
    pub fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |parent| parent.depth())
    }

    /// Iterates over bound variables in this scope (not including enclosing scopes).
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.def.params().iter().map(String::as_str).zip(&self.args)
    }

    pub(crate) fn collect_frames(&self, frames: &mut Vec<Frame>) {
        for arg in &self.args {
            arg.collect_frames(frames);
        }
        if let Some(parent) = &self.parent {
            parent.collect_frames(frames);
        }
    }

    pub(crate) fn holds_frames(&self) -> bool {
        self.args.iter().any(Value::holds_frames)
            || self.parent.as_ref().map_or(false, |parent| parent.holds_frames())
    }
}
