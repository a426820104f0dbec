//! Evaluation environment.

use std::sync::Arc;

use crate::{
    error::{ErrorKind, EvalResult},
    frame::{Frame, Store},
    node::Node,
    prims::Primitives,
    session::{SessionConfig, SessionContext, SessionState},
    Value,
};

mod scope;

pub use self::scope::Scope;

/// Environment of a single top-level evaluation: the stack of tracked values,
/// the active lexical scope and the session bookkeeping.
///
/// Values obtained by evaluating argument nodes via [`Self::exec_tracked()`] are released
/// when the enclosing function application completes, unless they are reachable
/// from the application result.
#[derive(Debug)]
pub struct Env<'s> {
    state: &'s mut SessionState,
    context: &'s SessionContext,
    stack: Vec<Value>,
    scope: Option<Arc<Scope>>,
}

impl<'s> Env<'s> {
    pub(crate) fn new(state: &'s mut SessionState, context: &'s SessionContext) -> Self {
        Self {
            state,
            context,
            stack: vec![],
            scope: None,
        }
    }

    /// Evaluates `node` without tracking the result.
    pub fn exec(&mut self, node: &Node) -> EvalResult {
        node.exec(self)
    }

    /// Evaluates `node` and tracks the result, so that its columns are released once
    /// the enclosing application completes.
    pub fn exec_tracked(&mut self, node: &Node) -> EvalResult {
        let value = node.exec(self)?;
        self.track(&value);
        Ok(value)
    }

    /// Evaluates all `nodes` in order, tracking the results.
    pub fn exec_all(&mut self, nodes: &[Node]) -> EvalResult<Vec<Value>> {
        nodes.iter().map(|node| self.exec_tracked(node)).collect()
    }

    /// Tracks `value` in the current evaluation scope.
    pub fn track(&mut self, value: &Value) {
        if value.holds_frames() {
            self.stack.push(value.clone());
        }
    }

    /// Returns the number of tracked values.
    pub fn tracked_len(&self) -> usize {
        self.stack.len()
    }

    /// Runs `action` in a nested evaluation scope. Once the action completes (successfully
    /// or not), values tracked within the scope are released, except for the columns
    /// reachable from the returned value.
    pub fn scoped(&mut self, action: impl FnOnce(&mut Self) -> EvalResult) -> EvalResult {
        let mark = self.stack.len();
        let result = action(self);

        let protected = match &result {
            Ok(value) => value.frames(),
            Err(_) => vec![],
        };
        for frame in &protected {
            self.state.add_refs(frame);
        }
        for value in self.stack.split_off(mark) {
            self.state.release(&value);
        }
        for frame in &protected {
            self.state.sub_refs(frame);
        }
        result
    }

    /// Runs `action` with `scope` as the active lexical scope, restoring the previous
    /// scope afterwards. Frames reachable from the scope chain are pinned for the duration
    /// of the action.
    pub(crate) fn with_scope(
        &mut self,
        scope: Arc<Scope>,
        action: impl FnOnce(&mut Self) -> EvalResult,
    ) -> EvalResult {
        let mut pinned = vec![];
        scope.collect_frames(&mut pinned);
        for frame in &pinned {
            self.state.add_refs(frame);
        }

        let previous = self.scope.replace(scope);
        let result = action(self);
        self.scope = previous;

        for frame in &pinned {
            self.state.sub_refs(frame);
        }
        result
    }

    /// Returns the active lexical scope.
    pub fn scope(&self) -> Option<&Arc<Scope>> {
        self.scope.as_ref()
    }

    /// Resolves `name`: the lexical scope chain is consulted first, then primitives
    /// and constants, then session temps and finally the frame store. Frames found
    /// in the store are marked as global.
    pub fn lookup(&mut self, name: &str) -> Result<Value, ErrorKind> {
        if let Some(value) = self.scope.as_ref().and_then(|scope| scope.lookup(name)) {
            return Ok(value.clone());
        }
        if let Some(value) = self.context.primitives.get(name) {
            return Ok(value);
        }
        if let Some(frame) = self.state.temp(name) {
            return Ok(Value::Frame(frame.clone()));
        }
        if let Some(frame) = self.context.store.get(name) {
            self.state.add_globals(&frame);
            return Ok(Value::Frame(frame));
        }
        Err(ErrorKind::UnknownIdentifier(name.to_owned()))
    }

    /// Returns the primitive registry.
    pub fn primitives(&self) -> &Primitives {
        &self.context.primitives
    }

    /// Returns the shared frame store.
    pub fn store(&self) -> &Store {
        &self.context.store
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.context.config
    }

    /// Marks columns of `frame` as global.
    pub fn add_globals(&mut self, frame: &Frame) {
        self.state.add_globals(frame);
    }

    /// Registers `frame` as a session temp under its key.
    pub fn track_tmp(&mut self, frame: Frame) -> Result<Frame, ErrorKind> {
        self.state.track_tmp(frame)
    }

    /// Gets a session temp by name.
    pub fn temp(&self, name: &str) -> Option<&Frame> {
        self.state.temp(name)
    }

    /// Removes `frame` from the session; see [`Session::remove()`](crate::Session::remove()).
    pub fn remove(&mut self, frame: &Frame) -> bool {
        self.state.remove(frame, &self.context.store)
    }

    /// Prepares columns at `indices` for in-place mutation;
    /// see [`Session::copy_on_write()`](crate::Session::copy_on_write()).
    pub fn copy_on_write(&mut self, frame: &Frame, indices: &[usize]) -> Result<Frame, ErrorKind> {
        self.state.copy_on_write(frame, indices)
    }

    /// Publishes `frame` in the store under `name`;
    /// see [`Session::assign()`](crate::Session::assign()).
    pub fn assign(&mut self, name: &str, frame: &Frame) -> Result<Frame, ErrorKind> {
        self.state.assign(name, frame, &self.context.store)
    }
}
