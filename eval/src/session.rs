//! Session: reference counting and copy-on-write bookkeeping shared by evaluations.

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use tracing::{debug, instrument};

use std::sync::Arc;

use crate::{
    compiler::Compiler,
    env::Env,
    error::{Error, ErrorKind, EvalResult},
    frame::{Column, ColumnId, Frame, Store},
    node::Node,
    prims::Primitives,
    Value,
};
use rapids_parser::{
    grammars::{Grammar, Rapids},
    num_list::{ColumnBounds, NumListError},
};

/// Configuration of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Handling of column indices exceeding the number of columns in column selectors.
    pub column_bounds: ColumnBounds,
    /// Whether to check reference counts before and after each top-level evaluation.
    /// Enabled by default in debug builds.
    pub check_refs: bool,
    /// Maximum number of elements a number list literal may expand to when evaluated
    /// as a value. Lists passed directly to row and column selectors are not expanded.
    pub max_list_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            column_bounds: ColumnBounds::default(),
            check_refs: cfg!(debug_assertions),
            max_list_len: 1 << 26,
        }
    }
}

/// Immutable part of a session.
#[derive(Debug)]
pub(crate) struct SessionContext {
    pub primitives: Arc<Primitives>,
    pub store: Store,
    pub config: SessionConfig,
}

/// Mutable bookkeeping of a session.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    refcounts: HashMap<ColumnId, usize>,
    globals: HashSet<ColumnId>,
    temps: HashMap<String, Frame>,
}

impl SessionState {
    fn ref_count(&self, id: ColumnId) -> usize {
        self.refcounts.get(&id).copied().unwrap_or(0)
    }

    fn effective_count(&self, id: ColumnId) -> usize {
        self.ref_count(id) + usize::from(self.globals.contains(&id))
    }

    pub fn add_refs(&mut self, frame: &Frame) {
        for id in frame.column_ids() {
            *self.refcounts.entry(id).or_default() += 1;
        }
    }

    /// Decrements refcounts without reclaiming columns. Never goes below zero.
    pub fn sub_refs(&mut self, frame: &Frame) {
        for id in frame.column_ids() {
            if let Some(count) = self.refcounts.get_mut(&id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.refcounts.remove(&id);
                }
            }
        }
    }

    pub fn add_globals(&mut self, frame: &Frame) {
        self.globals.extend(frame.column_ids());
    }

    fn free_if_unused(&self, column: &Column) {
        if self.effective_count(column.id()) == 0 && column.free() {
            debug!(column = %column.id(), "reclaimed column");
        }
    }

    /// Releases a value that has gone out of scope.
    pub fn release(&self, value: &Value) {
        for frame in value.frames() {
            for column in frame.columns() {
                self.free_if_unused(column);
            }
        }
    }

    pub fn temp(&self, name: &str) -> Option<&Frame> {
        self.temps.get(name)
    }

    pub fn track_tmp(&mut self, frame: Frame) -> Result<Frame, ErrorKind> {
        if self.temps.contains_key(frame.key()) {
            return Err(ErrorKind::TempExists(frame.key().to_owned()));
        }
        debug!(key = frame.key(), ncols = frame.ncols(), "tracking temp");
        self.add_refs(&frame);
        self.temps.insert(frame.key().to_owned(), frame.clone());
        Ok(frame)
    }

    pub fn remove(&mut self, frame: &Frame, store: &Store) -> bool {
        if let Some(temp) = self.temps.remove(frame.key()) {
            debug!(key = temp.key(), "removing temp");
            self.sub_refs(&temp);
            for column in temp.columns() {
                self.free_if_unused(column);
            }
            return true;
        }

        let mut removed = false;
        for column in frame.columns() {
            removed |= self.globals.remove(&column.id());
        }
        for column in frame.columns() {
            self.free_if_unused(column);
        }
        removed |= store.remove(frame.key()).is_some();
        debug!(key = frame.key(), removed, "removing global frame");
        removed
    }

    pub fn copy_on_write(&mut self, frame: &Frame, indices: &[usize]) -> Result<Frame, ErrorKind> {
        let mut output = frame.clone();
        let mut copied = false;
        for &idx in indices {
            let column = frame.column(idx).ok_or(NumListError::ColumnOutOfRange {
                index: idx as f64,
                len: frame.ncols(),
            })?;
            // The caller holds an implicit reference, so any recorded one means sharing.
            if self.effective_count(column.id()) > 0 {
                let copy = column.deep_copy()?;
                debug!(key = frame.key(), from = %column.id(), to = %copy.id(), "copy on write");
                output.replace(idx, copy)?;
                copied = true;
            }
        }
        Ok(if copied { output.with_fresh_key() } else { output })
    }

    pub fn assign(&mut self, name: &str, frame: &Frame, store: &Store) -> Result<Frame, ErrorKind> {
        if self.temps.contains_key(name) {
            return Err(ErrorKind::invalid_arg(
                "assign",
                format!("`{}` is a session temp", name),
            ));
        }

        let prior = store.get(name);
        if let Some(prior) = &prior {
            for id in prior.column_ids() {
                self.globals.remove(&id);
            }
        }

        let mut columns = Vec::with_capacity(frame.ncols());
        for column in frame.columns() {
            if self.globals.contains(&column.id()) {
                columns.push(column.deep_copy()?);
            } else {
                columns.push(column.clone());
            }
        }
        let assigned = Frame::new(frame.names().to_vec(), columns)?.with_key(name);
        self.add_globals(&assigned);

        if let Some(prior) = &prior {
            for column in prior.columns() {
                self.free_if_unused(column);
            }
        }
        store.insert(assigned.clone());
        debug!(key = name, ncols = assigned.ncols(), "assigned global frame");
        Ok(assigned)
    }

    fn end(&mut self, value: Option<Value>) -> EvalResult<Option<Value>> {
        let protected = value.as_ref().map(Value::frames).unwrap_or_default();
        for frame in &protected {
            self.add_refs(frame);
        }

        let temps: Vec<_> = self.temps.drain().map(|(_, frame)| frame).collect();
        debug!(temps = temps.len(), "ending session");
        for temp in &temps {
            self.sub_refs(temp);
            for column in temp.columns() {
                self.free_if_unused(column);
            }
        }
        for frame in &protected {
            self.sub_refs(frame);
        }

        let value = match value {
            Some(Value::Frame(frame)) => Some(Value::Frame(self.detach_globals(frame)?)),
            other => other,
        };
        self.globals.clear();
        self.refcounts.clear();
        Ok(value)
    }

    /// Replaces global columns of a frame returned out of the session with copies.
    fn detach_globals(&self, mut frame: Frame) -> Result<Frame, ErrorKind> {
        for idx in 0..frame.ncols() {
            let column = &frame.columns()[idx];
            if self.globals.contains(&column.id()) {
                let copy = column.deep_copy()?;
                frame.replace(idx, copy)?;
            }
        }
        Ok(frame)
    }

    fn check_refs(&self) -> Result<(), ErrorKind> {
        let mut expected = HashMap::<ColumnId, usize>::new();
        for frame in self.temps.values() {
            for id in frame.column_ids() {
                *expected.entry(id).or_default() += 1;
            }
        }

        for (&column, &expected) in &expected {
            let recorded = self.ref_count(column);
            if recorded != expected {
                return Err(ErrorKind::RefCountMismatch {
                    column,
                    recorded,
                    expected,
                });
            }
        }
        for (&column, &recorded) in &self.refcounts {
            if recorded > 0 && !expected.contains_key(&column) {
                return Err(ErrorKind::RefCountMismatch {
                    column,
                    recorded,
                    expected: 0,
                });
            }
        }
        Ok(())
    }
}

/// Long-lived context for evaluating Rapids expressions.
///
/// A session tracks reference counts of columns in session temps, the set of global
/// columns (ones belonging to frames owned outside the session) and the temps themselves.
/// All bookkeeping is guarded by a single lock held for the duration of each top-level
/// evaluation, so a session can be shared among threads.
///
/// # Examples
///
/// ```
/// use rapids_eval::{Frame, Session, Store, Value};
///
/// let store = Store::new();
/// store.insert(Frame::from_nums([("x", vec![1.0, 2.0, 3.0])])?.with_key("data"));
/// let session = Session::new(store);
///
/// let value = session.exec("(sum (+ data 1))")?;
/// assert_eq!(value, Value::Num(9.0));
///
/// session.exec("(cols data [0])->first")?;
/// assert_eq!(session.temp_names(), ["first"]);
/// session.end_quietly();
/// assert!(session.temp_names().is_empty());
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionState>,
    context: SessionContext,
}

impl Session {
    /// Creates a session with standard primitives and the default config.
    pub fn new(store: Store) -> Self {
        Self::with_config(Primitives::standard(), store, SessionConfig::default())
    }

    /// Creates a session with the specified primitives and config.
    pub fn with_config(primitives: Arc<Primitives>, store: Store, config: SessionConfig) -> Self {
        Self {
            state: Mutex::default(),
            context: SessionContext {
                primitives,
                store,
                config,
            },
        }
    }

    /// Returns the primitive registry used by this session.
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

    /// Compiles `code` into a node using the primitives of this session.
    pub fn compile(&self, code: &str) -> Result<Node, Error> {
        let expr = Rapids::parse_expr(code).map_err(Error::from_parse)?;
        Ok(Compiler::new(&self.context.primitives).compile(&expr))
    }

    /// Parses and evaluates `code`.
    #[instrument(level = "debug", skip(self), err)]
    pub fn exec(&self, code: &str) -> EvalResult {
        let node = self.compile(code)?;
        self.exec_node(&node)
    }

    /// Evaluates a node.
    pub fn exec_node(&self, node: &Node) -> EvalResult {
        let mut state = self.state.lock();
        if self.context.config.check_refs {
            state.check_refs()?;
        }
        let mut env = Env::new(&mut state, &self.context);
        let value = env.scoped(|env| node.exec(env))?;
        if self.context.config.check_refs {
            state.check_refs()?;
        }
        Ok(value)
    }

    /// Registers `frame` as a session temp under its key. Each column of the frame
    /// gains an internal reference.
    ///
    /// # Errors
    ///
    /// Returns an error if a temp with the same key already exists.
    pub fn track_tmp(&self, frame: Frame) -> Result<Frame, Error> {
        Ok(self.state.lock().track_tmp(frame)?)
    }

    /// Removes `frame` from the session.
    ///
    /// If the frame is a temp, the temp is deregistered and references of its columns
    /// are dropped. Otherwise, the frame is treated as global: its columns lose global status
    /// and the frame is removed from the store. In both cases, columns no longer referenced
    /// by temps or other globals are reclaimed. Removing the same frame again is a no-op.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&self, frame: &Frame) -> bool {
        self.state.lock().remove(frame, &self.context.store)
    }

    /// Prepares columns at `indices` for in-place mutation by the caller. Columns
    /// shared with temps or globals are replaced with private copies (in this case,
    /// the returned frame gets a fresh key); other columns are returned as is.
    pub fn copy_on_write(&self, frame: &Frame, indices: &[usize]) -> Result<Frame, Error> {
        Ok(self.state.lock().copy_on_write(frame, indices)?)
    }

    /// Publishes `frame` in the store under `name`, replacing the frame previously
    /// published under this name. Columns already belonging to other global frames
    /// are copied.
    pub fn assign(&self, name: &str, frame: &Frame) -> Result<Frame, Error> {
        Ok(self.state.lock().assign(name, frame, &self.context.store)?)
    }

    /// Ends the session, returning `value` to the caller. All temps not reachable
    /// from the value are reclaimed; global columns of a returned frame are copied.
    pub fn end(&self, value: Value) -> EvalResult {
        let value = self.state.lock().end(Some(value))?;
        Ok(value.unwrap_or(Value::Num(f64::NAN)))
    }

    /// Ends the session without a return value, reclaiming all temps.
    pub fn end_quietly(&self) {
        // Without a value, no columns are copied, so this cannot fail.
        self.state.lock().end(None).ok();
    }

    /// Returns the internal reference count of `column`.
    pub fn ref_count(&self, column: &Column) -> usize {
        self.state.lock().ref_count(column.id())
    }

    /// Checks whether `column` is global.
    pub fn is_global(&self, column: &Column) -> bool {
        self.state.lock().globals.contains(&column.id())
    }

    /// Gets a temp by name.
    pub fn temp(&self, name: &str) -> Option<Frame> {
        self.state.lock().temp(name).cloned()
    }

    /// Returns sorted names of temps.
    pub fn temp_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.lock().temps.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Checks that the recorded reference count of each column equals the number
    /// of temps referencing it.
    pub fn check_refs(&self) -> Result<(), Error> {
        Ok(self.state.lock().check_refs()?)
    }
}
