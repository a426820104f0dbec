//! Primitive functions and the primitive registry.
//!
//! # Defining primitives
//!
//! A primitive implements [`Primitive`]. Its [`apply`](Primitive::apply()) method receives
//! *unevaluated* argument nodes, so a primitive decides which args to evaluate and in which
//! order. Args should be evaluated with [`Env::exec_tracked()`] so that intermediate frames
//! are released once the application completes.
//!
//! Most primitives evaluate all their args in order; [`Eager`] wraps a function over evaluated
//! values into a primitive.
//!
//! ```
//! use rapids_eval::{
//!     prims::{Arity, Eager, Primitives},
//!     Session, SessionConfig, Store, Value,
//! };
//! use std::sync::Arc;
//!
//! let mut primitives = Primitives::clone(&Primitives::standard());
//! primitives.insert(Eager::new("twice", Arity::Exact(1), |_env, args| {
//!     Ok(Value::Num(2.0 * args[0].as_num()?))
//! }));
//! let session = Session::with_config(
//!     Arc::new(primitives),
//!     Store::new(),
//!     SessionConfig::default(),
//! );
//! assert_eq!(session.exec("(twice (+ 1 2))")?, Value::Num(6.0));
//! # Ok::<_, rapids_eval::Error>(())
//! ```

use hashbrown::HashMap;
use once_cell::sync::OnceCell;

use std::{fmt, sync::Arc};

use crate::{
    env::Env,
    error::{ErrorKind, EvalResult},
    node::{Node, NodeKind},
    values::{Function, Value},
};
use rapids_parser::num_list::NumList;

mod arith;
mod assign;
mod flow;
mod mungers;
mod reduce;

pub use self::{
    arith::{Arithmetic, Binary, BinaryOp, Unary, UnaryOp},
    assign::Assignment,
    flow::{And, IfElse, Logic, Not, Or, Sequence},
    mungers::FrameAccess,
    reduce::{Reduce, Reducer, Reducers},
};

/// Number of args accepted by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly the specified number of args.
    Exact(usize),
    /// At least the specified number of args.
    AtLeast(usize),
    /// Any number of args.
    Variable,
}

impl fmt::Display for Arity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(count) => write!(formatter, "{}", count),
            Self::AtLeast(count) => write!(formatter, "at least {}", count),
            Self::Variable => formatter.write_str("any number of"),
        }
    }
}

impl Arity {
    /// Checks whether this arity accepts `count` args.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(expected) => count == expected,
            Self::AtLeast(min) => count >= min,
            Self::Variable => true,
        }
    }

    /// Checks the number of args in a call to the function `name`.
    pub fn check(self, name: &str, count: usize) -> Result<(), ErrorKind> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(ErrorKind::ArityMismatch {
                name: name.to_owned(),
                expected: self,
                actual: count,
            })
        }
    }
}

/// Primitive function.
///
/// Primitives are stateless; a single instance is shared by all sessions using
/// the registry it is inserted into.
pub trait Primitive: fmt::Debug + Send + Sync + 'static {
    /// Returns the name of the primitive.
    fn name(&self) -> &str;

    /// Returns the arity of the primitive. The arity is checked before [`Self::apply()`]
    /// is called.
    fn arity(&self) -> Arity;

    /// Applies the primitive to unevaluated `args`.
    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult;
}

/// Primitive evaluating all its args in order before invoking the wrapped function.
pub struct Eager<F> {
    name: &'static str,
    arity: Arity,
    function: F,
}

impl<F> fmt::Debug for Eager<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Eager")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl<F> Eager<F>
where
    F: Fn(&mut Env<'_>, Vec<Value>) -> EvalResult + Send + Sync + 'static,
{
    /// Wraps `function`.
    pub const fn new(name: &'static str, arity: Arity, function: F) -> Self {
        Self {
            name,
            arity,
            function,
        }
    }
}

impl<F> Primitive for Eager<F>
where
    F: Fn(&mut Env<'_>, Vec<Value>) -> EvalResult + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let args = env.exec_all(args)?;
        (self.function)(env, args)
    }
}

/// Source of primitives and constants that can be merged into [`Primitives`].
pub trait PrimitiveProvider {
    /// Returns provided primitives.
    fn primitives(&self) -> Vec<Arc<dyn Primitive>>;

    /// Returns provided named constants.
    fn constants(&self) -> Vec<(&'static str, Value)> {
        vec![]
    }
}

/// Registry of primitives and named constants, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Primitives {
    fns: HashMap<String, Arc<dyn Primitive>>,
    constants: HashMap<String, Value>,
}

impl Primitives {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the standard registry, which is built once per process.
    pub fn standard() -> Arc<Self> {
        static STANDARD: OnceCell<Arc<Primitives>> = OnceCell::new();
        let standard = STANDARD.get_or_init(|| {
            let mut primitives = Self::new();
            primitives
                .extend(&Logic)
                .extend(&Arithmetic)
                .extend(&Reducers)
                .extend(&FrameAccess)
                .extend(&Assignment);
            Arc::new(primitives)
        });
        Arc::clone(standard)
    }

    /// Inserts a primitive, replacing a previously registered one with the same name.
    pub fn insert(&mut self, primitive: impl Primitive) -> &mut Self {
        self.insert_arc(Arc::new(primitive))
    }

    /// Inserts a shared primitive.
    pub fn insert_arc(&mut self, primitive: Arc<dyn Primitive>) -> &mut Self {
        self.fns.insert(primitive.name().to_owned(), primitive);
        self
    }

    /// Inserts a named constant.
    pub fn insert_constant(&mut self, name: &str, value: Value) -> &mut Self {
        self.constants.insert(name.to_owned(), value);
        self
    }

    /// Merges primitives and constants from `provider`.
    pub fn extend(&mut self, provider: &impl PrimitiveProvider) -> &mut Self {
        for primitive in provider.primitives() {
            self.insert_arc(primitive);
        }
        for (name, value) in provider.constants() {
            self.insert_constant(name, value);
        }
        self
    }

    /// Gets a primitive by name.
    pub fn primitive(&self, name: &str) -> Option<&Arc<dyn Primitive>> {
        self.fns.get(name)
    }

    /// Gets a primitive or a constant by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(primitive) = self.fns.get(name) {
            Some(Value::Fun(Function::Primitive(Arc::clone(primitive))))
        } else {
            self.constants.get(name).cloned()
        }
    }

    /// Checks whether the registry contains a primitive or a constant with `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name) || self.constants.contains_key(name)
    }

    /// Returns sorted names of primitives and constants.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self
            .fns
            .keys()
            .chain(self.constants.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}

/// Extracts a name from an unevaluated arg.
pub(crate) fn name_arg<'n>(primitive: &str, node: &'n Node) -> Result<&'n str, ErrorKind> {
    node.as_name()
        .ok_or_else(|| ErrorKind::invalid_arg(primitive, format!("expected name, got `{}`", node)))
}

/// Selector of rows or columns given as an arg.
#[derive(Debug)]
pub(crate) enum Selector {
    Indices(NumList),
    Names(Vec<String>),
    Mask(crate::Frame),
}

impl Selector {
    /// Reads a selector from an arg. Number list literals are used as is, without expansion.
    pub(crate) fn from_arg(env: &mut Env<'_>, primitive: &str, node: &Node) -> EvalResult<Self> {
        if let NodeKind::NumList(list) = node.kind() {
            return Ok(Self::Indices(list.clone()));
        }
        Ok(match env.exec_tracked(node)? {
            Value::Num(value) => Self::Indices(NumList::from_values(&[value])),
            Value::Nums(values) => Self::Indices(NumList::from_values(&values)),
            Value::Str(name) => Self::Names(vec![name]),
            Value::Strs(names) => Self::Names(names),
            Value::Frame(frame) => Self::Mask(frame),
            other => {
                let message = format!("unsupported selector type: {}", other.ty());
                return Err(ErrorKind::invalid_arg(primitive, message).into());
            }
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::Indices(list) => list.is_empty(),
            Self::Names(names) => names.is_empty(),
            Self::Mask(_) => false,
        }
    }
}
