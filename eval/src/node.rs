//! Runtime AST.

use tracing::trace;

use std::{fmt, sync::Arc};

use crate::{
    env::Env,
    error::{Error, ErrorKind, EvalResult},
    frame::Frame,
    prims::{Arity, Primitive},
    values::{Closure, Function, Row, Value},
};
use rapids_parser::{num_list::NumList, Location};

/// Definition of a function in the interpreted code: `{params . body}`.
#[derive(Debug)]
pub struct FnDef {
    params: Vec<String>,
    body: Node,
    location: Option<Location>,
}

impl FnDef {
    /// Creates a function definition.
    pub fn new(params: Vec<String>, body: Node) -> Self {
        Self {
            params,
            body,
            location: None,
        }
    }

    #[must_use]
    pub(crate) fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Returns parameter names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the function body.
    pub fn body(&self) -> &Node {
        &self.body
    }

    /// Returns the location of the definition in the code.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub(crate) fn name(&self) -> String {
        format!("{{{} . ..}}", self.params.join(" "))
    }
}

/// Kind of a [`Node`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum NodeKind {
    /// Number constant.
    Num(f64),
    /// String constant.
    Str(String),
    /// Identifier resolved at evaluation time.
    Id(String),
    /// Number list; evaluates to the expanded numbers.
    NumList(NumList),
    /// String list.
    StrList(Vec<String>),
    /// Embedded frame. Its columns are treated as global.
    Frame(Frame),
    /// Embedded row.
    Row(Row),
    /// Function definition; evaluates to a closure over the active scope.
    FnDef(Arc<FnDef>),
    /// Function application.
    Apply {
        /// Operator.
        op: Box<Node>,
        /// Unevaluated arguments.
        args: Vec<Node>,
    },
    /// Primitive function.
    Primitive(Arc<dyn Primitive>),
}

/// Node of the runtime AST. Nodes are immutable after construction.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    location: Option<Location>,
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }
}

impl Node {
    /// Creates a number constant.
    pub fn num(value: f64) -> Self {
        NodeKind::Num(value).into()
    }

    /// Creates a string constant.
    pub fn str(value: impl Into<String>) -> Self {
        NodeKind::Str(value.into()).into()
    }

    /// Creates an identifier.
    pub fn id(name: impl Into<String>) -> Self {
        NodeKind::Id(name.into()).into()
    }

    /// Creates a node embedding a frame.
    pub fn frame(frame: Frame) -> Self {
        NodeKind::Frame(frame).into()
    }

    /// Creates a node embedding a row.
    pub fn row(row: Row) -> Self {
        NodeKind::Row(row).into()
    }

    /// Creates a function definition.
    pub fn fn_def(params: Vec<String>, body: Node) -> Self {
        NodeKind::FnDef(Arc::new(FnDef::new(params, body))).into()
    }

    /// Creates a function application.
    pub fn apply(op: Node, args: Vec<Node>) -> Self {
        NodeKind::Apply {
            op: Box::new(op),
            args,
        }
        .into()
    }

    /// Creates a primitive node.
    pub fn primitive(primitive: impl Primitive) -> Self {
        NodeKind::Primitive(Arc::new(primitive)).into()
    }

    /// Sets the location of this node.
    #[must_use]
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the location of this node in the code.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Returns the arity of callable nodes (function definitions and primitives).
    pub fn arity(&self) -> Option<Arity> {
        match &self.kind {
            NodeKind::FnDef(def) => Some(Arity::Exact(def.params().len())),
            NodeKind::Primitive(primitive) => Some(primitive.arity()),
            _ => None,
        }
    }

    /// Returns the name if this node is an identifier, a string constant or a primitive.
    /// Used by primitives that take names rather than values.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Id(name) | NodeKind::Str(name) => Some(name),
            NodeKind::Primitive(primitive) => Some(primitive.name()),
            _ => None,
        }
    }

    /// Evaluates this node.
    pub fn exec(&self, env: &mut Env<'_>) -> EvalResult {
        let value = match &self.kind {
            NodeKind::Num(value) => Value::Num(*value),
            NodeKind::Str(value) => Value::Str(value.clone()),
            NodeKind::Id(name) => {
                trace!(name, "looking up identifier");
                env.lookup(name).map_err(|err| self.error(err))?
            }
            NodeKind::NumList(list) => {
                let limit = env.config().max_list_len;
                let count = list.count();
                if count > limit as u64 {
                    return Err(self.error(ErrorKind::ListTooLong { count, limit }));
                }
                Value::Nums(list.expand())
            }
            NodeKind::StrList(items) => Value::Strs(items.clone()),
            NodeKind::Frame(frame) => {
                env.add_globals(frame);
                Value::Frame(frame.clone())
            }
            NodeKind::Row(row) => Value::Row(row.clone()),
            NodeKind::FnDef(def) => {
                let closure = Closure::new(Arc::clone(def), env.scope().cloned());
                Value::Fun(Function::Closure(closure))
            }
            NodeKind::Primitive(primitive) => Value::Fun(Function::Primitive(Arc::clone(primitive))),
            NodeKind::Apply { op, args } => return self.exec_apply(env, op, args),
        };
        Ok(value)
    }

    fn exec_apply(&self, env: &mut Env<'_>, op: &Node, args: &[Node]) -> EvalResult {
        env.scoped(|env| {
            let function = match env.exec_tracked(op)? {
                Value::Fun(function) => function,
                other => return Err(op.error(ErrorKind::NotCallable(other.ty()))),
            };
            trace!(function = %function.name(), args = args.len(), "applying function");

            function.apply(env, args).map_err(|mut err| {
                err.push_call(
                    &function.name(),
                    function.def_location(),
                    self.location.as_ref(),
                );
                err.with_location(self.location.as_ref())
            })
        })
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind).with_location(self.location.as_ref())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Num(value) => write!(formatter, "#{}", value),
            NodeKind::Str(value) => write!(formatter, "{:?}", value),
            NodeKind::Id(name) => formatter.write_str(name),
            NodeKind::NumList(list) => fmt::Display::fmt(list, formatter),
            NodeKind::StrList(items) => {
                formatter.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(" ")?;
                    }
                    write!(formatter, "{:?}", item)?;
                }
                formatter.write_str("]")
            }
            NodeKind::Frame(frame) => formatter.write_str(frame.key()),
            NodeKind::Row(row) => write!(formatter, "<row of {}>", row.values().len()),
            NodeKind::FnDef(def) => {
                formatter.write_str("{")?;
                for param in def.params() {
                    write!(formatter, "{} ", param)?;
                }
                write!(formatter, ". {}}}", def.body())
            }
            NodeKind::Apply { op, args } => {
                write!(formatter, "({}", op)?;
                for arg in args {
                    write!(formatter, " {}", arg)?;
                }
                formatter.write_str(")")
            }
            NodeKind::Primitive(primitive) => formatter.write_str(primitive.name()),
        }
    }
}
