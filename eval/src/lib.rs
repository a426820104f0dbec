//! Interpreter for Rapids expressions produced by [`rapids-parser`], evaluated against
//! columnar [`Frame`]s.
//!
//! # How it works
//!
//! 1. An expression is parsed and *compiled* into a [`Node`] tree. Compilation resolves
//!   references to [primitives](prims) and desugars the `->name` suffix.
//! 2. The node is evaluated within a [`Session`]. Each evaluation runs in an [`Env`], which
//!   tracks frames produced during evaluation on a stack and manages lexical [`Scope`]s
//!   of interpreted functions.
//!
//! # Semantics
//!
//! - Primitives receive their args unevaluated. Most primitives evaluate all args eagerly,
//!   but some (e.g., `&&`, `||` and `ifelse`) skip evaluating some args.
//! - Functions defined in the code (`{x y . body}`) are closures: they capture the scope
//!   active at definition.
//! - Identifiers are resolved in the following order: the lexical scope, primitives
//!   and constants, session temps, and finally the shared [`Store`].
//! - Frames share columns. A [`Session`] counts references to each column held by temps
//!   and tracks columns of frames read from the store. Columns are only mutated in place
//!   if nothing else refers to them; otherwise, they are copied beforehand.
//! - Temporaries created by an evaluation live until they are removed or
//!   the session [ends](Session::end()).
//!
//! # Examples
//!
//! ```
//! use rapids_eval::{Frame, Session, Store, Value};
//!
//! let store = Store::new();
//! store.insert(Frame::from_nums([("x", vec![1.0, 2.0, 3.0])])?.with_key("data"));
//!
//! let session = Session::new(store.clone());
//! let value = session.exec("({x y . (+ x y)} 3 4)")?;
//! assert_eq!(value, Value::Num(7.0));
//!
//! // Frames can be bound to session temps.
//! let frame = session.exec("(* data 2)->doubled")?;
//! assert_eq!(frame.as_frame()?.columns()[0].nums()?, [2.0, 4.0, 6.0]);
//! assert_eq!(session.exec("(max doubled)")?, Value::Num(6.0));
//!
//! // Ending the session releases all temps.
//! session.end_quietly();
//! assert!(session.temp("doubled").is_none());
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! [`rapids-parser`]: https://docs.rs/rapids-parser/

#![warn(missing_docs, missing_debug_implementations)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]

pub use crate::{
    compiler::Compiler,
    env::{Env, Scope},
    error::{Backtrace, BacktraceElement, Error, ErrorCategory, ErrorKind, EvalResult},
    frame::{Column, ColumnData, ColumnId, ColumnType, Frame, Store},
    node::{FnDef, Node, NodeKind},
    session::{Session, SessionConfig},
    values::{Closure, Function, Row, Value, ValueType},
};

mod compiler;
mod env;
mod error;
mod frame;
mod node;
pub mod prims;
mod session;
mod values;
