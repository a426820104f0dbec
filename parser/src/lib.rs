//! Parser for Rapids, a small prefix expression language used to manipulate columnar data
//! frames.
//!
//! # Syntax
//!
//! Every Rapids program is a single expression. The expression kind is determined
//! by its first non-whitespace char:
//!
//! - **Applications** `(op arg1 arg2 ..)`. The operator may be an identifier, a function
//!   definition or another application.
//! - **Function definitions** `{x y . body}`. Parameters must be distinct identifiers.
//! - **Number lists** `[0, 5:15:2]` consisting of numbers and `base:end[:stride]` ranges.
//!   Elements are separated by commas or whitespace; `[]` is an empty list.
//! - **String lists** `["a" 'b']`.
//! - **Strings** quoted with `"` or `'`, with backslash escapes.
//! - **Numbers** like `3`, `-1.5e3` or `#42` (the `#` prefix is optional).
//! - **Identifiers**, which are any other runs of chars excluding whitespace
//!   and `({[]})\"'`. E.g., `+`, `tmp=`, `%frame.hex` and `x` are all valid identifiers.
//!
//! Applications may be followed by the `->name` suffix, which is a shorthand for binding
//! the result to a session temporary: `(cols x [0])->y` is the same as `(tmp= y (cols x [0]))`.
//!
//! Optional syntax is controlled via [`Features`](grammars::Features) declared
//! by a [`Grammar`](grammars::Grammar).
//!
//! # Examples
//!
//! ```
//! # use assert_matches::assert_matches;
//! use rapids_parser::{grammars::{Grammar, Rapids}, Expr, FnDefinition};
//!
//! let expr = Rapids::parse_expr("({x y . (+ x y)} 3 4)")?;
//! let Expr::Apply { op, args } = &expr.extra else {
//!     unreachable!();
//! };
//! assert_matches!(
//!     &op.extra,
//!     Expr::FnDefinition(FnDefinition { params, .. }) if params.len() == 2
//! );
//! assert_eq!(args.len(), 2);
//! assert_matches!(args[0].extra, Expr::Number(n) if n == 3.0);
//!
//! let expr = Rapids::parse_expr("[0,5:15:2]")?;
//! let Expr::NumList(list) = &expr.extra else {
//!     unreachable!();
//! };
//! assert_eq!(list.expand(), [0.0, 5.0, 7.0, 9.0, 11.0, 13.0]);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

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
    ast::{Expr, ExprType, FnDefinition, SpannedExpr},
    error::{Context, Error, ErrorKind},
    parser::is_valid_variable_name,
    spans::{
        CodeFragment, InputSpan, LocatedSpan, Location, MaybeSpanned, NomResult, Spanned,
        StripCode,
    },
};

mod ast;
mod error;
pub mod grammars;
pub mod num_list;
mod parser;
mod spans;
