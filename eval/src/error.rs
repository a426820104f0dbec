//! Evaluation errors.

use std::{error, fmt};

use crate::{
    frame::{ColumnId, ColumnType},
    prims::Arity,
    values::ValueType,
};
use rapids_parser::{num_list::NumListError, Location, StripCode};

/// Broad category of an [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed program text.
    Parse,
    /// Function called with a wrong number of args.
    Arity,
    /// Value of an unexpected type.
    Type,
    /// Value of the expected type, but outside of the supported domain.
    Domain,
    /// Identifier that resolves to nothing.
    UnknownIdentifier,
    /// Violated internal invariant of the session bookkeeping.
    Consistency,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Parse => "parse error",
            Self::Arity => "arity error",
            Self::Type => "type error",
            Self::Domain => "domain error",
            Self::UnknownIdentifier => "unknown identifier",
            Self::Consistency => "consistency error",
        })
    }
}

/// Kinds of errors that can occur when evaluating Rapids expressions.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Error parsing the program.
    Parse(rapids_parser::ErrorKind),

    /// Mismatch between the declared function arity and the number of args in the call.
    ArityMismatch {
        /// Function name.
        name: String,
        /// Arity of the function.
        expected: Arity,
        /// Number of args in the call.
        actual: usize,
    },
    /// Operator of an application has evaluated to something other than a function.
    NotCallable(ValueType),
    /// Value has an unexpected type.
    UnexpectedType {
        /// Expected value type.
        expected: ValueType,
        /// Actual value type.
        actual: ValueType,
    },
    /// Column has an unexpected type.
    UnexpectedColumnType {
        /// Expected column type.
        expected: ColumnType,
        /// Actual column type.
        actual: ColumnType,
    },
    /// Argument of an unsupported kind passed to a primitive.
    InvalidArg {
        /// Primitive name.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// Invalid row or column selector.
    Selector(NumListError),
    /// Row index exceeds the number of rows.
    RowOutOfRange {
        /// Requested row.
        index: usize,
        /// Number of rows in the frame.
        len: usize,
    },
    /// Number list literal selects more numbers than a value may hold.
    ListTooLong {
        /// Number of selected numbers.
        count: u64,
        /// Maximum number of elements in a number array.
        limit: usize,
    },
    /// Column with the specified name does not exist.
    UnknownColumn(String),
    /// Frames or columns have incompatible shapes.
    ShapeMismatch {
        /// Description of the shapes involved.
        message: String,
    },
    /// Column data has been reclaimed.
    FreedColumn(ColumnId),
    /// Session temporary with this name already exists.
    TempExists(String),
    /// Failure reported by a library primitive.
    Native(anyhow::Error),

    /// Identifier is not bound in the scope chain, primitive table, session temps or store.
    UnknownIdentifier(String),

    /// Recorded reference count of a column differs from the count of temp frames
    /// referencing it.
    RefCountMismatch {
        /// Column.
        column: ColumnId,
        /// Recorded internal reference count.
        recorded: usize,
        /// Number of references from session temps.
        expected: usize,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(formatter, "Parse error: {}", err),
            Self::ArityMismatch {
                name,
                expected,
                actual,
            } => write!(
                formatter,
                "Mismatch between the number of args in the definition of `{}` and its call: \
                 definition requires {} arg(s), call has {}",
                name, expected, actual
            ),
            Self::NotCallable(ty) => write!(formatter, "Expected function, found {}", ty),
            Self::UnexpectedType { expected, actual } => {
                write!(formatter, "Expected {}, found {}", expected, actual)
            }
            Self::UnexpectedColumnType { expected, actual } => {
                write!(formatter, "Expected {} column, found {} column", expected, actual)
            }
            Self::InvalidArg { name, message } => {
                write!(formatter, "Invalid argument for `{}`: {}", name, message)
            }
            Self::Selector(err) => write!(formatter, "Invalid selector: {}", err),
            Self::RowOutOfRange { index, len } => write!(
                formatter,
                "Row index {} is out of range for a frame with {} row(s)",
                index, len
            ),
            Self::ListTooLong { count, limit } => write!(
                formatter,
                "Number list selects {} number(s), which exceeds the limit of {}",
                count, limit
            ),
            Self::UnknownColumn(name) => write!(formatter, "Column `{}` does not exist", name),
            Self::ShapeMismatch { message } => write!(formatter, "Shape mismatch: {}", message),
            Self::FreedColumn(id) => write!(formatter, "Column {} has been reclaimed", id),
            Self::TempExists(name) => write!(formatter, "Temp `{}` already exists", name),
            Self::Native(err) => write!(formatter, "Failed executing primitive: {}", err),
            Self::UnknownIdentifier(name) => {
                write!(formatter, "Name lookup of `{}` failed", name)
            }
            Self::RefCountMismatch {
                column,
                recorded,
                expected,
            } => write!(
                formatter,
                "Column {} has recorded reference count {}, but is referenced by {} temp(s)",
                column, recorded, expected
            ),
        }
    }
}

impl ErrorKind {
    /// Creates a native error.
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(anyhow::Error::msg(message.into()))
    }

    /// Creates an error about an invalid argument of the primitive `name`.
    pub fn invalid_arg(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArg {
            name: name.to_owned(),
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse(_) => ErrorCategory::Parse,
            Self::ArityMismatch { .. } => ErrorCategory::Arity,
            Self::NotCallable(_)
            | Self::UnexpectedType { .. }
            | Self::UnexpectedColumnType { .. }
            | Self::InvalidArg { .. } => ErrorCategory::Type,
            Self::Selector(_)
            | Self::RowOutOfRange { .. }
            | Self::ListTooLong { .. }
            | Self::UnknownColumn(_)
            | Self::ShapeMismatch { .. }
            | Self::FreedColumn(_)
            | Self::TempExists(_)
            | Self::Native(_) => ErrorCategory::Domain,
            Self::UnknownIdentifier(_) => ErrorCategory::UnknownIdentifier,
            Self::RefCountMismatch { .. } => ErrorCategory::Consistency,
        }
    }

    /// Returns information helping fix the error.
    pub fn help(&self) -> Option<String> {
        Some(match self {
            Self::NotCallable(_) => "Only functions can occupy the operator position \
                of an application: primitives, `{x . body}` definitions, or expressions \
                evaluating to them"
                .to_owned(),
            Self::TempExists(name) => format!("Remove the temp first with `(rm {})`", name),
            Self::ListTooLong { .. } => "Pass the list directly to a row or column selector, \
                which resolves it without expansion"
                .to_owned(),
            Self::Selector(NumListError::MixedSigns) => {
                "Negative indices exclude columns; they cannot be combined with \
                 non-negative ones"
                    .to_owned()
            }
            Self::RefCountMismatch { .. } => {
                "This indicates a bug in the interpreter or in a library primitive".to_owned()
            }
            _ => return None,
        })
    }
}

impl error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Selector(err) => Some(err),
            Self::Native(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<NumListError> for ErrorKind {
    fn from(err: NumListError) -> Self {
        Self::Selector(err)
    }
}

/// Function call recorded in a [`Backtrace`].
#[derive(Debug, Clone)]
pub struct BacktraceElement {
    /// Function name.
    pub fn_name: String,
    /// Location of the function definition, if the function is user-defined.
    pub def_location: Option<Location>,
    /// Location of the function call.
    pub call_location: Option<Location>,
}

/// Call backtrace.
#[derive(Debug, Clone, Default)]
pub struct Backtrace {
    calls: Vec<BacktraceElement>,
}

impl Backtrace {
    /// Iterates over the backtrace, starting from the most recent call.
    pub fn calls(&self) -> impl Iterator<Item = &BacktraceElement> + '_ {
        self.calls.iter()
    }

    /// Checks whether the backtrace is empty.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn push_call(&mut self, call: BacktraceElement) {
        self.calls.push(call);
    }
}

/// Evaluation error together with the location of the failing expression and a backtrace.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    location: Option<Location>,
    backtrace: Backtrace,
}

impl Error {
    /// Creates an error without location information.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: None,
            backtrace: Backtrace::default(),
        }
    }

    pub(crate) fn from_parse(err: rapids_parser::Error<'_>) -> Self {
        let location = err.span().strip_code();
        Self {
            kind: ErrorKind::Parse(err.into_kind()),
            location: Some(location),
            backtrace: Backtrace::default(),
        }
    }

    /// Sets the location of the error unless it is already set.
    #[must_use]
    pub fn with_location(mut self, location: Option<&Location>) -> Self {
        if self.location.is_none() {
            self.location = location.cloned();
        }
        self
    }

    pub(crate) fn push_call(
        &mut self,
        fn_name: &str,
        def_location: Option<&Location>,
        call_location: Option<&Location>,
    ) {
        self.backtrace.push_call(BacktraceElement {
            fn_name: fn_name.to_owned(),
            def_location: def_location.cloned(),
            call_location: call_location.cloned(),
        });
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the location of the expression that has caused this error.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Returns the call backtrace, innermost call first.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<NumListError> for Error {
    fn from(err: NumListError) -> Self {
        Self::new(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(formatter, "{}: ", location)?;
        }
        fmt::Display::fmt(&self.kind, formatter)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Result of evaluating an expression.
pub type EvalResult<T = crate::Value> = Result<T, Error>;
