//! Values used by the interpreter.

use std::fmt;

use crate::{error::ErrorKind, frame::Frame};

mod function;

pub use self::function::{Closure, Function};

/// Possible high-level types of [`Value`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueType {
    /// Number (`f64`). Booleans are encoded as `1` and `0`.
    Num,
    /// Array of numbers.
    Nums,
    /// String.
    Str,
    /// Array of strings.
    Strs,
    /// Frame.
    Frame,
    /// Single row of numeric values.
    Row,
    /// Function value.
    Fun,
}

impl fmt::Display for ValueType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Num => "number",
            Self::Nums => "number array",
            Self::Str => "string",
            Self::Strs => "string array",
            Self::Frame => "frame",
            Self::Row => "row",
            Self::Fun => "function",
        })
    }
}

/// Single row of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<f64>,
    names: Vec<String>,
}

impl Row {
    /// Creates a row. Values and names must have the same length.
    pub fn new(values: Vec<f64>, names: Vec<String>) -> Result<Self, ErrorKind> {
        if values.len() == names.len() {
            Ok(Self { values, names })
        } else {
            Err(ErrorKind::ShapeMismatch {
                message: format!("{} names for {} row values", names.len(), values.len()),
            })
        }
    }

    /// Returns values in this row.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Gets a value by the column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let idx = self.names.iter().position(|candidate| candidate == name)?;
        Some(self.values[idx])
    }
}

/// Values produced by evaluating Rapids expressions.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Value {
    /// Number.
    Num(f64),
    /// Array of numbers.
    Nums(Vec<f64>),
    /// String.
    Str(String),
    /// Array of strings.
    Strs(Vec<String>),
    /// Frame.
    Frame(Frame),
    /// Single row.
    Row(Row),
    /// Function.
    Fun(Function),
}

impl Value {
    /// Creates a boolean value encoded as a number.
    pub fn bool(value: bool) -> Self {
        Self::Num(if value { 1.0 } else { 0.0 })
    }

    /// Returns the type of this value.
    pub fn ty(&self) -> ValueType {
        match self {
            Self::Num(_) => ValueType::Num,
            Self::Nums(_) => ValueType::Nums,
            Self::Str(_) => ValueType::Str,
            Self::Strs(_) => ValueType::Strs,
            Self::Frame(_) => ValueType::Frame,
            Self::Row(_) => ValueType::Row,
            Self::Fun(_) => ValueType::Fun,
        }
    }

    fn type_error(&self, expected: ValueType) -> ErrorKind {
        ErrorKind::UnexpectedType {
            expected,
            actual: self.ty(),
        }
    }

    /// Returns the number contained in this value.
    pub fn as_num(&self) -> Result<f64, ErrorKind> {
        match self {
            Self::Num(value) => Ok(*value),
            _ => Err(self.type_error(ValueType::Num)),
        }
    }

    /// Returns the number array contained in this value.
    pub fn as_nums(&self) -> Result<&[f64], ErrorKind> {
        match self {
            Self::Nums(values) => Ok(values),
            _ => Err(self.type_error(ValueType::Nums)),
        }
    }

    /// Returns the string contained in this value.
    pub fn as_str(&self) -> Result<&str, ErrorKind> {
        match self {
            Self::Str(value) => Ok(value),
            _ => Err(self.type_error(ValueType::Str)),
        }
    }

    /// Returns the string array contained in this value.
    pub fn as_strs(&self) -> Result<&[String], ErrorKind> {
        match self {
            Self::Strs(values) => Ok(values),
            _ => Err(self.type_error(ValueType::Strs)),
        }
    }

    /// Returns the frame contained in this value.
    pub fn as_frame(&self) -> Result<&Frame, ErrorKind> {
        match self {
            Self::Frame(frame) => Ok(frame),
            _ => Err(self.type_error(ValueType::Frame)),
        }
    }

    /// Converts this value into a frame.
    pub fn into_frame(self) -> Result<Frame, ErrorKind> {
        match self {
            Self::Frame(frame) => Ok(frame),
            other => Err(other.type_error(ValueType::Frame)),
        }
    }

    /// Returns the row contained in this value.
    pub fn as_row(&self) -> Result<&Row, ErrorKind> {
        match self {
            Self::Row(row) => Ok(row),
            _ => Err(self.type_error(ValueType::Row)),
        }
    }

    /// Returns the function contained in this value.
    pub fn as_fun(&self) -> Result<&Function, ErrorKind> {
        match self {
            Self::Fun(function) => Ok(function),
            _ => Err(self.type_error(ValueType::Fun)),
        }
    }

    /// Returns frames reachable from this value, including the frames bound
    /// in the scopes captured by closures.
    pub fn frames(&self) -> Vec<Frame> {
        let mut frames = vec![];
        self.collect_frames(&mut frames);
        frames
    }

    pub(crate) fn collect_frames(&self, frames: &mut Vec<Frame>) {
        match self {
            Self::Frame(frame) => frames.push(frame.clone()),
            Self::Fun(Function::Closure(closure)) => closure.collect_frames(frames),
            _ => { /* no frames */ }
        }
    }

    /// Checks whether this value holds any frames.
    pub(crate) fn holds_frames(&self) -> bool {
        match self {
            Self::Frame(_) => true,
            Self::Fun(Function::Closure(closure)) => closure.holds_frames(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, rhs: &Self) -> bool {
        match (self, rhs) {
            (Self::Num(x), Self::Num(y)) => x == y,
            (Self::Nums(xs), Self::Nums(ys)) => xs == ys,
            (Self::Str(x), Self::Str(y)) => x == y,
            (Self::Strs(xs), Self::Strs(ys)) => xs == ys,
            (Self::Frame(x), Self::Frame(y)) => x.is_same(y),
            (Self::Row(x), Self::Row(y)) => x == y,
            (Self::Fun(x), Self::Fun(y)) => x.is_same(y),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Frame> for Value {
    fn from(frame: Frame) -> Self {
        Self::Frame(frame)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        Self::Row(row)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(value) => fmt::Display::fmt(value, formatter),
            Self::Nums(values) => write!(formatter, "{:?}", values),
            Self::Str(value) => write!(formatter, "{:?}", value),
            Self::Strs(values) => write!(formatter, "{:?}", values),
            Self::Frame(frame) => write!(
                formatter,
                "frame `{}` ({} x {})",
                frame.key(),
                frame.nrows(),
                frame.ncols()
            ),
            Self::Row(row) => {
                formatter.write_str("{")?;
                for (i, (name, value)) in row.names.iter().zip(&row.values).enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{}: {}", name, value)?;
                }
                formatter.write_str("}")
            }
            Self::Fun(function) => write!(formatter, "fn `{}`", function.name()),
        }
    }
}
