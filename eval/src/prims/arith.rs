//! Arithmetic, comparison and math primitives.

use std::sync::Arc;

use super::{Arity, Primitive, PrimitiveProvider};
use crate::{
    env::Env,
    error::{ErrorKind, EvalResult},
    frame::{Column, ColumnType, Frame},
    node::Node,
    values::Value,
};

/// Arithmetic primitives: binary ops, comparisons and element-wise math functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Arithmetic;

impl PrimitiveProvider for Arithmetic {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        let binary = BinaryOp::ALL
            .iter()
            .map(|&op| Arc::new(Binary(op)) as Arc<dyn Primitive>);
        let unary = UnaryOp::ALL
            .iter()
            .map(|&op| Arc::new(Unary(op)) as Arc<dyn Primitive>);
        binary.chain(unary).collect()
    }
}

/// Binary operation on numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BinaryOp {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Power (`^`).
    Pow,
    /// Equality (`==`).
    Eq,
    /// Non-equality (`!=`).
    NotEq,
    /// "Less than" comparison (`<`).
    Lt,
    /// "Less or equal" comparison (`<=`).
    Le,
    /// "Greater than" comparison (`>`).
    Gt,
    /// "Greater or equal" comparison (`>=`).
    Ge,
}

impl BinaryOp {
    const ALL: [Self; 11] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Pow,
        Self::Eq,
        Self::NotEq,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
    ];

    /// Returns the name of the primitive implementing this op.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Checks whether this op is a comparison.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    /// Applies this op. Comparisons return `1` or `0`, or `NaN` if any operand is `NaN`.
    pub fn eval(self, x: f64, y: f64) -> f64 {
        let compare = |cmp: bool| {
            if x.is_nan() || y.is_nan() {
                f64::NAN
            } else if cmp {
                1.0
            } else {
                0.0
            }
        };

        match self {
            Self::Add => x + y,
            Self::Sub => x - y,
            Self::Mul => x * y,
            Self::Div => x / y,
            Self::Pow => x.powf(y),
            Self::Eq => compare(x == y),
            Self::NotEq => compare(x != y),
            Self::Lt => compare(x < y),
            Self::Le => compare(x <= y),
            Self::Gt => compare(x > y),
            Self::Ge => compare(x >= y),
        }
    }
}

/// Primitive for a [`BinaryOp`].
///
/// Operands may be numbers, number arrays of equal length, or numeric frames.
/// A number is broadcast over a frame; two frames must have the same shape,
/// or one of them must have a single column with the same number of rows.
/// `==` and `!=` also compare string or categorical columns with a string.
#[derive(Debug, Clone, Copy)]
pub struct Binary(pub BinaryOp);

impl Binary {
    fn shape_error(lhs: &Frame, rhs: &Frame) -> ErrorKind {
        ErrorKind::ShapeMismatch {
            message: format!(
                "frames with shapes {}x{} and {}x{}",
                lhs.nrows(),
                lhs.ncols(),
                rhs.nrows(),
                rhs.ncols()
            ),
        }
    }

    fn frame_with_scalar(self, frame: &Frame, y: f64, flip: bool) -> Result<Frame, ErrorKind> {
        let op = self.0;
        let columns = frame
            .columns()
            .iter()
            .map(|column| {
                if flip {
                    column.map(|x| op.eval(y, x))
                } else {
                    column.map(|x| op.eval(x, y))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Frame::new(frame.names().to_vec(), columns)
    }

    fn frame_with_str(self, frame: &Frame, value: &str) -> Result<Frame, ErrorKind> {
        let negate = match self.0 {
            BinaryOp::Eq => false,
            BinaryOp::NotEq => true,
            _ => {
                return Err(ErrorKind::invalid_arg(
                    self.name(),
                    "strings only support `==` and `!=`",
                ));
            }
        };

        let mut columns = Vec::with_capacity(frame.ncols());
        for column in frame.columns() {
            if column.ty()? == ColumnType::Num {
                return Err(ErrorKind::UnexpectedColumnType {
                    expected: ColumnType::Str,
                    actual: ColumnType::Num,
                });
            }
            let values = (0..frame.nrows())
                .map(|row| -> Result<f64, ErrorKind> {
                    Ok(match column.str_at(row)? {
                        None => f64::NAN,
                        Some(s) if (s == value) != negate => 1.0,
                        Some(_) => 0.0,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            columns.push(Column::num(values));
        }
        Frame::new(frame.names().to_vec(), columns)
    }

    fn frames(self, lhs: &Frame, rhs: &Frame) -> Result<Frame, ErrorKind> {
        if lhs.nrows() != rhs.nrows() {
            return Err(Self::shape_error(lhs, rhs));
        }
        let op = self.0;
        let zip = |x: &Column, y: &Column| x.zip_map(y, |x, y| op.eval(x, y));

        let columns = if lhs.ncols() == rhs.ncols() {
            lhs.columns()
                .iter()
                .zip(rhs.columns())
                .map(|(x, y)| zip(x, y))
                .collect::<Result<Vec<_>, _>>()?
        } else if rhs.ncols() == 1 {
            let y = &rhs.columns()[0];
            lhs.columns()
                .iter()
                .map(|x| zip(x, y))
                .collect::<Result<Vec<_>, _>>()?
        } else if lhs.ncols() == 1 {
            let x = &lhs.columns()[0];
            rhs.columns()
                .iter()
                .map(|y| zip(x, y))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            return Err(Self::shape_error(lhs, rhs));
        };

        let names = if lhs.ncols() >= rhs.ncols() {
            lhs.names()
        } else {
            rhs.names()
        };
        Frame::new(names.to_vec(), columns)
    }

    fn arrays(self, xs: &[f64], ys: &[f64]) -> Result<Vec<f64>, ErrorKind> {
        if xs.len() != ys.len() {
            return Err(ErrorKind::ShapeMismatch {
                message: format!("arrays with {} and {} elements", xs.len(), ys.len()),
            });
        }
        Ok(xs.iter().zip(ys).map(|(&x, &y)| self.0.eval(x, y)).collect())
    }

    /// Evaluates the op on two values.
    pub fn eval(self, lhs: &Value, rhs: &Value) -> Result<Value, ErrorKind> {
        let op = self.0;
        Ok(match (lhs, rhs) {
            (Value::Num(x), Value::Num(y)) => Value::Num(op.eval(*x, *y)),
            (Value::Nums(xs), Value::Num(y)) => {
                Value::Nums(xs.iter().map(|&x| op.eval(x, *y)).collect())
            }
            (Value::Num(x), Value::Nums(ys)) => {
                Value::Nums(ys.iter().map(|&y| op.eval(*x, y)).collect())
            }
            (Value::Nums(xs), Value::Nums(ys)) => Value::Nums(self.arrays(xs, ys)?),
            (Value::Frame(frame), Value::Num(y)) => {
                Value::Frame(self.frame_with_scalar(frame, *y, false)?)
            }
            (Value::Num(x), Value::Frame(frame)) => {
                Value::Frame(self.frame_with_scalar(frame, *x, true)?)
            }
            (Value::Frame(frame), Value::Str(s)) | (Value::Str(s), Value::Frame(frame)) => {
                Value::Frame(self.frame_with_str(frame, s)?)
            }
            (Value::Str(x), Value::Str(y)) if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) => {
                Value::bool((x == y) == (op == BinaryOp::Eq))
            }
            (Value::Frame(lhs), Value::Frame(rhs)) => Value::Frame(self.frames(lhs, rhs)?),
            _ => {
                let message = format!("unsupported operands: {} and {}", lhs.ty(), rhs.ty());
                return Err(ErrorKind::invalid_arg(self.name(), message));
            }
        })
    }
}

impl Primitive for Binary {
    fn name(&self) -> &str {
        self.0.as_str()
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let lhs = env.exec_tracked(&args[0])?;
        let rhs = env.exec_tracked(&args[1])?;
        Ok(self.eval(&lhs, &rhs)?)
    }
}

/// Element-wise math function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UnaryOp {
    /// Absolute value.
    Abs,
    /// Square root.
    Sqrt,
    /// Exponent.
    Exp,
    /// Natural logarithm.
    Log,
    /// Rounding down.
    Floor,
    /// Rounding up.
    Ceiling,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
}

impl UnaryOp {
    const ALL: [Self; 8] = [
        Self::Abs,
        Self::Sqrt,
        Self::Exp,
        Self::Log,
        Self::Floor,
        Self::Ceiling,
        Self::Sin,
        Self::Cos,
    ];

    /// Returns the name of the primitive implementing this function.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::Sin => "sin",
            Self::Cos => "cos",
        }
    }

    /// Applies this function.
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Self::Abs => x.abs(),
            Self::Sqrt => x.sqrt(),
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Floor => x.floor(),
            Self::Ceiling => x.ceil(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
        }
    }
}

/// Primitive for a [`UnaryOp`] on numbers, number arrays and numeric frames.
#[derive(Debug, Clone, Copy)]
pub struct Unary(pub UnaryOp);

impl Primitive for Unary {
    fn name(&self) -> &str {
        self.0.as_str()
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let op = self.0;
        Ok(match env.exec_tracked(&args[0])? {
            Value::Num(x) => Value::Num(op.eval(x)),
            Value::Nums(xs) => Value::Nums(xs.into_iter().map(|x| op.eval(x)).collect()),
            Value::Frame(frame) => {
                let columns = frame
                    .columns()
                    .iter()
                    .map(|column| column.map(|x| op.eval(x)))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Frame(Frame::new(frame.names().to_vec(), columns)?)
            }
            other => {
                let message = format!("unsupported arg type: {}", other.ty());
                return Err(ErrorKind::invalid_arg(self.name(), message).into());
            }
        })
    }
}
