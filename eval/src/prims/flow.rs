//! Sequencing, logic and conditional primitives.

use std::sync::Arc;

use super::{Arity, Primitive, PrimitiveProvider};
use crate::{
    env::Env,
    error::{ErrorKind, EvalResult},
    frame::{Column, Frame},
    node::Node,
    values::Value,
};

/// Logic primitives: `,`, `&&`, `||`, `!` and `ifelse`, plus constants `TRUE`, `FALSE`,
/// `NA`, `NaN` and `nan`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logic;

impl PrimitiveProvider for Logic {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        vec![
            Arc::new(Sequence),
            Arc::new(And),
            Arc::new(Or),
            Arc::new(Not),
            Arc::new(IfElse),
        ]
    }

    fn constants(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("TRUE", Value::Num(1.0)),
            ("FALSE", Value::Num(0.0)),
            ("NA", Value::Num(f64::NAN)),
            ("NaN", Value::Num(f64::NAN)),
            ("nan", Value::Num(f64::NAN)),
        ]
    }
}

/// `,` primitive: evaluates all args in order and returns the last value
/// (`NaN` if there are no args).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequence;

impl Primitive for Sequence {
    fn name(&self) -> &str {
        ","
    }

    fn arity(&self) -> Arity {
        Arity::Variable
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let mut last = Value::Num(f64::NAN);
        for arg in args {
            last = env.exec_tracked(arg)?;
        }
        Ok(last)
    }
}

fn scalar_test(env: &mut Env<'_>, primitive: &str, node: &Node) -> EvalResult<f64> {
    match env.exec_tracked(node)? {
        Value::Num(value) => Ok(value),
        other => {
            let message = format!("expected a number, got {}", other.ty());
            Err(ErrorKind::invalid_arg(primitive, message).into())
        }
    }
}

/// Short-circuiting `&&` on numbers: the second arg is not evaluated if the first one is `0`.
/// `NaN` represents an unknown value: `NaN && 0` is `0`; `NaN && x` is `NaN` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct And;

impl Primitive for And {
    fn name(&self) -> &str {
        "&&"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let left = scalar_test(env, self.name(), &args[0])?;
        if left == 0.0 {
            return Ok(Value::bool(false));
        }
        let right = scalar_test(env, self.name(), &args[1])?;
        Ok(Value::Num(if right == 0.0 {
            0.0
        } else if left.is_nan() || right.is_nan() {
            f64::NAN
        } else {
            1.0
        }))
    }
}

/// Short-circuiting `||` on numbers: the second arg is not evaluated if the first one
/// is non-zero and not `NaN`. `NaN || 1` is `1`; `NaN || x` is `NaN` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Or;

impl Primitive for Or {
    fn name(&self) -> &str {
        "||"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let left = scalar_test(env, self.name(), &args[0])?;
        if left != 0.0 && !left.is_nan() {
            return Ok(Value::bool(true));
        }
        let right = scalar_test(env, self.name(), &args[1])?;
        Ok(Value::Num(if right != 0.0 && !right.is_nan() {
            1.0
        } else if left.is_nan() || right.is_nan() {
            f64::NAN
        } else {
            0.0
        }))
    }
}

fn not(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// `!` primitive on numbers and numeric frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct Not;

impl Primitive for Not {
    fn name(&self) -> &str {
        "!"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        match env.exec_tracked(&args[0])? {
            Value::Num(x) => Ok(Value::Num(not(x))),
            Value::Nums(xs) => Ok(Value::Nums(xs.into_iter().map(not).collect())),
            Value::Frame(frame) => {
                let columns = frame
                    .columns()
                    .iter()
                    .map(|column| column.map(not))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Frame(Frame::new(frame.names().to_vec(), columns)?))
            }
            other => {
                let message = format!("unsupported arg type: {}", other.ty());
                Err(ErrorKind::invalid_arg(self.name(), message).into())
            }
        }
    }
}

/// `ifelse` primitive.
///
/// With a numeric test, evaluates only the selected branch (`NaN` yields `NaN` without
/// evaluating either branch). With a single-column frame test, both branches are evaluated
/// and combined row-wise; branches may be numbers or single-column numeric frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfElse;

impl IfElse {
    fn branch_column(&self, value: Value, nrows: usize) -> EvalResult<Vec<f64>> {
        match value {
            Value::Num(x) => Ok(vec![x; nrows]),
            Value::Frame(frame) if frame.ncols() == 1 && frame.nrows() == nrows => {
                Ok(frame.columns()[0].nums()?)
            }
            Value::Frame(frame) => Err(ErrorKind::ShapeMismatch {
                message: format!(
                    "`ifelse` branch has shape {}x{}, expected {}x1",
                    frame.nrows(),
                    frame.ncols(),
                    nrows
                ),
            }
            .into()),
            other => {
                let message = format!("unsupported branch type: {}", other.ty());
                Err(ErrorKind::invalid_arg(self.name(), message).into())
            }
        }
    }
}

impl Primitive for IfElse {
    fn name(&self) -> &str {
        "ifelse"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(3)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let test = match env.exec_tracked(&args[0])? {
            Value::Num(test) if test.is_nan() => return Ok(Value::Num(f64::NAN)),
            Value::Num(test) => {
                let branch = if test == 0.0 { &args[2] } else { &args[1] };
                return env.exec_tracked(branch);
            }
            Value::Frame(frame) if frame.ncols() == 1 => frame,
            Value::Frame(frame) => {
                return Err(ErrorKind::ShapeMismatch {
                    message: format!("`ifelse` test has {} columns, expected 1", frame.ncols()),
                }
                .into());
            }
            other => {
                let message = format!("unsupported test type: {}", other.ty());
                return Err(ErrorKind::invalid_arg(self.name(), message).into());
            }
        };

        let nrows = test.nrows();
        let tests = test.columns()[0].nums()?;
        let yes = env.exec_tracked(&args[1])?;
        let yes = self.branch_column(yes, nrows)?;
        let no = env.exec_tracked(&args[2])?;
        let no = self.branch_column(no, nrows)?;

        let output: Vec<f64> = tests
            .iter()
            .zip(yes.into_iter().zip(no))
            .map(|(&test, (yes, no))| {
                if test.is_nan() {
                    f64::NAN
                } else if test == 0.0 {
                    no
                } else {
                    yes
                }
            })
            .collect();
        let frame = Frame::new(test.names().to_vec(), vec![Column::num(output)])?;
        Ok(Value::Frame(frame))
    }
}
