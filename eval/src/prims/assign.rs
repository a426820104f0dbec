//! Assignment primitives.

use std::sync::Arc;

use super::{
    mungers::{resolve_columns, resolve_rows},
    name_arg, Arity, Primitive, PrimitiveProvider, Selector,
};
use crate::{
    env::Env,
    error::{ErrorKind, EvalResult},
    frame::{default_name, unique_name, Column, ColumnData, ColumnType, Frame},
    node::Node,
    values::Value,
};

/// Assignment primitives: `tmp=`, `assign`, `rm` and `:=`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assignment;

impl PrimitiveProvider for Assignment {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        vec![
            Arc::new(TmpAssign),
            Arc::new(Assign),
            Arc::new(Remove),
            Arc::new(RectAssign),
        ]
    }
}

/// `(tmp= name frame)`: registers the frame as a session temp named `name`.
/// The `(expr)->name` syntax is a shorthand for this primitive.
#[derive(Debug, Clone, Copy, Default)]
struct TmpAssign;

impl Primitive for TmpAssign {
    fn name(&self) -> &str {
        "tmp="
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let name = name_arg(self.name(), &args[0])?;
        if env.primitives().contains(name) {
            let message = format!("`{}` is a primitive", name);
            return Err(ErrorKind::invalid_arg(self.name(), message).into());
        }
        let frame = env.exec_tracked(&args[1])?.into_frame()?;
        let temp = env.track_tmp(frame.with_key(name))?;
        Ok(Value::Frame(temp))
    }
}

/// `(assign name frame)`: publishes the frame in the shared store.
#[derive(Debug, Clone, Copy, Default)]
struct Assign;

impl Primitive for Assign {
    fn name(&self) -> &str {
        "assign"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let name = name_arg(self.name(), &args[0])?;
        let frame = env.exec_tracked(&args[1])?.into_frame()?;
        Ok(Value::Frame(env.assign(name, &frame)?))
    }
}

/// `(rm name)`: removes a temp or a frame in the store. Returns `1` if the frame
/// was found and `0` otherwise.
#[derive(Debug, Clone, Copy, Default)]
struct Remove;

impl Primitive for Remove {
    fn name(&self) -> &str {
        "rm"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let name = name_arg(self.name(), &args[0])?;
        let frame = env
            .temp(name)
            .cloned()
            .or_else(|| env.store().get(name));
        Ok(Value::bool(match frame {
            Some(frame) => {
                env.remove(&frame);
                true
            }
            None => false,
        }))
    }
}

/// Values written into a column by `:=`, one per assigned row.
#[derive(Debug)]
enum Fill {
    Num(Vec<f64>),
    Str(Vec<Option<String>>),
}

impl Fill {
    fn ty(&self) -> ColumnType {
        match self {
            Self::Num(_) => ColumnType::Num,
            Self::Str(_) => ColumnType::Str,
        }
    }

    fn from_column(column: &Column) -> Result<Self, ErrorKind> {
        if column.ty()? == ColumnType::Num {
            return Ok(Self::Num(column.nums()?));
        }
        let len = column.len()?;
        let values = (0..len)
            .map(|row| column.str_at(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Str(values))
    }

    fn write(&self, column: &Column, rows: &[usize]) -> Result<(), ErrorKind> {
        column.write(|data| match (data, self) {
            (ColumnData::Num(values), Self::Num(src)) => {
                for (&row, &value) in rows.iter().zip(src) {
                    values[row] = value;
                }
                Ok(())
            }
            (ColumnData::Str(values), Self::Str(src)) => {
                for (&row, value) in rows.iter().zip(src) {
                    values[row] = value.clone();
                }
                Ok(())
            }
            (ColumnData::Cat { domain, codes }, Self::Str(src)) => {
                for (&row, value) in rows.iter().zip(src) {
                    codes[row] = match value {
                        None => None,
                        Some(value) => Some(category_code(domain, value)?),
                    };
                }
                Ok(())
            }
            (ColumnData::Cat { domain, codes }, Self::Num(src)) => {
                for (&row, &value) in rows.iter().zip(src) {
                    codes[row] = if value.is_nan() {
                        None
                    } else if value >= 0.0 && value.fract() == 0.0 && value < domain.len() as f64 {
                        Some(value as u32)
                    } else {
                        let message = format!("{} is not a valid category code", value);
                        return Err(ErrorKind::invalid_arg(":=", message));
                    };
                }
                Ok(())
            }
            (data, _) => Err(ErrorKind::UnexpectedColumnType {
                expected: data.ty(),
                actual: self.ty(),
            }),
        })?
    }
}

fn category_code(domain: &mut Vec<String>, value: &str) -> Result<u32, ErrorKind> {
    let idx = match domain.iter().position(|category| category == value) {
        Some(idx) => idx,
        None => {
            domain.push(value.to_owned());
            domain.len() - 1
        }
    };
    u32::try_from(idx).map_err(|_| ErrorKind::invalid_arg(":=", "too many categories"))
}

/// `(:= dst src cols rows)`: assigns `src` to a rectangle of `dst` selected by `cols`
/// and `rows`. An empty `cols` or `rows` list selects all columns or rows, respectively.
///
/// `src` may be a number, a string or a frame with the same shape as the rectangle.
/// Columns shared with session temps or global frames are copied before writing.
/// With [`ColumnBounds::Capped`](rapids_parser::num_list::ColumnBounds::Capped),
/// a column index equal to the number of columns appends a new column filled with `NaN`.
#[derive(Debug, Clone, Copy, Default)]
struct RectAssign;

impl RectAssign {
    fn append_columns(dst: &Frame, cols: &mut [usize]) -> Result<Frame, ErrorKind> {
        let base = dst.ncols();
        if cols.iter().all(|&idx| idx < base) {
            return Ok(dst.clone());
        }

        let mut frame = dst.clone().with_fresh_key();
        for idx in cols.iter_mut().filter(|idx| **idx >= base) {
            let name = unique_name(frame.names(), &default_name(frame.ncols() + 1));
            *idx = frame.ncols();
            frame.push_column(name, Column::constant(f64::NAN, dst.nrows()))?;
        }
        Ok(frame)
    }

    fn fills(&self, src: &Value, ncols: usize, nrows: usize) -> Result<Vec<Fill>, ErrorKind> {
        Ok(match src {
            Value::Num(value) => (0..ncols).map(|_| Fill::Num(vec![*value; nrows])).collect(),
            Value::Str(value) => (0..ncols)
                .map(|_| Fill::Str(vec![Some(value.clone()); nrows]))
                .collect(),
            Value::Frame(src) => {
                if src.ncols() != ncols || src.nrows() != nrows {
                    return Err(ErrorKind::ShapeMismatch {
                        message: format!(
                            "source has shape {}x{}, target rectangle is {}x{}",
                            src.nrows(),
                            src.ncols(),
                            nrows,
                            ncols
                        ),
                    });
                }
                src.columns()
                    .iter()
                    .map(Fill::from_column)
                    .collect::<Result<_, _>>()?
            }
            other => {
                let message = format!("unsupported source type: {}", other.ty());
                return Err(ErrorKind::invalid_arg(self.name(), message));
            }
        })
    }
}

impl Primitive for RectAssign {
    fn name(&self) -> &str {
        ":="
    }

    fn arity(&self) -> Arity {
        Arity::Exact(4)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let dst = env.exec_tracked(&args[0])?.into_frame()?;
        let src = env.exec_tracked(&args[1])?;
        let col_selector = Selector::from_arg(env, self.name(), &args[2])?;
        let row_selector = Selector::from_arg(env, self.name(), &args[3])?;

        let mut cols = if col_selector.is_empty() {
            (0..dst.ncols()).collect()
        } else {
            let bounds = env.config().column_bounds;
            resolve_columns(self.name(), &dst, &col_selector, bounds)?
        };
        let rows: Vec<usize> = if row_selector.is_empty() {
            (0..dst.nrows()).collect()
        } else {
            resolve_rows(self.name(), &dst, &row_selector)?
        };
        // Evaluated before any column is copied or written.
        let fills = self.fills(&src, cols.len(), rows.len())?;

        let frame = Self::append_columns(&dst, &mut cols)?;
        let frame = env.copy_on_write(&frame, &cols)?;
        for (&idx, fill) in cols.iter().zip(&fills) {
            fill.write(&frame.columns()[idx], &rows)?;
        }
        Ok(Value::Frame(frame))
    }
}
