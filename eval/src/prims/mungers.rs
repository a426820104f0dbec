//! Frame access primitives.

use std::sync::Arc;

use super::{Arity, Eager, Primitive, PrimitiveProvider, Selector};
use crate::{
    env::Env,
    error::{ErrorKind, EvalResult},
    frame::{default_name, unique_name, Column, Frame},
    node::Node,
    values::{Row, Value},
};
use rapids_parser::num_list::{ColumnBounds, NumListError};

/// Frame access primitives: `cols`, `rows`, `nrow`, `ncol`, `names`, `cbind` and `getrow`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAccess;

impl PrimitiveProvider for FrameAccess {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        vec![
            Arc::new(Cols),
            Arc::new(Rows),
            Arc::new(Eager::new("nrow", Arity::Exact(1), |_, args| {
                Ok(Value::Num(args[0].as_frame()?.nrows() as f64))
            })),
            Arc::new(Eager::new("ncol", Arity::Exact(1), |_, args| {
                Ok(Value::Num(args[0].as_frame()?.ncols() as f64))
            })),
            Arc::new(Eager::new("names", Arity::Exact(1), |_, args| {
                Ok(Value::Strs(args[0].as_frame()?.names().to_vec()))
            })),
            Arc::new(Eager::new("cbind", Arity::AtLeast(1), cbind)),
            Arc::new(Eager::new("getrow", Arity::Exact(1), getrow)),
        ]
    }
}

/// Resolves a column selector against `frame`. With [`ColumnBounds::Capped`], the result
/// may contain `frame.ncols()` denoting an out-of-range column.
pub(crate) fn resolve_columns(
    primitive: &str,
    frame: &Frame,
    selector: &Selector,
    bounds: ColumnBounds,
) -> Result<Vec<usize>, ErrorKind> {
    match selector {
        Selector::Indices(list) => Ok(list.columns(frame.ncols(), bounds)?),
        Selector::Names(names) => names
            .iter()
            .map(|name| frame.column_by_name(name).map(|(idx, _)| idx))
            .collect(),
        Selector::Mask(_) => Err(ErrorKind::invalid_arg(
            primitive,
            "columns cannot be selected by a frame",
        )),
    }
}

/// Resolves a row selector against `frame`.
pub(crate) fn resolve_rows(
    primitive: &str,
    frame: &Frame,
    selector: &Selector,
) -> Result<Vec<usize>, ErrorKind> {
    let nrows = frame.nrows();
    match selector {
        Selector::Indices(list) => {
            list.columns(nrows, ColumnBounds::Strict)
                .map_err(|err| match err {
                    NumListError::ColumnOutOfRange { index, len } => ErrorKind::RowOutOfRange {
                        index: index as usize,
                        len,
                    },
                    other => other.into(),
                })
        }
        Selector::Mask(mask) => {
            if mask.ncols() != 1 || mask.nrows() != nrows {
                return Err(ErrorKind::ShapeMismatch {
                    message: format!(
                        "row mask has shape {}x{}, expected {}x1",
                        mask.nrows(),
                        mask.ncols(),
                        nrows
                    ),
                });
            }
            let mask = mask.columns()[0].nums()?;
            Ok(mask
                .iter()
                .enumerate()
                .filter_map(|(row, &flag)| (flag != 0.0 && !flag.is_nan()).then_some(row))
                .collect())
        }
        Selector::Names(_) => Err(ErrorKind::invalid_arg(
            primitive,
            "rows cannot be selected by name",
        )),
    }
}

/// `(cols frame selector)`: selects columns by indices, negative exclusions or names.
/// Selected columns are shared with the source frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cols;

impl Primitive for Cols {
    fn name(&self) -> &str {
        "cols"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let frame = env.exec_tracked(&args[0])?.into_frame()?;
        let selector = Selector::from_arg(env, self.name(), &args[1])?;
        let bounds = env.config().column_bounds;
        let indices = resolve_columns(self.name(), &frame, &selector, bounds)?;
        if indices.iter().any(|&idx| idx >= frame.ncols()) {
            let err = NumListError::ColumnOutOfRange {
                index: frame.ncols() as f64,
                len: frame.ncols(),
            };
            return Err(ErrorKind::from(err).into());
        }
        Ok(Value::Frame(frame.select(&indices)?))
    }
}

/// `(rows frame selector)`: selects rows by indices, negative exclusions or a numeric
/// single-column mask frame. Produces new columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rows;

impl Primitive for Rows {
    fn name(&self) -> &str {
        "rows"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let frame = env.exec_tracked(&args[0])?.into_frame()?;
        let selector = Selector::from_arg(env, self.name(), &args[1])?;
        let rows = resolve_rows(self.name(), &frame, &selector)?;
        Ok(Value::Frame(frame.gather_rows(&rows)?))
    }
}

fn cbind(_env: &mut Env<'_>, args: Vec<Value>) -> EvalResult {
    let nrows = args
        .iter()
        .find_map(|arg| match arg {
            Value::Frame(frame) => Some(frame.nrows()),
            _ => None,
        })
        .unwrap_or(1);

    let mut names: Vec<String> = vec![];
    let mut columns = vec![];
    for arg in args {
        match arg {
            Value::Frame(frame) => {
                for (name, column) in frame.names().iter().zip(frame.columns()) {
                    names.push(unique_name(&names, name));
                    columns.push(column.clone());
                }
            }
            Value::Num(value) => {
                names.push(unique_name(&names, &default_name(columns.len() + 1)));
                columns.push(Column::constant(value, nrows));
            }
            Value::Nums(values) => {
                names.push(unique_name(&names, &default_name(columns.len() + 1)));
                columns.push(Column::num(values));
            }
            other => {
                let message = format!("unsupported arg type: {}", other.ty());
                return Err(ErrorKind::invalid_arg("cbind", message).into());
            }
        }
    }
    Ok(Value::Frame(Frame::new(names, columns)?))
}

fn getrow(_env: &mut Env<'_>, args: Vec<Value>) -> EvalResult {
    let frame = args[0].as_frame()?;
    if frame.nrows() != 1 {
        return Err(ErrorKind::ShapeMismatch {
            message: format!("`getrow` expects a single-row frame, got {} rows", frame.nrows()),
        }
        .into());
    }
    let values = frame
        .columns()
        .iter()
        .map(|column| column.at(0))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Row(Row::new(values, frame.names().to_vec())?))
}
