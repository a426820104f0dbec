//! Reducers: `sum`, `min`, `max` and `mean`.

use rayon::prelude::*;

use std::sync::Arc;

use super::{Arity, Primitive, PrimitiveProvider};
use crate::{
    env::Env,
    error::{ErrorKind, EvalResult},
    frame::CHUNK_LEN,
    node::Node,
    values::Value,
};

/// Reducer primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reducers;

impl PrimitiveProvider for Reducers {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        Reducer::ALL
            .iter()
            .map(|&reducer| Arc::new(Reduce(reducer)) as Arc<dyn Primitive>)
            .collect()
    }
}

/// Reduction over numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Reducer {
    /// Sum; `0` for no values.
    Sum,
    /// Minimum; `+inf` for no values.
    Min,
    /// Maximum; `-inf` for no values.
    Max,
    /// Arithmetic mean; `NaN` for no values.
    Mean,
}

impl Reducer {
    const ALL: [Self; 4] = [Self::Sum, Self::Min, Self::Max, Self::Mean];

    /// Returns the name of the primitive implementing this reducer.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
        }
    }
}

/// Partial reduction results, computed in parallel over chunks and then merged.
#[derive(Debug, Clone, Copy)]
struct Summary {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
    has_nan: bool,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            has_nan: false,
        }
    }
}

impl Summary {
    fn of(values: &[f64]) -> Self {
        values.iter().fold(Self::default(), |mut acc, &x| {
            acc.sum += x;
            acc.count += 1;
            acc.min = acc.min.min(x);
            acc.max = acc.max.max(x);
            acc.has_nan |= x.is_nan();
            acc
        })
    }

    fn of_par(values: &[f64]) -> Self {
        values
            .par_chunks(CHUNK_LEN)
            .map(Self::of)
            .reduce(Self::default, Self::merge)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            has_nan: self.has_nan || other.has_nan,
        }
    }

    fn result(self, reducer: Reducer) -> f64 {
        if self.has_nan {
            return f64::NAN;
        }
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Min => self.min,
            Reducer::Max => self.max,
            Reducer::Mean if self.count == 0 => f64::NAN,
            Reducer::Mean => self.sum / self.count as f64,
        }
    }
}

/// Primitive for a [`Reducer`]. Reduces over all args, which may be numbers, number arrays
/// or numeric frames. `NaN` among the values makes the result `NaN`.
#[derive(Debug, Clone, Copy)]
pub struct Reduce(pub Reducer);

impl Reduce {
    fn summarize(&self, value: &Value) -> Result<Summary, ErrorKind> {
        match value {
            Value::Num(x) => Ok(Summary::of(&[*x])),
            Value::Nums(xs) => Ok(Summary::of_par(xs)),
            Value::Frame(frame) => frame.columns().iter().try_fold(
                Summary::default(),
                |acc, column| -> Result<Summary, ErrorKind> {
                    Ok(acc.merge(Summary::of_par(&column.nums()?)))
                },
            ),
            other => Err(ErrorKind::invalid_arg(
                self.name(),
                format!("unsupported arg type: {}", other.ty()),
            )),
        }
    }
}

impl Primitive for Reduce {
    fn name(&self) -> &str {
        self.0.as_str()
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn apply(&self, env: &mut Env<'_>, args: &[Node]) -> EvalResult {
        let mut summary = Summary::default();
        for arg in args {
            let value = env.exec_tracked(arg)?;
            summary = summary.merge(self.summarize(&value)?);
        }
        Ok(Value::Num(summary.result(self.0)))
    }
}
