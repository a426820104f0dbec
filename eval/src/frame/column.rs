//! In-memory columns.

use parking_lot::RwLock;
use rayon::prelude::*;

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::error::ErrorKind;

/// Number of values processed by a single parallel task.
pub(crate) const CHUNK_LEN: usize = 4_096;

static NEXT_COLUMN_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a [`Column`]. Clones of a column share the identity;
/// deep copies receive a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(u64);

impl ColumnId {
    fn next() -> Self {
        Self(NEXT_COLUMN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Type of [`Column`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Floating-point numbers; `NaN` denotes a missing value.
    Num,
    /// Categorical values encoded as indices into a string domain.
    Cat,
    /// Arbitrary strings.
    Str,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Num => "numeric",
            Self::Cat => "categorical",
            Self::Str => "string",
        })
    }
}

/// Values stored in a [`Column`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Numeric values.
    Num(Vec<f64>),
    /// Categorical values.
    Cat {
        /// Category names.
        domain: Vec<String>,
        /// Index of the category for each row; `None` is a missing value.
        codes: Vec<Option<u32>>,
    },
    /// String values; `None` is a missing value.
    Str(Vec<Option<String>>),
}

impl ColumnData {
    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Num(values) => values.len(),
            Self::Cat { codes, .. } => codes.len(),
            Self::Str(values) => values.len(),
        }
    }

    /// Checks whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the type of values.
    pub fn ty(&self) -> ColumnType {
        match self {
            Self::Num(_) => ColumnType::Num,
            Self::Cat { .. } => ColumnType::Cat,
            Self::Str(_) => ColumnType::Str,
        }
    }

    fn gather(&self, rows: &[usize]) -> Self {
        match self {
            Self::Num(values) => Self::Num(rows.iter().map(|&row| values[row]).collect()),
            Self::Cat { domain, codes } => Self::Cat {
                domain: domain.clone(),
                codes: rows.iter().map(|&row| codes[row]).collect(),
            },
            Self::Str(values) => Self::Str(rows.iter().map(|&row| values[row].clone()).collect()),
        }
    }
}

#[derive(Debug)]
struct ColumnInner {
    id: ColumnId,
    // `None` after the column is reclaimed.
    data: RwLock<Option<ColumnData>>,
}

/// Shared handle to a column of values.
///
/// Cloning a column produces another handle to the same data; use [`Self::deep_copy()`]
/// to copy the data. Column data can be reclaimed with [`Self::free()`], after which
/// any access fails with [`ErrorKind::FreedColumn`].
#[derive(Clone)]
pub struct Column {
    inner: Arc<ColumnInner>,
}

impl fmt::Debug for Column {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Column")
            .field("id", &self.inner.id)
            .field("freed", &self.is_freed())
            .finish()
    }
}

impl Column {
    /// Creates a column with the provided data.
    pub fn new(data: ColumnData) -> Self {
        Self {
            inner: Arc::new(ColumnInner {
                id: ColumnId::next(),
                data: RwLock::new(Some(data)),
            }),
        }
    }

    /// Creates a numeric column.
    pub fn num(values: impl Into<Vec<f64>>) -> Self {
        Self::new(ColumnData::Num(values.into()))
    }

    /// Creates a categorical column. `codes` index into `domain`.
    pub fn cat(domain: Vec<String>, codes: Vec<Option<u32>>) -> Self {
        Self::new(ColumnData::Cat { domain, codes })
    }

    /// Creates a string column.
    pub fn str<S: Into<String>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        let values = values.into_iter().map(|value| value.map(Into::into)).collect();
        Self::new(ColumnData::Str(values))
    }

    /// Creates a numeric column with `len` copies of `value`.
    pub fn constant(value: f64, len: usize) -> Self {
        Self::num(vec![value; len])
    }

    /// Creates a string column with `len` copies of `value`.
    pub fn constant_str(value: &str, len: usize) -> Self {
        Self::new(ColumnData::Str(vec![Some(value.to_owned()); len]))
    }

    /// Returns the identity of this column.
    pub fn id(&self) -> ColumnId {
        self.inner.id
    }

    /// Checks whether the column data has been reclaimed.
    pub fn is_freed(&self) -> bool {
        self.inner.data.read().is_none()
    }

    /// Reclaims the column data. Returns `false` if the data was already reclaimed.
    pub fn free(&self) -> bool {
        self.inner.data.write().take().is_some()
    }

    /// Provides read access to the column data.
    pub fn read<R>(&self, action: impl FnOnce(&ColumnData) -> R) -> Result<R, ErrorKind> {
        let data = self.inner.data.read();
        let data = (*data).as_ref().ok_or(ErrorKind::FreedColumn(self.id()))?;
        Ok(action(data))
    }

    /// Provides write access to the column data. Callers mutating columns that may be
    /// shared must go through [`Session::copy_on_write()`](crate::Session::copy_on_write()).
    pub fn write<R>(&self, action: impl FnOnce(&mut ColumnData) -> R) -> Result<R, ErrorKind> {
        let mut data = self.inner.data.write();
        let data = (*data).as_mut().ok_or(ErrorKind::FreedColumn(self.id()))?;
        Ok(action(data))
    }

    /// Returns the number of rows.
    pub fn len(&self) -> Result<usize, ErrorKind> {
        self.read(ColumnData::len)
    }

    /// Returns the type of values.
    pub fn ty(&self) -> Result<ColumnType, ErrorKind> {
        self.read(ColumnData::ty)
    }

    /// Reads a value as a number. Categorical values are read as their codes.
    pub fn at(&self, row: usize) -> Result<f64, ErrorKind> {
        self.read(|data| match data {
            ColumnData::Num(values) => values.get(row).copied().ok_or(ErrorKind::RowOutOfRange {
                index: row,
                len: values.len(),
            }),
            ColumnData::Cat { codes, .. } => match codes.get(row) {
                Some(code) => Ok(code.map_or(f64::NAN, f64::from)),
                None => Err(ErrorKind::RowOutOfRange {
                    index: row,
                    len: codes.len(),
                }),
            },
            ColumnData::Str(_) => Err(ErrorKind::UnexpectedColumnType {
                expected: ColumnType::Num,
                actual: ColumnType::Str,
            }),
        })?
    }

    /// Reads a value as a string. Categorical values are resolved via the domain.
    pub fn str_at(&self, row: usize) -> Result<Option<String>, ErrorKind> {
        self.read(|data| match data {
            ColumnData::Str(values) => values.get(row).cloned().ok_or(ErrorKind::RowOutOfRange {
                index: row,
                len: values.len(),
            }),
            ColumnData::Cat { domain, codes } => match codes.get(row) {
                Some(code) => Ok(code.and_then(|code| domain.get(code as usize).cloned())),
                None => Err(ErrorKind::RowOutOfRange {
                    index: row,
                    len: codes.len(),
                }),
            },
            ColumnData::Num(_) => Err(ErrorKind::UnexpectedColumnType {
                expected: ColumnType::Str,
                actual: ColumnType::Num,
            }),
        })?
    }

    /// Returns the domain of a categorical column, or `None` for other column types.
    pub fn domain(&self) -> Result<Option<Vec<String>>, ErrorKind> {
        self.read(|data| match data {
            ColumnData::Cat { domain, .. } => Some(domain.clone()),
            _ => None,
        })
    }

    /// Copies the values of a numeric column.
    pub fn nums(&self) -> Result<Vec<f64>, ErrorKind> {
        self.read(|data| match data {
            ColumnData::Num(values) => Ok(values.clone()),
            other => Err(ErrorKind::UnexpectedColumnType {
                expected: ColumnType::Num,
                actual: other.ty(),
            }),
        })?
    }

    /// Applies `map_fn` to every value of a numeric column in parallel, producing
    /// a new column.
    pub fn map<F>(&self, map_fn: F) -> Result<Self, ErrorKind>
    where
        F: Fn(f64) -> f64 + Send + Sync,
    {
        let values = self.nums()?;
        let mut output = vec![0.0; values.len()];
        output
            .par_chunks_mut(CHUNK_LEN)
            .zip(values.par_chunks(CHUNK_LEN))
            .for_each(|(dest, src)| {
                for (dest, &x) in dest.iter_mut().zip(src) {
                    *dest = map_fn(x);
                }
            });
        Ok(Self::num(output))
    }

    /// Combines values of two numeric columns of equal length in parallel, producing
    /// a new column.
    pub fn zip_map<F>(&self, other: &Self, map_fn: F) -> Result<Self, ErrorKind>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync,
    {
        let xs = self.nums()?;
        let ys = other.nums()?;
        if xs.len() != ys.len() {
            return Err(ErrorKind::ShapeMismatch {
                message: format!("columns have {} and {} rows", xs.len(), ys.len()),
            });
        }

        let mut output = vec![0.0; xs.len()];
        output
            .par_chunks_mut(CHUNK_LEN)
            .zip(xs.par_chunks(CHUNK_LEN).zip(ys.par_chunks(CHUNK_LEN)))
            .for_each(|(dest, (xs, ys))| {
                for ((dest, &x), &y) in dest.iter_mut().zip(xs).zip(ys) {
                    *dest = map_fn(x, y);
                }
            });
        Ok(Self::num(output))
    }

    /// Creates an independent copy of this column with a new identity.
    pub fn deep_copy(&self) -> Result<Self, ErrorKind> {
        let data = self.read(ColumnData::clone)?;
        Ok(Self::new(data))
    }

    /// Creates a new column from the specified rows of this column.
    pub fn gather(&self, rows: &[usize]) -> Result<Self, ErrorKind> {
        let data = self.read(|data| {
            let len = data.len();
            match rows.iter().find(|&&row| row >= len) {
                Some(&index) => Err(ErrorKind::RowOutOfRange { index, len }),
                None => Ok(data.gather(rows)),
            }
        })??;
        Ok(Self::new(data))
    }

    /// Checks whether two handles refer to the same column.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn clones_share_identity_and_copies_do_not() {
        let column = Column::num([1.0, 2.0, 3.0]);
        let clone = column.clone();
        assert_eq!(clone.id(), column.id());
        assert!(clone.ptr_eq(&column));

        let copy = column.deep_copy().unwrap();
        assert_ne!(copy.id(), column.id());
        copy.write(|data| *data = ColumnData::Num(vec![0.0])).unwrap();
        assert_eq!(column.nums().unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn parallel_map_preserves_order() {
        let values: Vec<f64> = (0..3 * CHUNK_LEN + 17).map(|i| i as f64).collect();
        let column = Column::num(values.clone());
        let doubled = column.map(|x| 2.0 * x).unwrap().nums().unwrap();
        let expected: Vec<_> = values.iter().map(|x| 2.0 * x).collect();
        assert_eq!(doubled, expected);

        let summed = column.zip_map(&column, |x, y| x + y).unwrap();
        assert_eq!(summed.nums().unwrap(), expected);
    }

    #[test]
    fn reading_freed_column() {
        let column = Column::num([1.0]);
        assert!(column.free());
        assert!(!column.free());
        assert!(column.is_freed());
        assert_matches!(column.at(0), Err(ErrorKind::FreedColumn(id)) if id == column.id());
    }

    #[test]
    fn categorical_access() {
        let column = Column::cat(
            vec!["a".to_owned(), "b".to_owned()],
            vec![Some(1), None, Some(0)],
        );
        assert_eq!(column.ty().unwrap(), ColumnType::Cat);
        assert_eq!(column.str_at(0).unwrap().as_deref(), Some("b"));
        assert_eq!(column.str_at(1).unwrap(), None);
        assert_eq!(column.at(2).unwrap(), 0.0);
        assert!(column.at(1).unwrap().is_nan());
        assert_matches!(
            column.nums(),
            Err(ErrorKind::UnexpectedColumnType { actual: ColumnType::Cat, .. })
        );

        let gathered = column.gather(&[2, 0]).unwrap();
        assert_eq!(gathered.str_at(1).unwrap().as_deref(), Some("b"));
        assert_matches!(
            column.gather(&[3]),
            Err(ErrorKind::RowOutOfRange { index: 3, len: 3 })
        );
    }
}
