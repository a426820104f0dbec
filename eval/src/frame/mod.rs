//! Columnar frames and the shared frame store.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ErrorKind;
use rapids_parser::num_list::NumListError;

mod column;
mod store;

pub use self::{
    column::{Column, ColumnData, ColumnId, ColumnType},
    store::Store,
};
pub(crate) use self::column::CHUNK_LEN;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

fn next_key() -> String {
    format!("frame_{}", NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
}

/// Named, ordered collection of equal-length [`Column`]s.
///
/// Frames are cheap to clone: columns are shared between clones. Each frame carries a key,
/// which is its name in the [`Store`] or among session temps.
#[derive(Debug, Clone)]
pub struct Frame {
    key: String,
    names: Vec<String>,
    columns: Vec<Column>,
    nrows: usize,
}

impl Frame {
    /// Creates a frame with an automatically generated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the number of columns,
    /// or columns have differing lengths.
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Result<Self, ErrorKind> {
        if names.len() != columns.len() {
            return Err(ErrorKind::ShapeMismatch {
                message: format!("{} names for {} columns", names.len(), columns.len()),
            });
        }

        let mut nrows = None;
        for column in &columns {
            let len = column.len()?;
            match nrows {
                None => nrows = Some(len),
                Some(expected) if expected != len => {
                    return Err(ErrorKind::ShapeMismatch {
                        message: format!("columns have {} and {} rows", expected, len),
                    });
                }
                Some(_) => { /* lengths match */ }
            }
        }

        Ok(Self {
            key: next_key(),
            names,
            columns,
            nrows: nrows.unwrap_or(0),
        })
    }

    /// Creates a frame with default column names `C1`, `C2`, etc.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, ErrorKind> {
        let names = (1..=columns.len()).map(default_name).collect();
        Self::new(names, columns)
    }

    /// Creates a frame with numeric columns.
    pub fn from_nums<'a>(
        columns: impl IntoIterator<Item = (&'a str, Vec<f64>)>,
    ) -> Result<Self, ErrorKind> {
        let (names, columns) = columns
            .into_iter()
            .map(|(name, values)| (name.to_owned(), Column::num(values)))
            .unzip();
        Self::new(names, columns)
    }

    /// Sets the key of this frame.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Assigns a fresh generated key to this frame.
    #[must_use]
    pub fn with_fresh_key(self) -> Self {
        self.with_key(next_key())
    }

    /// Returns the key of this frame.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Finds a column by name.
    pub fn column_by_name(&self, name: &str) -> Result<(usize, &Column), ErrorKind> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|idx| (idx, &self.columns[idx]))
            .ok_or_else(|| ErrorKind::UnknownColumn(name.to_owned()))
    }

    /// Returns the number of columns.
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Returns the number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Iterates over the identities of columns.
    pub fn column_ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.columns.iter().map(Column::id)
    }

    /// Creates a frame sharing the specified columns with this one.
    pub fn select(&self, indices: &[usize]) -> Result<Self, ErrorKind> {
        let mut names = Vec::with_capacity(indices.len());
        let mut columns = Vec::with_capacity(indices.len());
        for &idx in indices {
            let column = self.column(idx).ok_or(NumListError::ColumnOutOfRange {
                index: idx as f64,
                len: self.ncols(),
            })?;
            names.push(self.names[idx].clone());
            columns.push(column.clone());
        }
        Ok(Self {
            key: next_key(),
            names,
            columns,
            nrows: if indices.is_empty() { 0 } else { self.nrows },
        })
    }

    /// Creates a frame with new columns consisting of the specified rows.
    pub fn gather_rows(&self, rows: &[usize]) -> Result<Self, ErrorKind> {
        let columns = self
            .columns
            .iter()
            .map(|column| column.gather(rows))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            key: next_key(),
            names: self.names.clone(),
            columns,
            nrows: rows.len(),
        })
    }

    /// Replaces the column at `index`. The replacement must have the same number of rows.
    pub fn replace(&mut self, index: usize, column: Column) -> Result<Column, ErrorKind> {
        let len = column.len()?;
        if len != self.nrows {
            return Err(ErrorKind::ShapeMismatch {
                message: format!("replacement column has {} rows, frame has {}", len, self.nrows),
            });
        }
        let ncols = self.ncols();
        let slot = self
            .columns
            .get_mut(index)
            .ok_or(NumListError::ColumnOutOfRange {
                index: index as f64,
                len: ncols,
            })?;
        Ok(std::mem::replace(slot, column))
    }

    /// Appends a column.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), ErrorKind> {
        let len = column.len()?;
        if !self.columns.is_empty() && len != self.nrows {
            return Err(ErrorKind::ShapeMismatch {
                message: format!("appended column has {} rows, frame has {}", len, self.nrows),
            });
        }
        self.nrows = len;
        self.names.push(name.into());
        self.columns.push(column);
        Ok(())
    }

    /// Creates a copy of this frame with independent copies of all columns.
    pub fn deep_copy(&self) -> Result<Self, ErrorKind> {
        let columns = self
            .columns
            .iter()
            .map(Column::deep_copy)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            key: next_key(),
            names: self.names.clone(),
            columns,
            nrows: self.nrows,
        })
    }

    /// Checks whether two frames have the same key and share all columns.
    pub fn is_same(&self, other: &Self) -> bool {
        self.key == other.key
            && self.columns.len() == other.columns.len()
            && self.column_ids().eq(other.column_ids())
    }
}

/// Default name of the column with the 1-based index `idx`.
pub(crate) fn default_name(idx: usize) -> String {
    format!("C{}", idx)
}

/// Makes `name` unique among `names` by appending a numeric suffix.
pub(crate) fn unique_name(names: &[String], name: &str) -> String {
    if !names.iter().any(|existing| existing == name) {
        return name.to_owned();
    }
    (0..)
        .map(|suffix| format!("{}{}", name, suffix))
        .find(|candidate| !names.contains(candidate))
        .unwrap_or_else(|| name.to_owned())
}
