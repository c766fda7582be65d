use std::collections::HashMap;
use std::sync::Arc;

use crate::decode::Decode;
use crate::error::{Error, Result};
use crate::options::StorageOptions;
use crate::value::SqliteValue;

/// Column metadata shared by every row of one result set.
#[derive(Debug)]
pub(crate) struct RowColumns {
    pub(crate) names: Vec<String>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) storage: StorageOptions,
}

impl RowColumns {
    pub(crate) fn new(names: Vec<String>, storage: StorageOptions) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();

        Self { names, index, storage }
    }
}

/// A single row of query output with its values copied out of the engine.
#[derive(Debug)]
pub struct SqliteRow {
    pub(crate) values: Box<[SqliteValue]>,
    pub(crate) columns: Arc<RowColumns>,
}

impl SqliteRow {
    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.names.get(index).map(|s| s.as_str())
    }

    /// The raw storage-class value at a column position or name.
    pub fn value<I: ColumnIndex>(&self, index: I) -> Result<&SqliteValue> {
        let index = index.resolve(self)?;
        Ok(&self.values[index])
    }

    /// Decode the value at a column position or name into a host type.
    pub fn get<T: Decode, I: ColumnIndex>(&self, index: I) -> Result<T> {
        let index = index.resolve(self)?;

        T::decode(&self.values[index], &self.columns.storage).map_err(|source| Error::Column {
            index,
            name: self.columns.names.get(index).cloned().unwrap_or_default(),
            source,
        })
    }
}

/// Resolves a value passed as a row index: either a 0-based position or a
/// column name (matched case-insensitively).
pub trait ColumnIndex {
    fn resolve(&self, row: &SqliteRow) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, row: &SqliteRow) -> Result<usize> {
        if *self >= row.values.len() {
            return Err(Error::UnknownColumn(self.to_string()));
        }

        Ok(*self)
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, row: &SqliteRow) -> Result<usize> {
        row.columns
            .index
            .get(&self.to_lowercase())
            .copied()
            .ok_or_else(|| Error::UnknownColumn((*self).to_owned()))
    }
}
