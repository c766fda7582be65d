use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::arguments::SqliteArguments;
use crate::connection::SqliteConnection;
use crate::encode::Encode;
use crate::error::{Error, Result};
use crate::type_info::SqliteTypeInfo;
use crate::value::SqliteValue;

mod cache;
mod handle;

pub(crate) use cache::StatementCache;
pub(crate) use handle::StatementHandle;
pub use handle::{live_statement_count, StepOutcome};

/// A single compiled SQL statement, for low-level use.
///
/// The statement borrows its connection, so it cannot outlive it; every
/// handle is finalized before the connection can close. Most callers want
/// the higher-level [`SqliteConnection`] query and mapping methods instead.
///
/// A statement moves through `prepared → bound → stepping → done`; `reset`
/// rewinds it (keeping bindings), `clear_bindings` returns it to prepared.
/// After [`finalize`](Self::finalize) (or drop) any remaining use fails with
/// [`Error::Disposed`].
pub struct SqliteStatement<'c> {
    handle: Option<StatementHandle>,
    sql: String,
    column_names: Option<Arc<HashMap<String, usize>>>,
    storage: crate::options::StorageOptions,
    _conn: PhantomData<&'c SqliteConnection>,
}

impl<'c> SqliteStatement<'c> {
    /// Compile `sql` against the connection.
    pub fn prepare(conn: &'c SqliteConnection, sql: &str) -> Result<Self> {
        let handle = StatementHandle::prepare(conn.handle_ptr(), sql, false)?;

        Ok(Self {
            handle: Some(handle),
            sql: sql.to_owned(),
            column_names: None,
            storage: conn.storage_options().clone(),
            _conn: PhantomData,
        })
    }

    fn handle(&self) -> Result<&StatementHandle> {
        self.handle.as_ref().ok_or(Error::Disposed)
    }

    fn handle_mut(&mut self) -> Result<&mut StatementHandle> {
        self.handle.as_mut().ok_or(Error::Disposed)
    }

    /// The SQL text this statement was compiled from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind a value at a 1-based parameter index.
    pub fn bind<T: Encode>(&mut self, index: usize, value: T) -> Result<()> {
        let mut arguments = SqliteArguments::new();
        arguments
            .add(value, &self.storage)
            .map_err(|source| Error::Bind { index, source })?;

        let handle = self.handle_mut()?;
        arguments.values[0].bind(handle, index)
    }

    /// Bind a value to a named parameter (`:name`, `@name` or `$name`).
    ///
    /// The name may be given with or without its prefix character.
    pub fn bind_by_name<T: Encode>(&mut self, name: &str, value: T) -> Result<()> {
        let index = self.parameter_index(name)?;
        self.bind(index, value)
    }

    fn parameter_index(&self, name: &str) -> Result<usize> {
        let handle = self.handle()?;

        if let Some(index) = handle.bind_parameter_index(name) {
            return Ok(index);
        }

        // accept a bare name for any of the prefix forms
        for prefix in [':', '@', '$'] {
            if let Some(index) = handle.bind_parameter_index(&format!("{prefix}{name}")) {
                return Ok(index);
            }
        }

        Err(Error::UnknownParameter(name.to_owned()))
    }

    /// Evaluate the statement one step.
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.handle_mut()?.step()
    }

    /// Step until done, or until `predicate` returns `false` for a row.
    ///
    /// The predicate receives the statement (positioned on the current row)
    /// and the 0-based row index.
    pub fn step_while(
        &mut self,
        mut predicate: impl FnMut(&Self, usize) -> bool,
    ) -> Result<()> {
        let mut row = 0_usize;

        loop {
            match self.handle_mut()?.step()? {
                StepOutcome::Done => return Ok(()),
                StepOutcome::Row => {
                    if !predicate(self, row) {
                        return Ok(());
                    }
                    row += 1;
                }
            }
        }
    }

    /// Rewind the statement to the start of its program; bindings are kept.
    pub fn reset(&mut self) -> Result<()> {
        self.handle_mut()?.reset();
        Ok(())
    }

    /// Clear all bindings back to NULL.
    pub fn clear_bindings(&mut self) -> Result<()> {
        self.handle_mut()?.clear_bindings();
        Ok(())
    }

    pub fn column_count(&self) -> Result<usize> {
        Ok(self.handle()?.column_count())
    }

    pub fn column_name(&self, index: usize) -> Result<String> {
        Ok(self.handle()?.column_name(index))
    }

    /// Storage class of the value in the current row at `index`.
    pub fn column_type(&self, index: usize) -> Result<SqliteTypeInfo> {
        Ok(SqliteTypeInfo(self.handle()?.column_type(index)))
    }

    /// Copy out the value of a result column in the current row.
    pub fn column_value(&self, index: usize) -> Result<SqliteValue> {
        Ok(self.handle()?.column_value(index))
    }

    /// 0-based index of a result column by name, case-insensitively.
    pub fn column_index(&mut self, name: &str) -> Result<usize> {
        if self.column_names.is_none() {
            let handle = self.handle()?;
            let mut names = HashMap::with_capacity(handle.column_count());

            for i in 0..handle.column_count() {
                names.insert(handle.column_name(i).to_lowercase(), i);
            }

            self.column_names = Some(Arc::new(names));
        }

        self.column_names
            .as_ref()
            .unwrap()
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| Error::UnknownColumn(name.to_owned()))
    }

    /// Finalize the statement, surfacing any deferred evaluation error.
    ///
    /// Dropping the statement finalizes it as well; this form reports the
    /// final status instead of discarding it.
    pub fn finalize(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .finalize()
                .map_err(|source| Error::step(&*self.sql, source)),
            None => Err(Error::Disposed),
        }
    }
}
