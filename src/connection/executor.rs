use std::sync::Arc;

use crate::arguments::{IntoArguments, SqliteArguments};
use crate::connection::SqliteConnection;
use crate::error::{Error, Result};
use crate::logger::QueryLogger;
use crate::row::{RowColumns, SqliteRow};
use crate::statement::{StatementHandle, StepOutcome};

impl SqliteConnection {
    /// Check out a cached statement for this SQL, or compile one.
    fn prepare_for_use(&mut self, sql: &str) -> Result<StatementHandle> {
        if let Some(handle) = self.statements.checkout(sql) {
            // reset and cleared at checkin; ready to bind
            return Ok(handle);
        }

        StatementHandle::prepare(self.handle.as_ptr(), sql, true)
    }

    /// Run a script of one or more statements, discarding output rows.
    ///
    /// This goes through the native exec entry point and bypasses the
    /// statement cache; parameters are not supported.
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        let mut logger = QueryLogger::new(sql, self.log_settings.clone());

        self.handle.exec(sql)?;
        logger.increase_rows_affected(self.handle.changes());

        Ok(())
    }

    /// Execute a single statement, returning the number of rows changed.
    ///
    /// The statement is prepared (or fetched from the cache), bound, run to
    /// completion and returned to the cache, on every exit path.
    pub fn execute<A: IntoArguments>(&mut self, sql: &str, params: A) -> Result<u64> {
        let arguments = params.into_arguments(&self.storage)?;
        let mut logger = QueryLogger::new(sql, self.log_settings.clone());

        let mut handle = self.prepare_for_use(sql)?;
        let outcome = run_to_completion(&mut handle, &arguments);
        self.statements.checkin(sql, handle);

        outcome?;

        let changes = self.handle.changes();
        logger.increase_rows_affected(changes);

        Ok(changes)
    }

    /// Execute a query, returning a lazy, single-pass iterator over its
    /// rows. The iterator borrows the connection; dropping it mid-stream
    /// resets the statement and returns it to the cache.
    pub fn query<A: IntoArguments>(&mut self, sql: &str, params: A) -> Result<SqliteRows<'_>> {
        let arguments = params.into_arguments(&self.storage)?;
        let logger = QueryLogger::new(sql, self.log_settings.clone());

        let mut handle = self.prepare_for_use(sql)?;

        if let Err(error) = arguments.bind(&mut handle) {
            self.statements.checkin(sql, handle);
            return Err(error);
        }

        let names = (0..handle.column_count()).map(|i| handle.column_name(i)).collect();
        let columns = Arc::new(RowColumns::new(names, self.storage.clone()));

        Ok(SqliteRows {
            sql: sql.to_owned(),
            handle: Some(handle),
            columns,
            logger,
            done: false,
            conn: self,
        })
    }

    /// Execute a query expected to produce at most one row.
    pub fn query_row<A: IntoArguments>(&mut self, sql: &str, params: A) -> Result<SqliteRow> {
        let mut rows = self.query(sql, params)?;

        rows.next().unwrap_or(Err(Error::NotFound))
    }
}

fn run_to_completion(handle: &mut StatementHandle, arguments: &SqliteArguments) -> Result<()> {
    arguments.bind(handle)?;

    loop {
        match handle.step()? {
            // a statement run for its side effects still drains any rows
            StepOutcome::Row => continue,
            StepOutcome::Done => return Ok(()),
        }
    }
}

/// Lazy iterator over the rows of one query.
///
/// Holds the prepared statement checked out of the connection's cache;
/// whichever comes first of exhaustion, error or drop checks it back in.
pub struct SqliteRows<'c> {
    conn: &'c mut SqliteConnection,
    handle: Option<StatementHandle>,
    sql: String,
    columns: Arc<RowColumns>,
    logger: QueryLogger,
    done: bool,
}

impl SqliteRows<'_> {
    /// Names of the result columns, in positional order.
    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.conn.statements.checkin(&self.sql, handle);
        }
    }
}

impl Iterator for SqliteRows<'_> {
    type Item = Result<SqliteRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let handle = self.handle.as_mut()?;

        match handle.step() {
            Ok(StepOutcome::Row) => {
                self.logger.increment_rows_returned();

                let values = (0..self.columns.names.len())
                    .map(|i| handle.column_value(i))
                    .collect();

                Some(Ok(SqliteRow { values, columns: Arc::clone(&self.columns) }))
            }

            Ok(StepOutcome::Done) => {
                self.done = true;
                self.release();
                None
            }

            Err(error) => {
                // a row error ends the iterator but leaves the connection
                // usable
                self.done = true;
                self.release();
                Some(Err(error))
            }
        }
    }
}

impl Drop for SqliteRows<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
