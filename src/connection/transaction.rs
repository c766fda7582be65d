use std::borrow::Cow;

use crate::connection::SqliteConnection;
use crate::error::Result;

// Savepoint names carry the nesting depth, so the names issued by one
// transaction stack are strictly increasing.
fn begin_sql(depth: usize) -> Cow<'static, str> {
    if depth == 0 {
        Cow::Borrowed("BEGIN")
    } else {
        Cow::Owned(format!("SAVEPOINT sp_{depth}"))
    }
}

fn commit_sql(depth: usize) -> Cow<'static, str> {
    if depth == 0 {
        Cow::Borrowed("COMMIT")
    } else {
        Cow::Owned(format!("RELEASE SAVEPOINT sp_{depth}"))
    }
}

fn rollback_sql(depth: usize) -> Cow<'static, str> {
    if depth == 0 {
        Cow::Borrowed("ROLLBACK")
    } else {
        Cow::Owned(format!("ROLLBACK TO SAVEPOINT sp_{depth}"))
    }
}

impl SqliteConnection {
    /// Run `f` inside a transaction.
    ///
    /// At the outermost level this issues `BEGIN` / `COMMIT` / `ROLLBACK`;
    /// nested calls use savepoints, so an error in an inner scope rolls
    /// back to the surrounding savepoint and leaves the outer transaction
    /// intact.
    ///
    /// Any error returned by `f` (or by the commit itself) rolls the scope
    /// back and is propagated.
    pub fn with_transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let depth = self.transaction_depth;

        self.handle.exec(begin_sql(depth).as_ref())?;
        self.transaction_depth += 1;

        let result = f(self);

        self.transaction_depth -= 1;

        match result {
            Ok(value) => {
                self.handle.exec(commit_sql(depth).as_ref())?;
                Ok(value)
            }

            Err(error) => {
                // rollback failure is unreported; the original error wins
                let _ = self.handle.exec(rollback_sql(depth).as_ref());
                Err(error)
            }
        }
    }

    /// Whether a transaction (or savepoint) is currently open.
    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_sql_by_depth() {
        assert_eq!(begin_sql(0), "BEGIN");
        assert_eq!(begin_sql(1), "SAVEPOINT sp_1");
        assert_eq!(begin_sql(2), "SAVEPOINT sp_2");

        assert_eq!(commit_sql(0), "COMMIT");
        assert_eq!(commit_sql(1), "RELEASE SAVEPOINT sp_1");

        assert_eq!(rollback_sql(0), "ROLLBACK");
        assert_eq!(rollback_sql(2), "ROLLBACK TO SAVEPOINT sp_2");
    }
}
