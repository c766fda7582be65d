use std::any::TypeId;
use std::collections::HashSet;
use std::path::Path;
use std::ptr::null_mut;
use std::sync::{Arc, Mutex};

use libsqlite3_sys::{sqlite3, sqlite3_interrupt};

use crate::error::Result;
use crate::logger::LogSettings;
use crate::options::{SqliteConnectOptions, StorageOptions};
use crate::statement::StatementCache;

mod establish;
mod executor;
mod handle;
mod transaction;

pub use executor::SqliteRows;

pub(crate) use handle::ConnectionHandle;

use establish::EstablishParams;

/// A single connection to a SQLite database.
///
/// The connection exclusively owns its database handle and is not safe for
/// concurrent use; it is `Send` but deliberately not `Sync`. Within one
/// connection, operation order is program order. Statements prepared against
/// the connection borrow it, so every statement handle is finalized before
/// the connection can close.
pub struct SqliteConnection {
    // declared before `handle` so cached statements finalize before close
    pub(crate) statements: StatementCache,
    pub(crate) handle: ConnectionHandle,

    interrupt: Arc<InterruptShared>,
    pub(crate) log_settings: LogSettings,
    pub(crate) storage: StorageOptions,
    pub(crate) transaction_depth: usize,

    // record types whose tables were reconciled through this connection
    pub(crate) synchronized: HashSet<TypeId>,

    // DDL statements issued by the schema synchronizer, for idempotence
    // observation in tests
    pub(crate) ddl_statements: u64,
}

impl SqliteConnection {
    /// Open a connection with the given options.
    pub fn open(options: SqliteConnectOptions) -> Result<Self> {
        let params = EstablishParams::from_options(&options)?;
        let handle = params.establish()?;

        let interrupt = Arc::new(InterruptShared(Mutex::new(handle.as_ptr())));

        Ok(Self {
            statements: StatementCache::new(options.statement_cache_capacity),
            handle,
            interrupt,
            log_settings: options.log_settings.clone(),
            storage: options.storage.clone(),
            transaction_depth: 0,
            synchronized: HashSet::new(),
            ddl_statements: 0,
        })
    }

    /// Open (and create if missing) a database file with default options.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(SqliteConnectOptions::new().filename(path).create_if_missing(true))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(SqliteConnectOptions::new().in_memory(true))
    }

    /// Close the connection.
    ///
    /// Cached statements are finalized first, then the database handle is
    /// closed. A statement handle leaking past its connection is a fatal
    /// bug and raises a diagnostic panic from the native close.
    pub fn close(mut self) {
        self.statements.clear();
        // dropping the rest of self closes the handle
    }

    /// The rowid assigned by the most recent successful INSERT.
    pub fn last_insert_rowid(&self) -> i64 {
        self.handle.last_insert_rowid()
    }

    /// Rows changed by the most recently completed INSERT/UPDATE/DELETE.
    pub fn changes(&self) -> u64 {
        self.handle.changes()
    }

    /// A handle that can abort the currently running statement from another
    /// thread. The aborted call returns [`Error::Cancelled`](crate::Error::Cancelled);
    /// bindings on the cancelled statement remain valid after a reset.
    pub fn interrupt_handle(&self) -> SqliteInterruptHandle {
        SqliteInterruptHandle { shared: Arc::clone(&self.interrupt) }
    }

    /// The storage representation options this connection was opened with.
    pub fn storage_options(&self) -> &StorageOptions {
        &self.storage
    }

    /// DDL statements issued by schema synchronization so far.
    pub fn ddl_statement_count(&self) -> u64 {
        self.ddl_statements
    }

    pub(crate) fn handle_ptr(&self) -> *mut sqlite3 {
        self.handle.as_ptr()
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        // outstanding interrupt handles must not reach a dead pointer
        *self.interrupt.0.lock().unwrap() = null_mut();
    }
}

struct InterruptShared(Mutex<*mut sqlite3>);

// the pointer is only dereferenced by sqlite3_interrupt, which is one of the
// few entry points documented safe to call from another thread
// <https://www.sqlite.org/c3ref/interrupt.html>
unsafe impl Send for InterruptShared {}
unsafe impl Sync for InterruptShared {}

/// Cross-thread cancellation for a [`SqliteConnection`].
#[derive(Clone)]
pub struct SqliteInterruptHandle {
    shared: Arc<InterruptShared>,
}

impl SqliteInterruptHandle {
    /// Signal the engine to abort the statement currently running on the
    /// connection, if any. A no-op once the connection has closed.
    pub fn interrupt(&self) {
        let ptr = self.shared.0.lock().unwrap();

        if !ptr.is_null() {
            unsafe { sqlite3_interrupt(*ptr) }
        }
    }
}
