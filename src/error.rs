use std::ffi::CStr;
use std::fmt::{self, Display};
use std::os::raw::c_int;

use libsqlite3_sys::{sqlite3, sqlite3_errmsg, sqlite3_extended_errcode, SQLITE_MISUSE};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Convenience alias for the boxed error type returned by [`Encode`] and
/// [`Decode`] implementations.
///
/// [`Encode`]: crate::encode::Encode
/// [`Decode`]: crate::decode::Decode
pub type BoxDynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All the ways a database operation can fail.
///
/// Native result codes are never exposed directly; they are captured into
/// [`SqliteError`] at the FFI boundary and carried as context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Opening the database file failed.
    #[error("error opening database: {0}")]
    Open(#[source] SqliteError),

    /// A statement could not be compiled.
    #[error("error preparing {sql:?}: {source}")]
    Prepare {
        sql: String,
        #[source]
        source: SqliteError,
    },

    /// A compiled statement failed while being evaluated.
    #[error("error executing {sql:?}: {source}")]
    Step {
        sql: String,
        #[source]
        source: SqliteError,
    },

    /// A parameter could not be bound at the given 1-based index.
    #[error("error binding parameter {index}: {source}")]
    Bind {
        index: usize,
        #[source]
        source: BoxDynError,
    },

    /// A column value could not be converted to the requested host type.
    #[error("error decoding column {index} ({name}): {source}")]
    Column {
        index: usize,
        name: String,
        #[source]
        source: BoxDynError,
    },

    /// A named SQL parameter does not occur in the statement.
    #[error("no parameter named {0:?} in statement")]
    UnknownParameter(String),

    /// A column name does not occur in the result set or table descriptor.
    #[error("no column named {0:?}")]
    UnknownColumn(String),

    /// No conversion is available for the host type.
    #[error("no SQLite conversion for host type `{0}`")]
    BindNotSupported(&'static str),

    /// The predicate translator encountered a node it cannot express in SQL.
    #[error("expression cannot be translated to SQL: {0}")]
    UntranslatableExpression(&'static str),

    /// The live schema and the table descriptor cannot be reconciled.
    #[error("schema cannot be reconciled: {0}")]
    SchemaIncompatible(String),

    /// A primary-key load matched no row.
    #[error("no row found for the given primary key")]
    NotFound,

    /// Use of a statement after it was finalized.
    #[error("use of a finalized statement")]
    Disposed,

    /// The running statement was aborted by an interrupt.
    #[error("operation cancelled")]
    Cancelled,

    /// The database stayed locked for the whole busy timeout.
    ///
    /// Retrying happens inside the engine's busy handler; by the time this
    /// surfaces, the configured timeout has already expired.
    #[error("database still locked after the busy timeout expired")]
    Busy,
}

impl Error {
    pub(crate) fn prepare(sql: impl Into<String>, source: SqliteError) -> Self {
        Error::Prepare { sql: sql.into(), source }
    }

    pub(crate) fn step(sql: impl Into<String>, source: SqliteError) -> Self {
        Error::Step { sql: sql.into(), source }
    }
}

/// An error code and message captured from the native engine.
///
/// The code is the extended result code; the message is whatever
/// `sqlite3_errmsg` reported at the point of capture.
#[derive(Debug)]
pub struct SqliteError {
    code: c_int,
    message: String,
}

// Error Codes And Messages
// https://www.sqlite.org/c3ref/errcode.html

impl SqliteError {
    /// Capture the current error state of a connection.
    ///
    /// # Safety
    /// `conn` must point at a live `sqlite3` object.
    pub(crate) unsafe fn from_connection(conn: *mut sqlite3) -> Self {
        let code = sqlite3_extended_errcode(conn);

        let message = {
            let err = sqlite3_errmsg(conn);
            debug_assert!(!err.is_null());

            CStr::from_ptr(err).to_string_lossy().into_owned()
        };

        Self { code, message }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self { code: SQLITE_MISUSE, message: message.into() }
    }

    /// The extended result code.
    pub fn code(&self) -> c_int {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {}) {}", self.code, self.message)
    }
}

impl std::error::Error for SqliteError {}
