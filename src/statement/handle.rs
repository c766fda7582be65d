use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{null, null_mut, NonNull};
use std::slice::from_raw_parts;
use std::sync::atomic::{AtomicUsize, Ordering};

use libsqlite3_sys::{
    sqlite3, sqlite3_bind_blob64, sqlite3_bind_double, sqlite3_bind_int, sqlite3_bind_int64,
    sqlite3_bind_null, sqlite3_bind_parameter_count, sqlite3_bind_parameter_index,
    sqlite3_bind_parameter_name, sqlite3_bind_text64, sqlite3_bind_zeroblob,
    sqlite3_clear_bindings, sqlite3_column_blob, sqlite3_column_bytes, sqlite3_column_count,
    sqlite3_column_double, sqlite3_column_int64, sqlite3_column_name, sqlite3_column_text,
    sqlite3_column_type, sqlite3_db_handle, sqlite3_finalize, sqlite3_prepare_v3, sqlite3_reset,
    sqlite3_sql, sqlite3_step, sqlite3_stmt, SQLITE_BUSY, SQLITE_DONE, SQLITE_INTERRUPT,
    SQLITE_LOCKED, SQLITE_OK, SQLITE_PREPARE_PERSISTENT, SQLITE_ROW, SQLITE_TRANSIENT, SQLITE_UTF8,
};

use crate::error::{Error, SqliteError};
use crate::type_info::DataType;
use crate::value::SqliteValue;

// Count of prepared statements not yet finalized, across the process.
// Exists so tests and shutdown diagnostics can observe that no handle
// outlives its connection.
static LIVE_STATEMENTS: AtomicUsize = AtomicUsize::new(0);

/// The number of prepared statement handles currently open in the process.
pub fn live_statement_count() -> usize {
    LIVE_STATEMENTS.load(Ordering::Acquire)
}

/// Result of evaluating a prepared statement one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Another row of output is available.
    Row,

    /// The statement has finished executing.
    Done,
}

/// Owned handle to a single compiled statement.
///
/// This is the entire call surface over the statement half of the C API:
/// one method per entry point used, no durable state beyond the pointer.
/// The handle is finalized exactly once, on drop or through
/// [`finalize`](Self::finalize).
#[derive(Debug)]
pub(crate) struct StatementHandle(NonNull<sqlite3_stmt>);

// A statement handle may be sent between threads, but not used concurrently
// from more than one; it is only reachable through the owning connection.
unsafe impl Send for StatementHandle {}

impl StatementHandle {
    /// Compile one statement out of `sql`.
    ///
    /// Trailing content after the first statement is rejected; scripts go
    /// through `sqlite3_exec` on the connection instead.
    pub(crate) fn prepare(
        conn: *mut sqlite3,
        sql: &str,
        persistent: bool,
    ) -> Result<Self, Error> {
        if sql.len() > c_int::MAX as usize {
            return Err(Error::prepare(
                sql,
                SqliteError::protocol("query string is too large"),
            ));
        }

        let mut statement_handle: *mut sqlite3_stmt = null_mut();
        let mut tail: *const c_char = null();

        let query_ptr = sql.as_ptr() as *const c_char;
        let query_len = sql.len() as c_int;

        // SQLITE_PREPARE_PERSISTENT hints the query planner that the
        // statement will be retained and reused many times (the cache path).
        let flags = if persistent { SQLITE_PREPARE_PERSISTENT as u32 } else { 0 };

        // <https://www.sqlite.org/c3ref/prepare.html>
        let status = unsafe {
            sqlite3_prepare_v3(conn, query_ptr, query_len, flags, &mut statement_handle, &mut tail)
        };

        if status != SQLITE_OK {
            return Err(Error::prepare(sql, unsafe { SqliteError::from_connection(conn) }));
        }

        // pzTail points one past the end of the first statement; anything
        // left besides whitespace means the caller handed us a script
        let consumed = (tail as usize) - (query_ptr as usize);
        let handle = match NonNull::new(statement_handle) {
            Some(ptr) => ptr,
            None => {
                // comments or whitespace only
                return Err(Error::prepare(sql, SqliteError::protocol("query contains no statement")));
            }
        };

        if !sql[consumed..].trim().is_empty() {
            unsafe {
                let _ = sqlite3_finalize(handle.as_ptr());
            }
            return Err(Error::prepare(
                sql,
                SqliteError::protocol("query contains more than one statement"),
            ));
        }

        LIVE_STATEMENTS.fetch_add(1, Ordering::AcqRel);

        Ok(Self(handle))
    }

    #[inline]
    fn as_ptr(&self) -> *mut sqlite3_stmt {
        self.0.as_ptr()
    }

    pub(crate) fn db_handle(&self) -> *mut sqlite3 {
        // <https://www.sqlite.org/c3ref/db_handle.html>
        unsafe { sqlite3_db_handle(self.as_ptr()) }
    }

    pub(crate) fn last_error(&self) -> SqliteError {
        unsafe { SqliteError::from_connection(self.db_handle()) }
    }

    /// The original SQL text of the statement.
    pub(crate) fn sql(&self) -> String {
        // <https://www.sqlite.org/c3ref/expanded_sql.html>
        unsafe {
            let ptr = sqlite3_sql(self.as_ptr());
            debug_assert!(!ptr.is_null());

            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }

    /// Evaluate the statement one step.
    ///
    /// Lock contention past the busy timeout surfaces as [`Error::Busy`];
    /// an interrupt surfaces as [`Error::Cancelled`].
    pub(crate) fn step(&mut self) -> Result<StepOutcome, Error> {
        // <https://www.sqlite.org/c3ref/step.html>
        let status = unsafe { sqlite3_step(self.as_ptr()) };

        match status {
            SQLITE_ROW => Ok(StepOutcome::Row),
            SQLITE_DONE => Ok(StepOutcome::Done),
            SQLITE_BUSY | SQLITE_LOCKED => Err(Error::Busy),
            SQLITE_INTERRUPT => Err(Error::Cancelled),
            _ => Err(Error::step(self.sql(), self.last_error())),
        }
    }

    /// Return the statement to the start of its program. Bindings are
    /// retained.
    pub(crate) fn reset(&mut self) {
        // the status merely repeats the most recent step error, which has
        // already been surfaced
        // <https://www.sqlite.org/c3ref/reset.html>
        unsafe {
            let _ = sqlite3_reset(self.as_ptr());
        }
    }

    pub(crate) fn clear_bindings(&mut self) {
        // <https://www.sqlite.org/c3ref/clear_bindings.html>
        unsafe {
            let _ = sqlite3_clear_bindings(self.as_ptr());
        }
    }

    pub(crate) fn bind_parameter_count(&self) -> usize {
        // <https://www.sqlite.org/c3ref/bind_parameter_count.html>
        let count = unsafe { sqlite3_bind_parameter_count(self.as_ptr()) };
        count as usize
    }

    pub(crate) fn bind_parameter_name(&self, index: usize) -> Option<String> {
        // <https://www.sqlite.org/c3ref/bind_parameter_name.html>
        unsafe {
            let name = sqlite3_bind_parameter_name(self.as_ptr(), index as c_int);
            if name.is_null() {
                return None;
            }

            Some(CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    /// 1-based index of a named parameter, or `None` if absent.
    pub(crate) fn bind_parameter_index(&self, name: &str) -> Option<usize> {
        let name = std::ffi::CString::new(name).ok()?;

        // <https://www.sqlite.org/c3ref/bind_parameter_index.html>
        let index = unsafe { sqlite3_bind_parameter_index(self.as_ptr(), name.as_ptr()) };

        (index > 0).then_some(index as usize)
    }

    pub(crate) fn bind_int(&mut self, index: usize, v: i32) -> c_int {
        unsafe { sqlite3_bind_int(self.as_ptr(), index as c_int, v) }
    }

    pub(crate) fn bind_int64(&mut self, index: usize, v: i64) -> c_int {
        unsafe { sqlite3_bind_int64(self.as_ptr(), index as c_int, v) }
    }

    pub(crate) fn bind_double(&mut self, index: usize, v: f64) -> c_int {
        unsafe { sqlite3_bind_double(self.as_ptr(), index as c_int, v) }
    }

    pub(crate) fn bind_text(&mut self, index: usize, v: &str) -> c_int {
        let bytes = v.as_bytes();

        // the length is in bytes, explicit, with no NUL termination assumed;
        // SQLITE_TRANSIENT makes SQLite copy the buffer before returning
        // <https://www.sqlite.org/c3ref/bind_blob.html>
        unsafe {
            sqlite3_bind_text64(
                self.as_ptr(),
                index as c_int,
                bytes.as_ptr() as *const c_char,
                bytes.len() as u64,
                SQLITE_TRANSIENT(),
                SQLITE_UTF8 as u8,
            )
        }
    }

    pub(crate) fn bind_blob(&mut self, index: usize, v: &[u8]) -> c_int {
        unsafe {
            sqlite3_bind_blob64(
                self.as_ptr(),
                index as c_int,
                v.as_ptr() as *const c_void,
                v.len() as u64,
                SQLITE_TRANSIENT(),
            )
        }
    }

    pub(crate) fn bind_null(&mut self, index: usize) -> c_int {
        unsafe { sqlite3_bind_null(self.as_ptr(), index as c_int) }
    }

    pub(crate) fn bind_zeroblob(&mut self, index: usize, size: i32) -> c_int {
        // <https://www.sqlite.org/c3ref/bind_zeroblob.html>
        unsafe { sqlite3_bind_zeroblob(self.as_ptr(), index as c_int, size) }
    }

    pub(crate) fn column_count(&self) -> usize {
        // <https://sqlite.org/c3ref/column_count.html>
        let count = unsafe { sqlite3_column_count(self.as_ptr()) };
        count as usize
    }

    pub(crate) fn column_name(&self, index: usize) -> String {
        // <https://sqlite.org/c3ref/column_name.html>
        unsafe {
            let ptr = sqlite3_column_name(self.as_ptr(), index as c_int);
            debug_assert!(!ptr.is_null());

            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }

    pub(crate) fn column_type(&self, index: usize) -> DataType {
        // only meaningful after a step returned Row
        // <https://www.sqlite.org/c3ref/column_blob.html>
        DataType::from_code(unsafe { sqlite3_column_type(self.as_ptr(), index as c_int) })
    }

    fn column_int64(&self, index: usize) -> i64 {
        unsafe { sqlite3_column_int64(self.as_ptr(), index as c_int) }
    }

    fn column_double(&self, index: usize) -> f64 {
        unsafe { sqlite3_column_double(self.as_ptr(), index as c_int) }
    }

    fn column_text(&self, index: usize) -> String {
        // `column_text` never returns NULL for a TEXT value; an empty string
        // comes back as a pointer to an empty buffer
        unsafe {
            let ptr = sqlite3_column_text(self.as_ptr(), index as c_int) as *const u8;
            let len = sqlite3_column_bytes(self.as_ptr(), index as c_int) as usize;

            if ptr.is_null() || len == 0 {
                return String::new();
            }

            String::from_utf8_lossy(from_raw_parts(ptr, len)).into_owned()
        }
    }

    fn column_blob(&self, index: usize) -> Vec<u8> {
        // the byte count must be read after the data pointer: calling
        // `column_bytes` after `column_text` may have forced a conversion
        // that reallocates the buffer
        // <https://www.sqlite.org/c3ref/column_blob.html>
        unsafe {
            let ptr = sqlite3_column_blob(self.as_ptr(), index as c_int) as *const u8;
            let len = sqlite3_column_bytes(self.as_ptr(), index as c_int) as usize;

            if ptr.is_null() || len == 0 {
                // empty blobs come back as a NULL pointer
                return Vec::new();
            }

            from_raw_parts(ptr, len).to_vec()
        }
    }

    /// Copy out the value of a result column, typed by its storage class.
    pub(crate) fn column_value(&self, index: usize) -> SqliteValue {
        match self.column_type(index) {
            DataType::Null => SqliteValue::Null,
            DataType::Integer => SqliteValue::Integer(self.column_int64(index)),
            DataType::Real => SqliteValue::Real(self.column_double(index)),
            DataType::Text => SqliteValue::Text(self.column_text(index)),
            DataType::Blob => SqliteValue::Blob(self.column_blob(index)),
        }
    }

    /// Finalize the statement, reporting the final evaluation status.
    pub(crate) fn finalize(self) -> Result<(), SqliteError> {
        let db = self.db_handle();
        let ptr = self.as_ptr();

        // Drop must not finalize a second time
        std::mem::forget(self);
        LIVE_STATEMENTS.fetch_sub(1, Ordering::AcqRel);

        // <https://sqlite.org/c3ref/finalize.html>
        let status = unsafe { sqlite3_finalize(ptr) };

        if status != SQLITE_OK {
            return Err(unsafe { SqliteError::from_connection(db) });
        }

        Ok(())
    }
}

impl Drop for StatementHandle {
    fn drop(&mut self) {
        LIVE_STATEMENTS.fetch_sub(1, Ordering::AcqRel);

        // the error (if any) repeats the most recent step failure, which
        // has already been surfaced
        // <https://sqlite.org/c3ref/finalize.html>
        unsafe {
            let _ = sqlite3_finalize(self.as_ptr());
        }
    }
}
