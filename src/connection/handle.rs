use std::ffi::CString;
use std::ptr;
use std::ptr::NonNull;

use libsqlite3_sys::{
    sqlite3, sqlite3_changes, sqlite3_close, sqlite3_exec, sqlite3_last_insert_rowid, SQLITE_OK,
};

use crate::error::{Error, SqliteError};

/// Managed handle to the raw SQLite3 database handle.
///
/// The database handle is closed when this is dropped; by then every
/// statement belonging to it must already be finalized, or close reports
/// a leak.
#[derive(Debug)]
pub(crate) struct ConnectionHandle(NonNull<sqlite3>);

// A SQLite3 handle is safe to send between threads provided not more than
// one thread accesses it at a time. Exclusive ownership upholds that.
// <https://www.sqlite.org/c3ref/threadsafe.html>
unsafe impl Send for ConnectionHandle {}

impl ConnectionHandle {
    #[inline]
    pub(super) unsafe fn new(ptr: *mut sqlite3) -> Self {
        Self(NonNull::new_unchecked(ptr))
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut sqlite3 {
        self.0.as_ptr()
    }

    pub(crate) fn last_insert_rowid(&self) -> i64 {
        // SAFETY: we have exclusive access to the database handle
        unsafe { sqlite3_last_insert_rowid(self.as_ptr()) }
    }

    /// Rows changed by the most recently completed INSERT/UPDATE/DELETE.
    pub(crate) fn changes(&self) -> u64 {
        // SAFETY: we have exclusive access to the database handle
        unsafe { sqlite3_changes(self.as_ptr()) as u64 }
    }

    pub(crate) fn last_error(&self) -> SqliteError {
        // SAFETY: we have exclusive access to the database handle
        unsafe { SqliteError::from_connection(self.as_ptr()) }
    }

    /// Run a script of zero or more statements, discarding any rows.
    pub(crate) fn exec(&mut self, query: impl Into<String>) -> Result<(), Error> {
        let query = query.into();
        let c_query = CString::new(query.clone())
            .map_err(|_| Error::prepare(&*query, SqliteError::protocol("query contains nul bytes")))?;

        // SAFETY: we have exclusive access to the database handle
        unsafe {
            let status = sqlite3_exec(
                self.as_ptr(),
                c_query.as_ptr(),
                // no row callback; errors carry the message via errmsg
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            );

            if status != SQLITE_OK {
                return Err(Error::step(query, SqliteError::from_connection(self.as_ptr())));
            }
        }

        Ok(())
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        unsafe {
            // https://sqlite.org/c3ref/close.html
            let status = sqlite3_close(self.0.as_ptr());
            if status != SQLITE_OK {
                // this only happens when a statement handle was leaked past
                // its connection, which close() prevents; make it loud
                panic!("{}", SqliteError::from_connection(self.0.as_ptr()));
            }
        }
    }
}
