use std::ffi::CString;
use std::io;
use std::ptr::{null, null_mut};
use std::time::Duration;

use libsqlite3_sys::{
    sqlite3_busy_timeout, sqlite3_extended_result_codes, sqlite3_open_v2, SQLITE_OK,
    SQLITE_OPEN_CREATE, SQLITE_OPEN_MEMORY, SQLITE_OPEN_NOMUTEX, SQLITE_OPEN_PRIVATECACHE,
    SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, SQLITE_OPEN_SHAREDCACHE,
};

use crate::connection::handle::ConnectionHandle;
use crate::error::{Error, SqliteError};
use crate::options::SqliteConnectOptions;

pub(super) struct EstablishParams {
    filename: CString,
    open_flags: i32,
    busy_timeout: Duration,
    pragma_script: String,
}

impl EstablishParams {
    pub(super) fn from_options(options: &SqliteConnectOptions) -> Result<Self, Error> {
        let filename = options
            .filename
            .to_str()
            .ok_or_else(|| {
                Error::Open(SqliteError::protocol(
                    "filename passed to SQLite must be valid UTF-8",
                ))
            })?
            .to_owned();

        let filename = CString::new(filename).map_err(|_| {
            Error::Open(SqliteError::protocol(
                "filename passed to SQLite must not contain nul bytes",
            ))
        })?;

        // [SQLITE_OPEN_NOMUTEX] makes [sqlite3_open_v2] fail rather than
        // hand us a handle that would serialize behind a mutex; this
        // connection is exclusively owned and never shared across threads.
        let mut flags = SQLITE_OPEN_NOMUTEX;

        flags |= if options.read_only {
            SQLITE_OPEN_READONLY
        } else if options.create_if_missing {
            SQLITE_OPEN_CREATE | SQLITE_OPEN_READWRITE
        } else {
            SQLITE_OPEN_READWRITE
        };

        if options.in_memory {
            flags |= SQLITE_OPEN_MEMORY;
        }

        flags |= if options.shared_cache {
            SQLITE_OPEN_SHAREDCACHE
        } else {
            SQLITE_OPEN_PRIVATECACHE
        };

        Ok(Self {
            filename,
            open_flags: flags,
            busy_timeout: options.busy_timeout,
            pragma_script: options.pragma_statements().collect(),
        })
    }

    pub(super) fn establish(&self) -> Result<ConnectionHandle, Error> {
        let mut handle = null_mut();

        // <https://www.sqlite.org/c3ref/open.html>
        let mut status =
            unsafe { sqlite3_open_v2(self.filename.as_ptr(), &mut handle, self.open_flags, null()) };

        if handle.is_null() {
            // failed to allocate memory for the connection object itself
            return Err(Error::Open(SqliteError::protocol(
                io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    "SQLite is unable to allocate memory to hold the sqlite3 object",
                )
                .to_string(),
            )));
        }

        // SAFE: tested for NULL just above; RAII from here on
        let mut handle = unsafe { ConnectionHandle::new(handle) };

        if status != SQLITE_OK {
            return Err(Error::Open(handle.last_error()));
        }

        // <https://www.sqlite.org/c3ref/extended_result_codes.html>
        unsafe {
            // NOTE: ignore the failure here
            sqlite3_extended_result_codes(handle.as_ptr(), 1);
        }

        // Let SQLite sleep-retry internally while something else holds the
        // lock, up to the configured timeout, instead of failing fast.
        // <https://www.sqlite.org/c3ref/busy_timeout.html>
        let ms = i32::try_from(self.busy_timeout.as_millis())
            .map_err(|_| Error::Open(SqliteError::protocol("busy timeout value is too big")))?;

        status = unsafe { sqlite3_busy_timeout(handle.as_ptr(), ms) };

        if status != SQLITE_OK {
            return Err(Error::Open(handle.last_error()));
        }

        if !self.pragma_script.is_empty() {
            handle.exec(self.pragma_script.clone())?;
        }

        Ok(handle)
    }
}
