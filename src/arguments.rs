use atoi::atoi;
use libsqlite3_sys::SQLITE_OK;

use crate::encode::{BindContext, Encode, IsNull};
use crate::error::{BoxDynError, Error};
use crate::options::StorageOptions;
use crate::statement::StatementHandle;

/// A value rendered into one of the kinds accepted by the native bind
/// entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum SqliteArgumentValue {
    Null,
    Text(String),
    Blob(Vec<u8>),
    Double(f64),
    Int(i32),
    Int64(i64),

    /// Reserve a writable blob of the given size, filled with zeroes.
    ZeroBlob(i32),
}

/// An ordered buffer of encoded bind parameters.
#[derive(Debug, Default, Clone)]
pub struct SqliteArguments {
    pub(crate) values: Vec<SqliteArgumentValue>,
}

impl SqliteArguments {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, value: SqliteArgumentValue) {
        self.values.push(value);
    }

    /// Encode and append a host value.
    pub(crate) fn add<T>(&mut self, value: T, options: &StorageOptions) -> Result<(), BoxDynError>
    where
        T: Encode,
    {
        let len_before_encoding = self.values.len();

        let encoded = value.encode(&mut BindContext::new(options, self));

        match encoded {
            Ok(IsNull::Yes) => self.values.push(SqliteArgumentValue::Null),
            Ok(IsNull::No) => {}
            Err(error) => {
                // don't leave a half-encoded value behind
                self.values.truncate(len_before_encoding);
                return Err(error);
            }
        }

        Ok(())
    }

    /// Bind every parameter of the statement from this buffer.
    ///
    /// Unnamed parameters consume buffer entries left to right; `?NNN` and
    /// `$NNN` forms index into the buffer directly. Parameters beyond the
    /// buffer are left unbound, which SQLite treats as NULL.
    pub(crate) fn bind(&self, handle: &mut StatementHandle) -> Result<(), Error> {
        let mut next_positional = 0_usize;

        let cnt = handle.bind_parameter_count();

        for param_i in 1..=cnt {
            let n: usize = if let Some(name) = handle.bind_parameter_name(param_i) {
                if let Some(digits) = name.strip_prefix('?') {
                    atoi(digits.as_bytes())
                        .ok_or_else(|| Error::UnknownParameter(name.clone()))?
                } else if let Some(digits) = name.strip_prefix('$') {
                    atoi(digits.as_bytes())
                        .ok_or_else(|| Error::UnknownParameter(name.clone()))?
                } else {
                    // :name / @name parameters are bound individually through
                    // `bind_by_name`, not from a positional buffer
                    return Err(Error::UnknownParameter(name.clone()));
                }
            } else {
                next_positional += 1;
                next_positional
            };

            if n > self.values.len() {
                break;
            }

            self.values[n - 1].bind(handle, n)?;
        }

        Ok(())
    }
}

/// Conversion of a parameter pack into an encoded argument buffer.
///
/// Implemented for tuples of [`Encode`] values (up to eight), for `()` and
/// for a prebuilt [`SqliteArguments`].
pub trait IntoArguments {
    fn into_arguments(self, options: &StorageOptions) -> Result<SqliteArguments, Error>;
}

impl IntoArguments for SqliteArguments {
    fn into_arguments(self, _options: &StorageOptions) -> Result<SqliteArguments, Error> {
        Ok(self)
    }
}

impl IntoArguments for () {
    fn into_arguments(self, _options: &StorageOptions) -> Result<SqliteArguments, Error> {
        Ok(SqliteArguments::new())
    }
}

macro_rules! impl_into_arguments_for_tuple {
    ($( ($idx:tt) $name:ident ),+) => {
        impl<$($name: Encode,)+> IntoArguments for ($($name,)+) {
            fn into_arguments(self, options: &StorageOptions) -> Result<SqliteArguments, Error> {
                let mut arguments = SqliteArguments::new();

                $(
                    arguments
                        .add(&self.$idx, options)
                        .map_err(|source| Error::Bind { index: $idx + 1, source })?;
                )+

                Ok(arguments)
            }
        }
    };
}

impl_into_arguments_for_tuple!((0) T1);
impl_into_arguments_for_tuple!((0) T1, (1) T2);
impl_into_arguments_for_tuple!((0) T1, (1) T2, (2) T3);
impl_into_arguments_for_tuple!((0) T1, (1) T2, (2) T3, (3) T4);
impl_into_arguments_for_tuple!((0) T1, (1) T2, (2) T3, (3) T4, (4) T5);
impl_into_arguments_for_tuple!((0) T1, (1) T2, (2) T3, (3) T4, (4) T5, (5) T6);
impl_into_arguments_for_tuple!((0) T1, (1) T2, (2) T3, (3) T4, (4) T5, (5) T6, (6) T7);
impl_into_arguments_for_tuple!((0) T1, (1) T2, (2) T3, (3) T4, (4) T5, (5) T6, (6) T7, (7) T8);

impl SqliteArgumentValue {
    /// Bind this value at the given 1-based parameter index.
    pub(crate) fn bind(&self, handle: &mut StatementHandle, index: usize) -> Result<(), Error> {
        use SqliteArgumentValue::*;

        let status = match self {
            Text(v) => handle.bind_text(index, v),
            Blob(v) => handle.bind_blob(index, v),
            Int(v) => handle.bind_int(index, *v),
            Int64(v) => handle.bind_int64(index, *v),
            Double(v) => handle.bind_double(index, *v),
            ZeroBlob(n) => handle.bind_zeroblob(index, *n),
            Null => handle.bind_null(index),
        };

        if status != SQLITE_OK {
            return Err(Error::Bind { index, source: Box::new(handle.last_error()) });
        }

        Ok(())
    }
}
