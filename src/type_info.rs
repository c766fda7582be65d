use std::fmt::{self, Display, Formatter};
use std::os::raw::c_int;
use std::str::FromStr;

use libsqlite3_sys::{SQLITE_BLOB, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_TEXT};

use crate::error::BoxDynError;

/// One of SQLite's five storage classes.
///
/// Every value crossing the native boundary belongs to exactly one of these.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DataType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

/// Type information for a SQLite column: the declared (or observed) storage
/// affinity.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SqliteTypeInfo(pub(crate) DataType);

impl SqliteTypeInfo {
    /// The keyword used in DDL for this affinity.
    pub fn name(&self) -> &'static str {
        match self.0 {
            DataType::Null => "NULL",
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
        }
    }

    pub fn data_type(&self) -> DataType {
        self.0
    }
}

impl Display for SqliteTypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl DataType {
    pub(crate) fn from_code(code: c_int) -> Self {
        match code {
            SQLITE_INTEGER => DataType::Integer,
            SQLITE_FLOAT => DataType::Real,
            SQLITE_TEXT => DataType::Text,
            SQLITE_BLOB => DataType::Blob,
            SQLITE_NULL => DataType::Null,

            // https://www.sqlite.org/c3ref/column_blob.html: no other codes
            // are produced by `sqlite3_column_type`
            _ => DataType::Null,
        }
    }
}

// Affinity resolution for declared column types, used when reading the live
// schema back out of `PRAGMA table_info`.
// <https://www.sqlite.org/datatype3.html#affname>
impl FromStr for DataType {
    type Err = BoxDynError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        Ok(match &*s {
            "" => DataType::Blob,

            _ if s.contains("int") => DataType::Integer,

            _ if s.contains("char") || s.contains("clob") || s.contains("text") => DataType::Text,

            _ if s.contains("blob") => DataType::Blob,

            _ if s.contains("real") || s.contains("floa") || s.contains("doub") => DataType::Real,

            // catch-all NUMERIC affinity; closest storage class we track
            _ => DataType::Real,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_from_declared_type() -> Result<(), BoxDynError> {
        assert_eq!(DataType::Integer, "INT".parse()?);
        assert_eq!(DataType::Integer, "INTEGER".parse()?);
        assert_eq!(DataType::Integer, "BIGINT".parse()?);
        assert_eq!(DataType::Integer, "MEDIUMINT".parse()?);

        assert_eq!(DataType::Text, "CHARACTER(20)".parse()?);
        assert_eq!(DataType::Text, "NCHAR(55)".parse()?);
        assert_eq!(DataType::Text, "TEXT".parse()?);
        assert_eq!(DataType::Text, "CLOB".parse()?);

        assert_eq!(DataType::Blob, "BLOB".parse()?);
        assert_eq!(DataType::Blob, "".parse()?);

        assert_eq!(DataType::Real, "REAL".parse()?);
        assert_eq!(DataType::Real, "FLOAT".parse()?);
        assert_eq!(DataType::Real, "DOUBLE PRECISION".parse()?);

        Ok(())
    }
}
