use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

/// Marker for reserving a zero-filled BLOB of the given size in bytes,
/// typically for later incremental writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroBlob(pub i32);

impl Type for ZeroBlob {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Blob)
    }
}

impl Encode for ZeroBlob {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::ZeroBlob(self.0));

        Ok(IsNull::No)
    }
}

impl Type for [u8] {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Blob)
    }
}

impl Encode for [u8] {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Blob(self.to_vec()));

        Ok(IsNull::No)
    }
}

impl Type for &[u8] {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Blob)
    }
}

impl Encode for &[u8] {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Blob(self.to_vec()));

        Ok(IsNull::No)
    }
}

impl Type for Vec<u8> {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Blob)
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Blob(self.clone()));

        Ok(IsNull::No)
    }
}

impl Decode for Vec<u8> {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        match value {
            SqliteValue::Blob(v) => Ok(v.clone()),
            other => mismatch(other, "BLOB"),
        }
    }
}
