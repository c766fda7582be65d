use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

fn decode_int64(value: &SqliteValue) -> Result<i64, BoxDynError> {
    match value {
        SqliteValue::Integer(v) => Ok(*v),
        other => mismatch(other, "INTEGER"),
    }
}

impl Type for u8 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for u8 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int(*self as i32));

        Ok(IsNull::No)
    }
}

impl Decode for u8 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)?.try_into()?)
    }
}

impl Type for u16 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for u16 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int(*self as i32));

        Ok(IsNull::No)
    }
}

impl Decode for u16 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)?.try_into()?)
    }
}

impl Type for u32 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for u32 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int64(*self as i64));

        Ok(IsNull::No)
    }
}

impl Decode for u32 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)?.try_into()?)
    }
}

impl Type for u64 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for u64 {
    /// Stored by reinterpreting the bits as `i64`: the round-trip is exact,
    /// but values with the high bit set appear negative to SQL, so ordering
    /// and range comparisons on such columns are not unsigned-safe.
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int64(*self as i64));

        Ok(IsNull::No)
    }
}

impl Decode for u64 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)? as u64)
    }
}
