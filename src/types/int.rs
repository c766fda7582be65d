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

impl Type for i8 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for i8 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int(*self as i32));

        Ok(IsNull::No)
    }
}

impl Decode for i8 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)?.try_into()?)
    }
}

impl Type for i16 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for i16 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int(*self as i32));

        Ok(IsNull::No)
    }
}

impl Decode for i16 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)?.try_into()?)
    }
}

impl Type for i32 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for i32 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int(*self));

        Ok(IsNull::No)
    }
}

impl Decode for i32 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(decode_int64(value)?.try_into()?)
    }
}

impl Type for i64 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Integer)
    }
}

impl Encode for i64 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Int64(*self));

        Ok(IsNull::No)
    }
}

impl Decode for i64 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        decode_int64(value)
    }
}
