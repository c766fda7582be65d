use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

impl Type for f32 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Real)
    }
}

impl Encode for f32 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Double(*self as f64));

        Ok(IsNull::No)
    }
}

impl Decode for f32 {
    fn decode(value: &SqliteValue, options: &StorageOptions) -> Result<Self, BoxDynError> {
        Ok(f64::decode(value, options)? as f32)
    }
}

impl Type for f64 {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Real)
    }
}

impl Encode for f64 {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Double(*self));

        Ok(IsNull::No)
    }
}

impl Decode for f64 {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        match value {
            SqliteValue::Real(v) => Ok(*v),
            // INTEGER widens losslessly for anything SQLite stores exactly
            SqliteValue::Integer(v) => Ok(*v as f64),
            other => mismatch(other, "REAL"),
        }
    }
}
