use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

impl Type for str {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for str {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Text(self.to_owned()));

        Ok(IsNull::No)
    }
}

impl Type for &str {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for &str {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Text((*self).to_owned()));

        Ok(IsNull::No)
    }
}

impl Type for String {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for String {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(SqliteArgumentValue::Text(self.clone()));

        Ok(IsNull::No)
    }
}

impl Decode for String {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        match value {
            SqliteValue::Text(v) => Ok(v.clone()),
            other => mismatch(other, "TEXT"),
        }
    }
}
