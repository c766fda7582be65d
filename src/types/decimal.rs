use std::str::FromStr;

use rust_decimal::Decimal;

use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

impl Type for Decimal {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for Decimal {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        let value = if ctx.options().decimal_as_blob {
            // the 16-byte wire representation: lossless, but opaque to SQL
            SqliteArgumentValue::Blob(self.serialize().to_vec())
        } else {
            SqliteArgumentValue::Text(self.to_string())
        };

        ctx.push(value);

        Ok(IsNull::No)
    }
}

impl Decode for Decimal {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        match value {
            SqliteValue::Blob(bytes) => {
                let bytes: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                    format!("expected 16 blob bytes for a decimal, found {}", bytes.len())
                })?;

                Ok(Decimal::deserialize(bytes))
            }

            SqliteValue::Text(s) => Ok(Decimal::from_str(s)?),

            SqliteValue::Integer(i) => Ok(Decimal::from(*i)),

            SqliteValue::Real(r) => Ok(Decimal::try_from(*r)?),

            other => mismatch(other, "TEXT or BLOB"),
        }
    }
}
