use uuid::Uuid;

use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::{StorageOptions, UuidFormat};
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

impl Type for Uuid {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for Uuid {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        let options = ctx.options();

        let value = if options.guid_as_blob {
            // 16 bytes, little-endian field order
            SqliteArgumentValue::Blob(self.to_bytes_le().to_vec())
        } else {
            SqliteArgumentValue::Text(match options.guid_format {
                UuidFormat::Hyphenated => self.hyphenated().to_string(),
                UuidFormat::Simple => self.simple().to_string(),
                UuidFormat::Braced => self.braced().to_string(),
                UuidFormat::Urn => self.urn().to_string(),
            })
        };

        ctx.push(value);

        Ok(IsNull::No)
    }
}

impl Decode for Uuid {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        match value {
            SqliteValue::Blob(bytes) => {
                let bytes: [u8; 16] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| format!("expected 16 blob bytes for a uuid, found {}", bytes.len()))?;

                Ok(Uuid::from_bytes_le(bytes))
            }

            // parse_str accepts all four text forms
            SqliteValue::Text(s) => Ok(Uuid::parse_str(s)?),

            other => mismatch(other, "TEXT or BLOB"),
        }
    }
}
