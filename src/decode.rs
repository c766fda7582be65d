use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::value::SqliteValue;

/// Converts a column value back into a host type.
///
/// The column's storage class drives the interpretation; the storage options
/// resolve representations that are configuration-dependent (date-time
/// formats, GUID-as-blob, …).
pub trait Decode: Sized {
    fn decode(value: &SqliteValue, options: &StorageOptions) -> Result<Self, BoxDynError>;
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &SqliteValue, options: &StorageOptions) -> Result<Self, BoxDynError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::decode(value, options).map(Some)
        }
    }
}

pub(crate) fn mismatch<T>(value: &SqliteValue, expected: &str) -> Result<T, BoxDynError> {
    Err(format!("expected {expected}, found {}", value.type_info()).into())
}
