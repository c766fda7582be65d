use crate::arguments::{SqliteArgumentValue, SqliteArguments};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::SqliteTypeInfo;

/// The return type of [`Encode::encode`].
pub enum IsNull {
    /// The value is null; no value was pushed onto the argument buffer.
    Yes,

    /// The value is not null and was pushed onto the argument buffer.
    No,
}

/// Associates a host type with its declared storage affinity.
///
/// This drives both DDL generation (column types in `CREATE TABLE`) and
/// nullability inference (`Option<T>` reports nullable).
pub trait Type {
    /// The declared affinity for columns of this host type.
    fn type_info() -> SqliteTypeInfo;

    /// Whether a column of this host type admits NULL.
    fn nullable() -> bool {
        false
    }
}

/// Everything passed through the conversion pipeline on a single bind:
/// the destination argument buffer and the connection's storage options.
///
/// A context is created per bind call and never escapes it.
pub struct BindContext<'a> {
    options: &'a StorageOptions,
    arguments: &'a mut SqliteArguments,
}

impl<'a> BindContext<'a> {
    pub(crate) fn new(options: &'a StorageOptions, arguments: &'a mut SqliteArguments) -> Self {
        Self { options, arguments }
    }

    /// The storage representation options in effect for this bind.
    pub fn options(&self) -> &StorageOptions {
        self.options
    }

    /// Append a bound value to the argument buffer.
    pub fn push(&mut self, value: SqliteArgumentValue) {
        self.arguments.push(value);
    }
}

/// Converts a host value into one of the bound-value kinds accepted by the
/// native bind entry points.
pub trait Encode {
    /// Render `self` into the context's argument buffer.
    ///
    /// Returning `Ok(IsNull::Yes)` without pushing makes the caller bind
    /// NULL in this position.
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError>;
}

impl<T: Encode> Encode for &T {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        <T as Encode>::encode(*self, ctx)
    }
}

impl<T: Type> Type for &T {
    fn type_info() -> SqliteTypeInfo {
        T::type_info()
    }

    fn nullable() -> bool {
        T::nullable()
    }
}

impl<T: Type> Type for Option<T> {
    fn type_info() -> SqliteTypeInfo {
        T::type_info()
    }

    fn nullable() -> bool {
        true
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        match self {
            Some(value) => value.encode(ctx),
            None => Ok(IsNull::Yes),
        }
    }
}
