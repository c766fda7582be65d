use rust_decimal::Decimal;
use time::macros::datetime;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use crate::encode::{BindContext, IsNull};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::schema::TableSpec;
use crate::types::ZeroBlob;
use crate::value::SqliteValue;

/// A record type that maps to a table.
///
/// Implementations are usually generated with the [`model!`](crate::model!)
/// macro; hand-written impls work the same way. The trait supplies the
/// declarative table shape and field accessors keyed by field name — the
/// reflected [`TableDescriptor`](crate::TableDescriptor) is built from the
/// spec once per type and cached for the life of the process.
pub trait Model: Sized + 'static {
    /// The declarative table shape: name, schema owner and columns with
    /// their flags, in field-declaration order.
    fn table_spec() -> TableSpec;

    /// A record with every field set to its vacant value, ready for
    /// materialization.
    fn new_record() -> Self;

    /// Encode the named field into a bind context.
    fn encode_field(
        &self,
        field: &str,
        ctx: &mut BindContext<'_>,
    ) -> Result<IsNull, BoxDynError>;

    /// Overwrite the named field from a column value.
    fn decode_field(
        &mut self,
        field: &str,
        value: &SqliteValue,
        options: &StorageOptions,
    ) -> Result<(), BoxDynError>;
}

/// The vacant value a field holds before materialization fills it.
///
/// Distinct from `Default` because several supported field types
/// (the date-time types) have no meaningful `Default` impl.
pub trait FieldDefault {
    fn field_default() -> Self;
}

macro_rules! impl_field_default {
    ($($ty:ty => $value:expr),+ $(,)?) => {
        $(
            impl FieldDefault for $ty {
                fn field_default() -> Self {
                    $value
                }
            }
        )+
    };
}

impl_field_default! {
    bool => false,
    i8 => 0,
    i16 => 0,
    i32 => 0,
    i64 => 0,
    u8 => 0,
    u16 => 0,
    u32 => 0,
    u64 => 0,
    f32 => 0.0,
    f64 => 0.0,
    String => String::new(),
    Vec<u8> => Vec::new(),
    Uuid => Uuid::nil(),
    Decimal => Decimal::ZERO,
    Duration => Duration::ZERO,
    PrimitiveDateTime => datetime!(1970-01-01 0:00),
    OffsetDateTime => OffsetDateTime::UNIX_EPOCH,
    ZeroBlob => ZeroBlob(0),
}

impl<T> FieldDefault for Option<T> {
    fn field_default() -> Self {
        None
    }
}

/// Declares a record struct together with its [`Model`] implementation.
///
/// Field flags go in brackets after the type: `pk`, `autoincrement`,
/// `ignore`, `named("Column")`, `collate("NOCASE")`, `default("0")`.
/// Nullability follows the host declaration — wrap the type in `Option`.
///
/// ```rust
/// sqlite_mapper::model! {
///     pub struct Person ("people") {
///         id: i64 [pk autoincrement],
///         name: String,
///         age: Option<i64>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident ($table:literal $(, schema = $schema:literal)?) {
            $( $fname:ident : $fty:ty $([ $($flag:tt)* ])? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $( pub $fname: $fty, )+
        }

        impl $crate::Model for $name {
            fn table_spec() -> $crate::TableSpec {
                $crate::TableSpec::new($table)
                    $( .schema($schema) )?
                    $(
                        .column($crate::__column_spec!(
                            $crate::ColumnSpec::new(
                                stringify!($fname),
                                <$fty as $crate::Type>::type_info(),
                                <$fty as $crate::Type>::nullable(),
                            ),
                            $($($flag)*)?
                        ))
                    )+
            }

            fn new_record() -> Self {
                Self {
                    $( $fname: $crate::FieldDefault::field_default(), )+
                }
            }

            fn encode_field(
                &self,
                field: &str,
                ctx: &mut $crate::BindContext<'_>,
            ) -> ::std::result::Result<$crate::IsNull, $crate::BoxDynError> {
                $(
                    if field == stringify!($fname) {
                        return $crate::Encode::encode(&self.$fname, ctx);
                    }
                )+

                Err(format!("record has no field {field:?}").into())
            }

            fn decode_field(
                &mut self,
                field: &str,
                value: &$crate::SqliteValue,
                options: &$crate::StorageOptions,
            ) -> ::std::result::Result<(), $crate::BoxDynError> {
                $(
                    if field == stringify!($fname) {
                        self.$fname = $crate::Decode::decode(value, options)?;
                        return Ok(());
                    }
                )+

                Err(format!("record has no field {field:?}").into())
            }
        }
    };
}

/// Applies bracketed column flags to a [`ColumnSpec`](crate::ColumnSpec).
/// An implementation detail of [`model!`](crate::model!).
#[doc(hidden)]
#[macro_export]
macro_rules! __column_spec {
    ($spec:expr,) => { $spec };

    ($spec:expr, pk $($rest:tt)*) => {
        $crate::__column_spec!($spec.primary_key(), $($rest)*)
    };

    ($spec:expr, autoincrement $($rest:tt)*) => {
        $crate::__column_spec!($spec.auto_increment(), $($rest)*)
    };

    ($spec:expr, ignore $($rest:tt)*) => {
        $crate::__column_spec!($spec.ignored(), $($rest)*)
    };

    ($spec:expr, named($name:literal) $($rest:tt)*) => {
        $crate::__column_spec!($spec.renamed($name), $($rest)*)
    };

    ($spec:expr, collate($collation:literal) $($rest:tt)*) => {
        $crate::__column_spec!($spec.collation($collation), $($rest)*)
    };

    ($spec:expr, default($literal:literal) $($rest:tt)*) => {
        $crate::__column_spec!($spec.default_value($literal), $($rest)*)
    };
}
