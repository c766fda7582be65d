//! Conversions between Rust and SQLite storage classes.
//!
//! | Rust type                  | Storage class                               |
//! |----------------------------|---------------------------------------------|
//! | `bool`                     | INTEGER (0 or 1)                            |
//! | `i8`, `i16`, `i32`, `i64`  | INTEGER                                     |
//! | `u8`, `u16`                | INTEGER (widened to `i32`)                  |
//! | `u32`                      | INTEGER (widened to `i64`)                  |
//! | `u64`                      | INTEGER (bit-reinterpreted; see below)      |
//! | `f32`, `f64`               | REAL                                        |
//! | `&str`, `String`           | TEXT                                        |
//! | `&[u8]`, `Vec<u8>`         | BLOB                                        |
//! | [`ZeroBlob`]               | BLOB (zero-filled reservation)              |
//! | `uuid::Uuid`               | TEXT, or BLOB with `guid_as_blob`           |
//! | `rust_decimal::Decimal`    | TEXT, or BLOB with `decimal_as_blob`        |
//! | `time::Duration`           | TEXT, or INTEGER with `duration_as_ticks`   |
//! | `time::PrimitiveDateTime`  | per the connection's `DateTimeFormat`       |
//! | `time::OffsetDateTime`     | per the connection's `DateTimeFormat`       |
//! | `Option<T>`                | NULL when `None`                            |
//!
//! # Unsigned integers
//!
//! `u8`, `u16` and `u32` are zero-extended into the next larger signed type,
//! which preserves their semantic value; SQLite stores integers in a
//! variable-width encoding so no space is wasted.
//!
//! `u64` has no larger signed type to widen into, so its bits are
//! reinterpreted as `i64`. The round-trip is exact, but values with the
//! high bit set compare as negative inside SQL — ordering and range
//! predicates over such columns are not unsigned-safe.
//!
//! # Integers coming back out
//!
//! Every INTEGER column is read as `i64` and narrowed at the typed edge
//! with a checked conversion; a value that does not fit the requested host
//! type is a decode error, never a silent truncation.

mod bool;
mod bytes;
mod datetime;
mod decimal;
mod duration;
mod float;
mod int;
mod str;
mod uint;
mod uuid;

pub use bytes::ZeroBlob;
