//! Embedded object persistence over SQLite.
//!
//! This crate maps record types to tables, issues prepared statements
//! against the native engine, converts typed values across the boundary,
//! and keeps a table's shape synchronized with its record type. Queries by
//! predicate go through a small expression tree that translates into a
//! parameterized `WHERE` clause — closed-over values are always bound,
//! never inlined.
//!
//! ```rust,no_run
//! use sqlite_mapper::{col, val, SqliteConnection};
//!
//! sqlite_mapper::model! {
//!     pub struct Person ("people") {
//!         id: i64 [pk autoincrement],
//!         name: String,
//!         age: Option<i64>,
//!     }
//! }
//!
//! # fn main() -> Result<(), sqlite_mapper::Error> {
//! let mut conn = SqliteConnection::open_path("people.db")?;
//!
//! let mut person = Person { id: 0, name: "Ada".into(), age: Some(36) };
//! conn.save(&mut person)?; // creates the table, assigns person.id
//!
//! let adults = conn
//!     .find_where::<Person>(&col("age").ge(val(18_i64)))?
//!     .collect::<Result<Vec<_>, _>>()?;
//! # let _ = adults;
//! # Ok(())
//! # }
//! ```
//!
//! ### Note: linkage
//! This crate uses `libsqlite3-sys` with the `bundled` feature, which
//! builds and links SQLite 3 from source. Using it alongside another crate
//! that links `libsqlite3-sys` (e.g. `rusqlite`) is a semver hazard; pin
//! versions in lockstep.

// SQLite is a C library. All interactions require FFI which is unsafe.
// All unsafe blocks should have comments pointing to SQLite docs and
// ensuring that we maintain invariants.
#![allow(unsafe_code)]

mod arguments;
mod connection;
mod decode;
mod encode;
mod error;
mod logger;
mod mapper;
mod model;
mod options;
pub mod query;
mod row;
mod schema;
mod statement;
mod type_info;
pub mod types;
mod value;

pub use arguments::{IntoArguments, SqliteArgumentValue, SqliteArguments};
pub use connection::{SqliteConnection, SqliteInterruptHandle, SqliteRows};
pub use decode::Decode;
pub use encode::{BindContext, Encode, IsNull, Type};
pub use error::{BoxDynError, Error, Result, SqliteError};
pub use logger::LogSettings;
pub use mapper::ModelRows;
pub use model::{FieldDefault, Model};
pub use options::{
    DateTimeFormat, SqliteConnectOptions, SqliteJournalMode, StorageOptions, UuidFormat,
};
pub use query::{col, val, Expr, ScalarValue};
pub use row::{ColumnIndex, SqliteRow};
pub use schema::{descriptor, ColumnDescriptor, ColumnSpec, TableDescriptor, TableSpec};
pub use statement::{live_statement_count, SqliteStatement, StepOutcome};
pub use type_info::{DataType, SqliteTypeInfo};
pub use value::SqliteValue;
