use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use log::LevelFilter;

mod datetime;
mod journal_mode;
mod storage;

pub use datetime::DateTimeFormat;
pub use journal_mode::SqliteJournalMode;
pub use storage::{StorageOptions, UuidFormat};

use crate::logger::LogSettings;

/// Options and flags which can be used to configure a SQLite connection.
///
/// # Example
///
/// ```rust,no_run
/// use sqlite_mapper::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
///
/// # fn example() -> Result<(), sqlite_mapper::Error> {
/// let conn = SqliteConnection::open(
///     SqliteConnectOptions::new()
///         .filename("data.db")
///         .create_if_missing(true)
///         .journal_mode(SqliteJournalMode::Wal),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SqliteConnectOptions {
    pub(crate) filename: Cow<'static, Path>,
    pub(crate) in_memory: bool,
    pub(crate) read_only: bool,
    pub(crate) create_if_missing: bool,
    pub(crate) shared_cache: bool,
    pub(crate) statement_cache_capacity: usize,
    pub(crate) busy_timeout: Duration,
    pub(crate) log_settings: LogSettings,

    pub(crate) pragmas: IndexMap<Cow<'static, str>, Option<Cow<'static, str>>>,

    pub(crate) storage: StorageOptions,
}

impl Default for SqliteConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteConnectOptions {
    /// Construct `Self` with default options.
    ///
    /// See the source of this method for the current defaults.
    pub fn new() -> Self {
        let mut pragmas: IndexMap<Cow<'static, str>, Option<Cow<'static, str>>> = IndexMap::new();

        // Pragmas are applied in insertion order on connect. Inserting the
        // well-known ones here up front keeps their relative order stable
        // even when they are overwritten later by their setters.

        // locking_mode should be set before journal_mode:
        // https://www.sqlite.org/wal.html#use_of_wal_without_shared_memory
        pragmas.insert("locking_mode".into(), None);

        // Don't set `journal_mode` unless the user requested it: WAL is a
        // permanent setting for created databases and changing into or out
        // of it requires an exclusive lock.
        pragmas.insert("journal_mode".into(), None);

        // Foreign key enforcement is on by default, though SQLite normally
        // leaves it off for backward compatibility:
        // https://www.sqlite.org/foreignkeys.html#fk_enable
        pragmas.insert("foreign_keys".into(), Some("ON".into()));

        pragmas.insert("synchronous".into(), None);

        Self {
            filename: Cow::Borrowed(Path::new(":memory:")),
            in_memory: false,
            read_only: false,
            create_if_missing: false,
            shared_cache: false,
            statement_cache_capacity: 100,
            busy_timeout: Duration::from_secs(30),
            log_settings: Default::default(),
            pragmas,
            storage: StorageOptions::default(),
        }
    }

    /// Sets the name of the database file.
    pub fn filename(mut self, filename: impl AsRef<Path>) -> Self {
        self.filename = Cow::Owned(filename.as_ref().to_owned());
        self
    }

    /// Gets the current name of the database file.
    pub fn get_filename(&self) -> &Path {
        &self.filename
    }

    /// Set the [`SQLITE_OPEN_MEMORY` flag](https://sqlite.org/c3ref/open.html).
    ///
    /// By default, this is disabled.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Sets the [access mode](https://www.sqlite.org/c3ref/open.html) to open
    /// the database for read-only access.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the [access mode](https://www.sqlite.org/c3ref/open.html) to
    /// create the database file if the file does not exist.
    ///
    /// By default, a new file **will not be created** if one is not found.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Set the [`SQLITE_OPEN_SHAREDCACHE` flag](https://sqlite.org/sharedcache.html).
    ///
    /// By default, this is disabled.
    pub fn shared_cache(mut self, on: bool) -> Self {
        self.shared_cache = on;
        self
    }

    /// Sets the capacity of the connection's prepared-statement cache.
    ///
    /// Caching is handled using LRU: when the number of distinct statements
    /// hits the limit, the least recently used one is finalized and dropped.
    /// The default capacity is 100 statements.
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Sets a timeout to wait when the database is locked before giving up
    /// with [`Error::Busy`](crate::Error::Busy).
    ///
    /// The default busy timeout is 30 seconds.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the [journal mode](https://www.sqlite.org/pragma.html#pragma_journal_mode)
    /// for the database connection.
    ///
    /// Journal modes are ephemeral per connection, with the exception of the
    /// [Write-Ahead Log (WAL) mode](https://www.sqlite.org/wal.html).
    pub fn journal_mode(self, mode: SqliteJournalMode) -> Self {
        self.pragma("journal_mode", mode.as_str())
    }

    /// Set the enforcement of [foreign key constraints](https://www.sqlite.org/pragma.html#pragma_foreign_keys).
    pub fn foreign_keys(self, on: bool) -> Self {
        self.pragma("foreign_keys", if on { "ON" } else { "OFF" })
    }

    /// Sets a custom initial pragma for the database connection.
    pub fn pragma<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        self.pragmas.insert(key.into(), Some(value.into()));
        self
    }

    pub fn log_statements(mut self, level: LevelFilter) -> Self {
        self.log_settings.log_statements(level);
        self
    }

    pub fn log_slow_statements(mut self, level: LevelFilter, duration: Duration) -> Self {
        self.log_settings.log_slow_statements(level, duration);
        self
    }

    /// Store `Uuid` values as 16-byte little-endian BLOBs instead of TEXT.
    pub fn guid_as_blob(mut self, on: bool) -> Self {
        self.storage.guid_as_blob = on;
        self
    }

    /// Text form used for `Uuid` values when they are stored as TEXT.
    pub fn guid_format(mut self, format: UuidFormat) -> Self {
        self.storage.guid_format = format;
        self
    }

    /// Store `Decimal` values as their 16-byte wire representation instead
    /// of an invariant decimal string.
    pub fn decimal_as_blob(mut self, on: bool) -> Self {
        self.storage.decimal_as_blob = on;
        self
    }

    /// Store `Duration` values as INTEGER 100 ns ticks instead of text.
    pub fn duration_as_ticks(mut self, on: bool) -> Self {
        self.storage.duration_as_ticks = on;
        self
    }

    /// Storage representation for date-time values.
    ///
    /// The default is [`DateTimeFormat::Iso8601SpaceMs`].
    pub fn datetime_format(mut self, format: DateTimeFormat) -> Self {
        self.storage.datetime_format = format;
        self
    }

    /// Compare strings case-insensitively in translated predicates
    /// (`COLLATE NOCASE`).
    pub fn case_insensitive_text(mut self, on: bool) -> Self {
        self.storage.case_insensitive_text = on;
        self
    }

    /// The storage representation choices carried by these options.
    pub fn storage_options(&self) -> &StorageOptions {
        &self.storage
    }

    pub(crate) fn pragma_statements(&self) -> impl Iterator<Item = String> + '_ {
        self.pragmas.iter().filter_map(|(key, value)| {
            value.as_ref().map(|value| format!("PRAGMA {} = {}; ", key, value))
        })
    }
}
