use crate::options::DateTimeFormat;

/// Text form used when a `Uuid` is stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UuidFormat {
    /// `67e55044-10b1-426f-9247-bb680e5fe0c8` (the canonical form).
    #[default]
    Hyphenated,
    /// `67e5504410b1426f9247bb680e5fe0c8`
    Simple,
    /// `{67e55044-10b1-426f-9247-bb680e5fe0c8}`
    Braced,
    /// `urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8`
    Urn,
}

/// Per-connection storage representation choices.
///
/// These affect how host values are rendered into storage classes on bind
/// and how column values are interpreted on extraction. They are fixed for
/// the lifetime of a connection; mixing representations within one table is
/// the caller's problem.
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Store `Uuid` as a 16-byte little-endian BLOB instead of TEXT.
    pub guid_as_blob: bool,

    /// Text form used when `guid_as_blob` is off.
    pub guid_format: UuidFormat,

    /// Store `Decimal` as its 16-byte wire representation instead of an
    /// invariant decimal string.
    pub decimal_as_blob: bool,

    /// Store `Duration` as an INTEGER count of 100 ns ticks instead of
    /// `[-]H:MM:SS.fffffffff` text.
    pub duration_as_ticks: bool,

    /// Storage representation for date-time values.
    pub datetime_format: DateTimeFormat,

    /// Translate string equality in predicates with `COLLATE NOCASE`.
    pub case_insensitive_text: bool,
}
