/// Storage representation for date-time values.
///
/// Text formats store the wall-clock reading of the value; numeric formats
/// store an instant derived from the wall clock treated as UTC. `RoundTrip`
/// is the exception: an offset date-time keeps its offset in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateTimeFormat {
    /// `2024-01-02 03:04:05.678` — ISO-8601 with a space separator and
    /// millisecond precision. Matches SQLite's own `datetime()` output.
    #[default]
    Iso8601SpaceMs,

    /// `2024-01-02T03:04:05` — ISO-8601 with the `T` separator, whole seconds.
    Iso8601T,

    /// `Tue, 02 Jan 2024 03:04:05 GMT`
    Rfc1123,

    /// Full-fidelity text: 100-nanosecond precision, offset preserved when
    /// the value carries one.
    RoundTrip,

    /// INTEGER count of 100 ns intervals since 0001-01-01 00:00:00.
    Ticks,

    /// INTEGER count of 100 ns intervals since 1601-01-01 00:00:00, the
    /// wall clock stored as-is.
    FileTime,

    /// INTEGER count of 100 ns intervals since 1601-01-01 00:00:00 UTC; an
    /// offset date-time is converted to UTC first.
    FileTimeUtc,

    /// REAL days since 1899-12-30 00:00:00.
    OleAutomation,

    /// REAL Julian day number, as produced by SQLite's `julianday()`.
    JulianDay,

    /// INTEGER whole seconds since the Unix epoch.
    UnixSeconds,

    /// INTEGER milliseconds since the Unix epoch.
    UnixMillis,
}

impl DateTimeFormat {
    /// Whether the format stores into an INTEGER or REAL column rather than
    /// TEXT.
    pub(crate) fn is_numeric(self) -> bool {
        !matches!(
            self,
            DateTimeFormat::Iso8601SpaceMs
                | DateTimeFormat::Iso8601T
                | DateTimeFormat::Rfc1123
                | DateTimeFormat::RoundTrip
        )
    }
}
