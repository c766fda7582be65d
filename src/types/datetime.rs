use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::{datetime, format_description as fd};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::{DateTimeFormat, StorageOptions};
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

const UNIX_EPOCH: PrimitiveDateTime = datetime!(1970-01-01 0:00);
const OLE_EPOCH: PrimitiveDateTime = datetime!(1899-12-30 0:00);

const TICKS_PER_SECOND: i64 = 10_000_000;

// 100 ns intervals between 0001-01-01 and the Unix epoch
const EPOCH_TICKS: i64 = 621_355_968_000_000_000;

// 100 ns intervals between 1601-01-01 and the Unix epoch
const EPOCH_FILETIME: i64 = 116_444_736_000_000_000;

// Julian day number of the Unix epoch
const EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

impl Type for PrimitiveDateTime {
    fn type_info() -> SqliteTypeInfo {
        // the declared affinity under the default (text) format; numeric
        // formats still store fine, TEXT has no constraint in SQLite
        SqliteTypeInfo(DataType::Text)
    }
}

impl Type for OffsetDateTime {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for PrimitiveDateTime {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        ctx.push(encode_wall_clock(*self, ctx.options().datetime_format)?);

        Ok(IsNull::No)
    }
}

impl Encode for OffsetDateTime {
    /// The wall-clock component of the value is stored; the offset only
    /// survives under [`DateTimeFormat::RoundTrip`], and
    /// [`DateTimeFormat::FileTimeUtc`] converts to UTC first.
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        let format = ctx.options().datetime_format;

        let value = match format {
            DateTimeFormat::RoundTrip => SqliteArgumentValue::Text(self.format(&Rfc3339)?),

            DateTimeFormat::FileTimeUtc => {
                let utc = self.to_offset(UtcOffset::UTC);
                encode_wall_clock(PrimitiveDateTime::new(utc.date(), utc.time()), format)?
            }

            _ => encode_wall_clock(PrimitiveDateTime::new(self.date(), self.time()), format)?,
        };

        ctx.push(value);

        Ok(IsNull::No)
    }
}

impl Decode for PrimitiveDateTime {
    fn decode(value: &SqliteValue, options: &StorageOptions) -> Result<Self, BoxDynError> {
        decode_wall_clock(value, options.datetime_format)
    }
}

impl Decode for OffsetDateTime {
    fn decode(value: &SqliteValue, options: &StorageOptions) -> Result<Self, BoxDynError> {
        if let SqliteValue::Text(s) = value {
            // an offset in the text always wins, whatever the configuration
            if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
                return Ok(dt);
            }

            if let Ok(dt) = OffsetDateTime::parse(s, formats::OFFSET_DATE_TIME) {
                return Ok(dt);
            }
        }

        Ok(decode_wall_clock(value, options.datetime_format)?.assume_utc())
    }
}

fn encode_wall_clock(
    dt: PrimitiveDateTime,
    format: DateTimeFormat,
) -> Result<SqliteArgumentValue, BoxDynError> {
    let since_epoch = dt - UNIX_EPOCH;

    Ok(match format {
        DateTimeFormat::Iso8601SpaceMs => SqliteArgumentValue::Text(dt.format(
            fd!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"),
        )?),

        DateTimeFormat::Iso8601T => SqliteArgumentValue::Text(
            dt.format(fd!("[year]-[month]-[day]T[hour]:[minute]:[second]"))?,
        ),

        DateTimeFormat::Rfc1123 => SqliteArgumentValue::Text(dt.format(fd!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))?),

        DateTimeFormat::RoundTrip => SqliteArgumentValue::Text(dt.format(fd!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:7]"
        ))?),

        DateTimeFormat::Ticks => SqliteArgumentValue::Int64(ticks_since_epoch(since_epoch)? + EPOCH_TICKS),

        DateTimeFormat::FileTime | DateTimeFormat::FileTimeUtc => {
            SqliteArgumentValue::Int64(ticks_since_epoch(since_epoch)? + EPOCH_FILETIME)
        }

        DateTimeFormat::OleAutomation => {
            let since_ole = dt - OLE_EPOCH;
            SqliteArgumentValue::Double(since_ole.as_seconds_f64() / SECONDS_PER_DAY)
        }

        DateTimeFormat::JulianDay => SqliteArgumentValue::Double(
            EPOCH_JULIAN_DAY + since_epoch.as_seconds_f64() / SECONDS_PER_DAY,
        ),

        DateTimeFormat::UnixSeconds => SqliteArgumentValue::Int64(since_epoch.whole_seconds()),

        DateTimeFormat::UnixMillis => SqliteArgumentValue::Int64(
            i64::try_from(since_epoch.whole_milliseconds())
                .map_err(|_| "datetime out of range for millisecond storage")?,
        ),
    })
}

fn ticks_since_epoch(since_epoch: Duration) -> Result<i64, BoxDynError> {
    i64::try_from(since_epoch.whole_nanoseconds() / 100)
        .map_err(|_| "datetime out of range for tick storage".into())
}

fn decode_wall_clock(
    value: &SqliteValue,
    format: DateTimeFormat,
) -> Result<PrimitiveDateTime, BoxDynError> {
    match value {
        SqliteValue::Text(s) => {
            decode_from_text(s).ok_or_else(|| format!("invalid datetime: {s:?}").into())
        }

        SqliteValue::Integer(i) => {
            let ticks = match format {
                DateTimeFormat::Ticks => *i - EPOCH_TICKS,
                DateTimeFormat::FileTime | DateTimeFormat::FileTimeUtc => *i - EPOCH_FILETIME,
                DateTimeFormat::UnixMillis => {
                    return Ok(UNIX_EPOCH + Duration::milliseconds(*i));
                }
                // whatever the configured text format, an INTEGER reads as
                // Unix seconds, matching `unixepoch()`
                _ => return Ok(UNIX_EPOCH + Duration::seconds(*i)),
            };

            // split before converting: the full tick count in nanoseconds
            // does not fit an i64
            let seconds = ticks.div_euclid(TICKS_PER_SECOND);
            let nanos = ticks.rem_euclid(TICKS_PER_SECOND) * 100;

            Ok(UNIX_EPOCH + Duration::seconds(seconds) + Duration::nanoseconds(nanos))
        }

        SqliteValue::Real(r) => Ok(match format {
            DateTimeFormat::OleAutomation => OLE_EPOCH + Duration::seconds_f64(r * SECONDS_PER_DAY),
            _ => UNIX_EPOCH + Duration::seconds_f64((r - EPOCH_JULIAN_DAY) * SECONDS_PER_DAY),
        }),

        other => mismatch(other, "TEXT, INTEGER or REAL"),
    }
}

fn decode_from_text(value: &str) -> Option<PrimitiveDateTime> {
    let compound = [
        BorrowedFormatItem::Compound(formats::PRIMITIVE_DATE_TIME_SPACE_SEPARATED),
        BorrowedFormatItem::Compound(formats::PRIMITIVE_DATE_TIME_T_SEPARATED),
    ];

    if let Ok(dt) = PrimitiveDateTime::parse(value, &BorrowedFormatItem::First(&compound)) {
        return Some(dt);
    }

    if let Ok(dt) = PrimitiveDateTime::parse(
        value,
        fd!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"),
    ) {
        return Some(dt);
    }

    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(PrimitiveDateTime::new(dt.date(), dt.time()));
    }

    None
}

mod formats {
    use time::format_description::BorrowedFormatItem::{Component, Literal, Optional};
    use time::format_description::{modifier, BorrowedFormatItem, Component::*};

    const YEAR: BorrowedFormatItem<'_> = Component(Year({
        let mut value = modifier::Year::default();
        value.padding = modifier::Padding::Zero;
        value.repr = modifier::YearRepr::Full;
        value.iso_week_based = false;
        value.sign_is_mandatory = false;
        value
    }));

    const MONTH: BorrowedFormatItem<'_> = Component(Month({
        let mut value = modifier::Month::default();
        value.padding = modifier::Padding::Zero;
        value.repr = modifier::MonthRepr::Numerical;
        value.case_sensitive = true;
        value
    }));

    const DAY: BorrowedFormatItem<'_> = Component(Day({
        let mut value = modifier::Day::default();
        value.padding = modifier::Padding::Zero;
        value
    }));

    const HOUR: BorrowedFormatItem<'_> = Component(Hour({
        let mut value = modifier::Hour::default();
        value.padding = modifier::Padding::Zero;
        value.is_12_hour_clock = false;
        value
    }));

    const MINUTE: BorrowedFormatItem<'_> = Component(Minute({
        let mut value = modifier::Minute::default();
        value.padding = modifier::Padding::Zero;
        value
    }));

    const SECOND: BorrowedFormatItem<'_> = Component(Second({
        let mut value = modifier::Second::default();
        value.padding = modifier::Padding::Zero;
        value
    }));

    const SUBSECOND: BorrowedFormatItem<'_> = Component(Subsecond({
        let mut value = modifier::Subsecond::default();
        value.digits = modifier::SubsecondDigits::OneOrMore;
        value
    }));

    const OFFSET_HOUR: BorrowedFormatItem<'_> = Component(OffsetHour({
        let mut value = modifier::OffsetHour::default();
        value.sign_is_mandatory = true;
        value.padding = modifier::Padding::Zero;
        value
    }));

    const OFFSET_MINUTE: BorrowedFormatItem<'_> = Component(OffsetMinute({
        let mut value = modifier::OffsetMinute::default();
        value.padding = modifier::Padding::Zero;
        value
    }));

    pub(super) const OFFSET_DATE_TIME: &[BorrowedFormatItem<'_>] = {
        &[
            YEAR,
            Literal(b"-"),
            MONTH,
            Literal(b"-"),
            DAY,
            Optional(&Literal(b" ")),
            Optional(&Literal(b"T")),
            HOUR,
            Literal(b":"),
            MINUTE,
            Optional(&Literal(b":")),
            Optional(&SECOND),
            Optional(&Literal(b".")),
            Optional(&SUBSECOND),
            Optional(&OFFSET_HOUR),
            Optional(&Literal(b":")),
            Optional(&OFFSET_MINUTE),
        ]
    };

    pub(super) const PRIMITIVE_DATE_TIME_SPACE_SEPARATED: &[BorrowedFormatItem<'_>] = {
        &[
            YEAR,
            Literal(b"-"),
            MONTH,
            Literal(b"-"),
            DAY,
            Literal(b" "),
            HOUR,
            Literal(b":"),
            MINUTE,
            Optional(&Literal(b":")),
            Optional(&SECOND),
            Optional(&Literal(b".")),
            Optional(&SUBSECOND),
            Optional(&Literal(b"Z")),
        ]
    };

    pub(super) const PRIMITIVE_DATE_TIME_T_SEPARATED: &[BorrowedFormatItem<'_>] = {
        &[
            YEAR,
            Literal(b"-"),
            MONTH,
            Literal(b"-"),
            DAY,
            Literal(b"T"),
            HOUR,
            Literal(b":"),
            MINUTE,
            Optional(&Literal(b":")),
            Optional(&SECOND),
            Optional(&Literal(b".")),
            Optional(&SUBSECOND),
            Optional(&Literal(b"Z")),
        ]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_renders_milliseconds() {
        let dt = datetime!(2024-01-02 03:04:05.678);
        let value = encode_wall_clock(dt, DateTimeFormat::Iso8601SpaceMs).unwrap();

        assert_eq!(value, SqliteArgumentValue::Text("2024-01-02 03:04:05.678".into()));
    }

    #[test]
    fn numeric_formats_round_trip() {
        let dt = datetime!(2024-01-02 03:04:05.678);

        for format in [
            DateTimeFormat::Ticks,
            DateTimeFormat::FileTime,
            DateTimeFormat::UnixMillis,
        ] {
            let stored = match encode_wall_clock(dt, format).unwrap() {
                SqliteArgumentValue::Int64(i) => SqliteValue::Integer(i),
                other => panic!("unexpected storage class: {other:?}"),
            };

            let back = decode_wall_clock(&stored, format).unwrap();
            assert_eq!(back, dt, "{format:?}");
        }
    }

    #[test]
    fn unix_seconds_truncates_subseconds() {
        let dt = datetime!(2024-01-02 03:04:05.678);

        let stored = match encode_wall_clock(dt, DateTimeFormat::UnixSeconds).unwrap() {
            SqliteArgumentValue::Int64(i) => SqliteValue::Integer(i),
            other => panic!("unexpected storage class: {other:?}"),
        };

        let back = decode_wall_clock(&stored, DateTimeFormat::UnixSeconds).unwrap();
        assert_eq!(back, datetime!(2024-01-02 03:04:05));
    }

    #[test]
    fn rfc1123_round_trips_whole_seconds() {
        let dt = datetime!(2024-01-02 03:04:05);

        let stored = match encode_wall_clock(dt, DateTimeFormat::Rfc1123).unwrap() {
            SqliteArgumentValue::Text(s) => s,
            other => panic!("unexpected storage class: {other:?}"),
        };

        assert_eq!(stored, "Tue, 02 Jan 2024 03:04:05 GMT");

        let back = decode_from_text(&stored).unwrap();
        assert_eq!(back, dt);
    }
}
