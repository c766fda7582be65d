use time::Duration;

use crate::arguments::SqliteArgumentValue;
use crate::decode::{mismatch, Decode};
use crate::encode::{BindContext, Encode, IsNull, Type};
use crate::error::BoxDynError;
use crate::options::StorageOptions;
use crate::type_info::{DataType, SqliteTypeInfo};
use crate::value::SqliteValue;

const NANOS_PER_TICK: i64 = 100;

impl Type for Duration {
    fn type_info() -> SqliteTypeInfo {
        SqliteTypeInfo(DataType::Text)
    }
}

impl Encode for Duration {
    fn encode(&self, ctx: &mut BindContext<'_>) -> Result<IsNull, BoxDynError> {
        let value = if ctx.options().duration_as_ticks {
            let ticks = i64::try_from(self.whole_nanoseconds() / NANOS_PER_TICK as i128)
                .map_err(|_| "duration out of range for tick storage")?;

            SqliteArgumentValue::Int64(ticks)
        } else {
            SqliteArgumentValue::Text(format_duration(*self))
        };

        ctx.push(value);

        Ok(IsNull::No)
    }
}

impl Decode for Duration {
    fn decode(value: &SqliteValue, _options: &StorageOptions) -> Result<Self, BoxDynError> {
        match value {
            SqliteValue::Integer(ticks) => Ok(Duration::nanoseconds(
                ticks
                    .checked_mul(NANOS_PER_TICK)
                    .ok_or("tick value out of range")?,
            )),

            SqliteValue::Text(s) => parse_duration(s),

            other => mismatch(other, "TEXT or INTEGER"),
        }
    }
}

// `[-]H:MM:SS.fffffffff` with exactly nine fractional digits, so the text
// sorts consistently for same-sign durations of equal hour width
fn format_duration(d: Duration) -> String {
    let sign = if d.is_negative() { "-" } else { "" };
    let d = d.abs();

    format!(
        "{sign}{}:{:02}:{:02}.{:09}",
        d.whole_hours(),
        d.whole_minutes() % 60,
        d.whole_seconds() % 60,
        d.subsec_nanoseconds()
    )
}

fn parse_duration(s: &str) -> Result<Duration, BoxDynError> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let invalid = || -> BoxDynError { format!("invalid duration: {s:?}").into() };

    let mut parts = rest.splitn(3, ':');
    let hours: i64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let minutes: i64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let seconds_part = parts.next().ok_or_else(invalid)?;

    let (seconds, nanos) = match seconds_part.split_once('.') {
        Some((whole, frac)) => {
            if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }

            let scale = 10_i64.pow(9 - frac.len() as u32);
            let frac: i64 = frac.parse().map_err(|_| invalid())?;

            (whole.parse::<i64>().map_err(|_| invalid())?, frac * scale)
        }
        None => (seconds_part.parse().map_err(|_| invalid())?, 0),
    };

    let magnitude =
        Duration::seconds(hours * 3600 + minutes * 60 + seconds) + Duration::nanoseconds(nanos);

    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text_round_trips() {
        for d in [
            Duration::ZERO,
            Duration::seconds(1),
            Duration::new(3661, 500_000_000),
            -Duration::new(90_061, 123_456_789),
            Duration::hours(300),
        ] {
            let text = format_duration(d);
            assert_eq!(parse_duration(&text).unwrap(), d, "{text}");
        }
    }

    #[test]
    fn text_shape() {
        assert_eq!(format_duration(Duration::new(3661, 500_000_000)), "1:01:01.500000000");
        assert_eq!(format_duration(-Duration::seconds(90)), "-0:01:30.000000000");
    }
}
