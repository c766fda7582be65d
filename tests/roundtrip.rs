use anyhow::Result;
use rust_decimal::Decimal;
use sqlite_mapper::{
    DateTimeFormat, SqliteConnectOptions, SqliteConnection, SqliteValue, UuidFormat,
};
use std::str::FromStr;
use time::macros::datetime;
use time::Duration;
use uuid::Uuid;

fn connect(options: SqliteConnectOptions) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::open(options.in_memory(true))?;
    conn.execute_batch("CREATE TABLE t (v)")?;
    Ok(conn)
}

fn store(conn: &mut SqliteConnection, value: impl sqlite_mapper::Encode) -> Result<()> {
    conn.execute("DELETE FROM t", ())?;
    conn.execute("INSERT INTO t (v) VALUES (?)", (value,))?;
    Ok(())
}

fn read<T: sqlite_mapper::Decode>(conn: &mut SqliteConnection) -> Result<T> {
    Ok(conn.query_row("SELECT v FROM t", ())?.get(0)?)
}

#[test]
fn primitives_round_trip() -> Result<()> {
    let mut conn = connect(SqliteConnectOptions::new())?;

    store(&mut conn, true)?;
    assert!(read::<bool>(&mut conn)?);

    store(&mut conn, -12_345_i32)?;
    assert_eq!(read::<i32>(&mut conn)?, -12_345);

    store(&mut conn, i64::MIN)?;
    assert_eq!(read::<i64>(&mut conn)?, i64::MIN);

    store(&mut conn, 1.5_f64)?;
    assert_eq!(read::<f64>(&mut conn)?, 1.5);

    store(&mut conn, "O'Reilly")?;
    assert_eq!(read::<String>(&mut conn)?, "O'Reilly");

    store(&mut conn, vec![0_u8, 1, 2, 255])?;
    assert_eq!(read::<Vec<u8>>(&mut conn)?, vec![0, 1, 2, 255]);

    Ok(())
}

#[test]
fn u64_max_round_trips_bitwise() -> Result<()> {
    let mut conn = connect(SqliteConnectOptions::new())?;

    store(&mut conn, u64::MAX)?;

    // stored as the bit pattern, which SQL sees as -1
    let raw = conn.query_row("SELECT v FROM t", ())?;
    assert_eq!(raw.value(0)?, &SqliteValue::Integer(-1));

    assert_eq!(read::<u64>(&mut conn)?, u64::MAX);

    Ok(())
}

#[test]
fn narrowing_out_of_range_is_an_error() -> Result<()> {
    let mut conn = connect(SqliteConnectOptions::new())?;

    store(&mut conn, i64::from(i32::MAX) + 1)?;

    assert!(read::<i32>(&mut conn).is_err());
    assert_eq!(read::<i64>(&mut conn)?, i64::from(i32::MAX) + 1);

    Ok(())
}

#[test]
fn null_reads_as_none_for_every_host_type() -> Result<()> {
    let mut conn = connect(SqliteConnectOptions::new())?;

    store(&mut conn, None::<i64>)?;

    assert_eq!(read::<Option<bool>>(&mut conn)?, None);
    assert_eq!(read::<Option<i64>>(&mut conn)?, None);
    assert_eq!(read::<Option<f64>>(&mut conn)?, None);
    assert_eq!(read::<Option<String>>(&mut conn)?, None);
    assert_eq!(read::<Option<Vec<u8>>>(&mut conn)?, None);
    assert_eq!(read::<Option<Uuid>>(&mut conn)?, None);
    assert_eq!(read::<Option<Decimal>>(&mut conn)?, None);
    assert_eq!(read::<Option<Duration>>(&mut conn)?, None);
    assert_eq!(read::<Option<time::PrimitiveDateTime>>(&mut conn)?, None);

    Ok(())
}

#[test]
fn uuid_round_trips_as_text_and_blob() -> Result<()> {
    let id = Uuid::from_str("67e55044-10b1-426f-9247-bb680e5fe0c8")?;

    let mut conn = connect(SqliteConnectOptions::new())?;
    store(&mut conn, id)?;

    let raw = conn.query_row("SELECT v FROM t", ())?;
    assert_eq!(
        raw.value(0)?,
        &SqliteValue::Text("67e55044-10b1-426f-9247-bb680e5fe0c8".into()),
    );
    assert_eq!(read::<Uuid>(&mut conn)?, id);

    let mut conn = connect(SqliteConnectOptions::new().guid_format(UuidFormat::Simple))?;
    store(&mut conn, id)?;
    assert_eq!(
        conn.query_row("SELECT v FROM t", ())?.value(0)?,
        &SqliteValue::Text("67e5504410b1426f9247bb680e5fe0c8".into()),
    );
    assert_eq!(read::<Uuid>(&mut conn)?, id);

    let mut conn = connect(SqliteConnectOptions::new().guid_as_blob(true))?;
    store(&mut conn, id)?;

    match conn.query_row("SELECT v FROM t", ())?.value(0)? {
        SqliteValue::Blob(bytes) => assert_eq!(bytes.len(), 16),
        other => panic!("expected a blob, found {other:?}"),
    }
    assert_eq!(read::<Uuid>(&mut conn)?, id);

    Ok(())
}

#[test]
fn decimal_round_trips_as_text_and_blob() -> Result<()> {
    let value = Decimal::from_str("-1234567890.123456789")?;

    let mut conn = connect(SqliteConnectOptions::new())?;
    store(&mut conn, value)?;
    assert_eq!(
        conn.query_row("SELECT v FROM t", ())?.value(0)?,
        &SqliteValue::Text("-1234567890.123456789".into()),
    );
    assert_eq!(read::<Decimal>(&mut conn)?, value);

    let mut conn = connect(SqliteConnectOptions::new().decimal_as_blob(true))?;
    store(&mut conn, value)?;
    assert_eq!(read::<Decimal>(&mut conn)?, value);

    Ok(())
}

#[test]
fn duration_round_trips_as_text_and_ticks() -> Result<()> {
    let value = Duration::new(90_061, 500_000_000);

    let mut conn = connect(SqliteConnectOptions::new())?;
    store(&mut conn, value)?;
    assert_eq!(
        conn.query_row("SELECT v FROM t", ())?.value(0)?,
        &SqliteValue::Text("25:01:01.500000000".into()),
    );
    assert_eq!(read::<Duration>(&mut conn)?, value);

    let mut conn = connect(SqliteConnectOptions::new().duration_as_ticks(true))?;
    store(&mut conn, value)?;
    assert_eq!(
        conn.query_row("SELECT v FROM t", ())?.value(0)?,
        &SqliteValue::Integer(900_615_000_000),
    );
    assert_eq!(read::<Duration>(&mut conn)?, value);

    Ok(())
}

#[test]
fn datetime_round_trips_across_formats() -> Result<()> {
    let value = datetime!(2024-01-02 03:04:05.678);

    for format in [
        DateTimeFormat::Iso8601SpaceMs,
        DateTimeFormat::RoundTrip,
        DateTimeFormat::Ticks,
        DateTimeFormat::FileTime,
        DateTimeFormat::UnixMillis,
    ] {
        let mut conn = connect(SqliteConnectOptions::new().datetime_format(format))?;
        store(&mut conn, value)?;

        assert_eq!(read::<time::PrimitiveDateTime>(&mut conn)?, value, "{format:?}");
    }

    // second-resolution formats drop the fraction
    for format in [DateTimeFormat::Iso8601T, DateTimeFormat::Rfc1123, DateTimeFormat::UnixSeconds] {
        let mut conn = connect(SqliteConnectOptions::new().datetime_format(format))?;
        store(&mut conn, value)?;

        assert_eq!(
            read::<time::PrimitiveDateTime>(&mut conn)?,
            datetime!(2024-01-02 03:04:05),
            "{format:?}",
        );
    }

    Ok(())
}

#[test]
fn default_datetime_format_matches_sqlite_datetime() -> Result<()> {
    let mut conn = connect(SqliteConnectOptions::new())?;

    store(&mut conn, datetime!(2024-01-02 03:04:05.678))?;

    assert_eq!(
        conn.query_row("SELECT v FROM t", ())?.value(0)?,
        &SqliteValue::Text("2024-01-02 03:04:05.678".into()),
    );

    Ok(())
}

#[test]
fn zeroblob_reserves_zero_filled_bytes() -> Result<()> {
    let mut conn = connect(SqliteConnectOptions::new())?;

    store(&mut conn, sqlite_mapper::types::ZeroBlob(4))?;

    assert_eq!(read::<Vec<u8>>(&mut conn)?, vec![0, 0, 0, 0]);

    Ok(())
}
