use anyhow::Result;
use sqlite_mapper::{live_statement_count, model, SqliteConnection, SqliteStatement, StepOutcome};

// This file stays a single test: the statement counter is process-wide, and
// integration test files run as separate processes.

model! {
    pub struct Item ("items") {
        id: i64 [pk autoincrement],
        label: String,
    }
}

#[test]
fn no_statement_survives_its_connection() -> Result<()> {
    assert_eq!(live_statement_count(), 0);

    let mut conn = SqliteConnection::open_in_memory()?;

    for n in 0..10 {
        conn.save(&mut Item { id: 0, label: format!("item-{n}") })?;
    }

    // exercise the cache, a lazy iterator and a low-level statement
    let _ = conn.load_all::<Item>()?.next();

    {
        let mut stmt = SqliteStatement::prepare(&conn, "SELECT COUNT(*) FROM items")?;
        assert_eq!(stmt.step()?, StepOutcome::Row);
        assert_eq!(stmt.column_value(0)?, sqlite_mapper::SqliteValue::Integer(10));
    }

    assert!(live_statement_count() > 0, "the cache holds prepared statements");

    conn.close();

    assert_eq!(live_statement_count(), 0, "closing the connection finalized everything");

    Ok(())
}
