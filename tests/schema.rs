use anyhow::Result;
use sqlite_mapper::{model, Error, SqliteConnection, SqliteValue};

// Two record types mapping to the same table stand in for one type whose
// shape changed between releases.

model! {
    pub struct NoteV1 ("notes") {
        id: i64 [pk autoincrement],
        body: String,
    }
}

model! {
    pub struct NoteV2 ("notes") {
        id: i64 [pk autoincrement],
        body: String,
        starred: Option<bool>,
    }
}

model! {
    pub struct NoteRetyped ("notes") {
        id: i64 [pk autoincrement],
        body: Option<i64>,
    }
}

#[test]
fn synchronization_is_idempotent() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.synchronize_schema::<NoteV1>()?;
    let after_create = conn.ddl_statement_count();
    assert_eq!(after_create, 1);

    conn.synchronize_schema::<NoteV1>()?;
    assert_eq!(conn.ddl_statement_count(), after_create, "second run issues no DDL");

    Ok(())
}

#[test]
fn new_field_becomes_an_added_column_with_null_for_existing_rows() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    let mut old = NoteV1 { id: 0, body: "existing".into() };
    conn.save(&mut old)?;

    conn.synchronize_schema::<NoteV2>()?;

    // the old row is intact and reads NULL in the added column
    let row = conn.query_row("SELECT body, starred FROM notes", ())?;
    assert_eq!(row.get::<String, _>("body")?, "existing");
    assert_eq!(row.value("starred")?, &SqliteValue::Null);

    let loaded: NoteV2 = conn.load((old.id,))?;
    assert_eq!(loaded.starred, None);

    // and synchronizing again is a no-op
    let ddl = conn.ddl_statement_count();
    conn.synchronize_schema::<NoteV2>()?;
    assert_eq!(conn.ddl_statement_count(), ddl);

    Ok(())
}

#[test]
fn column_type_changes_are_refused() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.synchronize_schema::<NoteV1>()?;

    assert!(matches!(
        conn.synchronize_schema::<NoteRetyped>(),
        Err(Error::SchemaIncompatible(_)),
    ));

    Ok(())
}

#[test]
fn first_save_creates_the_table_on_demand() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    assert_eq!(conn.ddl_statement_count(), 0);

    conn.save(&mut NoteV1 { id: 0, body: "hello".into() })?;

    assert_eq!(conn.ddl_statement_count(), 1);

    Ok(())
}
