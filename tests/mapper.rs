use anyhow::Result;
use sqlite_mapper::{model, Error, SqliteConnection};

model! {
    pub struct Contact ("contacts") {
        email: String [pk],
        name: String,
        age: Option<i64>,
    }
}

model! {
    pub struct Counter ("counters") {
        id: i64 [pk autoincrement],
        n: i64,
    }
}

model! {
    pub struct Grant ("grants") {
        user: String [pk],
        role: String [pk],
        note: Option<String>,
    }
}

model! {
    pub struct Slot ("slots") {
        id: i64 [pk],
        label: String,
    }
}

model! {
    pub struct Setting ("settings") {
        key: String [pk],
        value: String,
    }
}

fn contact(email: &str, name: &str) -> Contact {
    Contact { email: email.into(), name: name.into(), age: None }
}

#[test]
fn save_then_load_by_pk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut conn = SqliteConnection::open_path(dir.path().join("contacts.db"))?;

    let mut k = contact("k@x", "K");
    conn.save(&mut k)?;

    let loaded: Contact = conn.load(("k@x",))?;
    assert_eq!(loaded, k);

    Ok(())
}

#[test]
fn load_of_missing_key_is_not_found() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.save(&mut contact("k@x", "K"))?;

    assert!(matches!(conn.load::<Contact, _>(("missing@x",)), Err(Error::NotFound)));

    Ok(())
}

#[test]
fn saving_the_same_key_twice_keeps_one_row_with_latest_values() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.save(&mut contact("k@x", "K"))?;
    conn.save(&mut contact("k@x", "Kay"))?;

    let all: Vec<Contact> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Kay");

    Ok(())
}

#[test]
fn auto_increment_assigns_and_writes_back_rowids() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    for n in 1..=100 {
        let mut row = Counter { id: 0, n };
        conn.save(&mut row)?;

        assert_eq!(row.id, n, "rowid written back into the record");
    }

    assert_eq!(conn.last_insert_rowid(), 100);

    let all: Vec<Counter> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 100);

    Ok(())
}

#[test]
fn saving_a_set_key_updates_instead_of_inserting() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    let mut row = Counter { id: 0, n: 1 };
    conn.save(&mut row)?;

    row.n = 2;
    conn.save(&mut row)?;

    let all: Vec<Counter> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].n, 2);

    Ok(())
}

#[test]
fn zero_is_a_real_key_on_a_manual_integer_pk() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.save(&mut Slot { id: 0, label: "first".into() })?;
    conn.save(&mut Slot { id: 0, label: "second".into() })?;

    let all: Vec<Slot> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 1, "zero key upserts instead of re-inserting");
    assert_eq!(all[0].label, "second");

    let loaded: Slot = conn.load((0_i64,))?;
    assert_eq!(loaded.id, 0);
    assert_eq!(loaded.label, "second");

    Ok(())
}

#[test]
fn empty_string_is_a_real_key_on_a_manual_text_pk() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.save(&mut Setting { key: String::new(), value: "x".into() })?;
    conn.save(&mut Setting { key: String::new(), value: "y".into() })?;

    let all: Vec<Setting> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].value, "y");

    let loaded: Setting = conn.load(("",))?;
    assert_eq!(loaded.value, "y");

    Ok(())
}

#[test]
fn composite_key_save_load_update_delete() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    let mut grant = Grant { user: "ada".into(), role: "admin".into(), note: None };
    conn.save(&mut grant)?;

    let loaded: Grant = conn.load(("ada", "admin"))?;
    assert_eq!(loaded, grant);

    grant.note = Some("temporary".into());
    conn.save(&mut grant)?;

    let loaded: Grant = conn.load(("ada", "admin"))?;
    assert_eq!(loaded.note.as_deref(), Some("temporary"));

    assert_eq!(conn.delete(&grant)?, 1);
    assert!(matches!(conn.load::<Grant, _>(("ada", "admin")), Err(Error::NotFound)));

    Ok(())
}

#[test]
fn delete_returns_rows_affected() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    let mut k = contact("k@x", "K");
    conn.save(&mut k)?;

    assert_eq!(conn.delete(&k)?, 1);
    assert_eq!(conn.delete(&k)?, 0);

    Ok(())
}

#[test]
fn transaction_rolls_back_on_error() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    // the table exists before the failed transaction
    conn.save(&mut contact("seed@x", "Seed"))?;
    conn.delete(&contact("seed@x", "Seed"))?;

    let outcome: Result<(), Error> = conn.with_transaction(|conn| {
        conn.save(&mut contact("a@x", "A"))?;
        conn.save(&mut contact("b@x", "B"))?;
        Err(Error::NotFound)
    });

    assert!(outcome.is_err());

    let all: Vec<Contact> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert!(all.is_empty(), "no rows persist after rollback");

    Ok(())
}

#[test]
fn inner_savepoint_rolls_back_without_the_outer_transaction() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.save(&mut contact("seed@x", "Seed"))?;
    conn.delete(&contact("seed@x", "Seed"))?;

    conn.with_transaction(|conn| {
        conn.save(&mut contact("kept@x", "Kept"))?;

        let inner: Result<(), Error> = conn.with_transaction(|conn| {
            conn.save(&mut contact("lost@x", "Lost"))?;
            Err(Error::NotFound)
        });
        assert!(inner.is_err());

        Ok(())
    })?;

    let all: Vec<Contact> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].email, "kept@x");

    Ok(())
}

#[test]
fn dropping_a_lazy_iterator_mid_stream_releases_the_statement() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    for n in 1..=10 {
        conn.save(&mut Counter { id: 0, n })?;
    }

    {
        let mut rows = conn.load_all::<Counter>()?;
        let first = rows.next().unwrap()?;
        assert_eq!(first.n, 1);
        // dropped here with nine rows unread
    }

    // the connection is immediately usable again
    let all: Vec<Counter> = conn.load_all()?.collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 10);

    Ok(())
}

#[test]
fn interrupt_handle_outlives_idle_use() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    let handle = conn.interrupt_handle();

    // interrupting an idle connection is a no-op
    handle.interrupt();

    conn.save(&mut contact("k@x", "K"))?;
    assert_eq!(conn.load_all::<Contact>()?.count(), 1);

    conn.close();

    // and a no-op after close
    handle.interrupt();

    Ok(())
}
