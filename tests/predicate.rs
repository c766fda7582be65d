use anyhow::Result;
use sqlite_mapper::{col, model, val, SqliteConnectOptions, SqliteConnection};

model! {
    pub struct Person ("people") {
        id: i64 [pk autoincrement],
        name: String,
        age: Option<i64>,
    }
}

fn seed(conn: &mut SqliteConnection) -> Result<()> {
    for (name, age) in [
        ("Ada", Some(36)),
        ("Alan", Some(41)),
        ("Grace", Some(85)),
        ("ada", Some(20)),
        ("Ghost", None),
    ] {
        conn.save(&mut Person { id: 0, name: name.into(), age })?;
    }

    Ok(())
}

fn names(people: Vec<Person>) -> Vec<String> {
    people.into_iter().map(|p| p.name).collect()
}

#[test]
fn closure_value_and_starts_with() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    seed(&mut conn)?;

    let closure_value = 21_i64;
    let found: Vec<Person> = conn
        .find_where(&col("age").gt(val(closure_value)).and(col("name").starts_with(val("A"))))?
        .collect::<Result<_, _>>()?;

    assert_eq!(names(found), ["Ada", "Alan"]);

    Ok(())
}

#[test]
fn null_comparison_matches_null_rows_only() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    seed(&mut conn)?;

    let found: Vec<Person> =
        conn.find_where(&col("age").eq(val(None::<i64>)))?.collect::<Result<_, _>>()?;
    assert_eq!(names(found), ["Ghost"]);

    let found: Vec<Person> =
        conn.find_where(&col("age").ne(val(None::<i64>)))?.collect::<Result<_, _>>()?;
    assert_eq!(found.len(), 4);

    Ok(())
}

#[test]
fn quoted_needles_are_bound_not_inlined() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;

    conn.save(&mut Person { id: 0, name: "O'Reilly".into(), age: Some(30) })?;

    let found: Vec<Person> = conn
        .find_where(&col("name").eq(val("O'Reilly")).and(col("age").ge(val(30_i64))))?
        .collect::<Result<_, _>>()?;

    assert_eq!(found.len(), 1);

    Ok(())
}

#[test]
fn string_equality_honors_case_insensitive_option() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    seed(&mut conn)?;

    let found: Vec<Person> =
        conn.find_where(&col("name").eq(val("ADA")))?.collect::<Result<_, _>>()?;
    assert!(found.is_empty(), "binary comparison by default");

    let mut conn =
        SqliteConnection::open(SqliteConnectOptions::new().in_memory(true).case_insensitive_text(true))?;
    seed(&mut conn)?;

    let found: Vec<Person> =
        conn.find_where(&col("name").eq(val("ADA")))?.collect::<Result<_, _>>()?;
    assert_eq!(names(found), ["Ada", "ada"]);

    Ok(())
}

#[test]
fn sequence_membership_and_string_calls() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    seed(&mut conn)?;

    let found: Vec<Person> =
        conn.find_where(&col("age").in_list([36_i64, 85]))?.collect::<Result<_, _>>()?;
    assert_eq!(names(found), ["Ada", "Grace"]);

    let found: Vec<Person> = conn
        .find_where(&col("name").to_lower().eq(val("ada")))?
        .collect::<Result<_, _>>()?;
    assert_eq!(found.len(), 2);

    let found: Vec<Person> =
        conn.find_where(&col("name").length().eq(val(5_i64)))?.collect::<Result<_, _>>()?;
    assert_eq!(names(found), ["Grace", "Ghost"]);

    Ok(())
}

#[test]
fn conditional_translates_to_case() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    seed(&mut conn)?;

    // prefer age when present, else -1
    let found: Vec<Person> = conn
        .find_where(
            &col("age")
                .is_not_null()
                .if_then_else(col("age"), val(-1_i64))
                .lt(val(0_i64)),
        )?
        .collect::<Result<_, _>>()?;

    assert_eq!(names(found), ["Ghost"]);

    Ok(())
}

#[test]
fn coalesce_translates_and_folds() -> Result<()> {
    let mut conn = SqliteConnection::open_in_memory()?;
    seed(&mut conn)?;

    let found: Vec<Person> = conn
        .find_where(&col("age").coalesce(val(-1_i64)).eq(val(-1_i64)))?
        .collect::<Result<_, _>>()?;

    assert_eq!(names(found), ["Ghost"]);

    Ok(())
}
