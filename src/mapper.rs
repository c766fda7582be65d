use std::marker::PhantomData;

use crate::arguments::{SqliteArgumentValue, SqliteArguments};
use crate::connection::{SqliteConnection, SqliteRows};
use crate::encode::{BindContext, IsNull};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::options::StorageOptions;
use crate::query::{translate, Expr};
use crate::row::SqliteRow;
use crate::schema::{descriptor, ColumnDescriptor, TableDescriptor};
use crate::value::SqliteValue;

impl SqliteConnection {
    /// Persist a record.
    ///
    /// While the primary key is unset — every key column NULL, or zero on
    /// the auto-increment column — the record is inserted; otherwise it is
    /// upserted, so saving the same key twice leaves one row with the
    /// latest values. The first save of a record type synchronizes its
    /// schema.
    ///
    /// After an insert through an auto-increment key, the assigned rowid
    /// is written back into the record.
    pub fn save<T: Model>(&mut self, record: &mut T) -> Result<()> {
        self.ensure_synchronized::<T>()?;

        let desc = descriptor::<T>()?;
        let storage = self.storage.clone();

        let values = encode_columns(record, desc, &storage)?;

        if pk_unset(desc, &values) || desc.pk.is_empty() {
            // fresh row; an unset auto-increment key is left out so the
            // engine assigns it
            let omit = desc
                .autoincrement
                .filter(|&i| auto_key_unset(&values[i]));

            let mut names = Vec::new();
            let mut arguments = SqliteArguments::new();

            for (i, column) in desc.columns.iter().enumerate() {
                if Some(i) == omit {
                    continue;
                }

                names.push(column.quoted_name());
                arguments.push(values[i].clone());
            }

            let sql = if names.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", desc.qualified_name())
            } else {
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    desc.qualified_name(),
                    names.join(", "),
                    placeholders(names.len()),
                )
            };

            self.execute(&sql, arguments)?;

            if let Some(i) = omit {
                let rowid = self.last_insert_rowid();
                let column = &desc.columns[i];

                record
                    .decode_field(column.field, &SqliteValue::Integer(rowid), &storage)
                    .map_err(|source| Error::Column { index: i, name: column.name.clone(), source })?;
            }
        } else {
            let sql = upsert_sql(desc);

            let mut arguments = SqliteArguments::new();
            for value in values {
                arguments.push(value);
            }

            self.execute(&sql, arguments)?;
        }

        Ok(())
    }

    /// Load a record by primary key.
    ///
    /// For a composite key pass a tuple in key-declaration order. Returns
    /// [`Error::NotFound`] when no row matches.
    pub fn load<T: Model, A: crate::arguments::IntoArguments>(&mut self, pk: A) -> Result<T> {
        let desc = descriptor::<T>()?;

        if desc.pk.is_empty() {
            return Err(Error::SchemaIncompatible(format!(
                "table {:?} has no primary key to load by",
                desc.name,
            )));
        }

        let sql = format!("{} WHERE {}", select_sql(desc), pk_clause(desc));

        let row = self.query_row(&sql, pk)?;

        materialize(&row, desc)
    }

    /// Load every row of the record type's table, lazily.
    ///
    /// One record materializes per row; dropping the iterator mid-stream
    /// resets and releases the underlying statement.
    pub fn load_all<T: Model>(&mut self) -> Result<ModelRows<'_, T>> {
        let desc = descriptor::<T>()?;
        let sql = select_sql(desc);

        Ok(ModelRows { rows: self.query(&sql, ())?, desc, _record: PhantomData })
    }

    /// Load the rows matching a predicate expression, lazily.
    ///
    /// The predicate's closed-over values are bound as parameters, never
    /// inlined into the SQL.
    pub fn find_where<T: Model>(&mut self, predicate: &Expr) -> Result<ModelRows<'_, T>> {
        let desc = descriptor::<T>()?;

        let translated = translate(predicate, &self.storage)?;
        let arguments = translated.arguments(&self.storage)?;

        let sql = format!("{} WHERE {}", select_sql(desc), translated.sql);

        Ok(ModelRows { rows: self.query(&sql, arguments)?, desc, _record: PhantomData })
    }

    /// Delete a record by its primary key, returning rows affected.
    pub fn delete<T: Model>(&mut self, record: &T) -> Result<u64> {
        let desc = descriptor::<T>()?;

        if desc.pk.is_empty() {
            return Err(Error::SchemaIncompatible(format!(
                "table {:?} has no primary key to delete by",
                desc.name,
            )));
        }

        let storage = self.storage.clone();

        let mut arguments = SqliteArguments::new();
        for (n, column) in desc.pk_columns().enumerate() {
            arguments.push(encode_column(record, column, &storage, n + 1)?);
        }

        let sql = format!("DELETE FROM {} WHERE {}", desc.qualified_name(), pk_clause(desc));

        self.execute(&sql, arguments)
    }
}

/// Lazy iterator materializing one record per row.
pub struct ModelRows<'c, T: Model> {
    rows: SqliteRows<'c>,
    desc: &'static TableDescriptor,
    _record: PhantomData<fn() -> T>,
}

impl<T: Model> Iterator for ModelRows<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(error) => return Some(Err(error)),
        };

        Some(materialize(&row, self.desc))
    }
}

fn materialize<T: Model>(row: &SqliteRow, desc: &TableDescriptor) -> Result<T> {
    let mut record = T::new_record();

    for (index, name) in row.columns.names.iter().enumerate() {
        // result columns with no descriptor counterpart leave the record's
        // fields untouched
        if let Some(column) = desc.column_by_name(name) {
            record
                .decode_field(column.field, &row.values[index], &row.columns.storage)
                .map_err(|source| Error::Column { index, name: name.clone(), source })?;
        }
    }

    Ok(record)
}

fn encode_columns<T: Model>(
    record: &T,
    desc: &TableDescriptor,
    storage: &StorageOptions,
) -> Result<Vec<SqliteArgumentValue>> {
    desc.columns
        .iter()
        .enumerate()
        .map(|(i, column)| encode_column(record, column, storage, i + 1))
        .collect()
}

fn encode_column<T: Model>(
    record: &T,
    column: &ColumnDescriptor,
    storage: &StorageOptions,
    index: usize,
) -> Result<SqliteArgumentValue> {
    let mut arguments = SqliteArguments::new();

    let is_null = record
        .encode_field(column.field, &mut BindContext::new(storage, &mut arguments))
        .map_err(|source| Error::Bind { index, source })?;

    Ok(match is_null {
        IsNull::Yes => SqliteArgumentValue::Null,
        IsNull::No => arguments.values.pop().unwrap_or(SqliteArgumentValue::Null),
    })
}

// The primary key counts as unset only while every key column is NULL, or
// zero on the auto-increment column (whose value the engine assigns). An
// explicitly supplied zero or empty value on any other key column is a
// real key and saves as an upsert.
fn pk_unset(desc: &TableDescriptor, values: &[SqliteArgumentValue]) -> bool {
    !desc.pk.is_empty()
        && desc.pk.iter().all(|&i| match &values[i] {
            SqliteArgumentValue::Null => true,
            value => desc.autoincrement == Some(i) && auto_key_unset(value),
        })
}

fn auto_key_unset(value: &SqliteArgumentValue) -> bool {
    matches!(
        value,
        SqliteArgumentValue::Null | SqliteArgumentValue::Int(0) | SqliteArgumentValue::Int64(0),
    )
}

fn placeholders(count: usize) -> String {
    let mut out = String::with_capacity(count * 3);

    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }

    out
}

fn select_sql(desc: &TableDescriptor) -> String {
    let columns: Vec<String> = desc.columns.iter().map(|c| c.quoted_name()).collect();

    format!("SELECT {} FROM {}", columns.join(", "), desc.qualified_name())
}

fn pk_clause(desc: &TableDescriptor) -> String {
    desc.pk_columns()
        .map(|c| format!("{} = ?", c.quoted_name()))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn upsert_sql(desc: &TableDescriptor) -> String {
    let names: Vec<String> = desc.columns.iter().map(|c| c.quoted_name()).collect();
    let keys: Vec<String> = desc.pk_columns().map(|c| c.quoted_name()).collect();

    let updates: Vec<String> = desc
        .columns
        .iter()
        .filter(|c| !c.is_pk())
        .map(|c| format!("{} = excluded.{}", c.quoted_name(), c.quoted_name()))
        .collect();

    let action = if updates.is_empty() {
        "DO NOTHING".to_owned()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        desc.qualified_name(),
        names.join(", "),
        placeholders(names.len()),
        keys.join(", "),
        action,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn zero_only_unsets_the_auto_increment_key() {
        use crate::encode::Type;
        use crate::schema::{ColumnSpec, TableSpec};

        let auto = TableDescriptor::from_spec(
            TableSpec::new("t").column(
                ColumnSpec::new("id", <i64 as Type>::type_info(), false)
                    .primary_key()
                    .auto_increment(),
            ),
            "T",
        )
        .unwrap();

        assert!(pk_unset(&auto, &[SqliteArgumentValue::Int64(0)]));
        assert!(pk_unset(&auto, &[SqliteArgumentValue::Null]));
        assert!(!pk_unset(&auto, &[SqliteArgumentValue::Int64(7)]));

        let manual = TableDescriptor::from_spec(
            TableSpec::new("t")
                .column(ColumnSpec::new("key", <String as Type>::type_info(), false).primary_key()),
            "T",
        )
        .unwrap();

        assert!(pk_unset(&manual, &[SqliteArgumentValue::Null]));
        assert!(!pk_unset(&manual, &[SqliteArgumentValue::Text(String::new())]));
        assert!(!pk_unset(&manual, &[SqliteArgumentValue::Text("k@x".into())]));

        let manual_int = TableDescriptor::from_spec(
            TableSpec::new("t")
                .column(ColumnSpec::new("id", <i64 as Type>::type_info(), false).primary_key()),
            "T",
        )
        .unwrap();

        assert!(!pk_unset(&manual_int, &[SqliteArgumentValue::Int64(0)]));
    }
}
