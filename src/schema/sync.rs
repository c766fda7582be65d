use std::any::TypeId;
use std::collections::HashMap;

use crate::connection::SqliteConnection;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::schema::{descriptor, quote_identifier, ColumnDescriptor, TableDescriptor};
use crate::type_info::DataType;

impl SqliteConnection {
    /// Reconcile the live schema with the table descriptor of `T`.
    ///
    /// A missing table is created with the descriptor's columns, key and
    /// defaults. An existing table gains any descriptor columns it lacks
    /// through `ALTER TABLE … ADD COLUMN`; columns are never dropped or
    /// retyped. Synchronization is idempotent — a second run on a
    /// reconciled schema issues no DDL (observable through
    /// [`ddl_statement_count`](Self::ddl_statement_count)).
    ///
    /// DDL in SQLite autocommits per statement, so an error mid-way leaves
    /// the columns added so far in place.
    pub fn synchronize_schema<T: Model>(&mut self) -> Result<()> {
        let desc = descriptor::<T>()?;

        let live = self.live_columns(desc)?;

        if live.is_empty() {
            let sql = create_table_sql(desc);
            self.execute_batch(&sql)?;
            self.ddl_statements += 1;
        } else {
            for column in &desc.columns {
                match live.get(&column.name.to_lowercase()) {
                    None => {
                        let sql = add_column_sql(desc, column);
                        self.execute_batch(&sql)?;
                        self.ddl_statements += 1;
                    }

                    Some(declared) => {
                        let live_affinity: DataType =
                            declared.parse().unwrap_or(DataType::Blob);

                        if live_affinity != column.type_info.data_type() {
                            log::warn!(
                                target: "sqlite_mapper::schema",
                                "column {:?} of table {} is {} in the database but {} in the descriptor; refusing to retype",
                                column.name,
                                desc.qualified_name(),
                                declared,
                                column.type_info,
                            );

                            return Err(Error::SchemaIncompatible(format!(
                                "column {:?} of table {:?} would change type from {} to {}",
                                column.name, desc.name, declared, column.type_info,
                            )));
                        }
                    }
                }
            }
        }

        self.synchronized.insert(TypeId::of::<T>());

        Ok(())
    }

    /// Synchronize once per record type per connection; later calls are
    /// free.
    pub(crate) fn ensure_synchronized<T: Model>(&mut self) -> Result<()> {
        if self.synchronized.contains(&TypeId::of::<T>()) {
            return Ok(());
        }

        self.synchronize_schema::<T>()
    }

    /// Live column set of the descriptor's table: lowercase name → declared
    /// type. Empty when the table does not exist.
    fn live_columns(&mut self, desc: &TableDescriptor) -> Result<HashMap<String, String>> {
        // the schema owner qualifies the pragma, not its argument
        let sql = match &desc.schema {
            Some(schema) => format!(
                "PRAGMA {}.table_info({})",
                quote_identifier(schema),
                quote_identifier(&desc.name),
            ),
            None => format!("PRAGMA table_info({})", quote_identifier(&desc.name)),
        };

        let mut live = HashMap::new();

        for row in self.query(&sql, ())? {
            let row = row?;

            let name: String = row.get("name")?;
            let declared: String = row.get("type")?;

            live.insert(name.to_lowercase(), declared);
        }

        Ok(live)
    }
}

fn column_def(column: &ColumnDescriptor, inline_pk: bool) -> String {
    let mut def = format!("{} {}", column.quoted_name(), column.type_info.name());

    if inline_pk {
        def.push_str(" PRIMARY KEY");

        if column.autoincrement {
            def.push_str(" AUTOINCREMENT");
        }
    }

    if !column.nullable {
        def.push_str(" NOT NULL");
    }

    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(default);
    }

    if let Some(collation) = &column.collation {
        def.push_str(" COLLATE ");
        def.push_str(collation);
    }

    def
}

fn create_table_sql(desc: &TableDescriptor) -> String {
    let single_pk = desc.pk.len() == 1;

    let mut defs: Vec<String> = desc
        .columns
        .iter()
        .map(|c| column_def(c, single_pk && c.is_pk()))
        .collect();

    if desc.pk.len() > 1 {
        let keys: Vec<String> = desc.pk_columns().map(|c| c.quoted_name()).collect();
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!("CREATE TABLE {} ({})", desc.qualified_name(), defs.join(", "))
}

fn add_column_sql(desc: &TableDescriptor, column: &ColumnDescriptor) -> String {
    // an added NOT NULL column needs a default to be satisfiable on rows
    // that already exist; without one the column is added nullable and
    // existing rows read NULL
    let force_nullable = !column.nullable && column.default.is_none();

    let mut def = column_def(column, false);
    if force_nullable {
        def = def.replace(" NOT NULL", "");
    }

    format!("ALTER TABLE {} ADD COLUMN {}", desc.qualified_name(), def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::Type;
    use crate::schema::{ColumnSpec, TableSpec};

    fn desc(spec: TableSpec) -> TableDescriptor {
        TableDescriptor::from_spec(spec, "Fixture").unwrap()
    }

    #[test]
    fn create_table_with_inline_pk() {
        let desc = desc(
            TableSpec::new("person")
                .column(ColumnSpec::new("id", <i64 as Type>::type_info(), false).primary_key().auto_increment())
                .column(ColumnSpec::new("name", <String as Type>::type_info(), false))
                .column(ColumnSpec::new("age", <i64 as Type>::type_info(), true)),
        );

        assert_eq!(
            create_table_sql(&desc),
            "CREATE TABLE \"person\" (\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             \"name\" TEXT NOT NULL, \
             \"age\" INTEGER)",
        );
    }

    #[test]
    fn create_table_with_composite_pk() {
        let desc = desc(
            TableSpec::new("grant")
                .column(ColumnSpec::new("user", <String as Type>::type_info(), false).primary_key())
                .column(ColumnSpec::new("role", <String as Type>::type_info(), false).primary_key())
                .column(ColumnSpec::new("note", <String as Type>::type_info(), true)),
        );

        assert_eq!(
            create_table_sql(&desc),
            "CREATE TABLE \"grant\" (\
             \"user\" TEXT NOT NULL, \
             \"role\" TEXT NOT NULL, \
             \"note\" TEXT, \
             PRIMARY KEY (\"user\", \"role\"))",
        );
    }

    #[test]
    fn added_not_null_column_without_default_is_relaxed() {
        let desc = desc(
            TableSpec::new("t")
                .column(ColumnSpec::new("id", <i64 as Type>::type_info(), false).primary_key())
                .column(ColumnSpec::new("tag", <String as Type>::type_info(), false)),
        );

        assert_eq!(
            add_column_sql(&desc, &desc.columns[1]),
            "ALTER TABLE \"t\" ADD COLUMN \"tag\" TEXT",
        );
    }

    #[test]
    fn added_column_keeps_default_and_collation() {
        let desc = desc(
            TableSpec::new("t")
                .column(ColumnSpec::new("id", <i64 as Type>::type_info(), false).primary_key())
                .column(
                    ColumnSpec::new("tag", <String as Type>::type_info(), false)
                        .default_value("'none'")
                        .collation("NOCASE"),
                ),
        );

        assert_eq!(
            add_column_sql(&desc, &desc.columns[1]),
            "ALTER TABLE \"t\" ADD COLUMN \"tag\" TEXT NOT NULL DEFAULT 'none' COLLATE NOCASE",
        );
    }
}
