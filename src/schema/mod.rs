use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::error::{Error, Result};
use crate::model::Model;
use crate::type_info::SqliteTypeInfo;

mod sanitize;
mod sync;

pub(crate) use sanitize::{quote_identifier, sanitize_identifier};

/// Declarative description of one persisted column, produced by a
/// [`Model`] implementation (usually through the [`model!`](crate::model!)
/// macro) before sanitization.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    field: &'static str,
    name_override: Option<&'static str>,
    type_info: SqliteTypeInfo,
    nullable: bool,
    pk: bool,
    autoincrement: bool,
    ignored: bool,
    default: Option<&'static str>,
    collation: Option<&'static str>,
}

impl ColumnSpec {
    pub fn new(field: &'static str, type_info: SqliteTypeInfo, nullable: bool) -> Self {
        Self {
            field,
            name_override: None,
            type_info,
            nullable,
            pk: false,
            autoincrement: false,
            ignored: false,
            default: None,
            collation: None,
        }
    }

    /// Mark the column as (part of) the primary key.
    pub fn primary_key(mut self) -> Self {
        self.pk = true;
        self
    }

    /// Let SQLite assign the value on insert. Only valid on an INTEGER
    /// primary key, and on at most one column per table.
    pub fn auto_increment(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Keep the field on the struct but leave it out of the table.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Store under this column name instead of the field name.
    pub fn renamed(mut self, name: &'static str) -> Self {
        self.name_override = Some(name);
        self
    }

    /// Emit a `COLLATE` clause for the column.
    pub fn collation(mut self, collation: &'static str) -> Self {
        self.collation = Some(collation);
        self
    }

    /// Emit a `DEFAULT` clause with this literal.
    pub fn default_value(mut self, literal: &'static str) -> Self {
        self.default = Some(literal);
        self
    }
}

/// Declarative description of a table, produced by a [`Model`]
/// implementation before sanitization.
#[derive(Debug, Clone)]
pub struct TableSpec {
    name: &'static str,
    schema: Option<&'static str>,
    columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn new(name: &'static str) -> Self {
        Self { name, schema: None, columns: Vec::new() }
    }

    /// Qualify the table with a schema owner (e.g. an attached database).
    pub fn schema(mut self, schema: &'static str) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }
}

/// One column of a reconciled table descriptor: sanitized name, affinity,
/// flags and the host-side accessor key.
#[derive(Debug)]
pub struct ColumnDescriptor {
    /// Field name on the host struct; the key passed to the model's
    /// accessors.
    pub field: &'static str,

    /// Sanitized column name, unquoted.
    pub name: String,

    pub type_info: SqliteTypeInfo,
    pub nullable: bool,

    /// Position within the primary key, in declaration order.
    pub pk_ordinal: Option<usize>,

    pub autoincrement: bool,
    pub default: Option<String>,
    pub collation: Option<String>,
}

impl ColumnDescriptor {
    pub fn quoted_name(&self) -> String {
        quote_identifier(&self.name)
    }

    pub fn is_pk(&self) -> bool {
        self.pk_ordinal.is_some()
    }
}

/// The reflected, sanitized image of a record type that drives SQL
/// generation. Built once per type and shared for the life of the process.
#[derive(Debug)]
pub struct TableDescriptor {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,

    /// Indices into `columns` of the primary key, in declaration order.
    pub pk: Vec<usize>,

    /// Index into `columns` of the auto-increment column, if any.
    pub autoincrement: Option<usize>,

    name_index: HashMap<String, usize>,
}

impl TableDescriptor {
    /// `"schema"."table"`, or `"table"` without an owner.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(&self.name)),
            None => quote_identifier(&self.name),
        }
    }

    /// Look up a column by its (sanitized) name, case-insensitively.
    pub fn column_by_name(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.name_index.get(&name.to_lowercase()).map(|&i| &self.columns[i])
    }

    pub fn pk_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.pk.iter().map(|&i| &self.columns[i])
    }

    pub(crate) fn from_spec(spec: TableSpec, type_name: &str) -> Result<Self> {
        let table_name = sanitize_identifier(spec.name);

        let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(spec.columns.len());
        let mut pk = Vec::new();
        let mut autoincrement = None;

        for col in spec.columns {
            if col.ignored {
                continue;
            }

            let mut name = sanitize_identifier(col.name_override.unwrap_or(col.field));

            // a column named after its record type collides with common
            // host-language accessor conventions; steer clear of it
            if name.eq_ignore_ascii_case(type_name) {
                name.push_str("Property");
            }

            let mut unique = name.clone();
            let mut suffix = 1_u32;
            while columns.iter().any(|c: &ColumnDescriptor| c.name.eq_ignore_ascii_case(&unique)) {
                unique = format!("{name}{suffix}");
                suffix += 1;
            }

            let index = columns.len();

            if col.pk {
                pk.push(index);
            }

            if col.autoincrement {
                if autoincrement.is_some() {
                    return Err(Error::SchemaIncompatible(format!(
                        "table {table_name:?} declares more than one auto-increment column",
                    )));
                }

                autoincrement = Some(index);
            }

            columns.push(ColumnDescriptor {
                field: col.field,
                name: unique,
                type_info: col.type_info,
                nullable: col.nullable,
                pk_ordinal: col.pk.then(|| pk.len() - 1),
                autoincrement: col.autoincrement,
                default: col.default.map(str::to_owned),
                collation: col.collation.map(str::to_owned),
            });
        }

        if let Some(index) = autoincrement {
            let col = &columns[index];

            // AUTOINCREMENT is only meaningful on the rowid alias
            if !col.is_pk()
                || pk.len() != 1
                || col.type_info != <i64 as crate::encode::Type>::type_info()
            {
                return Err(Error::SchemaIncompatible(format!(
                    "auto-increment column {:?} in table {table_name:?} must be the sole INTEGER primary key",
                    col.name,
                )));
            }
        }

        let name_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), i))
            .collect();

        Ok(Self {
            schema: spec.schema.map(sanitize_identifier),
            name: table_name,
            columns,
            pk,
            autoincrement,
            name_index,
        })
    }
}

// Process-wide registry of table descriptors: written once per record type,
// read many times, shared for the life of the process.
static REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static TableDescriptor>>> = OnceLock::new();

/// The reconciled table descriptor for a record type, reflecting it on
/// first use.
pub fn descriptor<T: Model>() -> Result<&'static TableDescriptor> {
    let registry = REGISTRY.get_or_init(Default::default);

    if let Some(&descriptor) = registry.read().unwrap().get(&TypeId::of::<T>()) {
        return Ok(descriptor);
    }

    // built outside the write lock; a racing registration wins and the
    // spare copy is discarded
    let built = TableDescriptor::from_spec(T::table_spec(), short_type_name::<T>())?;

    let mut registry = registry.write().unwrap();

    Ok(*registry
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::leak(Box::new(built))))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::Type;

    #[test]
    fn descriptor_sanitizes_and_orders_columns() {
        let spec = TableSpec::new("people 2")
            .column(ColumnSpec::new("id", <i64 as Type>::type_info(), false).primary_key().auto_increment())
            .column(ColumnSpec::new("first name", <String as Type>::type_info(), false))
            .column(ColumnSpec::new("note", <String as Type>::type_info(), true).ignored())
            .column(ColumnSpec::new("age", <i64 as Type>::type_info(), true));

        let desc = TableDescriptor::from_spec(spec, "Person").unwrap();

        assert_eq!(desc.name, "people2");
        assert_eq!(
            desc.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            ["id", "firstName", "age"],
        );
        assert_eq!(desc.pk, vec![0]);
        assert_eq!(desc.autoincrement, Some(0));
        assert!(desc.columns[2].nullable);
    }

    #[test]
    fn column_matching_type_name_is_suffixed() {
        let spec = TableSpec::new("Person")
            .column(ColumnSpec::new("key", <String as Type>::type_info(), false).primary_key())
            .column(ColumnSpec::new("person", <String as Type>::type_info(), false))
            .column(ColumnSpec::new("personProperty", <String as Type>::type_info(), false));

        let desc = TableDescriptor::from_spec(spec, "Person").unwrap();

        assert_eq!(desc.columns[1].name, "personProperty");
        assert_eq!(desc.columns[2].name, "personProperty1");
    }

    #[test]
    fn composite_autoincrement_is_rejected() {
        let spec = TableSpec::new("t")
            .column(ColumnSpec::new("a", <i64 as Type>::type_info(), false).primary_key().auto_increment())
            .column(ColumnSpec::new("b", <i64 as Type>::type_info(), false).primary_key());

        assert!(matches!(
            TableDescriptor::from_spec(spec, "T"),
            Err(Error::SchemaIncompatible(_)),
        ));
    }

    #[test]
    fn textual_autoincrement_is_rejected() {
        let spec = TableSpec::new("t")
            .column(ColumnSpec::new("a", <String as Type>::type_info(), false).primary_key().auto_increment());

        assert!(matches!(
            TableDescriptor::from_spec(spec, "T"),
            Err(Error::SchemaIncompatible(_)),
        ));
    }
}
