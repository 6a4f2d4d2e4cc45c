//! Schema alteration
//!
//! Statement templates for the DDL the host emits, and a [`SchemaEditor`]
//! that runs them on a connection.

use ifx_core::{IfxError, Result, Value};

use crate::connection::InformixConnection;
use crate::fields::FieldType;

const REDUNDANT_INDEX_STATEMENT: &str = "CREATE INDEX";
const REDUNDANT_INDEX_ERROR: &str = "Index already exists";

pub fn create_unique_sql(table: &str, columns: &[&str], name: &str) -> String {
    format!(
        "ALTER TABLE {table} ADD CONSTRAINT UNIQUE ({}) CONSTRAINT {name} ",
        columns.join(", ")
    )
}

pub fn create_fk_sql(
    table: &str,
    column: &str,
    to_table: &str,
    to_column: &str,
    name: &str,
) -> String {
    format!(
        "ALTER TABLE {table} ADD CONSTRAINT FOREIGN KEY ({column}) \
         REFERENCES {to_table} ({to_column}) ON DELETE CASCADE CONSTRAINT  {name}"
    )
}

pub fn create_column_sql(table: &str, column: &str, definition: &str) -> String {
    format!("ALTER TABLE {table} ADD {column} {definition}")
}

pub fn alter_column_null_sql(column: &str, column_type: &str) -> String {
    format!("MODIFY {column} {column_type} NULL")
}

pub fn alter_column_not_null_sql(column: &str, column_type: &str) -> String {
    format!("MODIFY {column} {column_type} NOT NULL")
}

pub fn alter_column_type_sql(column: &str, column_type: &str) -> String {
    format!("MODIFY {column} {column_type}")
}

/// The default value itself is appended by the caller
pub fn alter_column_default_sql(column: &str) -> String {
    format!("MODIFY {column} DEFAULT ")
}

pub fn alter_column_no_default_sql(column: &str) -> String {
    format!("MODIFY {column} DROP DEFAULT")
}

pub fn delete_column_sql(table: &str, column: &str) -> String {
    format!("ALTER TABLE {table} DROP {column}")
}

/// Wrap one or more column changes in `ALTER TABLE`
pub fn alter_table_sql(table: &str, changes: &str) -> String {
    format!("ALTER TABLE {table} {changes}")
}

/// Column definition: type, nullability and check constraint.
///
/// Defaults are never emitted, see [`skip_default`].
pub fn column_definition(field: FieldType, column: &str, nullable: bool) -> String {
    let mut definition = field.column_type();
    if !nullable {
        definition.push_str(" NOT NULL");
    }
    if let Some(check) = field.check_constraint(column) {
        definition.push_str(&format!(" CHECK ({check})"));
    }
    definition
}

/// Informix needs typed default literals (`DATETIME(...) year to fraction(5)`),
/// so column defaults are left to the application.
pub fn skip_default(_field: FieldType) -> bool {
    true
}

/// Whether a failure is Informix rejecting an index it already created for a
/// foreign key.
///
/// Both the statement and the error text must match. A duplicate-index error
/// from any other statement, or any other error from `CREATE INDEX`, is a
/// real failure.
pub fn is_redundant_index_error(sql: &str, error: &str) -> bool {
    sql.contains(REDUNDANT_INDEX_STATEMENT) && error.contains(REDUNDANT_INDEX_ERROR)
}

/// Suffix for `CREATE DATABASE`.
///
/// Informix cannot set a collation at creation time.
pub fn table_creation_suffix(charset: Option<&str>, collation: Option<&str>) -> Result<String> {
    if let Some(collation) = collation {
        return Err(IfxError::Configuration(format!(
            "Informix does not support collation setting at database creation time (got {collation})"
        )));
    }
    Ok(match charset {
        Some(charset) => format!("WITH ENCODING '{charset}'"),
        None => "WITH BUFFERED LOG".to_string(),
    })
}

/// Runs DDL on a connection
pub struct SchemaEditor<'conn> {
    connection: &'conn mut InformixConnection,
}

impl<'conn> SchemaEditor<'conn> {
    pub fn new(connection: &'conn mut InformixConnection) -> Self {
        Self { connection }
    }

    /// Execute one DDL statement.
    ///
    /// A `CREATE INDEX` rejected with "Index already exists" is logged and
    /// treated as success; every other error is returned.
    #[tracing::instrument(skip(self, params))]
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let result = {
            let mut cursor = self.connection.cursor()?;
            cursor.execute(sql, params).map(|_| ())
        };
        match result {
            Err(e) if is_redundant_index_error(sql, &e.to_string()) => {
                tracing::debug!(error = %e, "ignoring redundant foreign key index");
                Ok(())
            }
            other => other,
        }
    }

    pub fn add_column(
        &mut self,
        table: &str,
        column: &str,
        field: FieldType,
        nullable: bool,
    ) -> Result<()> {
        let definition = column_definition(field, column, nullable);
        self.execute(&create_column_sql(table, column, &definition), &[])
    }

    pub fn remove_column(&mut self, table: &str, column: &str) -> Result<()> {
        self.execute(&delete_column_sql(table, column), &[])
    }

    pub fn alter_column_type(&mut self, table: &str, column: &str, field: FieldType) -> Result<()> {
        let change = alter_column_type_sql(column, &field.column_type());
        self.execute(&alter_table_sql(table, &change), &[])
    }

    pub fn alter_column_null(
        &mut self,
        table: &str,
        column: &str,
        field: FieldType,
        nullable: bool,
    ) -> Result<()> {
        let column_type = field.column_type();
        let change = if nullable {
            alter_column_null_sql(column, &column_type)
        } else {
            alter_column_not_null_sql(column, &column_type)
        };
        self.execute(&alter_table_sql(table, &change), &[])
    }

    pub fn add_unique(&mut self, table: &str, columns: &[&str], name: &str) -> Result<()> {
        self.execute(&create_unique_sql(table, columns, name), &[])
    }

    pub fn add_foreign_key(
        &mut self,
        table: &str,
        column: &str,
        to_table: &str,
        to_column: &str,
        name: &str,
    ) -> Result<()> {
        self.execute(&create_fk_sql(table, column, to_table, to_column, name), &[])
    }
}
