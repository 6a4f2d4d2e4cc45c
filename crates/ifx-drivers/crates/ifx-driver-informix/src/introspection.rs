//! Catalog introspection
//!
//! Reads table, column, index and foreign key metadata from the Informix
//! system catalog (`systables`, `syscolumns`, `sysindices`, `sysreferences`).

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use ifx_core::{IfxError, Result, Row, Value};

use crate::cursor::Cursor;
use crate::fields::FieldType;
use crate::types::InformixType;

pub const TABLE_LIST_QUERY: &str = "SELECT tabname, tabtype FROM systables";

pub const TABLE_DESCRIPTION_QUERY: &str = "SELECT c.colname, c.coltype, c.collength \
     FROM syscolumns c JOIN systables t ON c.tabid = t.tabid \
     WHERE t.tabname = %s ORDER BY c.colno";

pub const COLUMN_NUMBERS_QUERY: &str = "SELECT sc.colno, sc.colname FROM syscolumns sc \
     JOIN systables st ON sc.tabid = st.tabid WHERE st.tabname = %s";

pub const INDEX_QUERY: &str = "SELECT idx.idxname, idx.idxtype, idx.indexkeys \
     FROM sysindices idx JOIN systables st ON idx.tabid = st.tabid \
     WHERE st.tabname = %s";

/// Foreign keys declared on a table, one row per referencing column
pub const KEY_COLUMNS_QUERY: &str = "SELECT col1.colname, t2.tabname, col2.colname \
     FROM systables t1 \
     JOIN syscolumns col1 ON t1.tabid = col1.tabid \
     JOIN sysindexes idx1 ON idx1.tabid = t1.tabid AND col1.colno = idx1.part1 \
     JOIN sysconstraints const1 ON idx1.idxname = const1.idxname AND const1.tabid = t1.tabid \
     JOIN sysreferences ref ON ref.constrid = const1.constrid \
     JOIN sysconstraints const2 ON ref.primary = const2.constrid \
     JOIN sysindexes idx2 ON idx2.idxname = const2.idxname \
     JOIN syscolumns col2 ON col2.colno = idx2.part1 AND col2.tabid = idx2.tabid \
     JOIN systables t2 ON t2.tabid = idx2.tabid \
     WHERE const1.constrtype = 'R' AND t1.tabname = %s";

/// `coltype` bit set on NOT NULL columns
const NOT_NULL_FLAG: i32 = 0x100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
    Other(String),
}

impl TableKind {
    fn from_tabtype(tabtype: &str) -> Self {
        match tabtype.trim().to_ascii_lowercase().as_str() {
            "t" => TableKind::Table,
            "v" => TableKind::View,
            other => TableKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub kind: TableKind,
}

/// One `syscolumns` row, decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// `coltype` with the NOT NULL bit removed
    pub type_code: i32,
    pub internal_size: i32,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
}

impl ColumnInfo {
    pub fn informix_type(&self) -> Option<InformixType> {
        InformixType::from_code(self.type_code)
    }

    pub fn field_type(&self) -> Option<FieldType> {
        let length = u32::try_from(self.internal_size).unwrap_or(0);
        self.informix_type().and_then(|t| {
            t.field_type(length, self.precision.unwrap_or(0), self.scale.unwrap_or(0))
        })
    }
}

/// A foreign key column and the column it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Target of a relation, by 0-based column position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub referenced_index: usize,
    pub referenced_table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub columns: Vec<String>,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
}

/// Decode `coltype` and `collength` of a column.
///
/// Decimal and money columns pack precision into the high byte of
/// `collength` and scale into the low byte.
pub fn decode_column(name: &str, coltype: i32, collength: i32) -> ColumnInfo {
    let type_code = coltype % 256;
    let (precision, scale) = match InformixType::from_code(type_code) {
        Some(InformixType::Decimal | InformixType::Money) => (
            u32::try_from(collength / 256).ok(),
            u32::try_from(collength % 256).ok(),
        ),
        _ => (None, None),
    };
    ColumnInfo {
        name: name.to_string(),
        type_code,
        internal_size: collength,
        precision,
        scale,
        nullable: coltype < NOT_NULL_FLAG,
    }
}

/// Column numbers (1-based) from a `sysindices.indexkeys` value such as
/// `"1 [1], 4 [1]"`.
///
/// Descending key parts carry a negative column number (`"-4 [1]"`).
pub fn parse_index_keys(keys: &str) -> Result<Vec<usize>> {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| {
            key.split_whitespace()
                .next()
                .and_then(|colno| colno.parse::<i32>().ok())
                .filter(|colno| *colno != 0)
                .map(|colno| colno.unsigned_abs() as usize)
                .ok_or_else(|| IfxError::Conversion(format!("malformed index key {key:?}")))
        })
        .collect()
}

/// Catalog entries that are not user tables: the `sys*` tables and the
/// blank-prefixed locale entries (`" GL_COLLATE"`, `" VERSION"` ...).
pub fn is_internal_table(name: &str) -> bool {
    name.starts_with("sys") || name.starts_with(' ')
}

pub fn get_table_list(cursor: &mut Cursor<'_>) -> Result<Vec<TableInfo>> {
    cursor.execute(TABLE_LIST_QUERY, &[])?;
    let mut tables = Vec::new();
    for row in cursor.fetch_all()? {
        let name = text(&row, 0)?.trim_end().to_string();
        if is_internal_table(&name) {
            continue;
        }
        tables.push(TableInfo {
            kind: TableKind::from_tabtype(&text(&row, 1)?),
            name,
        });
    }
    Ok(tables)
}

pub fn get_table_description(cursor: &mut Cursor<'_>, table: &str) -> Result<Vec<ColumnInfo>> {
    cursor.execute(TABLE_DESCRIPTION_QUERY, &[Value::from(table)])?;
    cursor
        .fetch_all()?
        .iter()
        .map(|row| {
            Ok(decode_column(
                text(row, 0)?.trim_end(),
                int(row, 1)?,
                int(row, 2)?,
            ))
        })
        .collect()
}

/// Indexes of `table` keyed by index name
pub fn get_constraints(
    cursor: &mut Cursor<'_>,
    table: &str,
) -> Result<BTreeMap<String, ConstraintInfo>> {
    let column_names: HashMap<usize, String> =
        column_numbers(cursor, table)?.into_iter().collect();

    cursor.execute(INDEX_QUERY, &[Value::from(table)])?;
    let mut constraints = BTreeMap::new();
    for row in cursor.fetch_all()? {
        let name = text(&row, 0)?.trim_end().to_string();
        let idx_type = text(&row, 1)?;
        let columns = parse_index_keys(&text(&row, 2)?)?
            .into_iter()
            .map(|colno| {
                column_names.get(&colno).cloned().ok_or_else(|| {
                    IfxError::Conversion(format!("index {name} references unknown column {colno}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let unique = idx_type.trim() == "U";
        constraints.insert(
            name,
            ConstraintInfo {
                primary_key: unique && columns.len() == 1,
                unique,
                index: idx_type.trim() == "D",
                columns,
            },
        );
    }
    Ok(constraints)
}

pub fn get_key_columns(cursor: &mut Cursor<'_>, table: &str) -> Result<Vec<KeyColumn>> {
    cursor.execute(KEY_COLUMNS_QUERY, &[Value::from(table)])?;
    cursor
        .fetch_all()?
        .iter()
        .map(|row| {
            Ok(KeyColumn {
                column: text(row, 0)?.trim_end().to_string(),
                referenced_table: text(row, 1)?.trim_end().to_string(),
                referenced_column: text(row, 2)?.trim_end().to_string(),
            })
        })
        .collect()
}

/// Foreign keys of `table` keyed by the 0-based position of the referencing
/// column
pub fn get_relations(cursor: &mut Cursor<'_>, table: &str) -> Result<BTreeMap<usize, Relation>> {
    let key_columns = get_key_columns(cursor, table)?;
    if key_columns.is_empty() {
        return Ok(BTreeMap::new());
    }

    let positions = column_positions(cursor, table)?;
    let mut referenced_positions: HashMap<String, HashMap<String, usize>> = HashMap::new();
    let mut relations = BTreeMap::new();
    for key in key_columns {
        let index = lookup_position(&positions, table, &key.column)?;
        let found = match referenced_positions.entry(key.referenced_table.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(column_positions(cursor, &key.referenced_table)?)
            }
        };
        let referenced_index =
            lookup_position(found, &key.referenced_table, &key.referenced_column)?;
        relations.insert(
            index,
            Relation {
                referenced_index,
                referenced_table: key.referenced_table,
            },
        );
    }
    Ok(relations)
}

/// `(colno, colname)` pairs of `table`, colno 1-based
fn column_numbers(cursor: &mut Cursor<'_>, table: &str) -> Result<Vec<(usize, String)>> {
    cursor.execute(COLUMN_NUMBERS_QUERY, &[Value::from(table)])?;
    cursor
        .fetch_all()?
        .iter()
        .map(|row| {
            let colno = usize::try_from(int(row, 0)?)
                .map_err(|_| IfxError::Conversion(format!("negative column number in {table}")))?;
            Ok((colno, text(row, 1)?.trim_end().to_string()))
        })
        .collect()
}

/// Column name to 0-based position
fn column_positions(cursor: &mut Cursor<'_>, table: &str) -> Result<HashMap<String, usize>> {
    Ok(column_numbers(cursor, table)?
        .into_iter()
        .map(|(colno, name)| (name, colno.saturating_sub(1)))
        .collect())
}

fn lookup_position(positions: &HashMap<String, usize>, table: &str, column: &str) -> Result<usize> {
    positions
        .get(column)
        .copied()
        .ok_or_else(|| IfxError::Conversion(format!("unknown column {table}.{column}")))
}

fn text(row: &Row, index: usize) -> Result<String> {
    match row.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(IfxError::Conversion(format!(
            "expected text in catalog column {index}, got {other:?}"
        ))),
    }
}

fn int(row: &Row, index: usize) -> Result<i32> {
    row.get(index)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| IfxError::Conversion(format!("expected integer in catalog column {index}")))
}
