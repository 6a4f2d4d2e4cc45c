//! Statement executor
//!
//! [`Cursor`] wraps a raw statement handle. Outgoing SQL has its
//! placeholders rewritten and its parameters normalised; incoming rows are
//! decoded by the connection's [`ValueCodec`] and shaped into [`Row`]s.

use std::sync::Arc;

use ifx_core::{ColumnDescription, IfxError, RawCursor, RawRow, Result, Row, Value};

use crate::codec::ValueCodec;
use crate::dialect::InformixDialect;

const SQL_PREVIEW_LEN: usize = 120;

pub struct Cursor<'conn> {
    inner: Box<dyn RawCursor + 'conn>,
    codec: &'conn ValueCodec,
    dialect: &'conn InformixDialect,
    active: bool,
    last_sql: Option<String>,
    last_params: Vec<Value>,
}

impl<'conn> Cursor<'conn> {
    pub fn new(
        inner: Box<dyn RawCursor + 'conn>,
        codec: &'conn ValueCodec,
        dialect: &'conn InformixDialect,
    ) -> Self {
        Self {
            inner,
            codec,
            dialect,
            active: true,
            last_sql: None,
            last_params: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// SQL of the last statement, before placeholder rewriting
    pub fn last_sql(&self) -> Option<&str> {
        self.last_sql.as_deref()
    }

    /// Parameters of the last statement, as sent to the driver
    pub fn last_params(&self) -> &[Value] {
        &self.last_params
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(IfxError::CursorInactive)
        }
    }

    /// Execute one statement and return the affected row count.
    ///
    /// Placeholders are only rewritten when parameters are given, so a
    /// parameterless statement may contain a literal `%s`.
    #[tracing::instrument(skip(self, sql, params), fields(params = params.len()))]
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<i64> {
        self.ensure_active()?;
        self.last_sql = Some(sql.to_string());

        let (sql, params) = if params.is_empty() {
            (sql.to_string(), Vec::new())
        } else {
            (
                self.dialect.translate_statement(sql),
                self.codec.encode_params(params)?,
            )
        };

        tracing::debug!(sql_preview = %preview(&sql), "executing statement");
        let result = self.inner.execute(&sql, &params);
        self.last_params = params;
        if let Err(e) = &result {
            tracing::debug!(error = %e, "statement failed");
        }
        result?;
        Ok(self.inner.row_count())
    }

    /// Execute one statement per parameter set.
    ///
    /// An empty batch is not sent and yields `None`.
    #[tracing::instrument(skip(self, sql, param_sets), fields(sets = param_sets.len()))]
    pub fn execute_many(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> Result<Option<i64>> {
        self.ensure_active()?;
        self.last_sql = Some(sql.to_string());
        if param_sets.is_empty() {
            return Ok(None);
        }

        let sql = self.dialect.translate_statement(sql);
        let param_sets = param_sets
            .iter()
            .map(|set| self.codec.encode_params(set))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(sql_preview = %preview(&sql), "executing batch");
        self.inner.execute_many(&sql, &param_sets)?;
        self.last_params = param_sets.into_iter().last().unwrap_or_default();
        Ok(Some(self.inner.row_count()))
    }

    /// Fetch the next row, then discard any remaining result sets
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        self.ensure_active()?;
        let row = self.inner.fetch_one()?;
        let row = row.map(|raw| self.shape(raw)).transpose()?;
        while self.inner.next_set()? {}
        Ok(row)
    }

    pub fn fetch_many(&mut self, size: usize) -> Result<Vec<Row>> {
        self.ensure_active()?;
        let rows = self.inner.fetch_many(size)?;
        self.shape_all(rows)
    }

    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.ensure_active()?;
        let rows = self.inner.fetch_all()?;
        self.shape_all(rows)
    }

    pub fn description(&self) -> Result<&[ColumnDescription]> {
        self.ensure_active()?;
        Ok(self.inner.description())
    }

    pub fn row_count(&self) -> Result<i64> {
        self.ensure_active()?;
        Ok(self.inner.row_count())
    }

    /// Release the statement handle. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.inner.close()?;
        Ok(())
    }

    fn column_names(&self) -> Arc<[String]> {
        self.inner
            .description()
            .iter()
            .map(|column| column.name.clone())
            .collect()
    }

    fn shape(&self, raw: RawRow) -> Result<Row> {
        let values = self.codec.decode_row(self.inner.description(), raw)?;
        Ok(Row::new(self.column_names(), values))
    }

    fn shape_all(&self, rows: Vec<RawRow>) -> Result<Vec<Row>> {
        let columns = self.column_names();
        let description = self.inner.description();
        rows.into_iter()
            .map(|raw| {
                self.codec
                    .decode_row(description, raw)
                    .map(|values| Row::new(columns.clone(), values))
            })
            .collect()
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(error = %e, "failed to close cursor");
        }
    }
}

fn preview(sql: &str) -> &str {
    match sql.char_indices().nth(SQL_PREVIEW_LEN) {
        Some((end, _)) => &sql[..end],
        None => sql,
    }
}
