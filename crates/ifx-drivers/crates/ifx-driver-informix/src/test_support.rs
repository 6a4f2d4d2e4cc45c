//! Scripted statement handle used by the unit tests of this crate

use std::collections::VecDeque;
use std::sync::Arc;

use ifx_core::{CliError, CliResult, ColumnDescription, RawCursor, RawRow, Value};
use parking_lot::Mutex;

/// Calls observed by a [`ScriptedCursor`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute { sql: String, params: Vec<Value> },
    ExecuteMany { sql: String, param_sets: Vec<Vec<Value>> },
    NextSet,
    Close,
}

/// One result set: column metadata and the rows still to fetch
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub description: Vec<ColumnDescription>,
    pub rows: VecDeque<RawRow>,
}

impl ResultSet {
    pub fn new(description: Vec<ColumnDescription>, rows: Vec<RawRow>) -> Self {
        Self {
            description,
            rows: rows.into(),
        }
    }
}

/// Serves one scripted result set per `execute`, in order
#[derive(Default)]
pub struct ScriptedCursor {
    pub results: VecDeque<ResultSet>,
    /// Result sets reported by `next_set` after the current one
    pub trailing_sets: usize,
    pub row_count: i64,
    pub fail_with: Option<CliError>,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub current: ResultSet,
}

impl ScriptedCursor {
    pub fn new(results: impl IntoIterator<Item = ResultSet>) -> Self {
        Self {
            results: results.into_iter().collect(),
            ..Default::default()
        }
    }

    fn advance(&mut self) -> CliResult<()> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.current = self.results.pop_front().unwrap_or_default();
        Ok(())
    }
}

impl RawCursor for ScriptedCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CliResult<()> {
        self.calls.lock().push(Call::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.advance()
    }

    fn execute_many(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> CliResult<()> {
        self.calls.lock().push(Call::ExecuteMany {
            sql: sql.to_string(),
            param_sets: param_sets.to_vec(),
        });
        self.advance()
    }

    fn description(&self) -> &[ColumnDescription] {
        &self.current.description
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }

    fn fetch_one(&mut self) -> CliResult<Option<RawRow>> {
        Ok(self.current.rows.pop_front())
    }

    fn fetch_many(&mut self, size: usize) -> CliResult<Vec<RawRow>> {
        let size = size.min(self.current.rows.len());
        Ok(self.current.rows.drain(..size).collect())
    }

    fn fetch_all(&mut self) -> CliResult<Vec<RawRow>> {
        Ok(self.current.rows.drain(..).collect())
    }

    fn next_set(&mut self) -> CliResult<bool> {
        self.calls.lock().push(Call::NextSet);
        if self.trailing_sets == 0 {
            return Ok(false);
        }
        self.trailing_sets -= 1;
        self.current = ResultSet::default();
        Ok(true)
    }

    fn close(&mut self) -> CliResult<()> {
        self.calls.lock().push(Call::Close);
        Ok(())
    }
}
