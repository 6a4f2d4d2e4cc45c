//! In-memory connector used by the unit tests of this crate

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ifx_core::{
    CliError, CliResult, ColumnDescription, ConnectionAttribute, Connector, RawConnection,
    RawCursor, RawRow, Value,
};
use parking_lot::Mutex;

pub fn connect_failed() -> CliError {
    CliError::new(
        "08001",
        "Attempt to connect to database server (dev) failed. (-908) (SQLDriverConnect)",
    )
}

pub fn read_error() -> CliError {
    CliError::new(
        "08S01",
        "Read error occurred during connection attempt. (-27001) (SQLDriverConnect)",
    )
}

pub fn auth_error() -> CliError {
    CliError::new(
        "28000",
        "Incorrect password or user is not known on the database server. (-951) (SQLDriverConnect)",
    )
}

/// Replays connect outcomes in order; succeeds once the script runs out.
#[derive(Default)]
pub struct ScriptedConnector {
    outcomes: Mutex<VecDeque<Option<CliError>>>,
    attempts: AtomicU32,
}

impl ScriptedConnector {
    pub fn new(failures: impl IntoIterator<Item = CliError>) -> Self {
        Self {
            outcomes: Mutex::new(failures.into_iter().map(Some).collect()),
            attempts: AtomicU32::new(0),
        }
    }

    /// Fail with `error` forever
    pub fn always(error: CliError) -> Self {
        Self::new(std::iter::repeat_n(error, 64))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    fn connect(
        &self,
        _connection_string: &str,
        _autocommit: bool,
        _timeout: Option<Duration>,
    ) -> CliResult<Box<dyn RawConnection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().pop_front().flatten() {
            Some(err) => Err(err),
            None => Ok(Box::new(StubConnection::default())),
        }
    }
}

/// Connection whose statements succeed unless `fail_with` is set
#[derive(Default)]
pub struct StubConnection {
    pub fail_with: Option<CliError>,
    pub executed: Arc<Mutex<Vec<String>>>,
}

impl RawConnection for StubConnection {
    fn cursor(&mut self) -> CliResult<Box<dyn RawCursor + '_>> {
        Ok(Box::new(StubCursor {
            fail_with: self.fail_with.clone(),
            executed: self.executed.clone(),
        }))
    }

    fn autocommit(&self) -> bool {
        false
    }

    fn set_autocommit(&mut self, _autocommit: bool) -> CliResult<()> {
        Ok(())
    }

    fn set_attribute(&mut self, _attribute: ConnectionAttribute) -> CliResult<()> {
        Ok(())
    }

    fn close(&mut self) -> CliResult<()> {
        Ok(())
    }
}

struct StubCursor {
    fail_with: Option<CliError>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl RawCursor for StubCursor {
    fn execute(&mut self, sql: &str, _params: &[Value]) -> CliResult<()> {
        self.executed.lock().push(sql.to_string());
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn execute_many(&mut self, sql: &str, _param_sets: &[Vec<Value>]) -> CliResult<()> {
        self.execute(sql, &[])
    }

    fn description(&self) -> &[ColumnDescription] {
        &[]
    }

    fn row_count(&self) -> i64 {
        -1
    }

    fn fetch_one(&mut self) -> CliResult<Option<RawRow>> {
        Ok(None)
    }

    fn fetch_many(&mut self, _size: usize) -> CliResult<Vec<RawRow>> {
        Ok(Vec::new())
    }

    fn fetch_all(&mut self) -> CliResult<Vec<RawRow>> {
        Ok(Vec::new())
    }

    fn next_set(&mut self) -> CliResult<bool> {
        Ok(false)
    }

    fn close(&mut self) -> CliResult<()> {
        Ok(())
    }
}
