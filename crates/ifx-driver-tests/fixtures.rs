//! Core test fixtures for driving the Informix adapter without a server.
//!
//! [`FakeCli`] stands in for the call-level interface. It records every
//! call it receives as an [`Event`], can be told to fail connects or
//! specific statements, and serves scripted result sets to matching
//! queries. Connections built by [`connection`] run on a [`ManualClock`] so
//! retry sleeps and validation intervals are deterministic.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ifx_driver_tests::fixtures::{FakeCli, connection};
//! use rstest::rstest;
//! use serde_json::json;
//!
//! #[rstest]
//! fn test_commit(cli: FakeCli) -> anyhow::Result<()> {
//!     let (mut conn, _clock) = connection(&cli, json!({}))?;
//!     conn.commit()?;
//!     assert!(cli.executed_sql().is_empty());
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ifx_core::{
    CliError, CliResult, ColumnDescription, ConnectionAttribute, Connector, ManualClock,
    RawConnection, RawCursor, RawRow, Value,
};
use ifx_driver_informix::{ConnectionParams, ConnectionSettings, InformixConnection, Platform};
use parking_lot::Mutex;
use rstest::fixture;
use serde_json::json;

const SQLHOSTS: &str = "informix onsoctcp localhost 9088\n";

/// Something the fake CLI was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A connect attempt, successful or not
    Connect {
        /// Connection string as passed to the primitive
        connection_string: String,
        /// Requested autocommit mode
        autocommit: bool,
        /// Login timeout
        timeout: Option<Duration>,
    },
    /// A connection attribute was set
    Attribute(ConnectionAttribute),
    /// Autocommit was switched
    Autocommit(bool),
    /// A single statement
    Execute {
        /// SQL after translation
        sql: String,
        /// Parameters after normalisation
        params: Vec<Value>,
    },
    /// A batch statement
    ExecuteMany {
        /// SQL after translation
        sql: String,
        /// Parameter sets after normalisation
        param_sets: Vec<Vec<Value>>,
    },
    /// `next_set` was called
    NextSet,
    /// A statement handle was closed
    CursorClosed,
    /// A physical connection was closed
    ConnectionClosed,
}

/// A result set served to queries starting with `prefix`
#[derive(Debug, Clone)]
struct Scripted {
    prefix: String,
    description: Vec<ColumnDescription>,
    rows: Vec<RawRow>,
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    connect_failures: VecDeque<CliError>,
    statement_failures: Vec<(String, CliError)>,
    results: Vec<Scripted>,
    trailing_sets: usize,
}

/// Scripted call-level interface shared by a test and the connections it opens
#[derive(Debug, Clone, Default)]
pub struct FakeCli {
    state: Arc<Mutex<State>>,
}

impl FakeCli {
    /// A CLI on which everything succeeds and queries return no rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next connect attempts with these errors, in order
    pub fn fail_connects(&self, errors: impl IntoIterator<Item = CliError>) -> &Self {
        self.state.lock().connect_failures.extend(errors);
        self
    }

    /// Fail every statement whose SQL starts with `prefix`
    pub fn fail_statement(&self, prefix: &str, error: CliError) -> &Self {
        self.state
            .lock()
            .statement_failures
            .push((prefix.to_string(), error));
        self
    }

    /// Stop failing statements
    pub fn clear_statement_failures(&self) -> &Self {
        self.state.lock().statement_failures.clear();
        self
    }

    /// Serve `rows` to the next statement whose SQL starts with `prefix`
    pub fn respond(
        &self,
        prefix: &str,
        description: Vec<ColumnDescription>,
        rows: Vec<RawRow>,
    ) -> &Self {
        self.state.lock().results.push(Scripted {
            prefix: prefix.to_string(),
            description,
            rows,
        });
        self
    }

    /// Report this many extra result sets after each query
    pub fn trailing_sets(&self, count: usize) -> &Self {
        self.state.lock().trailing_sets = count;
        self
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Forget recorded events
    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// SQL of every single statement executed, in order
    pub fn executed_sql(&self) -> Vec<String> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Execute { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of connect attempts
    pub fn connect_count(&self) -> usize {
        self.count(|event| matches!(event, Event::Connect { .. }))
    }

    /// Number of recorded events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|event| predicate(event))
            .count()
    }

    fn record(&self, event: Event) {
        self.state.lock().events.push(event);
    }
}

impl Connector for FakeCli {
    fn connect(
        &self,
        connection_string: &str,
        autocommit: bool,
        timeout: Option<Duration>,
    ) -> CliResult<Box<dyn RawConnection>> {
        self.record(Event::Connect {
            connection_string: connection_string.to_string(),
            autocommit,
            timeout,
        });
        if let Some(err) = self.state.lock().connect_failures.pop_front() {
            return Err(err);
        }
        Ok(Box::new(FakeConnection {
            cli: self.clone(),
            autocommit,
        }))
    }
}

struct FakeConnection {
    cli: FakeCli,
    autocommit: bool,
}

impl RawConnection for FakeConnection {
    fn cursor(&mut self) -> CliResult<Box<dyn RawCursor + '_>> {
        Ok(Box::new(FakeCursor {
            cli: self.cli.clone(),
            description: Vec::new(),
            rows: VecDeque::new(),
            trailing_sets: 0,
        }))
    }

    fn autocommit(&self) -> bool {
        self.autocommit
    }

    fn set_autocommit(&mut self, autocommit: bool) -> CliResult<()> {
        self.cli.record(Event::Autocommit(autocommit));
        self.autocommit = autocommit;
        Ok(())
    }

    fn set_attribute(&mut self, attribute: ConnectionAttribute) -> CliResult<()> {
        self.cli.record(Event::Attribute(attribute));
        Ok(())
    }

    fn close(&mut self) -> CliResult<()> {
        self.cli.record(Event::ConnectionClosed);
        Ok(())
    }
}

struct FakeCursor {
    cli: FakeCli,
    description: Vec<ColumnDescription>,
    rows: VecDeque<RawRow>,
    trailing_sets: usize,
}

impl FakeCursor {
    fn run(&mut self, sql: &str) -> CliResult<()> {
        let mut state = self.cli.state.lock();
        if let Some((_, err)) = state
            .statement_failures
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
        {
            return Err(err.clone());
        }
        match state.results.iter().position(|r| sql.starts_with(&r.prefix)) {
            Some(index) => {
                let scripted = state.results.remove(index);
                self.description = scripted.description;
                self.rows = scripted.rows.into();
                self.trailing_sets = state.trailing_sets;
            }
            None => {
                self.description.clear();
                self.rows.clear();
                self.trailing_sets = 0;
            }
        }
        Ok(())
    }
}

impl RawCursor for FakeCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CliResult<()> {
        self.cli.record(Event::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.run(sql)
    }

    fn execute_many(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> CliResult<()> {
        self.cli.record(Event::ExecuteMany {
            sql: sql.to_string(),
            param_sets: param_sets.to_vec(),
        });
        self.run(sql)
    }

    fn description(&self) -> &[ColumnDescription] {
        &self.description
    }

    fn row_count(&self) -> i64 {
        self.rows.len() as i64
    }

    fn fetch_one(&mut self) -> CliResult<Option<RawRow>> {
        Ok(self.rows.pop_front())
    }

    fn fetch_many(&mut self, size: usize) -> CliResult<Vec<RawRow>> {
        let size = size.min(self.rows.len());
        Ok(self.rows.drain(..size).collect())
    }

    fn fetch_all(&mut self) -> CliResult<Vec<RawRow>> {
        Ok(self.rows.drain(..).collect())
    }

    fn next_set(&mut self) -> CliResult<bool> {
        self.cli.record(Event::NextSet);
        if self.trailing_sets == 0 {
            return Ok(false);
        }
        self.trailing_sets -= 1;
        self.description.clear();
        self.rows.clear();
        Ok(true)
    }

    fn close(&mut self) -> CliResult<()> {
        self.cli.record(Event::CursorClosed);
        Ok(())
    }
}

/// `-908`: the server could not be reached
pub fn connect_failed() -> CliError {
    CliError::new(
        "08004",
        "Attempt to connect to database server (dev) failed. (-908) (SQLDriverConnect)",
    )
}

/// `-27001`: read error while connecting
pub fn read_error() -> CliError {
    CliError::new(
        "HY000",
        "Read error occurred during connection attempt. (-27001) (SQLDriverConnect)",
    )
}

/// `-951`: bad credentials, never retried by default
pub fn auth_error() -> CliError {
    CliError::new(
        "28000",
        "Incorrect password or user is not known on the database server (-951) (SQLDriverConnect)",
    )
}

/// A fresh fake CLI
#[fixture]
pub fn cli() -> FakeCli {
    init_tracing();
    FakeCli::new()
}

/// Route `tracing` events to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Resolve settings against a throwaway driver library and sqlhosts file.
///
/// `overrides` is merged into a complete server/database/user/password
/// settings object; nested objects are merged key by key and `null`
/// values are kept.
pub fn params(overrides: serde_json::Value) -> Result<ConnectionParams> {
    let dir = tempfile::tempdir()?;
    let driver = dir.path().join("iclit09b.so");
    let sqlhosts = dir.path().join("sqlhosts");
    std::fs::write(&driver, b"")?;
    std::fs::write(&sqlhosts, SQLHOSTS)?;

    let mut settings = json!({
        "SERVER": "informix",
        "NAME": "sysmaster",
        "USER": "informix",
        "PASSWORD": "in4mix",
        "OPTIONS": {"DRIVER": driver.display().to_string()},
    });
    merge(&mut settings, overrides);

    let settings = ConnectionSettings::from_json(&settings.to_string())?;
    Ok(settings.resolve(&Platform::Linux, Some(&sqlhosts))?)
}

fn merge(base: &mut serde_json::Value, overrides: serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

/// A connection wrapper over `cli`, on a manual clock.
///
/// Retry delays always take the upper bound of their window.
pub fn connection(
    cli: &FakeCli,
    overrides: serde_json::Value,
) -> Result<(InformixConnection, Arc<ManualClock>)> {
    let clock = Arc::new(ManualClock::new());
    let conn = InformixConnection::new(params(overrides)?, Arc::new(cli.clone()))?
        .with_clock(clock.clone())
        .with_jitter(|_low: f64, high: f64| high);
    Ok((conn, clock))
}
