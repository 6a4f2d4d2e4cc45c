//! Informix connection wrapper
//!
//! Owns one physical connection, opened lazily through the retry engine and
//! configured once after it is established.

use std::sync::Arc;

use ifx_connection::{HealthMonitor, Jitter, RetryEngine, RetryState, health};
use ifx_core::{Clock, ConnectionAttribute, Connector, IfxError, RawConnection, Result};

use crate::codec::{Encoding, OutputConverters, ValueCodec, parse_encodings};
use crate::config::{ConnectionParams, MAX_WRITE};
use crate::cursor::Cursor;
use crate::dialect::{InformixDialect, SessionIsolation};
use crate::schema::SchemaEditor;

/// Encoding set on every connection for SQL text
const CONNECTION_ENCODING: &str = "UTF-8";

pub struct InformixConnection {
    params: ConnectionParams,
    connector: Arc<dyn Connector>,
    engine: RetryEngine,
    monitor: HealthMonitor,
    dialect: InformixDialect,
    codec: ValueCodec,
    connection: Option<Box<dyn RawConnection>>,
}

impl InformixConnection {
    /// Build a wrapper. No connection is opened until one is needed.
    pub fn new(params: ConnectionParams, connector: Arc<dyn Connector>) -> Result<Self> {
        let options = params.options();
        let encodings = parse_encodings(&options.encodings)?;
        let driver_charset = options
            .driver_charset
            .as_deref()
            .map(str::parse::<Encoding>)
            .transpose()?;
        let codec = ValueCodec::new(OutputConverters::informix(encodings))
            .with_driver_charset(driver_charset);
        let dialect = InformixDialect::new().with_collation(options.collation.clone());

        Ok(Self {
            engine: RetryEngine::new(params.retry_policy().clone()),
            monitor: HealthMonitor::new(params.validation_interval()),
            params,
            connector,
            dialect,
            codec,
            connection: None,
        })
    }

    /// Use `clock` for retry sleeps and validation timing
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.engine.set_clock(clock.clone());
        self.monitor = HealthMonitor::with_clock(self.params.validation_interval(), clock);
        self
    }

    pub fn with_jitter(mut self, jitter: impl Jitter + 'static) -> Self {
        self.engine.set_jitter(jitter);
        self
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn dialect(&self) -> &InformixDialect {
        &self.dialect
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    /// Retry states visited by the most recent connect
    pub fn retry_transitions(&self) -> &[RetryState] {
        self.engine.transitions()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection_string(&self) -> String {
        self.params.connection_string()
    }

    /// Open a new physical connection, replacing any current one
    #[tracing::instrument(skip(self))]
    pub fn connect(&mut self) -> Result<()> {
        self.teardown();
        tracing::debug!("connecting to informix");

        let connection_string = self.connection_string();
        let connection = self.engine.open(
            self.connector.as_ref(),
            &connection_string,
            self.params.autocommit(),
            self.params.timeout(),
        )?;
        self.connection = Some(connection);

        if let Err(e) = self.configure() {
            tracing::error!(error = %e, "failed to configure connection");
            self.teardown();
            return Err(e);
        }
        self.monitor.reset();
        tracing::debug!("connected to informix");
        Ok(())
    }

    fn configure(&mut self) -> Result<()> {
        let isolation = self.params.options().isolation_level;
        let lock_wait = self.params.options().lock_mode_wait;

        let connection = self.connection.as_mut().ok_or(IfxError::NotConnected)?;
        connection.set_attribute(ConnectionAttribute::Encoding(CONNECTION_ENCODING.into()))?;
        if let Some(level) = isolation {
            connection.set_attribute(ConnectionAttribute::TxnIsolation(level))?;
        }
        connection.set_attribute(ConnectionAttribute::MaxWrite(MAX_WRITE))?;

        if let Some(wait) = lock_wait {
            self.set_lock_mode(wait)?;
        }
        Ok(())
    }

    /// Connect if there is no physical connection yet
    pub fn ensure_connection(&mut self) -> Result<()> {
        if self.connection.is_none() {
            self.connect()?;
        }
        Ok(())
    }

    pub fn cursor(&mut self) -> Result<Cursor<'_>> {
        self.ensure_connection()?;
        let connection = self.connection.as_mut().ok_or(IfxError::NotConnected)?;
        let inner = connection.cursor()?;
        Ok(Cursor::new(inner, &self.codec, &self.dialect))
    }

    fn execute_sql(&mut self, sql: &str) -> Result<()> {
        let mut cursor = self.cursor()?;
        cursor.execute(sql, &[])?;
        cursor.close()
    }

    pub fn autocommit(&self) -> bool {
        match &self.connection {
            Some(connection) => connection.autocommit(),
            None => self.params.autocommit(),
        }
    }

    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        self.ensure_connection()?;
        let connection = self.connection.as_mut().ok_or(IfxError::NotConnected)?;
        connection.set_autocommit(autocommit)?;
        Ok(())
    }

    /// Start an explicit transaction while in autocommit mode
    pub fn begin(&mut self) -> Result<()> {
        let sql = self.dialect.start_transaction_sql();
        self.execute_sql(sql)
    }

    /// `COMMIT WORK`. On failure the physical connection is discarded.
    pub fn commit(&mut self) -> Result<()> {
        let sql = self.dialect.commit_sql();
        self.end_transaction(sql)
    }

    /// `ROLLBACK WORK`. On failure the physical connection is discarded.
    pub fn rollback(&mut self) -> Result<()> {
        let sql = self.dialect.rollback_sql();
        self.end_transaction(sql)
    }

    fn end_transaction(&mut self, sql: &str) -> Result<()> {
        if self.connection.is_none() {
            return Ok(());
        }
        if let Err(e) = self.execute_sql(sql) {
            tracing::warn!(error = %e, sql, "transaction end failed, closing connection");
            self.teardown();
            return Err(e);
        }
        Ok(())
    }

    pub fn savepoint(&mut self, sid: &str) -> Result<()> {
        let sql = self.dialect.savepoint_create_sql(sid);
        self.execute_sql(&sql)
    }

    pub fn savepoint_commit(&mut self, sid: &str) -> Result<()> {
        let sql = self.dialect.savepoint_commit_sql(sid);
        self.execute_sql(&sql)
    }

    pub fn savepoint_rollback(&mut self, sid: &str) -> Result<()> {
        let sql = self.dialect.savepoint_rollback_sql(sid);
        self.execute_sql(&sql)
    }

    /// Switch constraint checking to immediate, then back to deferred
    pub fn check_constraints(&mut self) -> Result<()> {
        for sql in self.dialect.constraint_checks_sql() {
            self.execute_sql(sql)?;
        }
        Ok(())
    }

    pub fn set_isolation(&mut self, isolation: SessionIsolation) -> Result<()> {
        let sql = self.dialect.isolation_sql(isolation);
        self.execute_sql(sql)
    }

    pub fn read_dirty(&mut self) -> Result<()> {
        self.set_isolation(SessionIsolation::DirtyRead)
    }

    pub fn read_committed(&mut self) -> Result<()> {
        self.set_isolation(SessionIsolation::CommittedRead)
    }

    pub fn read_repeatable(&mut self) -> Result<()> {
        self.set_isolation(SessionIsolation::RepeatableRead)
    }

    pub fn read_committed_with_update_locks(&mut self) -> Result<()> {
        self.set_isolation(SessionIsolation::CommittedReadRetainUpdateLocks)
    }

    /// See [`InformixDialect::lock_mode_sql`] for the meaning of `wait`
    pub fn set_lock_mode(&mut self, wait: i64) -> Result<()> {
        let sql = self.dialect.lock_mode_sql(wait);
        self.execute_sql(&sql)
    }

    /// Probe the current connection. `false` when there is none.
    pub fn is_usable(&mut self) -> bool {
        match self.connection.as_mut() {
            Some(connection) => health::is_usable(connection.as_mut()),
            None => false,
        }
    }

    /// Re-validate the connection before reuse, if `VALIDATE_CONNECTION` is on.
    ///
    /// Probes at most once per validation interval. An unusable connection is
    /// closed and dropped; the next operation reconnects.
    pub fn validate_connection(&mut self) -> bool {
        if !self.params.options().validate_connection {
            return true;
        }
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };
        let usable = self
            .monitor
            .validate(|| health::is_usable(connection.as_mut()));
        if !usable {
            tracing::warn!("connection failed validation, discarding it");
            self.teardown();
        }
        usable
    }

    pub fn schema_editor(&mut self) -> SchemaEditor<'_> {
        SchemaEditor::new(self)
    }

    /// Close the physical connection, if any
    pub fn close(&mut self) -> Result<()> {
        self.monitor.reset();
        if let Some(mut connection) = self.connection.take() {
            connection.close()?;
            tracing::debug!("informix connection closed");
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(error = %e, "error closing discarded connection");
        }
    }
}

impl Drop for InformixConnection {
    fn drop(&mut self) {
        self.teardown();
    }
}
