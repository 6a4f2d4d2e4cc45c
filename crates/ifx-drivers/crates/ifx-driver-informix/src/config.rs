//! Connection settings and their validation
//!
//! The host hands over a settings mapping (usually JSON) with upper-case
//! keys. [`ConnectionSettings::resolve`] validates it against the local
//! platform and produces the immutable [`ConnectionParams`] a connection is
//! opened from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ifx_connection::RetryPolicy;
use ifx_core::{IfxError, IsolationLevel, Result};
use serde::{Deserialize, Deserializer};

/// Environment variable naming the sqlhosts registry file
pub const SQLHOSTS_ENV: &str = "INFORMIXSQLHOSTS";

/// Maximum size of a single parameter write
pub const MAX_WRITE: usize = 32_000;

const DEFAULT_ENCODINGS: [&str; 3] = ["utf-8", "cp1252", "iso-8859-1"];

/// Settings for one logical connection, as provided by the host
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSettings {
    #[serde(rename = "DSN")]
    pub dsn: Option<String>,
    #[serde(rename = "SERVER")]
    pub server: Option<String>,
    /// `None` when the key is absent, `Some(None)` when it is explicitly null
    #[serde(rename = "NAME", default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(rename = "USER")]
    pub user: Option<String>,
    #[serde(rename = "PASSWORD")]
    pub password: Option<String>,
    #[serde(rename = "AUTOCOMMIT", default)]
    pub autocommit: bool,
    #[serde(rename = "OPTIONS", default)]
    pub options: ConnectionOptions,
    #[serde(rename = "CONNECTION_RETRY", default)]
    pub connection_retry: RetryPolicy,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// The `OPTIONS` sub-mapping
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Driver library path (or registered driver name on Windows)
    #[serde(rename = "DRIVER")]
    pub driver: Option<String>,
    /// Encodings tried in order when decoding character data
    pub encodings: Vec<String>,
    /// Appended as `COLLATE <collation>` to pattern-matching operators
    pub collation: Option<String>,
    /// Charset for SQL text and parameters sent to the driver
    pub driver_charset: Option<String>,
    #[serde(rename = "ISOLATION_LEVEL")]
    pub isolation_level: Option<IsolationLevel>,
    /// Lock wait: 0 = no wait, -1 = wait forever, n = wait n seconds
    #[serde(rename = "LOCK_MODE_WAIT")]
    pub lock_mode_wait: Option<i64>,
    #[serde(rename = "CPTIMEOUT")]
    pub cp_timeout: Option<u64>,
    /// Connect timeout in seconds, forwarded to the connect primitive
    #[serde(rename = "CONN_TIMEOUT")]
    pub conn_timeout: Option<u64>,
    #[serde(rename = "VALIDATE_CONNECTION")]
    pub validate_connection: bool,
    /// Minimum seconds between two validation probes
    #[serde(rename = "VALIDATION_INTERVAL")]
    pub validation_interval: u64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            driver: None,
            encodings: DEFAULT_ENCODINGS.iter().map(|s| s.to_string()).collect(),
            collation: None,
            driver_charset: None,
            isolation_level: None,
            lock_mode_wait: None,
            cp_timeout: None,
            conn_timeout: None,
            validate_connection: false,
            validation_interval: 300,
        }
    }
}

/// Operating system family, as far as driver lookup is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Darwin,
    Linux,
    Windows32,
    Windows64,
    Other(String),
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::Darwin,
            "linux" => Platform::Linux,
            "windows" if cfg!(target_pointer_width = "64") => Platform::Windows64,
            "windows" => Platform::Windows32,
            other => Platform::Other(other.to_string()),
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows32 | Platform::Windows64)
    }

    /// Default CLI driver location for this platform
    pub fn default_driver(&self) -> Option<&'static str> {
        match self {
            Platform::Darwin => Some("/Applications/IBM/informix/lib/cli/iclit09b.dylib"),
            Platform::Linux => Some("/opt/IBM/informix/lib/cli/iclit09b.so"),
            Platform::Windows32 => Some("IBM INFORMIX ODBC DRIVER (32-bit)"),
            Platform::Windows64 => Some("IBM INFORMIX ODBC DRIVER (64-bit)"),
            Platform::Other(_) => None,
        }
    }
}

impl ConnectionSettings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| IfxError::Configuration(format!("invalid connection settings: {e}")))
    }

    /// Validate against the current platform and the `INFORMIXSQLHOSTS`
    /// environment variable.
    pub fn resolve_from_env(&self) -> Result<ConnectionParams> {
        let sqlhosts = std::env::var_os(SQLHOSTS_ENV).map(PathBuf::from);
        self.resolve(&Platform::current(), sqlhosts.as_deref())
    }

    /// Validate the settings and fill in the driver default.
    ///
    /// Without a DSN, `NAME`, `SERVER`, `USER` and `PASSWORD` are required.
    /// Outside Windows the sqlhosts file and the driver library must exist.
    pub fn resolve(&self, platform: &Platform, sqlhosts: Option<&Path>) -> Result<ConnectionParams> {
        if self.dsn.is_none() {
            let required = [
                ("NAME", self.name.is_some()),
                ("SERVER", self.server.is_some()),
                ("USER", self.user.is_some()),
                ("PASSWORD", self.password.is_some()),
            ];
            if let Some((key, _)) = required.iter().find(|(_, set)| !set) {
                return Err(IfxError::Configuration(format!(
                    "{key} is a required setting for an informix connection"
                )));
            }
        }

        let driver = match &self.options.driver {
            Some(driver) => driver.clone(),
            None => platform
                .default_driver()
                .ok_or_else(|| {
                    IfxError::Configuration("cannot locate informix driver, please specify".into())
                })?
                .to_string(),
        };

        if !platform.is_windows() {
            match sqlhosts {
                Some(path) if path.exists() => {}
                other => {
                    return Err(IfxError::Configuration(format!(
                        "Cannot find Informix sqlhosts at {}",
                        other.map_or_else(|| "<unset>".to_string(), |p| p.display().to_string())
                    )));
                }
            }
            if !Path::new(&driver).exists() {
                return Err(IfxError::Configuration(format!(
                    "cannot find Informix driver at {driver}"
                )));
            }
        }

        tracing::debug!(driver = %driver, dsn = ?self.dsn, server = ?self.server, "resolved connection settings");

        Ok(ConnectionParams {
            driver,
            dsn: self.dsn.clone(),
            server: self.server.clone(),
            name: self.name.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            autocommit: self.autocommit,
            options: self.options.clone(),
            retry: self.connection_retry.clone(),
        })
    }
}

/// Validated, immutable connection parameters
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    driver: String,
    dsn: Option<String>,
    server: Option<String>,
    name: Option<Option<String>>,
    user: Option<String>,
    password: Option<String>,
    autocommit: bool,
    options: ConnectionOptions,
    retry: RetryPolicy,
}

impl ConnectionParams {
    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn database(&self) -> Option<&str> {
        self.name.as_ref().and_then(|n| n.as_deref())
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Login timeout forwarded to the connect primitive
    pub fn timeout(&self) -> Option<Duration> {
        self.options.conn_timeout.map(Duration::from_secs)
    }

    pub fn validation_interval(&self) -> Duration {
        Duration::from_secs(self.options.validation_interval)
    }

    /// Semicolon-joined `key=value` connection string.
    ///
    /// An explicitly null `NAME` connects to the server without opening a
    /// database (`CONNECTDATABASE=no`).
    pub fn connection_string(&self) -> String {
        let mut parts = vec![format!("Driver={{{}}}", self.driver)];
        if let Some(dsn) = &self.dsn {
            parts.push(format!("DSN={dsn}"));
        }
        if let Some(server) = &self.server {
            parts.push(format!("Server={server}"));
        }
        match &self.name {
            Some(Some(name)) => parts.push(format!("Database={name}")),
            Some(None) => parts.push("CONNECTDATABASE=no".to_string()),
            None => {}
        }
        if let Some(user) = &self.user {
            parts.push(format!("Uid={user}"));
        }
        if let Some(password) = &self.password {
            parts.push(format!("Pwd={password}"));
        }
        if let Some(timeout) = self.options.cp_timeout {
            parts.push(format!("CPTimeout={timeout}"));
        }
        parts.join(";")
    }
}
