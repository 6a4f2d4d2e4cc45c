//! Informix SQL dialect
//!
//! This module provides the `InformixDialect` struct with the rewrites the
//! host's generic SQL needs before it reaches the CLI: pagination, parameter
//! placeholders, transaction control and lookup operators.

use ifx_core::IsolationLevel;

/// Placeholder emitted by the host's SQL generator
pub const HOST_PLACEHOLDER: &str = "%s";

/// Positional placeholder understood by the CLI
pub const CLI_PLACEHOLDER: &str = "?";

/// Query returning the serial value generated by the last insert
pub const LAST_INSERT_ID_SQL: &str = "SELECT DBINFO('sqlca.sqlerrd1') FROM SYSTABLES WHERE TABID=1";

const OPERATORS: [(&str, &str); 16] = [
    ("exact", "= %s"),
    ("iexact", "= LOWER(%s)"),
    ("contains", r"LIKE %s ESCAPE '\'"),
    ("icontains", r"LIKE LOWER(%s) ESCAPE '\'"),
    ("gt", "> %s"),
    ("gte", ">= %s"),
    ("lt", "< %s"),
    ("lte", "<= %s"),
    ("startswith", r"LIKE %s ESCAPE '\'"),
    ("endswith", r"LIKE %s ESCAPE '\'"),
    ("istartswith", r"LIKE LOWER(%s) ESCAPE '\'"),
    ("iendswith", r"LIKE LOWER(%s) ESCAPE '\'"),
    ("regex", "LIKE %s"),
    ("iregex", "LIKE %s"),
    ("in", "IN %s"),
    ("isnull", "IS NULL"),
];

const PATTERN_OPS: [(&str, &str); 6] = [
    ("contains", r"LIKE '%' ESCAPE '\' || {} || '%'"),
    ("icontains", r"LIKE '%' ESCAPE '\' || UPPER({}) || '%'"),
    ("startswith", r"LIKE {} ESCAPE '\' || '%'"),
    ("istartswith", r"LIKE UPPER({}) ESCAPE '\' || '%'"),
    ("endswith", r"LIKE '%' ESCAPE '\' || {}"),
    ("iendswith", r"LIKE '%' ESCAPE '\' || UPPER({})"),
];

/// Session isolation switch issued as a statement, as opposed to the
/// connection attribute set from `ISOLATION_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIsolation {
    DirtyRead,
    CommittedRead,
    RepeatableRead,
    CommittedReadRetainUpdateLocks,
}

impl From<IsolationLevel> for SessionIsolation {
    fn from(level: IsolationLevel) -> Self {
        match level {
            IsolationLevel::ReadUncommitted => SessionIsolation::DirtyRead,
            IsolationLevel::ReadCommitted => SessionIsolation::CommittedRead,
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable => {
                SessionIsolation::RepeatableRead
            }
        }
    }
}

/// Informix dialect
///
/// # Example
///
/// ```
/// use ifx_driver_informix::InformixDialect;
///
/// let dialect = InformixDialect::new();
///
/// assert_eq!(
///     dialect.translate("SELECT id FROM t WHERE a = %s", Some(15), 10),
///     "SELECT SKIP 10 FIRST 5 id FROM t WHERE a = ?"
/// );
/// assert_eq!(dialect.paginate("SELECT id FROM t", Some(20), 0), "SELECT FIRST 20 id FROM t");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InformixDialect {
    collation: Option<String>,
}

impl InformixDialect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `COLLATE <collation>` to every `LIKE` lookup operator
    pub fn with_collation(mut self, collation: Option<String>) -> Self {
        self.collation = collation;
        self
    }

    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    /// Rewrite the first `SELECT` keyword into `SELECT [SKIP low] FIRST n`.
    ///
    /// Without a `high_mark` the statement is returned untouched. Only the
    /// first occurrence is replaced, so a statement whose first `SELECT` is
    /// not the outer one is paginated in the wrong place.
    ///
    /// # Example
    ///
    /// ```
    /// use ifx_driver_informix::InformixDialect;
    ///
    /// let dialect = InformixDialect::new();
    /// assert_eq!(dialect.paginate("SELECT a FROM t", Some(15), 10), "SELECT SKIP 10 FIRST 5 a FROM t");
    /// assert_eq!(dialect.paginate("SELECT a FROM t", None, 10), "SELECT a FROM t");
    /// ```
    pub fn paginate(&self, sql: &str, high_mark: Option<u64>, low_mark: u64) -> String {
        let Some(high_mark) = high_mark else {
            return sql.to_string();
        };
        let mut select = String::from("SELECT");
        if low_mark > 0 {
            select.push_str(&format!(" SKIP {low_mark}"));
        }
        select.push_str(&format!(" FIRST {}", high_mark.saturating_sub(low_mark)));
        sql.replacen("SELECT", &select, 1)
    }

    /// Replace every `%s` with `?`.
    ///
    /// The substitution is purely textual: a `%s` inside a string literal
    /// is rewritten as well.
    pub fn rewrite_placeholders(&self, sql: &str) -> String {
        sql.replace(HOST_PLACEHOLDER, CLI_PLACEHOLDER)
    }

    /// Full translation of a generated SELECT
    pub fn translate(&self, sql: &str, high_mark: Option<u64>, low_mark: u64) -> String {
        self.rewrite_placeholders(&self.paginate(sql, high_mark, low_mark))
    }

    /// Translation of INSERT, UPDATE, DELETE and aggregate statements
    pub fn translate_statement(&self, sql: &str) -> String {
        self.rewrite_placeholders(sql)
    }

    pub fn start_transaction_sql(&self) -> &'static str {
        "BEGIN WORK"
    }

    pub fn commit_sql(&self) -> &'static str {
        "COMMIT WORK"
    }

    pub fn rollback_sql(&self) -> &'static str {
        "ROLLBACK WORK"
    }

    pub fn savepoint_create_sql(&self, sid: &str) -> String {
        format!("SAVEPOINT {sid}")
    }

    pub fn savepoint_commit_sql(&self, sid: &str) -> String {
        format!("RELEASE SAVEPOINT {sid}")
    }

    pub fn savepoint_rollback_sql(&self, sid: &str) -> String {
        format!("ROLLBACK WORK TO SAVEPOINT {sid}")
    }

    pub fn isolation_sql(&self, isolation: SessionIsolation) -> &'static str {
        match isolation {
            SessionIsolation::DirtyRead => "set isolation to dirty read;",
            SessionIsolation::CommittedRead => "set isolation to committed read;",
            SessionIsolation::RepeatableRead => "set isolation to repeatable read;",
            SessionIsolation::CommittedReadRetainUpdateLocks => {
                "set isolation to committed read retain update locks;"
            }
        }
    }

    /// Lock wait statement: `0` fails immediately, `-1` waits forever,
    /// anything else waits that many seconds.
    ///
    /// # Example
    ///
    /// ```
    /// use ifx_driver_informix::InformixDialect;
    ///
    /// let dialect = InformixDialect::new();
    /// assert_eq!(dialect.lock_mode_sql(0), "SET LOCK MODE TO NOT WAIT");
    /// assert_eq!(dialect.lock_mode_sql(-1), "SET LOCK MODE TO WAIT");
    /// assert_eq!(dialect.lock_mode_sql(30), "SET LOCK MODE TO WAIT 30");
    /// ```
    pub fn lock_mode_sql(&self, wait: i64) -> String {
        match wait {
            0 => "SET LOCK MODE TO NOT WAIT".to_string(),
            -1 => "SET LOCK MODE TO WAIT".to_string(),
            seconds => format!("SET LOCK MODE TO WAIT {seconds}"),
        }
    }

    /// Statements switching constraint checking to immediate and back
    pub fn constraint_checks_sql(&self) -> [&'static str; 2] {
        ["SET CONSTRAINTS ALL IMMEDIATE", "SET CONSTRAINTS ALL DEFERRED"]
    }

    /// Identifiers are sent unquoted
    pub fn quote_name<'a>(&self, name: &'a str) -> &'a str {
        name
    }

    /// SQL for a lookup operator, with the collation appended to `LIKE` forms
    ///
    /// # Example
    ///
    /// ```
    /// use ifx_driver_informix::InformixDialect;
    ///
    /// let dialect = InformixDialect::new().with_collation(Some("en_US.819".into()));
    /// assert_eq!(dialect.operator("gt").as_deref(), Some("> %s"));
    /// assert_eq!(dialect.operator("regex").as_deref(), Some("LIKE %s COLLATE en_US.819"));
    /// ```
    pub fn operator(&self, lookup: &str) -> Option<String> {
        let (_, sql) = OPERATORS.iter().find(|(name, _)| *name == lookup)?;
        Some(match &self.collation {
            Some(collation) if sql.starts_with("LIKE ") => format!("{sql} COLLATE {collation}"),
            _ => sql.to_string(),
        })
    }

    /// Pattern lookup against an expression rather than a literal
    pub fn pattern_op(&self, lookup: &str, rhs: &str) -> Option<String> {
        PATTERN_OPS
            .iter()
            .find(|(name, _)| *name == lookup)
            .map(|(_, template)| template.replace("{}", rhs))
    }

    /// Wrapper applied to the left-hand side of a lookup
    pub fn lookup_cast(&self, lookup: &str) -> &'static str {
        match lookup {
            "iexact" | "icontains" | "istartswith" | "iendswith" => "LOWER(%s)",
            _ => "%s",
        }
    }

    pub fn date_extract_sql(&self, lookup: &str, field: &str) -> Option<String> {
        let function = match lookup {
            "week_day" => "WEEKDAY",
            "month" => "MONTH",
            "day" => "DAY",
            _ => return None,
        };
        Some(format!("{function}({field})"))
    }

    /// First and last day of `year`, as date literals
    pub fn year_lookup_bounds(&self, year: i32) -> [String; 2] {
        [format!("{year}-01-01"), format!("{year}-12-31")]
    }

    pub fn fulltext_search_sql(&self, field: &str) -> String {
        format!("LIKE '%{field}%'")
    }

    /// Aggregate name Informix understands for `function`
    pub fn aggregate_function<'a>(&self, function: &'a str) -> &'a str {
        match function {
            "STDDEV_POP" | "STDDEV_SAMP" => "STDDEV",
            "VAR_POP" | "VAR_SAMP" => "VARIANCE",
            other => other,
        }
    }

    pub fn last_insert_id_sql(&self) -> &'static str {
        LAST_INSERT_ID_SQL
    }

    /// One `DELETE FROM` per table
    pub fn sql_flush<S: AsRef<str>>(&self, tables: &[S]) -> Vec<String> {
        tables
            .iter()
            .map(|table| format!("DELETE FROM {};", self.quote_name(table.as_ref())))
            .collect()
    }
}
