//! Tests for InformixDialect

use super::*;

mod paginate_tests {
    use super::*;

    #[test]
    fn test_skip_and_first() {
        let dialect = InformixDialect::new();
        let sql = dialect.paginate("SELECT id, name FROM users", Some(15), 10);
        assert_eq!(sql, "SELECT SKIP 10 FIRST 5 id, name FROM users");
    }

    #[test]
    fn test_first_only_when_low_mark_is_zero() {
        let dialect = InformixDialect::new();
        let sql = dialect.paginate("SELECT id FROM users", Some(20), 0);
        assert_eq!(sql, "SELECT FIRST 20 id FROM users");
        assert!(!sql.contains("SKIP"));
    }

    #[test]
    fn test_no_high_mark_is_noop() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.paginate("SELECT id FROM users", None, 5),
            "SELECT id FROM users"
        );
    }

    #[test]
    fn test_only_first_select_is_rewritten() {
        let dialect = InformixDialect::new();
        let sql = dialect.paginate(
            "SELECT id FROM users WHERE id IN (SELECT user_id FROM orders)",
            Some(3),
            0,
        );
        assert_eq!(
            sql,
            "SELECT FIRST 3 id FROM users WHERE id IN (SELECT user_id FROM orders)"
        );
    }

    #[test]
    fn test_low_mark_above_high_mark_saturates() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.paginate("SELECT id FROM t", Some(5), 10),
            "SELECT SKIP 10 FIRST 0 id FROM t"
        );
    }
}

mod placeholder_tests {
    use super::*;

    #[test]
    fn test_rewrites_every_placeholder() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.rewrite_placeholders("INSERT INTO t (a, b) VALUES (%s, %s)"),
            "INSERT INTO t (a, b) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_rewrite_is_purely_textual() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.rewrite_placeholders("SELECT '%s' FROM t WHERE a = %s"),
            "SELECT '?' FROM t WHERE a = ?"
        );
    }

    #[test]
    fn test_translate_combines_both() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.translate("SELECT a FROM t WHERE b = %s", Some(20), 0),
            "SELECT FIRST 20 a FROM t WHERE b = ?"
        );
    }

    #[test]
    fn test_translate_statement_does_not_paginate() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.translate_statement("DELETE FROM t WHERE id IN (SELECT id FROM u WHERE x = %s)"),
            "DELETE FROM t WHERE id IN (SELECT id FROM u WHERE x = ?)"
        );
    }
}

mod transaction_tests {
    use super::*;

    #[test]
    fn test_transaction_keywords() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.start_transaction_sql(), "BEGIN WORK");
        assert_eq!(dialect.commit_sql(), "COMMIT WORK");
        assert_eq!(dialect.rollback_sql(), "ROLLBACK WORK");
    }

    #[test]
    fn test_savepoints() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.savepoint_create_sql("s1"), "SAVEPOINT s1");
        assert_eq!(dialect.savepoint_commit_sql("s1"), "RELEASE SAVEPOINT s1");
        assert_eq!(
            dialect.savepoint_rollback_sql("s1"),
            "ROLLBACK WORK TO SAVEPOINT s1"
        );
    }

    #[test]
    fn test_isolation_statements() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.isolation_sql(SessionIsolation::DirtyRead),
            "set isolation to dirty read;"
        );
        assert_eq!(
            dialect.isolation_sql(SessionIsolation::CommittedReadRetainUpdateLocks),
            "set isolation to committed read retain update locks;"
        );
        assert_eq!(
            SessionIsolation::from(ifx_core::IsolationLevel::ReadUncommitted),
            SessionIsolation::DirtyRead
        );
    }

    #[test]
    fn test_lock_mode() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.lock_mode_sql(0), "SET LOCK MODE TO NOT WAIT");
        assert_eq!(dialect.lock_mode_sql(-1), "SET LOCK MODE TO WAIT");
        assert_eq!(dialect.lock_mode_sql(12), "SET LOCK MODE TO WAIT 12");
    }

    #[test]
    fn test_constraint_checks() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.constraint_checks_sql(),
            ["SET CONSTRAINTS ALL IMMEDIATE", "SET CONSTRAINTS ALL DEFERRED"]
        );
    }
}

mod operator_tests {
    use super::*;

    #[test]
    fn test_operators_without_collation() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.operator("exact").as_deref(), Some("= %s"));
        assert_eq!(
            dialect.operator("icontains").as_deref(),
            Some(r"LIKE LOWER(%s) ESCAPE '\'")
        );
        assert_eq!(dialect.operator("unknown"), None);
    }

    #[test]
    fn test_collation_applies_to_like_operators_only() {
        let dialect = InformixDialect::new().with_collation(Some("de_DE.8859-1".into()));
        assert_eq!(
            dialect.operator("contains").as_deref(),
            Some(r"LIKE %s ESCAPE '\' COLLATE de_DE.8859-1")
        );
        assert_eq!(dialect.operator("iexact").as_deref(), Some("= LOWER(%s)"));
        assert_eq!(dialect.operator("lte").as_deref(), Some("<= %s"));
    }

    #[test]
    fn test_pattern_ops() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.pattern_op("startswith", "name").as_deref(),
            Some(r"LIKE name ESCAPE '\' || '%'")
        );
        assert_eq!(dialect.pattern_op("exact", "name"), None);
    }

    #[test]
    fn test_lookup_cast() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.lookup_cast("iexact"), "LOWER(%s)");
        assert_eq!(dialect.lookup_cast("exact"), "%s");
    }
}

mod operations_tests {
    use super::*;

    #[test]
    fn test_quote_name_is_identity() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.quote_name("my_table"), "my_table");
    }

    #[test]
    fn test_date_extract() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.date_extract_sql("week_day", "created").as_deref(),
            Some("WEEKDAY(created)")
        );
        assert_eq!(dialect.date_extract_sql("hour", "created"), None);
    }

    #[test]
    fn test_year_bounds_and_fulltext() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.year_lookup_bounds(2016),
            ["2016-01-01".to_string(), "2016-12-31".to_string()]
        );
        assert_eq!(dialect.fulltext_search_sql("body"), "LIKE '%body%'");
    }

    #[test]
    fn test_aggregate_renames() {
        let dialect = InformixDialect::new();
        assert_eq!(dialect.aggregate_function("STDDEV_SAMP"), "STDDEV");
        assert_eq!(dialect.aggregate_function("VAR_POP"), "VARIANCE");
        assert_eq!(dialect.aggregate_function("SUM"), "SUM");
    }

    #[test]
    fn test_sql_flush() {
        let dialect = InformixDialect::new();
        assert_eq!(
            dialect.sql_flush(&["a", "b"]),
            vec!["DELETE FROM a;".to_string(), "DELETE FROM b;".to_string()]
        );
        assert!(dialect.last_insert_id_sql().starts_with("SELECT DBINFO"));
    }
}
