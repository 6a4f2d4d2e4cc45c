//! Tests for the statement executor

use super::*;
use crate::test_support::{Call, ResultSet, ScriptedCursor};
use ifx_core::{CliError, ColumnDescription, IfxError, Value, sql_type};

fn codec() -> ValueCodec {
    ValueCodec::new(OutputConverters::informix(vec![
        Encoding::Utf8,
        Encoding::Cp1252,
        Encoding::Latin1,
    ]))
}

fn people() -> ResultSet {
    ResultSet::new(
        vec![
            ColumnDescription::new("id", sql_type::INTEGER),
            ColumnDescription::new("name", sql_type::CHAR),
        ],
        vec![
            vec![Value::Int32(1), Value::Bytes(b"caf\xe9".to_vec())],
            vec![Value::Int32(2), Value::Bytes(br"two\nlines".to_vec())],
            vec![Value::Int32(3), Value::Null],
        ],
    )
}

mod execute_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_params_are_normalised_and_placeholders_rewritten() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor {
            row_count: 1,
            ..Default::default()
        };
        let calls = raw.calls.clone();
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        let affected = cursor
            .execute(
                "UPDATE t SET flag = %s WHERE name = %s",
                &[Value::Bool(true), Value::from("x")],
            )
            .unwrap();

        assert_eq!(affected, 1);
        assert_eq!(
            calls.lock()[0],
            Call::Execute {
                sql: "UPDATE t SET flag = ? WHERE name = ?".into(),
                params: vec![Value::Int32(1), Value::from("x")],
            }
        );
        assert_eq!(cursor.last_sql(), Some("UPDATE t SET flag = %s WHERE name = %s"));
        assert_eq!(cursor.last_params(), &[Value::Int32(1), Value::from("x")]);
    }

    #[test]
    fn test_parameterless_statement_is_sent_verbatim() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor::default();
        let calls = raw.calls.clone();
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        cursor.execute("SELECT '%s' FROM t", &[]).unwrap();
        assert_eq!(
            calls.lock()[0],
            Call::Execute {
                sql: "SELECT '%s' FROM t".into(),
                params: Vec::new(),
            }
        );
    }

    #[test]
    fn test_driver_error_is_returned() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor {
            fail_with: Some(CliError::new("42000", "Syntax error. (-201)")),
            ..Default::default()
        };
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        let err = cursor.execute("SELEC 1", &[]).unwrap_err();
        assert_eq!(err.native_code(), Some(-201));
        assert_eq!(cursor.last_sql(), Some("SELEC 1"));
    }

    #[test]
    fn test_execute_many_with_no_sets_is_a_noop() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor::default();
        let calls = raw.calls.clone();
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        assert_eq!(cursor.execute_many("INSERT INTO t VALUES (%s)", &[]).unwrap(), None);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_execute_many_normalises_every_set() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor {
            row_count: 2,
            ..Default::default()
        };
        let calls = raw.calls.clone();
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        let result = cursor
            .execute_many(
                "INSERT INTO t VALUES (%s)",
                &[vec![Value::Bool(false)], vec![Value::Bool(true)]],
            )
            .unwrap();

        assert_eq!(result, Some(2));
        assert_eq!(
            calls.lock()[0],
            Call::ExecuteMany {
                sql: "INSERT INTO t VALUES (?)".into(),
                param_sets: vec![vec![Value::Int32(0)], vec![Value::Int32(1)]],
            }
        );
    }
}

mod fetch_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fetch_one_decodes_and_drains_result_sets() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let mut raw = ScriptedCursor::new([people()]);
        raw.trailing_sets = 2;
        let calls = raw.calls.clone();
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        cursor.execute("SELECT id, name FROM people", &[]).unwrap();
        let row = cursor.fetch_one().unwrap().unwrap();

        assert_eq!(row.get_by_name("name"), Some(&Value::from("café")));
        assert_eq!(row[0], Value::Int32(1));
        let next_sets = calls.lock().iter().filter(|c| **c == Call::NextSet).count();
        assert_eq!(next_sets, 3);
    }

    #[test]
    fn test_fetch_one_on_empty_result() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let mut cursor = Cursor::new(Box::new(ScriptedCursor::default()), &codec, &dialect);
        cursor.execute("SELECT id FROM nobody", &[]).unwrap();
        assert_eq!(cursor.fetch_one().unwrap(), None);
    }

    #[test]
    fn test_fetch_many_and_fetch_all() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let mut cursor = Cursor::new(Box::new(ScriptedCursor::new([people()])), &codec, &dialect);
        cursor.execute("SELECT id, name FROM people", &[]).unwrap();

        let first = cursor.fetch_many(1).unwrap();
        assert_eq!(first.len(), 1);

        let rest = cursor.fetch_all().unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].columns(), &["id".to_string(), "name".to_string()]);
        assert_eq!(rest[0][1], Value::from("two\nlines"));
        assert_eq!(rest[1][1], Value::Null);
    }
}

mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_use_after_close_is_an_error() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let mut cursor = Cursor::new(Box::new(ScriptedCursor::default()), &codec, &dialect);
        cursor.close().unwrap();

        assert!(!cursor.is_active());
        assert!(matches!(cursor.execute("SELECT 1", &[]), Err(IfxError::CursorInactive)));
        assert!(matches!(cursor.fetch_one(), Err(IfxError::CursorInactive)));
        assert!(matches!(cursor.fetch_all(), Err(IfxError::CursorInactive)));
        assert!(matches!(cursor.row_count(), Err(IfxError::CursorInactive)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor::default();
        let calls = raw.calls.clone();
        let mut cursor = Cursor::new(Box::new(raw), &codec, &dialect);

        cursor.close().unwrap();
        cursor.close().unwrap();
        drop(cursor);
        assert_eq!(*calls.lock(), vec![Call::Close]);
    }

    #[test]
    fn test_drop_closes_handle() {
        let (codec, dialect) = (codec(), InformixDialect::new());
        let raw = ScriptedCursor::default();
        let calls = raw.calls.clone();
        drop(Cursor::new(Box::new(raw), &codec, &dialect));
        assert_eq!(*calls.lock(), vec![Call::Close]);
    }
}
