//! Statement execution tests through a full connection.
//!
//! Checks what reaches the driver (rewritten placeholders, normalised
//! parameters) and what comes back (decoded character data).

use crate::fixtures::{Event, FakeCli, cli, connection};
use anyhow::{Context, Result};
use ifx_core::{CliError, ColumnDescription, IfxError, Value, sql_type};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn last_execute(cli: &FakeCli) -> Option<(String, Vec<Value>)> {
    cli.events().into_iter().rev().find_map(|event| match event {
        Event::Execute { sql, params } => Some((sql, params)),
        _ => None,
    })
}

fn titles(rows: &[&[u8]]) -> (Vec<ColumnDescription>, Vec<Vec<Value>>) {
    (
        vec![
            ColumnDescription::new("id", sql_type::INTEGER),
            ColumnDescription::new("title", sql_type::VARCHAR),
        ],
        rows.iter()
            .zip(1..)
            .map(|(raw, id)| vec![Value::Int32(id), Value::Bytes(raw.to_vec())])
            .collect(),
    )
}

/// Test that host placeholders are rewritten and booleans sent as integers
#[rstest]
fn test_parameters_reach_driver_normalised(cli: FakeCli) -> Result<()> {
    let (mut conn, _clock) = connection(&cli, json!({}))?;
    let mut cursor = conn.cursor()?;

    cursor.execute(
        "UPDATE book SET in_print = %s WHERE id = %s AND title = %s",
        &[Value::Bool(true), Value::Int32(7), Value::from("Dune")],
    )?;

    let (sql, params) = last_execute(&cli).context("statement not executed")?;
    assert_eq!(sql, "UPDATE book SET in_print = ? WHERE id = ? AND title = ?");
    assert_eq!(
        params,
        vec![Value::Int32(1), Value::Int32(7), Value::from("Dune")]
    );
    Ok(())
}

/// Test that batch parameters are normalised set by set
#[rstest]
fn test_execute_many(cli: FakeCli) -> Result<()> {
    let (mut conn, _clock) = connection(&cli, json!({}))?;
    let mut cursor = conn.cursor()?;

    cursor.execute_many(
        "INSERT INTO flags (on_off) VALUES (%s)",
        &[vec![Value::Bool(true)], vec![Value::Bool(false)]],
    )?;
    assert_eq!(cursor.last_params(), &[Value::Int32(0)]);
    drop(cursor);

    let batches: Vec<_> = cli
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::ExecuteMany { sql, param_sets } => Some((sql, param_sets)),
            _ => None,
        })
        .collect();
    assert_eq!(
        batches,
        vec![(
            "INSERT INTO flags (on_off) VALUES (?)".to_string(),
            vec![vec![Value::Int32(1)], vec![Value::Int32(0)]],
        )]
    );
    Ok(())
}

/// Test that character columns are decoded with the first encoding that fits
#[rstest]
#[case::utf8(b"Caf\xc3\xa9", "Café")]
#[case::cp1252(b"Caf\xe9 \x80", "Café €")]
#[case::latin1(b"\x81ber", "\u{81}ber")]
#[case::escaped_newline(br"line one\nline two", "line one\nline two")]
fn test_character_data_is_decoded(
    cli: FakeCli,
    #[case] raw: &[u8],
    #[case] expected: &str,
) -> Result<()> {
    let (description, rows) = titles(&[raw]);
    cli.respond("SELECT id, title", description, rows);
    let (mut conn, _clock) = connection(&cli, json!({}))?;
    let mut cursor = conn.cursor()?;

    cursor.execute("SELECT id, title FROM book", &[])?;
    let rows = cursor.fetch_all()?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_by_name("title"), Some(&Value::from(expected)));
    assert_eq!(rows[0].get_by_name("id"), Some(&Value::Int32(1)));
    Ok(())
}

/// Test that bytes no configured encoding accepts are reported
#[rstest]
fn test_undecodable_character_data(cli: FakeCli) -> Result<()> {
    let (description, rows) = titles(&[b"caf\xe9".as_slice()]);
    cli.respond("SELECT id, title", description, rows);
    let (mut conn, _clock) = connection(&cli, json!({"OPTIONS": {"encodings": ["utf-8", "ascii"]}}))?;
    let mut cursor = conn.cursor()?;

    cursor.execute("SELECT id, title FROM book", &[])?;
    let Err(err) = cursor.fetch_all() else {
        panic!("decoding should fail");
    };
    assert!(matches!(err, IfxError::Decode(_)));
    assert_eq!(
        err.to_string(),
        "Decode error: unable to decode 4 bytes using any of [utf-8, ascii]"
    );
    Ok(())
}

/// Test that a driver charset re-encodes text parameters and decodes results
#[rstest]
fn test_driver_charset(cli: FakeCli) -> Result<()> {
    let (description, rows) = titles(&[b"na\xefve".as_slice()]);
    cli.respond("SELECT id, title", description, rows);
    let (mut conn, _clock) = connection(
        &cli,
        json!({"OPTIONS": {"encodings": ["iso-8859-1"], "driver_charset": "cp1252"}}),
    )?;
    let mut cursor = conn.cursor()?;

    cursor.execute(
        "SELECT id, title FROM book WHERE title = %s",
        &[Value::from("naïve")],
    )?;
    let (_, params) = last_execute(&cli).context("statement not executed")?;
    assert_eq!(params, vec![Value::Bytes(b"na\xefve".to_vec())]);

    let row = cursor.fetch_one()?.context("expected a row")?;
    assert_eq!(row[1], Value::from("naïve"));
    Ok(())
}

/// Test that fetching one row consumes every pending result set
#[rstest]
fn test_fetch_one_drains_result_sets(cli: FakeCli) -> Result<()> {
    let (description, rows) = titles(&[b"first".as_slice(), b"second".as_slice()]);
    cli.respond("SELECT id, title", description, rows).trailing_sets(2);
    let (mut conn, _clock) = connection(&cli, json!({}))?;
    let mut cursor = conn.cursor()?;

    cursor.execute("SELECT id, title FROM book", &[])?;
    let row = cursor.fetch_one()?.context("expected a row")?;

    assert_eq!(row[1], Value::from("first"));
    assert_eq!(cli.count(|e| *e == Event::NextSet), 3);
    Ok(())
}

/// Test that driver errors surface with their native code and keep the connection
#[rstest]
fn test_statement_error(cli: FakeCli) -> Result<()> {
    cli.fail_statement(
        "INSERT INTO book",
        CliError::new("23000", "Unique constraint (informix.u_isbn) violated. (-268)"),
    );
    let (mut conn, _clock) = connection(&cli, json!({}))?;

    let result = {
        let mut cursor = conn.cursor()?;
        cursor.execute("INSERT INTO book (isbn) VALUES (%s)", &[Value::from("123")])
    };
    let Err(err) = result else {
        panic!("insert should fail");
    };
    assert!(matches!(err, IfxError::Database(_)));
    assert_eq!(err.native_code(), Some(-268));
    assert!(conn.is_connected());
    Ok(())
}

/// Test that the configured collation is applied to pattern operators
#[rstest]
#[case::no_collation(json!({}), "LIKE %s ESCAPE '\\'")]
#[case::collation(
    json!({"OPTIONS": {"collation": "en_US.819"}}),
    "LIKE %s ESCAPE '\\' COLLATE en_US.819"
)]
fn test_collation_from_settings(
    cli: FakeCli,
    #[case] overrides: serde_json::Value,
    #[case] expected: &str,
) -> Result<()> {
    let (conn, _clock) = connection(&cli, overrides)?;
    assert_eq!(conn.dialect().operator("contains").as_deref(), Some(expected));
    Ok(())
}
