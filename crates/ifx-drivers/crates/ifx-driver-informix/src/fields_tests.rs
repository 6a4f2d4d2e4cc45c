//! Tests for field type conversions

use super::*;
use chrono::{NaiveDate, NaiveTime};
use ifx_core::{IfxError, Value};

fn datetime(text: &str) -> chrono::NaiveDateTime {
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").unwrap()
}

mod column_type_tests {
    use super::*;

    #[test]
    fn test_column_types() {
        assert_eq!(FieldType::Auto.column_type(), "serial");
        assert_eq!(FieldType::BigAuto.column_type(), "bigserial");
        assert_eq!(FieldType::Char { max_length: 100 }.column_type(), "lvarchar(100)");
        assert_eq!(FieldType::CharToBoolean.column_type(), "char(1)");
        assert_eq!(FieldType::DateTime.column_type(), "datetime year to fraction(5)");
        assert_eq!(FieldType::Time.column_type(), "datetime hour to second");
        assert_eq!(FieldType::Uuid.column_type(), "char(32)");
        assert_eq!(
            FieldType::Decimal {
                max_digits: 10,
                decimal_places: 2
            }
            .column_type(),
            "decimal"
        );
    }

    #[test]
    fn test_positive_types_get_check_constraint() {
        assert_eq!(
            FieldType::PositiveInteger.check_constraint("age"),
            Some("age >= 0".to_string())
        );
        assert_eq!(FieldType::Integer.check_constraint("age"), None);
    }
}

mod boolean_tests {
    use super::*;

    #[test]
    fn test_boolean_from_db() {
        let field = FieldType::Boolean;
        assert_eq!(field.from_db_value(Value::Int32(1)).unwrap(), Value::Bool(true));
        assert_eq!(field.from_db_value(Value::Int16(0)).unwrap(), Value::Bool(false));
        assert_eq!(field.from_db_value(Value::Int32(2)).unwrap(), Value::Null);
        assert_eq!(field.from_db_value(Value::String("t".into())).unwrap(), Value::Bool(true));
        assert_eq!(field.from_db_value(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_boolean_to_db() {
        let field = FieldType::NullBoolean;
        assert_eq!(field.to_db_value(Value::Bool(true)).unwrap(), Value::Int32(1));
        assert_eq!(field.to_db_value(Value::Bool(false)).unwrap(), Value::Int32(0));
        assert_eq!(field.to_db_value(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_yes_no_round_trip() {
        let field = FieldType::CharToBoolean;
        for flag in [true, false] {
            let stored = field.to_db_value(Value::Bool(flag)).unwrap();
            assert_eq!(stored, Value::String(if flag { "Y" } else { "N" }.into()));
            assert_eq!(field.from_db_value(stored).unwrap(), Value::Bool(flag));
        }
        assert_eq!(field.from_db_value(Value::String("?".into())).unwrap(), Value::Null);
    }
}

mod text_tests {
    use super::*;

    #[test]
    fn test_trim_char_strips_trailing_blanks() {
        let field = FieldType::TrimChar { max_length: 10 };
        assert_eq!(
            field.from_db_value(Value::String("  abc   ".into())).unwrap(),
            Value::String("  abc".into())
        );
    }

    #[test]
    fn test_plain_char_is_untouched() {
        let field = FieldType::Char { max_length: 10 };
        assert_eq!(
            field.from_db_value(Value::String("abc   ".into())).unwrap(),
            Value::String("abc   ".into())
        );
    }
}

mod decimal_tests {
    use super::*;

    fn decimal(max_digits: u32, decimal_places: u32) -> FieldType {
        FieldType::Decimal {
            max_digits,
            decimal_places,
        }
    }

    #[test]
    fn test_rounds_to_decimal_places() {
        assert_eq!(
            decimal(5, 2).from_db_value(Value::String("3.14159".into())).unwrap(),
            Value::Decimal("3.14".into())
        );
    }

    #[test]
    fn test_pads_to_decimal_places() {
        assert_eq!(
            decimal(4, 2).from_db_value(Value::Float64(2.5)).unwrap(),
            Value::Decimal("2.50".into())
        );
        assert_eq!(
            decimal(5, 2).from_db_value(Value::Int32(7)).unwrap(),
            Value::Decimal("7.00".into())
        );
    }

    #[test]
    fn test_fractional_value_has_no_integer_digits() {
        assert_eq!(normalize_decimal(&Value::Decimal("-0.5".into()), 2, 2).unwrap(), "-0.50");
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = decimal(5, 2)
            .from_db_value(Value::String("12345.6".into()))
            .unwrap_err();
        assert!(matches!(err, IfxError::Conversion(_)));
    }

    #[test]
    fn test_non_numeric_is_an_error() {
        assert!(normalize_decimal(&Value::String("abc".into()), 5, 2).is_err());
    }
}

mod temporal_tests {
    use super::*;

    #[test]
    fn test_date_parsed_from_text() {
        assert_eq!(
            FieldType::Date
                .from_db_value(Value::String("2016-05-23".into()))
                .unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2016, 5, 23).unwrap())
        );
    }

    #[test]
    fn test_temporal_values_pass_through() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(FieldType::Date.from_db_value(date.clone()).unwrap(), date);
    }

    #[test]
    fn test_datetime_parsed_from_text() {
        assert_eq!(
            FieldType::DateTime
                .from_db_value(Value::String("2016-05-23 12:26:56.11190".into()))
                .unwrap(),
            Value::DateTime(datetime("2016-05-23 12:26:56.111900"))
        );
    }

    #[test]
    fn test_time_parsed_from_text() {
        assert_eq!(
            FieldType::Time
                .from_db_value(Value::String("08:30:00".into()))
                .unwrap(),
            Value::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_date_is_an_error() {
        assert!(FieldType::Date.from_db_value(Value::String("yesterday".into())).is_err());
    }

    #[test]
    fn test_adapt_datetime_truncates_to_five_digits() {
        assert_eq!(
            adapt_datetime(&datetime("2016-05-23 12:26:56.111909")),
            "2016-05-23 12:26:56.11190"
        );
        assert_eq!(
            FieldType::DateTime
                .to_db_value(Value::DateTime(datetime("2016-05-23 12:26:56.000000")))
                .unwrap(),
            Value::String("2016-05-23 12:26:56.00000".into())
        );
    }
}

mod uuid_tests {
    use super::*;

    #[test]
    fn test_uuid_from_canonical_and_simple_text() {
        let id = uuid::Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            FieldType::Uuid
                .from_db_value(Value::String("550e8400-e29b-41d4-a716-446655440000".into()))
                .unwrap(),
            Value::Uuid(id)
        );
        assert_eq!(
            FieldType::Uuid
                .from_db_value(Value::String("550e8400e29b41d4a716446655440000".into()))
                .unwrap(),
            Value::Uuid(id)
        );
    }

    #[test]
    fn test_uuid_stored_as_hex() {
        let id = uuid::Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            FieldType::Uuid.to_db_value(Value::Uuid(id)).unwrap(),
            Value::String("550e8400e29b41d4a716446655440000".into())
        );
    }
}
