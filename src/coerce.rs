//! Coercion of loosely-typed request values into typed fields.
//!
//! Every lossy or failing conversion lives here so the rules can be audited
//! in one place. Failing conversions produce `HumidorError::Validation`.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{HumidorError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Boolean `true` and the string `"true"` are true. Everything else is false.
pub fn parse_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

/// Integer field where null and the empty string mean "no value".
pub fn parse_optional_int(field: &str, value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid_integer(field, s)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(invalid_integer(field, &n.to_string())),
            }
        }
        other => Err(invalid_integer(field, &other.to_string())),
    }
}

fn invalid_integer(field: &str, raw: &str) -> HumidorError {
    HumidorError::validation(format!("invalid integer for '{}': '{}'", field, raw))
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| HumidorError::validation("invalid date format"))
}

/// Record identifier. Absent, null, empty, `false` and `0` all mean "not
/// supplied"; anything else must be a positive integer.
pub fn parse_identifier(field: &str, value: Option<&Value>) -> Result<Option<i64>> {
    let invalid = |raw: String| HumidorError::validation(format!("invalid {}: '{}'", field, raw));
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(0) => Ok(None),
            Ok(id) if id > 0 => Ok(Some(id)),
            _ => Err(invalid(s.clone())),
        },
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(None),
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(invalid(n.to_string())),
        },
        Some(other) => Err(invalid(other.to_string())),
    }
}

/// Free text. Null clears the field; scalars are stringified.
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_boolean_domain() {
        assert!(parse_boolean(&json!(true)));
        assert!(parse_boolean(&json!("true")));
        assert!(!parse_boolean(&json!(false)));
        assert!(!parse_boolean(&json!("false")));
        assert!(!parse_boolean(&json!("True")));
        assert!(!parse_boolean(&json!("on")));
        assert!(!parse_boolean(&json!(1)));
        assert!(!parse_boolean(&Value::Null));
    }

    #[test]
    fn test_parse_optional_int() {
        assert_eq!(parse_optional_int("nota", &json!("8")).unwrap(), Some(8));
        assert_eq!(parse_optional_int("nota", &json!(" 9 ")).unwrap(), Some(9));
        assert_eq!(parse_optional_int("nota", &json!(7)).unwrap(), Some(7));
        assert_eq!(parse_optional_int("nota", &json!(6.0)).unwrap(), Some(6));
        assert_eq!(parse_optional_int("nota", &json!("")).unwrap(), None);
        assert_eq!(parse_optional_int("nota", &Value::Null).unwrap(), None);
    }

    #[test]
    fn test_parse_optional_int_rejects_garbage() {
        let err = parse_optional_int("duracao_minutos", &json!("forty")).unwrap_err();
        assert!(matches!(err, HumidorError::Validation(_)));
        assert!(err.to_string().contains("duracao_minutos"));

        assert!(parse_optional_int("nota", &json!(7.5)).is_err());
        assert!(parse_optional_int("nota", &json!(true)).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let err = parse_date("2024-13-01").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: invalid date format");
        assert!(parse_date("01/02/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("charuto_id", Some(&json!(3))).unwrap(), Some(3));
        assert_eq!(parse_identifier("charuto_id", Some(&json!("12"))).unwrap(), Some(12));
        assert_eq!(parse_identifier("charuto_id", None).unwrap(), None);
        assert_eq!(parse_identifier("charuto_id", Some(&json!(""))).unwrap(), None);
        assert_eq!(parse_identifier("charuto_id", Some(&json!(0))).unwrap(), None);
        assert!(parse_identifier("charuto_id", Some(&json!("abc"))).is_err());
        assert!(parse_identifier("charuto_id", Some(&json!(-4))).is_err());
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text(&json!("reto")), Some("reto".to_string()));
        assert_eq!(parse_text(&json!("")), Some(String::new()));
        assert_eq!(parse_text(&Value::Null), None);
        assert_eq!(parse_text(&json!(5)), Some("5".to_string()));
    }
}
