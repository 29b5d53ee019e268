//! Scalar coercion from loosely-typed string forms.

use crate::error::ValidationError;
use crate::kind::Kind;
use thiserror::Error;

/// A string that is not one of the recognised boolean tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid boolean value: {0}")]
pub struct InvalidBoolean(pub String);

/// Parse a boolean token, ignoring case and surrounding whitespace.
///
/// Truthy: `yes`, `true`, `1`, `y`, `on`. Falsy: `no`, `false`, `0`, `n`, `off`.
pub fn coerce_boolean(text: &str) -> Result<bool, InvalidBoolean> {
    let token = text.trim().to_lowercase();
    match token.as_str() {
        "yes" | "true" | "1" | "y" | "on" => Ok(true),
        "no" | "false" | "0" | "n" | "off" => Ok(false),
        _ => Err(InvalidBoolean(token)),
    }
}

/// Parse a base-10 integer for `field`.
pub fn parse_integer(field: &str, text: &str) -> Result<i64, ValidationError> {
    text.parse::<i64>()
        .map_err(|_| ValidationError::InvalidNumber {
            field: field.to_owned(),
            value: text.to_owned(),
            expected: Kind::Integer,
        })
}

/// Parse a finite float for `field`. Infinities and NaN cannot be carried
/// by JSON and are rejected.
pub fn parse_float(field: &str, text: &str) -> Result<f64, ValidationError> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::InvalidNumber {
            field: field.to_owned(),
            value: text.to_owned(),
            expected: Kind::Float,
        }),
    }
}

/// Split a comma-separated string into trimmed segments.
///
/// An empty string yields an empty list. Embedded commas cannot be escaped.
pub fn split_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',').map(|s| s.trim().to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_tokens() {
        for t in ["yes", "TRUE", " 1 ", "Y", "On", "\ttrue\n"] {
            assert!(coerce_boolean(t).unwrap(), "{t:?} should be true");
        }
    }

    #[test]
    fn falsy_tokens() {
        for t in ["no", "False", "0", " n ", "OFF"] {
            assert!(!coerce_boolean(t).unwrap(), "{t:?} should be false");
        }
    }

    #[test]
    fn rejects_other_tokens() {
        for t in ["", "maybe", "2", "tru", "yes please"] {
            assert!(coerce_boolean(t).is_err(), "{t:?} should be rejected");
        }
    }

    #[test]
    fn integer_parse_errors_name_field() {
        let err = parse_integer("count", "12x").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidNumber { ref field, .. } if field == "count"
        ));
        assert_eq!(parse_integer("count", "-42").unwrap(), -42);
    }

    #[test]
    fn float_rejects_non_finite() {
        assert!(parse_float("ratio", "inf").is_err());
        assert!(parse_float("ratio", "NaN").is_err());
        assert!((parse_float("ratio", "0.25").unwrap() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn split_list_trims_and_handles_empty() {
        assert_eq!(split_list("a, b ,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
        assert_eq!(split_list(" "), vec![""]);
    }
}
