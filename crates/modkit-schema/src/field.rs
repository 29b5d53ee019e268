//! Validation and coercion of a single value against a [`FieldSpec`].

use crate::coerce::{coerce_boolean, parse_float, parse_integer, split_list};
use crate::error::ValidationError;
use crate::kind::{canonical_string, type_name, Kind};
use crate::spec::FieldSpec;
use serde_json::{Map, Number, Value};

/// Validate `value` against `spec` and return the coerced value.
///
/// `name` is the qualified field name used in errors: nested object fields
/// are reported as `parent.child` and list elements as `field[2]`. Coerced
/// values of nested fields and list elements are written back into the
/// returned structure, and absent sub-fields with a default receive it.
pub fn validate_field(name: &str, value: &Value, spec: &FieldSpec) -> Result<Value, ValidationError> {
    let coerced = coerce_kind(name, value, spec.kind)?;

    if !spec.choices.is_empty() {
        let rendered = canonical_string(&coerced);
        if !spec.choices.iter().any(|c| *c == rendered) {
            return Err(ValidationError::InvalidChoice {
                field: name.to_owned(),
                value: rendered,
                choices: spec.choices.clone(),
            });
        }
    }

    match coerced {
        Value::Object(map) if spec.kind == Kind::Object && !spec.fields.is_empty() => {
            validate_object(name, map, spec).map(Value::Object)
        }
        Value::Array(items) if spec.kind == Kind::List => match spec.element_kind {
            Some(element_kind) => validate_elements(name, &items, element_kind).map(Value::Array),
            None => Ok(Value::Array(items)),
        },
        other => Ok(other),
    }
}

fn validate_object(
    name: &str,
    mut map: Map<String, Value>,
    spec: &FieldSpec,
) -> Result<Map<String, Value>, ValidationError> {
    for (sub_name, sub_spec) in spec.fields.iter() {
        let path = format!("{name}.{sub_name}");
        match map.get(sub_name) {
            Some(sub_value) => {
                let coerced = validate_field(&path, sub_value, sub_spec)?;
                map.insert(sub_name.to_owned(), coerced);
            }
            None if sub_spec.required => {
                return Err(ValidationError::MissingRequiredField { path });
            }
            None => {
                if let Some(default) = &sub_spec.default {
                    let filled = validate_field(&path, default, sub_spec)?;
                    map.insert(sub_name.to_owned(), filled);
                }
            }
        }
    }
    Ok(map)
}

fn validate_elements(
    name: &str,
    items: &[Value],
    element_kind: Kind,
) -> Result<Vec<Value>, ValidationError> {
    let element_spec = FieldSpec::new(element_kind);
    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_field(&format!("{name}[{i}]"), item, &element_spec))
        .collect()
}

fn coerce_kind(name: &str, value: &Value, kind: Kind) -> Result<Value, ValidationError> {
    let mismatch = || ValidationError::TypeMismatch {
        field: name.to_owned(),
        expected: kind,
        found: type_name(value),
    };

    match (kind, value) {
        (Kind::Raw, v) => Ok(v.clone()),

        (Kind::String | Kind::Path, Value::String(_)) => Ok(value.clone()),
        (Kind::String | Kind::Path, _) => Err(mismatch()),

        (Kind::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (Kind::Boolean, Value::String(s)) => coerce_boolean(s)
            .map(Value::Bool)
            .map_err(|source| ValidationError::InvalidBoolean {
                field: name.to_owned(),
                source,
            }),
        (Kind::Boolean, _) => Err(mismatch()),

        (Kind::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return Ok(value.clone());
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(mismatch()),
            }
        }
        (Kind::Integer, Value::String(s)) => parse_integer(name, s).map(Value::from),
        (Kind::Integer, _) => Err(mismatch()),

        (Kind::Float, Value::Number(n)) => {
            if n.is_f64() {
                return Ok(value.clone());
            }
            n.as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(mismatch)
        }
        (Kind::Float, Value::String(s)) => {
            let f = parse_float(name, s)?;
            Number::from_f64(f).map(Value::Number).ok_or_else(mismatch)
        }
        (Kind::Float, _) => Err(mismatch()),

        (Kind::List, Value::Array(_)) => Ok(value.clone()),
        (Kind::List, Value::String(s)) => Ok(Value::Array(
            split_list(s).into_iter().map(Value::String).collect(),
        )),
        (Kind::List, _) => Err(mismatch()),

        (Kind::Object, Value::Object(_)) => Ok(value.clone()),
        (Kind::Object, _) => Err(mismatch()),
    }
}
