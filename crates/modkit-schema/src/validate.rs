use crate::constraints::ConstraintSet;
use crate::error::ValidationError;
use crate::field::validate_field;
use crate::params::ParameterSet;
use crate::spec::Schema;
use tracing::debug;

/// Validate `params` against `schema` and `constraints`, coercing declared
/// fields in place.
///
/// Checks run in a fixed order and stop at the first violation:
/// per-field validation, mutually exclusive groups, required-together groups,
/// required-one-of groups, then conditional requirements.
pub fn validate_all(
    params: &mut ParameterSet,
    schema: &Schema,
    constraints: &ConstraintSet,
) -> Result<(), ValidationError> {
    let result = check_all(params, schema, constraints);
    if let Err(e) = &result {
        debug!("argument validation failed ({}): {e}", e.kind());
    }
    result
}

fn check_all(
    params: &mut ParameterSet,
    schema: &Schema,
    constraints: &ConstraintSet,
) -> Result<(), ValidationError> {
    for (name, spec) in schema.iter() {
        match params.get(name) {
            Some(value) => {
                let coerced = validate_field(name, value, spec)?;
                params.insert(name, coerced);
            }
            None if spec.required => {
                return Err(ValidationError::MissingRequired {
                    field: name.to_owned(),
                });
            }
            None => {}
        }
    }

    let present = |group: &[String]| group.iter().filter(|n| params.contains(n)).count();

    for group in &constraints.mutually_exclusive {
        if present(group) > 1 {
            return Err(ValidationError::MutuallyExclusiveViolation {
                group: group.clone(),
            });
        }
    }

    for group in &constraints.required_together {
        let count = present(group);
        if count > 0 && count < group.len() {
            return Err(ValidationError::RequiredTogetherViolation {
                group: group.clone(),
            });
        }
    }

    for group in &constraints.required_one_of {
        if present(group) == 0 {
            return Err(ValidationError::RequiredOneViolation {
                group: group.clone(),
            });
        }
    }

    for condition in &constraints.required_if {
        if params.get(&condition.field) != Some(&condition.value) {
            continue;
        }
        if let Some(missing) = condition.requirements.iter().find(|r| !params.contains(r)) {
            return Err(ValidationError::ConditionalRequiredViolation {
                missing: missing.clone(),
                trigger: condition.field.clone(),
                value: condition.value.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldSpec;
    use serde_json::{json, Value};

    fn params(v: Value) -> ParameterSet {
        match v {
            Value::Object(m) => m.into(),
            _ => unreachable!("test input must be an object"),
        }
    }

    #[test]
    fn missing_required_is_reported_first() {
        let schema = Schema::new().field("name", FieldSpec::string().required());
        let constraints = ConstraintSet::new().required_one_of(&["x", "y"]);
        let mut p = params(json!({}));
        let err = validate_all(&mut p, &schema, &constraints).unwrap_err();
        assert!(matches!(err, ValidationError::MissingRequired { ref field } if field == "name"));
    }

    #[test]
    fn coerced_values_are_written_back() {
        let schema = Schema::new()
            .field("force", FieldSpec::boolean())
            .field("port", FieldSpec::integer());
        let mut p = params(json!({"force": "yes", "port": "22"}));
        validate_all(&mut p, &schema, &ConstraintSet::new()).unwrap();
        assert_eq!(p.get("force"), Some(&json!(true)));
        assert_eq!(p.get("port"), Some(&json!(22)));
    }

    #[test]
    fn field_errors_come_before_constraint_errors() {
        let schema = Schema::new().field("a", FieldSpec::integer());
        let constraints = ConstraintSet::new().mutually_exclusive(&["a", "b"]);
        let mut p = params(json!({"a": "nope", "b": 1}));
        let err = validate_all(&mut p, &schema, &constraints).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidNumber { .. }));
    }

    #[test]
    fn first_violating_group_in_declaration_order_wins() {
        let constraints = ConstraintSet::new()
            .mutually_exclusive(&["a", "b"])
            .mutually_exclusive(&["c", "d"]);
        let mut p = params(json!({"a": 1, "b": 1, "c": 1, "d": 1}));
        let err = validate_all(&mut p, &Schema::new(), &constraints).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MutuallyExclusiveViolation { ref group } if group == &["a", "b"]
        ));
    }

    #[test]
    fn required_together_all_or_nothing() {
        let constraints = ConstraintSet::new().required_together(&["user", "password"]);
        assert!(validate_all(&mut params(json!({})), &Schema::new(), &constraints).is_ok());
        assert!(validate_all(
            &mut params(json!({"user": "u", "password": "p"})),
            &Schema::new(),
            &constraints
        )
        .is_ok());
        assert!(matches!(
            validate_all(&mut params(json!({"user": "u"})), &Schema::new(), &constraints),
            Err(ValidationError::RequiredTogetherViolation { .. })
        ));
    }

    #[test]
    fn required_if_uses_deep_equality() {
        let constraints =
            ConstraintSet::new().required_if("opts", json!({"mode": "x"}), &["target"]);
        let mut p = params(json!({"opts": {"mode": "x"}}));
        assert!(matches!(
            validate_all(&mut p, &Schema::new(), &constraints),
            Err(ValidationError::ConditionalRequiredViolation { .. })
        ));
        let mut p = params(json!({"opts": {"mode": "y"}}));
        assert!(validate_all(&mut p, &Schema::new(), &constraints).is_ok());
    }

    #[test]
    fn required_if_compares_coerced_value() {
        let schema = Schema::new().field("force", FieldSpec::boolean());
        let constraints = ConstraintSet::new().required_if("force", true, &["reason"]);
        let mut p = params(json!({"force": "yes"}));
        let err = validate_all(&mut p, &schema, &constraints).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ConditionalRequiredViolation { ref missing, .. } if missing == "reason"
        ));
    }
}
