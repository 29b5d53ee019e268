use crate::coerce::InvalidBoolean;
use crate::kind::Kind;
use serde_json::Value;
use thiserror::Error;

/// Every way a parameter mapping can be rejected.
///
/// Validation is fail-fast: the first violation found is returned and nothing
/// is accumulated.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required argument: {field}")]
    MissingRequired { field: String },
    #[error("{field} must be of type {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: Kind,
        found: &'static str,
    },
    #[error("{field} must be one of: {}", choices.join(", "))]
    InvalidChoice {
        field: String,
        value: String,
        choices: Vec<String>,
    },
    #[error("{field} must be a boolean: {source}")]
    InvalidBoolean {
        field: String,
        #[source]
        source: InvalidBoolean,
    },
    #[error("{field} must be a number: '{value}' is not a valid {expected}")]
    InvalidNumber {
        field: String,
        value: String,
        expected: Kind,
    },
    #[error("parameters are mutually exclusive: {}", group.join(", "))]
    MutuallyExclusiveViolation { group: Vec<String> },
    #[error("parameters must be specified together: {}", group.join(", "))]
    RequiredTogetherViolation { group: Vec<String> },
    #[error("one of the following is required: {}", group.join(", "))]
    RequiredOneViolation { group: Vec<String> },
    #[error("{missing} is required when {trigger}={value}")]
    ConditionalRequiredViolation {
        missing: String,
        trigger: String,
        value: Value,
    },
    #[error("{path} is required")]
    MissingRequiredField { path: String },
    #[error("invalid argument spec for '{field}': {reason}")]
    InvalidSpec { field: String, reason: String },
    #[error("parameter {0} not found")]
    ParameterNotFound(String),
}

impl ValidationError {
    /// Stable short name of the violation, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequired { .. } => "missing_required",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::InvalidChoice { .. } => "invalid_choice",
            Self::InvalidBoolean { .. } => "invalid_boolean",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::MutuallyExclusiveViolation { .. } => "mutually_exclusive",
            Self::RequiredTogetherViolation { .. } => "required_together",
            Self::RequiredOneViolation { .. } => "required_one_of",
            Self::ConditionalRequiredViolation { .. } => "required_if",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::InvalidSpec { .. } => "invalid_spec",
            Self::ParameterNotFound(_) => "parameter_not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mutually_exclusive_names_group() {
        let e = ValidationError::MutuallyExclusiveViolation {
            group: vec!["src".to_owned(), "content".to_owned()],
        };
        assert_eq!(
            e.to_string(),
            "parameters are mutually exclusive: src, content"
        );
    }

    #[test]
    fn display_conditional_names_all_parts() {
        let e = ValidationError::ConditionalRequiredViolation {
            missing: "a".to_owned(),
            trigger: "mode".to_owned(),
            value: Value::from("advanced"),
        };
        let msg = e.to_string();
        assert!(msg.contains("a is required"));
        assert!(msg.contains("mode"));
        assert!(msg.contains("advanced"));
    }

    #[test]
    fn display_invalid_choice_lists_choices() {
        let e = ValidationError::InvalidChoice {
            field: "state".to_owned(),
            value: "gone".to_owned(),
            choices: vec!["present".to_owned(), "absent".to_owned()],
        };
        assert_eq!(e.to_string(), "state must be one of: present, absent");
    }

    #[test]
    fn kind_is_stable() {
        let e = ValidationError::MissingRequiredField {
            path: "opts.name".to_owned(),
        };
        assert_eq!(e.kind(), "missing_required_field");
        assert!(e.to_string().contains("opts.name"));
    }
}
