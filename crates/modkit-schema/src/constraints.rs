use serde::{Deserialize, Serialize};
use serde_json::Value;

/// When `field` resolves to `value`, every name in `requirements` must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredIf {
    pub field: String,
    pub value: Value,
    pub requirements: Vec<String>,
}

/// Cross-field constraints evaluated after per-field validation.
///
/// Groups of each kind are checked in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    #[serde(default)]
    pub mutually_exclusive: Vec<Vec<String>>,
    #[serde(default)]
    pub required_together: Vec<Vec<String>>,
    #[serde(default)]
    pub required_one_of: Vec<Vec<String>>,
    #[serde(default)]
    pub required_if: Vec<RequiredIf>,
}

fn group(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mutually_exclusive(mut self, names: &[&str]) -> Self {
        self.mutually_exclusive.push(group(names));
        self
    }

    #[must_use]
    pub fn required_together(mut self, names: &[&str]) -> Self {
        self.required_together.push(group(names));
        self
    }

    #[must_use]
    pub fn required_one_of(mut self, names: &[&str]) -> Self {
        self.required_one_of.push(group(names));
        self
    }

    #[must_use]
    pub fn required_if(mut self, field: &str, value: impl Into<Value>, requirements: &[&str]) -> Self {
        self.required_if.push(RequiredIf {
            field: field.to_owned(),
            value: value.into(),
            requirements: group(requirements),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mutually_exclusive.is_empty()
            && self.required_together.is_empty()
            && self.required_one_of.is_empty()
            && self.required_if.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_preserves_declaration_order() {
        let c = ConstraintSet::new()
            .mutually_exclusive(&["a", "b"])
            .mutually_exclusive(&["c", "d"])
            .required_if("state", "link", &["src"]);
        assert_eq!(c.mutually_exclusive[0], vec!["a", "b"]);
        assert_eq!(c.mutually_exclusive[1], vec!["c", "d"]);
        assert_eq!(c.required_if[0].value, json!("link"));
        assert!(!c.is_empty());
        assert!(ConstraintSet::new().is_empty());
    }

    #[test]
    fn deserializes_with_missing_lists() {
        let c: ConstraintSet =
            serde_json::from_str(r#"{"required_one_of": [["src", "content"]]}"#).unwrap();
        assert_eq!(c.required_one_of.len(), 1);
        assert!(c.mutually_exclusive.is_empty());
    }
}
