use crate::error::ValidationError;
use crate::kind::Kind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Declarative description of one accepted parameter.
///
/// Built either with the chained constructors below or deserialized from a
/// JSON argument spec (`type`, `elements`, `options` and `no_log` are the
/// wire names).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Kind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, rename = "no_log", alias = "sensitive")]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(
        default,
        rename = "elements",
        alias = "element_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub element_kind: Option<Kind>,
    #[serde(
        default,
        rename = "options",
        alias = "fields",
        skip_serializing_if = "Schema::is_empty"
    )]
    pub fields: Schema,
    /// Version in which the parameter goes away; supplying it is deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_in_version: Option<String>,
}

impl FieldSpec {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(Kind::Integer)
    }

    pub fn float() -> Self {
        Self::new(Kind::Float)
    }

    pub fn path() -> Self {
        Self::new(Kind::Path)
    }

    pub fn list(elements: Kind) -> Self {
        Self {
            kind: Kind::List,
            element_kind: Some(elements),
            ..Self::default()
        }
    }

    pub fn object() -> Self {
        Self::new(Kind::Object)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_owned());
        self
    }

    #[must_use]
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name, spec);
        self
    }

    #[must_use]
    pub fn removed_in(mut self, version: &str) -> Self {
        self.removed_in_version = Some(version.to_owned());
        self
    }

    fn check(&self, name: &str) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidSpec {
            field: name.to_owned(),
            reason: reason.to_owned(),
        };
        if self.element_kind.is_some() && self.kind != Kind::List {
            return Err(invalid("element type is only allowed on list fields"));
        }
        if !self.fields.is_empty() && self.kind != Kind::Object {
            return Err(invalid("sub-fields are only allowed on object fields"));
        }
        if self.required && self.default.is_some() {
            return Err(invalid("a required field cannot carry a default"));
        }
        for (sub_name, sub_spec) in self.fields.iter() {
            sub_spec.check(&format!("{name}.{sub_name}"))?;
        }
        Ok(())
    }
}

/// Mapping of field name to [`FieldSpec`]. Iteration is in sorted name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema from a JSON argument spec document.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    #[must_use]
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn insert(&mut self, name: &str, spec: FieldSpec) {
        self.fields.insert(name.to_owned(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Alias name to canonical name, for top-level fields.
    pub fn alias_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (name, spec) in &self.fields {
            for alias in &spec.aliases {
                map.insert(alias.clone(), name.clone());
            }
        }
        map
    }

    /// Names of top-level fields whose values must never be echoed.
    pub fn sensitive_fields(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.sensitive)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Verify the structural invariants of every field, including nested ones,
    /// and that aliases are unambiguous.
    pub fn check(&self) -> Result<(), ValidationError> {
        let mut seen_aliases = BTreeSet::new();
        for (name, spec) in &self.fields {
            spec.check(name)?;
            for alias in &spec.aliases {
                if self.fields.contains_key(alias) {
                    return Err(ValidationError::InvalidSpec {
                        field: name.clone(),
                        reason: format!("alias '{alias}' shadows another field"),
                    });
                }
                if !seen_aliases.insert(alias.as_str()) {
                    return Err(ValidationError::InvalidSpec {
                        field: name.clone(),
                        reason: format!("alias '{alias}' is declared more than once"),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, FieldSpec)> for Schema {
    fn from_iter<T: IntoIterator<Item = (S, FieldSpec)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
