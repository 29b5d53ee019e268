use crate::coerce::{coerce_boolean, split_list};
use crate::error::ValidationError;
use crate::kind::{canonical_string, type_name, Kind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Canonical mapping of parameter name to value for one invocation.
///
/// Unknown keys supplied by the caller are kept as-is; only declared fields
/// are coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, Value>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> Result<&Value, ValidationError> {
        self.values
            .get(name)
            .ok_or_else(|| ValidationError::ParameterNotFound(name.to_owned()))
    }

    /// Boolean parameter; string forms are parsed with the boolean coercer.
    pub fn get_bool(&self, name: &str) -> Result<bool, ValidationError> {
        match self.require(name)? {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => coerce_boolean(s).map_err(|source| ValidationError::InvalidBoolean {
                field: name.to_owned(),
                source,
            }),
            other => Err(ValidationError::TypeMismatch {
                field: name.to_owned(),
                expected: Kind::Boolean,
                found: type_name(other),
            }),
        }
    }

    /// Integer parameter; floats are truncated and strings parsed base-10.
    pub fn get_int(&self, name: &str) -> Result<i64, ValidationError> {
        let value = self.require(name)?;
        let mismatch = || ValidationError::TypeMismatch {
            field: name.to_owned(),
            expected: Kind::Integer,
            found: type_name(value),
        };
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(mismatch),
            Value::String(s) => crate::coerce::parse_integer(name, s),
            _ => Err(mismatch()),
        }
    }

    /// Canonical string form of any parameter.
    pub fn get_str(&self, name: &str) -> Result<String, ValidationError> {
        self.require(name).map(canonical_string)
    }

    /// List parameter rendered as strings; a plain string is comma-split.
    pub fn get_string_list(&self, name: &str) -> Result<Vec<String>, ValidationError> {
        match self.require(name)? {
            Value::Array(items) => Ok(items.iter().map(canonical_string).collect()),
            Value::String(s) => Ok(split_list(s)),
            other => Err(ValidationError::TypeMismatch {
                field: name.to_owned(),
                expected: Kind::List,
                found: type_name(other),
            }),
        }
    }

    /// Optional string parameter: `None` when absent or null.
    pub fn opt_str(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            None | Some(Value::Null) => None,
            Some(v) => Some(canonical_string(v)),
        }
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

impl From<ParameterSet> for Map<String, Value> {
    fn from(params: ParameterSet) -> Self {
        params.values.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
