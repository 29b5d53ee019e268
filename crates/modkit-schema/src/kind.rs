use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The type a parameter value must satisfy after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[serde(alias = "str")]
    String,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "int")]
    Integer,
    Float,
    #[serde(alias = "array")]
    List,
    #[serde(alias = "dict", alias = "map")]
    Object,
    Path,
    /// No type check; any value is accepted as supplied.
    #[default]
    #[serde(alias = "any")]
    Raw,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::List => "list",
            Kind::Object => "object",
            Kind::Path => "path",
            Kind::Raw => "raw",
        }
    }

    /// Kinds whose values are single JSON scalars.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Kind::String | Kind::Boolean | Kind::Integer | Kind::Float | Kind::Path
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(Kind::String),
            "boolean" | "bool" => Ok(Kind::Boolean),
            "integer" | "int" => Ok(Kind::Integer),
            "float" => Ok(Kind::Float),
            "list" | "array" => Ok(Kind::List),
            "object" | "dict" | "map" => Ok(Kind::Object),
            "path" => Ok(Kind::Path),
            "raw" | "any" | "" => Ok(Kind::Raw),
            other => Err(format!("unknown argument type '{other}'")),
        }
    }
}

/// Name of a value's JSON variant, for type mismatch messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Canonical string form of a value, used for choice matching and for
/// string-typed parameter access.
///
/// Strings render without quotes; everything else renders as compact JSON.
pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
