pub mod append;
pub mod command;
pub mod copy;
pub mod file;
pub mod replace;
pub mod stat;

use modkit_core::{CoreError, Module, ModuleOptions, ModuleResult};
use modkit_fs::{exists, permission_bits, MutationOutcome};
use modkit_schema::{kind::type_name, ConstraintSet, Kind, ParameterSet, Schema, ValidationError};
use serde_json::Value;
use std::path::Path;

/// Everything the host needs to run one module.
pub struct Definition {
    pub schema: Schema,
    pub constraints: ConstraintSet,
    pub options: ModuleOptions,
    pub body: fn(&mut Module) -> Result<ModuleResult, CoreError>,
}

/// Read a permission mode given either as an octal string (`"0644"`,
/// `"0o755"`) or as a plain number.
pub fn parse_mode(params: &ParameterSet, name: &str) -> Result<Option<u32>, CoreError> {
    let invalid = |value: String| ValidationError::InvalidNumber {
        field: name.to_owned(),
        value,
        expected: Kind::Integer,
    };
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let digits = s.trim();
            let digits = digits.strip_prefix("0o").unwrap_or(digits);
            u32::from_str_radix(digits, 8)
                .ok()
                .filter(|m| *m <= 0o7777)
                .map(Some)
                .ok_or_else(|| invalid(s.clone()).into())
        }
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|m| u32::try_from(m).ok())
            .filter(|m| *m <= 0o7777)
            .map(Some)
            .ok_or_else(|| invalid(n.to_string()).into()),
        Some(other) => Err(ValidationError::TypeMismatch {
            field: name.to_owned(),
            expected: Kind::String,
            found: type_name(other),
        }
        .into()),
    }
}

/// True when `path` exists and its bits differ from a requested mode.
pub fn mode_differs(path: &Path, mode: Option<u32>) -> Result<bool, CoreError> {
    match mode {
        Some(mode) if exists(path) => Ok(permission_bits(path)? != mode),
        _ => Ok(false),
    }
}

/// Outcome reported in check mode, where nothing is touched.
pub fn predicted(path: &Path, changed: bool) -> MutationOutcome {
    if changed {
        MutationOutcome::changed(path)
    } else {
        MutationOutcome::unchanged(path)
    }
}
