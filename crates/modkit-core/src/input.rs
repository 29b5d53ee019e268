use crate::config::ModuleConfig;
use crate::CoreError;
use modkit_schema::{coerce_boolean, CONTROL_PREFIX};
use serde_json::{Map, Value};
use std::io::Read;
use tracing::debug;

/// Raw argument document of one invocation, with the control flags decoded.
///
/// `args` still contains the control keys; the normalizer strips them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleInput {
    pub args: Map<String, Value>,
    pub check_mode: bool,
    pub debug: bool,
}

impl ModuleInput {
    pub fn new(args: Map<String, Value>) -> Self {
        Self {
            args,
            ..Self::default()
        }
    }
}

fn control_flag(args: &Map<String, Value>, name: &str) -> Result<bool, CoreError> {
    let key = format!("{CONTROL_PREFIX}{name}");
    match args.get(&key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => {
            coerce_boolean(s).map_err(|e| CoreError::InvalidInput(format!("{key}: {e}")))
        }
        Some(other) => Err(CoreError::InvalidInput(format!(
            "{key} must be a boolean, got {other}"
        ))),
    }
}

/// Decode an argument document.
pub fn parse_input(text: &str) -> Result<ModuleInput, CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::EmptyInput);
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let Value::Object(args) = value else {
        return Err(CoreError::InvalidInput(
            "expected a JSON object at the top level".to_owned(),
        ));
    };
    let check_mode = control_flag(&args, "check_mode")?;
    let debug = control_flag(&args, "debug")?;
    Ok(ModuleInput {
        args,
        check_mode,
        debug,
    })
}

/// Read the argument document from `reader`.
pub fn read_input_from<R: Read>(mut reader: R) -> Result<ModuleInput, CoreError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_input(&text)
}

/// Read the argument document from the configured environment variable if it
/// is set and non-empty, otherwise from stdin.
pub fn read_input(config: &ModuleConfig) -> Result<ModuleInput, CoreError> {
    match std::env::var(&config.args_env) {
        Ok(text) if !text.is_empty() => {
            debug!("reading module arguments from {}", config.args_env);
            parse_input(&text)
        }
        _ => {
            debug!("reading module arguments from stdin");
            read_input_from(std::io::stdin().lock())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_control_flags() {
        let input =
            parse_input(r#"{"path": "/x", "_modkit_check_mode": true, "_modkit_debug": "yes"}"#)
                .unwrap();
        assert!(input.check_mode);
        assert!(input.debug);
        assert_eq!(input.args.len(), 3);
    }

    #[test]
    fn flags_default_to_false() {
        let input = parse_input(r#"{"path": "/x"}"#).unwrap();
        assert!(!input.check_mode);
        assert!(!input.debug);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_input(""), Err(CoreError::EmptyInput)));
        assert!(matches!(parse_input("  \n"), Err(CoreError::EmptyInput)));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            parse_input("{not json"),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_input("[1, 2]"),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn bad_control_flag_is_rejected() {
        assert!(matches!(
            parse_input(r#"{"_modkit_check_mode": "perhaps"}"#),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_input(r#"{"_modkit_debug": [true]}"#),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn reads_from_any_reader() {
        let input = read_input_from(&b"{\"a\": 1}"[..]).unwrap();
        assert_eq!(input.args.get("a"), Some(&Value::from(1)));
    }
}
