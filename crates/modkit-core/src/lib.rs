//! Per-invocation runtime for modkit modules.
//!
//! This crate ties the schema and filesystem layers together: it reads the
//! orchestrator's argument document (`input`), builds a validated `Module`
//! context, runs external commands (`command`), and encodes the JSON result
//! envelope (`result`) written back on stdout.

pub mod command;
pub mod config;
pub mod input;
pub mod module;
pub mod result;
pub mod text;

pub use command::{get_bin_path, run_command, CommandOutput, CommandSpec};
pub use config::{ModuleConfig, ModuleOptions, ARGS_ENV, LOG_ENV, SCRATCH_ENV};
pub use input::{parse_input, read_input, read_input_from, ModuleInput};
pub use module::{execute, Module, NO_LOG_PLACEHOLDER};
pub use result::{write_result, Deprecation, Diff, ModuleResult};
pub use text::regex_replace;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] modkit_schema::ValidationError),
    #[error(transparent)]
    Fs(#[from] modkit_fs::FsError),
    #[error("empty input, expecting a JSON object of module arguments")]
    EmptyInput,
    #[error("invalid module arguments: {0}")]
    InvalidInput(String),
    #[error("check mode is not supported by this module")]
    CheckModeUnsupported,
    #[error("failed to run '{cmd}': {source}")]
    Command {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid regular expression: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("failed to find required executable {0}")]
    BinaryNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use modkit_schema::ValidationError;

    #[test]
    fn validation_errors_pass_through_unchanged() {
        let inner = ValidationError::MissingRequired {
            field: "path".to_owned(),
        };
        let expected = inner.to_string();
        let e: CoreError = inner.into();
        assert_eq!(e.to_string(), expected);
    }

    #[test]
    fn binary_not_found_names_binary() {
        let e = CoreError::BinaryNotFound("rsync".to_owned());
        assert!(e.to_string().contains("rsync"));
    }
}
