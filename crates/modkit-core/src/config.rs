use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the module arguments when stdin is not used.
pub const ARGS_ENV: &str = "MODKIT_MODULE_ARGS";
/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV: &str = "MODKIT_LOG";
/// Environment variable selecting where scratch directories are created.
pub const SCRATCH_ENV: &str = "MODKIT_SCRATCH_DIR";

fn default_args_env() -> String {
    ARGS_ENV.to_owned()
}

fn default_log_filter_env() -> String {
    LOG_ENV.to_owned()
}

/// Host-side settings shared by every module invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default = "default_args_env")]
    pub args_env: String,
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
    #[serde(default = "default_log_filter_env")]
    pub log_filter_env: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            args_env: default_args_env(),
            scratch_root: None,
            log_filter_env: default_log_filter_env(),
        }
    }
}

impl ModuleConfig {
    /// Defaults, with the scratch root taken from `MODKIT_SCRATCH_DIR` when set.
    pub fn from_env() -> Self {
        let scratch_root = std::env::var_os(SCRATCH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            scratch_root,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

/// Capabilities a module declares about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleOptions {
    pub supports_check_mode: bool,
}

impl ModuleOptions {
    pub fn check_mode() -> Self {
        Self {
            supports_check_mode: true,
        }
    }
}
