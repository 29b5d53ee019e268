use crate::command::CommandOutput;
use crate::CoreError;
use modkit_fs::MutationOutcome;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

/// Before/after text pair reported alongside a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub before: String,
    pub after: String,
    pub before_header: String,
    pub after_header: String,
}

impl Diff {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
            before_header: "before".to_owned(),
            after_header: "after".to_owned(),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, before_header: &str, after_header: &str) -> Self {
        if !before_header.is_empty() {
            before_header.clone_into(&mut self.before_header);
        }
        if !after_header.is_empty() {
            after_header.clone_into(&mut self.after_header);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    pub msg: String,
}

/// The JSON document a module writes to stdout.
///
/// `changed` is always present; everything else is omitted when empty.
/// Module-specific fields go into `data` and are flattened into the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deprecations: Vec<Deprecation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ModuleResult {
    pub fn new(changed: bool) -> Self {
        Self {
            changed,
            ..Self::default()
        }
    }

    pub fn unchanged() -> Self {
        Self::new(false)
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: Some(msg.into()),
            ..Self::default()
        }
    }

    /// `changed`, `path`, and `backup_file` taken from a convergence outcome.
    pub fn from_outcome(outcome: &MutationOutcome) -> Self {
        let mut result =
            Self::new(outcome.changed).with_data("path", outcome.path.display().to_string());
        if let Some(backup) = &outcome.backup {
            result = result.with_data("backup_file", backup.display().to_string());
        }
        result
    }

    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn with_diff(mut self, diff: Diff) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Record a command's exit status and output streams.
    #[must_use]
    pub fn with_command(mut self, output: CommandOutput) -> Self {
        self.rc = Some(output.rc);
        self.stdout = Some(output.stdout);
        self.stderr = Some(output.stderr);
        self.data.insert("cmd".to_owned(), Value::String(output.cmd));
        self
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(self.failed)
    }
}

/// Serialize `result` as a single line of JSON.
pub fn write_result<W: Write>(result: &ModuleResult, mut out: W) -> Result<(), CoreError> {
    serde_json::to_writer(&mut out, result)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
