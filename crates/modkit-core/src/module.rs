use crate::config::{ModuleConfig, ModuleOptions};
use crate::input::ModuleInput;
use crate::result::{Deprecation, ModuleResult};
use crate::CoreError;
use modkit_fs::Scratch;
use modkit_schema::{normalize, validate_all, ConstraintSet, ParameterSet, Schema};
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Replacement for values of sensitive parameters in reported invocations.
pub const NO_LOG_PLACEHOLDER: &str = "VALUE_SPECIFIED_IN_NO_LOG_PARAMETER";

/// Context of one module invocation: validated parameters, mode flags, and
/// the warnings and deprecations collected while the module runs.
#[derive(Debug)]
pub struct Module {
    params: ParameterSet,
    check_mode: bool,
    debug: bool,
    no_log: BTreeSet<String>,
    warnings: Vec<String>,
    deprecations: Vec<String>,
    scratch_root: Option<PathBuf>,
    scratch: OnceCell<Scratch>,
}

impl Module {
    /// Normalize and validate `input` against `schema` and `constraints`.
    pub fn new(
        input: &ModuleInput,
        schema: &Schema,
        constraints: &ConstraintSet,
        options: ModuleOptions,
        config: &ModuleConfig,
    ) -> Result<Self, CoreError> {
        schema.check()?;
        let mut params = normalize(&input.args, schema, &schema.alias_map());
        validate_all(&mut params, schema, constraints)?;
        if input.check_mode && !options.supports_check_mode {
            return Err(CoreError::CheckModeUnsupported);
        }

        let mut module = Self {
            params,
            check_mode: input.check_mode,
            debug: input.debug,
            no_log: schema.sensitive_fields(),
            warnings: Vec::new(),
            deprecations: Vec::new(),
            scratch_root: config.scratch_root.clone(),
            scratch: OnceCell::new(),
        };

        for (name, spec) in schema.iter() {
            let Some(version) = &spec.removed_in_version else {
                continue;
            };
            let supplied = input.args.contains_key(name)
                || spec.aliases.iter().any(|a| input.args.contains_key(a));
            if supplied {
                module.deprecate(
                    &format!("Param '{name}' is deprecated"),
                    Some(version.as_str()),
                );
            }
        }

        module.debug_msg(&format!("validated {} parameters", module.params.len()));
        Ok(module)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn check_mode(&self) -> bool {
        self.check_mode
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{msg}");
        self.warnings.push(msg);
    }

    /// Record a deprecation, suffixed with the removal version when known.
    pub fn deprecate(&mut self, msg: &str, version: Option<&str>) {
        let msg = match version {
            Some(v) if !v.is_empty() => format!("{msg} (version: {v})"),
            _ => msg.to_owned(),
        };
        warn!("deprecated: {msg}");
        self.deprecations.push(msg);
    }

    /// Emit a debug event, only when the invocation asked for debug output.
    pub fn debug_msg(&self, msg: &str) {
        if self.debug {
            debug!("{msg}");
        }
    }

    /// The invocation's scratch directory, created on first use and removed
    /// when the module is dropped.
    pub fn scratch(&self) -> Result<&Scratch, CoreError> {
        if let Some(scratch) = self.scratch.get() {
            return Ok(scratch);
        }
        let scratch = match &self.scratch_root {
            Some(root) => Scratch::new_in(root)?,
            None => Scratch::new()?,
        };
        Ok(self.scratch.get_or_init(|| scratch))
    }

    /// Resolved parameters with sensitive values masked.
    pub fn invocation(&self) -> Map<String, Value> {
        self.params
            .iter()
            .map(|(name, value)| {
                let shown = if self.no_log.contains(name) {
                    Value::String(NO_LOG_PLACEHOLDER.to_owned())
                } else {
                    value.clone()
                };
                (name.to_owned(), shown)
            })
            .collect()
    }

    /// Complete a result with the invocation, warnings, and deprecations.
    pub fn exit_json(&self, mut result: ModuleResult) -> ModuleResult {
        result.invocation = Some(self.invocation());
        result.warnings.extend(self.warnings.iter().cloned());
        result.deprecations.extend(
            self.deprecations
                .iter()
                .map(|msg| Deprecation { msg: msg.clone() }),
        );
        result
    }

    /// A failure result carrying `msg` plus any extra fields in `extra`.
    pub fn fail_json(&self, msg: impl Into<String>, extra: ModuleResult) -> ModuleResult {
        let mut result = extra;
        result.failed = true;
        result.msg = Some(msg.into());
        self.exit_json(result)
    }
}

/// Build a [`Module`] for `input` and run `body` with it.
///
/// Every outcome becomes a result envelope: validation and setup errors
/// produce a failure without an invocation, errors from `body` produce a
/// failure that still reports the invocation.
pub fn execute<F>(
    input: &ModuleInput,
    schema: &Schema,
    constraints: &ConstraintSet,
    options: ModuleOptions,
    config: &ModuleConfig,
    body: F,
) -> ModuleResult
where
    F: FnOnce(&mut Module) -> Result<ModuleResult, CoreError>,
{
    let mut module = match Module::new(input, schema, constraints, options, config) {
        Ok(m) => m,
        Err(e) => {
            debug!("module setup failed: {e}");
            return ModuleResult::failure(e.to_string());
        }
    };
    match body(&mut module) {
        Ok(result) => module.exit_json(result),
        Err(e) => {
            debug!("module failed: {e}");
            module.fail_json(e.to_string(), ModuleResult::unchanged())
        }
    }
}
