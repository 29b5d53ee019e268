//! `command`: run a program, guarded by optional `creates`/`removes` paths.

use super::Definition;
use modkit_core::{
    get_bin_path, run_command, CommandSpec, CoreError, Module, ModuleOptions, ModuleResult,
};
use modkit_fs::exists;
use modkit_schema::{canonical_string, ConstraintSet, FieldSpec, Kind, Schema};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub fn definition() -> Definition {
    Definition {
        schema: Schema::new()
            .field("argv", FieldSpec::list(Kind::String).required().alias("cmd"))
            .field("stdin", FieldSpec::string())
            .field("creates", FieldSpec::path())
            .field("removes", FieldSpec::path())
            .field("chdir", FieldSpec::path())
            .field("environment", FieldSpec::object().alias("env")),
        constraints: ConstraintSet::new(),
        options: ModuleOptions::check_mode(),
        body: run,
    }
}

fn run(module: &mut Module) -> Result<ModuleResult, CoreError> {
    let params = module.params();
    let argv = params.get_string_list("argv")?;
    let Some((program, args)) = argv.split_first() else {
        return Err(CoreError::InvalidInput("argv must name a program".to_owned()));
    };
    let chdir = params.opt_str("chdir").map(PathBuf::from);

    if let Some(creates) = params.opt_str("creates") {
        if exists(Path::new(&creates)) {
            return Ok(skipped(format!("skipped, since {creates} exists")));
        }
    }
    if let Some(removes) = params.opt_str("removes") {
        if !exists(Path::new(&removes)) {
            return Ok(skipped(format!("skipped, since {removes} does not exist")));
        }
    }
    if module.check_mode() {
        return Ok(skipped("command would have run; skipped in check mode".to_owned()));
    }

    let mut spec = CommandSpec::new(resolve_program(program, chdir.as_deref())?).args(args);
    if let Some(Value::Object(env)) = params.get("environment") {
        for (key, value) in env {
            spec = spec.env(key.as_str(), canonical_string(value));
        }
    }
    if let Some(stdin) = params.opt_str("stdin") {
        spec = spec.stdin(stdin);
    }
    if let Some(dir) = chdir {
        spec = spec.current_dir(dir);
    }

    let output = run_command(&spec)?;
    module.debug_msg(&format!("{} returned {}", output.cmd, output.rc));
    let success = output.success();
    let mut result = ModuleResult::new(true).with_command(output);
    if !success {
        result.failed = true;
        result.msg = Some("non-zero return code".to_owned());
    }
    Ok(result)
}

fn skipped(msg: String) -> ModuleResult {
    ModuleResult::unchanged().with_msg(msg).with_data("skipped", true)
}

// Relative paths with a directory part are looked up from `chdir`, as the
// child will see them.
fn resolve_program(program: &str, chdir: Option<&Path>) -> Result<String, CoreError> {
    let candidate = match chdir {
        Some(dir) if program.contains('/') && Path::new(program).is_relative() => {
            dir.join(program).display().to_string()
        }
        _ => program.to_owned(),
    };
    get_bin_path(&candidate, true)?
        .map(|path| path.display().to_string())
        .ok_or_else(|| CoreError::BinaryNotFound(program.to_owned()))
}
