//! `replace`: substitute every match of a regular expression in a file.

use super::Definition;
use modkit_core::{regex_replace, CoreError, Diff, Module, ModuleOptions, ModuleResult};
use modkit_fs::{permission_bits, read_text, replace_file};
use modkit_schema::{ConstraintSet, FieldSpec, Schema};
use std::path::PathBuf;

pub fn definition() -> Definition {
    Definition {
        schema: Schema::new()
            .field("path", FieldSpec::path().required().alias("dest"))
            .field("regexp", FieldSpec::string().required())
            .field("replace", FieldSpec::string().default_value("")),
        constraints: ConstraintSet::new(),
        options: ModuleOptions::check_mode(),
        body: run,
    }
}

fn run(module: &mut Module) -> Result<ModuleResult, CoreError> {
    let params = module.params();
    let path = PathBuf::from(params.get_str("path")?);
    let pattern = params.get_str("regexp")?;
    let replacement = params.get_str("replace")?;

    let before = read_text(&path)?;
    let after = regex_replace(&before, &pattern, &replacement)?;
    if after == before {
        return Ok(ModuleResult::unchanged().with_data("path", path.display().to_string()));
    }
    let diff = Diff::new(before, after.clone()).with_headers(
        &format!("{} (before)", path.display()),
        &format!("{} (after)", path.display()),
    );

    if module.check_mode() {
        return Ok(ModuleResult::new(true)
            .with_data("path", path.display().to_string())
            .with_diff(diff));
    }
    let mode = permission_bits(&path)?;
    let outcome = replace_file(module.scratch()?, &path, after.as_bytes(), mode)?;
    Ok(ModuleResult::from_outcome(&outcome).with_diff(diff))
}
