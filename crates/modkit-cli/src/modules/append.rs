//! `append`: make sure a file contains a block of text.

use super::Definition;
use modkit_core::{CoreError, Diff, Module, ModuleOptions, ModuleResult};
use modkit_fs::{append_content, appended, exists, read_bytes};
use modkit_schema::{ConstraintSet, FieldSpec, Schema};
use std::path::PathBuf;

pub fn definition() -> Definition {
    Definition {
        schema: Schema::new()
            .field("path", FieldSpec::path().required().alias("dest"))
            .field("content", FieldSpec::string().required()),
        constraints: ConstraintSet::new(),
        options: ModuleOptions::check_mode(),
        body: run,
    }
}

fn run(module: &mut Module) -> Result<ModuleResult, CoreError> {
    let params = module.params();
    let path = PathBuf::from(params.get_str("path")?);
    let content = params.get_str("content")?;

    let before = if exists(&path) {
        Some(read_bytes(&path)?)
    } else {
        None
    };
    let Some(after) = appended(before.as_deref(), content.as_bytes()) else {
        return Ok(ModuleResult::unchanged().with_data("path", path.display().to_string()));
    };
    // Non-UTF-8 bytes are shown lossily; the file itself is written byte for byte.
    let before = before
        .as_deref()
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    let diff = Diff::new(before, String::from_utf8_lossy(&after)).with_headers(
        &format!("{} (before)", path.display()),
        &format!("{} (after)", path.display()),
    );

    if module.check_mode() {
        return Ok(ModuleResult::new(true)
            .with_data("path", path.display().to_string())
            .with_diff(diff));
    }
    let outcome = append_content(module.scratch()?, &path, &content)?;
    Ok(ModuleResult::from_outcome(&outcome).with_diff(diff))
}
