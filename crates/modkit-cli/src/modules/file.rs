//! `file`: converge a directory, a symlink, or the mode of an existing file.

use super::{mode_differs, parse_mode, predicted, Definition};
use modkit_core::{CoreError, Module, ModuleOptions, ModuleResult};
use modkit_fs::{
    ensure_directory, ensure_mode, ensure_symlink, exists, file_stat, is_dir, FsError,
    MutationOutcome,
};
use modkit_schema::{ConstraintSet, FieldSpec, Kind, Schema};
use std::path::{Path, PathBuf};

const DEFAULT_DIR_MODE: u32 = 0o755;

pub fn definition() -> Definition {
    Definition {
        schema: Schema::new()
            .field(
                "path",
                FieldSpec::path().required().alias("dest").alias("name"),
            )
            .field(
                "state",
                FieldSpec::string()
                    .choices(["file", "directory", "link"])
                    .default_value("file"),
            )
            .field("src", FieldSpec::path())
            .field("mode", FieldSpec::new(Kind::Raw)),
        constraints: ConstraintSet::new().required_if("state", "link", &["src"]),
        options: ModuleOptions::check_mode(),
        body: run,
    }
}

fn run(module: &mut Module) -> Result<ModuleResult, CoreError> {
    let params = module.params();
    let path = PathBuf::from(params.get_str("path")?);
    let state = params.get_str("state")?;
    let mode = parse_mode(params, "mode")?;
    let check = module.check_mode();

    let outcome = match state.as_str() {
        "directory" => directory(&path, mode.unwrap_or(DEFAULT_DIR_MODE), check)?,
        "link" => link(&PathBuf::from(params.get_str("src")?), &path, check)?,
        _ => existing_file(&path, mode, check)?,
    };
    module.debug_msg(&format!(
        "file state={state} on {} changed={}",
        path.display(),
        outcome.changed
    ));

    let mut result = ModuleResult::from_outcome(&outcome).with_data("state", state);
    if let Some(mode) = mode {
        result = result.with_data("mode", format!("{mode:04o}"));
    }
    Ok(result)
}

fn directory(path: &Path, mode: u32, check: bool) -> Result<MutationOutcome, CoreError> {
    if !check {
        return Ok(ensure_directory(path, mode)?);
    }
    if is_dir(path) {
        Ok(predicted(path, mode_differs(path, Some(mode))?))
    } else if exists(path) {
        Err(FsError::NotADirectory(path.to_path_buf()).into())
    } else {
        Ok(predicted(path, true))
    }
}

fn link(target: &Path, dest: &Path, check: bool) -> Result<MutationOutcome, CoreError> {
    if !check {
        return Ok(ensure_symlink(target, dest)?);
    }
    let stat = file_stat(dest)?;
    match (stat.exists, stat.lnk_target) {
        (false, _) => Ok(predicted(dest, true)),
        (true, Some(current)) => Ok(predicted(dest, current.as_os_str() != target.as_os_str())),
        (true, None) => Err(FsError::DestinationNotSymlink(dest.to_path_buf()).into()),
    }
}

// state=file never creates anything; content belongs to `copy`.
fn existing_file(path: &Path, mode: Option<u32>, check: bool) -> Result<MutationOutcome, CoreError> {
    if !exists(path) {
        return Err(FsError::NotFound(path.to_path_buf()).into());
    }
    match mode {
        Some(mode) if check => Ok(predicted(path, mode_differs(path, Some(mode))?)),
        Some(mode) => Ok(ensure_mode(path, mode)?),
        None => Ok(MutationOutcome::unchanged(path)),
    }
}
