//! `copy`: converge a file to literal content or to a copy of another file.

use super::{mode_differs, parse_mode, Definition};
use modkit_core::{CoreError, Module, ModuleOptions, ModuleResult};
use modkit_fs::{
    backup_file, content_matches, copy_file, exists, file_digest, files_equal, is_file,
    permission_bits, replace_file,
};
use modkit_schema::{ConstraintSet, FieldSpec, Kind, Schema, ValidationError};
use std::path::{Path, PathBuf};
use tracing::info;

const NEW_FILE_MODE: u32 = 0o644;

pub fn definition() -> Definition {
    Definition {
        schema: Schema::new()
            .field("dest", FieldSpec::path().required())
            .field("src", FieldSpec::path())
            .field("content", FieldSpec::string().sensitive())
            .field("mode", FieldSpec::new(Kind::Raw))
            .field("backup", FieldSpec::boolean().default_value(false)),
        constraints: ConstraintSet::new()
            .mutually_exclusive(&["src", "content"])
            .required_one_of(&["src", "content"]),
        options: ModuleOptions::check_mode(),
        body: run,
    }
}

enum Source {
    File(PathBuf),
    Content(String),
}

impl Source {
    fn content_differs(&self, dest: &Path) -> Result<bool, CoreError> {
        Ok(match self {
            Source::File(src) => !files_equal(src, dest)?,
            Source::Content(text) => !content_matches(dest, text.as_bytes())?,
        })
    }
}

fn run(module: &mut Module) -> Result<ModuleResult, CoreError> {
    let params = module.params();
    let dest = PathBuf::from(params.get_str("dest")?);
    let mode = parse_mode(params, "mode")?;
    let want_backup = params.get_bool("backup")?;
    let source = match (params.opt_str("src"), params.opt_str("content")) {
        (Some(src), _) => Source::File(PathBuf::from(src)),
        (None, Some(text)) => Source::Content(text),
        (None, None) => {
            return Err(ValidationError::RequiredOneViolation {
                group: vec!["src".to_owned(), "content".to_owned()],
            }
            .into())
        }
    };

    let content_differs = source.content_differs(&dest)?;
    let wanted_mode = match (&source, mode) {
        (Source::File(src), None) => Some(permission_bits(src)?),
        _ => mode,
    };
    let changed = content_differs || mode_differs(&dest, wanted_mode)?;
    if module.check_mode() || !changed {
        let mut result = ModuleResult::new(changed).with_data("dest", dest.display().to_string());
        if exists(&dest) {
            result = result.with_data("checksum", file_digest(&dest)?);
        }
        return Ok(result);
    }

    let scratch = module.scratch()?;
    let backup = if want_backup && content_differs && is_file(&dest) {
        let backup = backup_file(scratch, &dest)?;
        info!("saved {} as {}", dest.display(), backup.display());
        Some(backup)
    } else {
        None
    };

    let mut outcome = match &source {
        Source::File(src) => copy_file(scratch, src, &dest, mode)?,
        Source::Content(text) => {
            let mode = match mode {
                Some(mode) => mode,
                None if exists(&dest) => permission_bits(&dest)?,
                None => NEW_FILE_MODE,
            };
            replace_file(scratch, &dest, text.as_bytes(), mode)?
        }
    };
    if let Some(backup) = backup {
        outcome = outcome.with_backup(backup);
    }

    let mut result = ModuleResult::from_outcome(&outcome)
        .with_data("dest", dest.display().to_string())
        .with_data("checksum", file_digest(&dest)?);
    if let Source::File(src) = &source {
        result = result.with_data("src", src.display().to_string());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn content_source_compares_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f");
        let source = Source::Content("hello".to_owned());
        assert!(source.content_differs(&dest).unwrap());
        fs::write(&dest, "hello").unwrap();
        assert!(!source.content_differs(&dest).unwrap());
    }

    #[test]
    fn file_source_requires_src() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::File(dir.path().join("missing"));
        assert!(source.content_differs(&dir.path().join("dest")).is_err());
    }
}
