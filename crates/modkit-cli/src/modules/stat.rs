//! `stat`: report metadata about a path without changing anything.

use super::Definition;
use modkit_core::{CoreError, Module, ModuleOptions, ModuleResult};
use modkit_fs::{file_digest, file_stat};
use modkit_schema::{ConstraintSet, FieldSpec, Schema};
use serde_json::Value;
use std::path::PathBuf;

pub fn definition() -> Definition {
    Definition {
        schema: Schema::new()
            .field("path", FieldSpec::path().required())
            .field("get_checksum", FieldSpec::boolean().default_value(true)),
        constraints: ConstraintSet::new(),
        options: ModuleOptions::check_mode(),
        body: run,
    }
}

fn run(module: &mut Module) -> Result<ModuleResult, CoreError> {
    let params = module.params();
    let path = PathBuf::from(params.get_str("path")?);
    let stat = file_stat(&path)?;

    let mut value = serde_json::to_value(&stat)?;
    if stat.isreg && params.get_bool("get_checksum")? {
        if let Value::Object(fields) = &mut value {
            fields.insert("checksum".to_owned(), Value::String(file_digest(&path)?));
        }
    }
    Ok(ModuleResult::unchanged().with_data("stat", value))
}
