use crate::params::ParameterSet;
use crate::spec::Schema;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys starting with this prefix are orchestrator control values and never
/// reach the parameter set.
pub const CONTROL_PREFIX: &str = "_modkit_";

/// Build the canonical parameter set from raw input.
///
/// Order matters and is fixed: control keys are stripped, then schema
/// defaults fill absent fields, then aliases are resolved. An alias only
/// promotes its value when the canonical key is still absent at that point,
/// and the alias key is always removed.
pub fn normalize(
    raw: &Map<String, Value>,
    schema: &Schema,
    aliases: &BTreeMap<String, String>,
) -> ParameterSet {
    let mut params: ParameterSet = raw
        .iter()
        .filter(|(key, _)| !key.starts_with(CONTROL_PREFIX))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (name, spec) in schema.iter() {
        if params.contains(name) {
            continue;
        }
        if let Some(default) = &spec.default {
            params.insert(name, default.clone());
        }
    }

    for (alias, canonical) in aliases {
        if let Some(value) = params.remove(alias) {
            if !params.contains(canonical) {
                params.insert(canonical.clone(), value);
            }
        }
    }

    params
}
