//! Text helpers shared by modules that edit file content.

use crate::CoreError;
use regex::Regex;

/// Replace every match of `pattern` in `text`.
///
/// `replacement` may refer to capture groups as `$1` or `${name}`; write `$$`
/// for a literal dollar sign.
pub fn regex_replace(text: &str, pattern: &str, replacement: &str) -> Result<String, CoreError> {
    let regex = Regex::new(pattern)?;
    Ok(regex.replace_all(text, replacement).into_owned())
}
