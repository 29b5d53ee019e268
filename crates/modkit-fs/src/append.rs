use crate::atomic::replace_file;
use crate::scratch::Scratch;
use crate::stat::{exists, permission_bits, read_bytes};
use crate::{FsError, MutationOutcome};
use std::path::Path;
use tracing::debug;

const NEW_FILE_MODE: u32 = 0o644;

/// Bytes the file would hold after appending `content`, or `None` when
/// `content` already occurs in `existing`.
///
/// `existing` of `None` means the file is absent. Existing content that does
/// not end in a newline, including an empty file, gets one before `content`.
/// Files are treated as raw bytes, so any encoding is accepted.
pub fn appended(existing: Option<&[u8]>, content: &[u8]) -> Option<Vec<u8>> {
    let Some(existing) = existing else {
        return Some(content.to_vec());
    };
    if contains(existing, content) {
        return None;
    }
    let mut after = Vec::with_capacity(existing.len() + content.len() + 1);
    after.extend_from_slice(existing);
    if !after.ends_with(b"\n") {
        after.push(b'\n');
    }
    after.extend_from_slice(content);
    Some(after)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Ensure `content` appears somewhere in the file at `path`.
///
/// A missing file is created holding just `content` with mode `0644`. When
/// the content is already present nothing happens. Otherwise it is added on
/// a new line and the file keeps its current bits.
pub fn append_content(
    scratch: &Scratch,
    path: &Path,
    content: &str,
) -> Result<MutationOutcome, FsError> {
    if !exists(path) {
        return replace_file(scratch, path, content.as_bytes(), NEW_FILE_MODE);
    }

    let existing = read_bytes(path)?;
    let Some(after) = appended(Some(existing.as_slice()), content.as_bytes()) else {
        debug!("{} already contains the requested content", path.display());
        return Ok(MutationOutcome::unchanged(path));
    };
    let mode = permission_bits(path)?;
    replace_file(scratch, path, &after, mode)
}
