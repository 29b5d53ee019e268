use crate::atomic::copy_file;
use crate::scratch::Scratch;
use crate::FsError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Sibling path used for a backup taken now: `<path>.<YYYY-MM-DD-HH-MM-SS>`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(stamp);
    PathBuf::from(name)
}

/// Copy `path` to a timestamped sibling, keeping its permission bits.
pub fn backup_file(scratch: &Scratch, path: &Path) -> Result<PathBuf, FsError> {
    let backup = backup_path(path);
    copy_file(scratch, path, &backup, None)?;
    info!("backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}
