//! Idempotent convergence primitives for files, directories, and symlinks.
//!
//! Every mutating operation first checks whether the target already matches
//! the desired state and reports `changed = false` without touching it.
//! Content changes are staged in a private [`Scratch`] directory and
//! committed with a rename, so a crash never leaves a half-written target.

pub mod append;
pub mod atomic;
pub mod backup;
pub mod compare;
pub mod directory;
pub mod scratch;
pub mod stat;
pub mod symlink;

pub use append::{append_content, appended};
pub use atomic::{atomic_move, copy_file, replace_file};
pub use backup::{backup_file, backup_path};
pub use compare::{content_matches, file_digest, files_equal};
pub use directory::ensure_directory;
pub use scratch::Scratch;
pub use stat::{
    ensure_mode, exists, file_stat, is_dir, is_executable, is_file, is_symlink, permission_bits,
    preserve_selinux_context, read_bytes, read_text, FileStat,
};
pub use symlink::ensure_symlink;

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` into it is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

/// Directory that holds `path`, or `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[derive(Debug, Error)]
pub enum FsError {
    #[error("{0} does not exist")]
    NotFound(PathBuf),
    #[error("destination {0} exists and is not a symlink")]
    DestinationNotSymlink(PathBuf),
    #[error("{0} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("{0} is not supported on this host")]
    Unsupported(String),
    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Adapter for `map_err` that records which operation failed on which path.
    pub(crate) fn io(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { op, path, source }
    }
}

/// Result of a convergence operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
    pub changed: bool,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl MutationOutcome {
    pub fn unchanged(path: &Path) -> Self {
        Self {
            changed: false,
            path: path.to_path_buf(),
            backup: None,
        }
    }

    pub fn changed(path: &Path) -> Self {
        Self {
            changed: true,
            path: path.to_path_buf(),
            backup: None,
        }
    }

    #[must_use]
    pub fn with_backup(mut self, backup: PathBuf) -> Self {
        self.backup = Some(backup);
        self
    }
}
