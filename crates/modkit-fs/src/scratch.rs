use crate::FsError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::debug;

const SCRATCH_PREFIX: &str = "modkit-";

/// Per-invocation private temporary directory.
///
/// Staged files live here until they are committed over their destination.
/// The directory and anything left in it are removed on drop.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create under the system temporary directory.
    pub fn new() -> Result<Self, FsError> {
        let dir = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(FsError::io("create scratch directory in", &std::env::temp_dir()))?;
        debug!("scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create under `root`, which must already exist.
    pub fn new_in(root: &Path) -> Result<Self, FsError> {
        let dir = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)
            .map_err(FsError::io("create scratch directory in", root))?;
        debug!("scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a new uniquely named file in the scratch directory.
    ///
    /// The file is not deleted automatically; the caller either commits it
    /// somewhere else or leaves it for the directory cleanup.
    pub fn stage(&self, prefix: &str) -> Result<(File, PathBuf), FsError> {
        let tmp = Builder::new()
            .prefix(prefix)
            .tempfile_in(self.dir.path())
            .map_err(FsError::io("stage a file in", self.dir.path()))?;
        tmp.keep().map_err(|e| FsError::Io {
            op: "stage a file in",
            path: self.dir.path().to_path_buf(),
            source: e.error,
        })
    }
}
