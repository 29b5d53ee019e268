use crate::stat::{set_permission_bits, MODE_MASK};
use crate::{FsError, MutationOutcome};
use std::fs::{self, DirBuilder};
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;
use tracing::{debug, info};

/// Converge `path` to be a directory with exactly `mode`.
///
/// Missing parents are created as well. The exact bits, unaffected by the
/// umask, are only guaranteed on the leaf.
pub fn ensure_directory(path: &Path, mode: u32) -> Result<MutationOutcome, FsError> {
    let mode = mode & MODE_MASK;
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            let current = meta.permissions().mode() & MODE_MASK;
            if current == mode {
                debug!("directory {} already has mode {mode:04o}", path.display());
                return Ok(MutationOutcome::unchanged(path));
            }
            set_permission_bits(path, mode)?;
            info!(
                "changed mode of {} from {current:04o} to {mode:04o}",
                path.display()
            );
            Ok(MutationOutcome::changed(path))
        }
        Ok(_) => Err(FsError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            DirBuilder::new()
                .recursive(true)
                .mode(mode)
                .create(path)
                .map_err(FsError::io("create directory", path))?;
            set_permission_bits(path, mode)?;
            info!("created directory {} with mode {mode:04o}", path.display());
            Ok(MutationOutcome::changed(path))
        }
        Err(e) => Err(FsError::io("stat", path)(e)),
    }
}
