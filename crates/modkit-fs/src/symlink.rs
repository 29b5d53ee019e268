use crate::atomic::sync_after_commit;
use crate::{fsync_dir, parent_dir, FsError, MutationOutcome};
use std::fs::{self, DirBuilder};
use std::io::ErrorKind;
use std::os::unix::fs::{symlink, DirBuilderExt};
use std::path::Path;
use tempfile::Builder;
use tracing::{debug, info};

/// Converge `dest` to be a symlink pointing at `target`.
///
/// An existing link to another target is swapped atomically by renaming a
/// freshly made link over it. Anything at `dest` that is not a symlink is an
/// error and stays untouched. Missing parent directories are created `0755`.
pub fn ensure_symlink(target: &Path, dest: &Path) -> Result<MutationOutcome, FsError> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let current = fs::read_link(dest).map_err(FsError::io("read link", dest))?;
            // Exact bytes: `a/` and `a` are different link targets.
            if current.as_os_str() == target.as_os_str() {
                debug!("{} already points to {}", dest.display(), target.display());
                return Ok(MutationOutcome::unchanged(dest));
            }
            replace_link(target, dest)?;
            info!(
                "repointed {} from {} to {}",
                dest.display(),
                current.display(),
                target.display()
            );
            Ok(MutationOutcome::changed(dest))
        }
        Ok(_) => Err(FsError::DestinationNotSymlink(dest.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let parent = parent_dir(dest);
            if !parent.is_dir() {
                DirBuilder::new()
                    .recursive(true)
                    .mode(0o755)
                    .create(parent)
                    .map_err(FsError::io("create directory", parent))?;
            }
            symlink(target, dest).map_err(FsError::io("create symlink", dest))?;
            info!("linked {} to {}", dest.display(), target.display());
            Ok(MutationOutcome::changed(dest))
        }
        Err(e) => Err(FsError::io("stat", dest)(e)),
    }
}

fn replace_link(target: &Path, dest: &Path) -> Result<(), FsError> {
    let dir = parent_dir(dest);
    let fresh = Builder::new()
        .prefix(".modkit-link-")
        .make_in(dir, |p| symlink(target, p))
        .map_err(FsError::io("create symlink in", dir))?;
    fresh
        .persist(dest)
        .map_err(|e| FsError::io("rename", dest)(e.error))?;
    sync_after_commit(dir, fsync_dir(dir));
    Ok(())
}
