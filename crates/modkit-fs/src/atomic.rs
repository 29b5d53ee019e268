use crate::compare::{content_matches, files_equal};
use crate::scratch::Scratch;
use crate::stat::{permission_bits, set_permission_bits, MODE_MASK};
use crate::{fsync_dir, parent_dir, FsError, MutationOutcome};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Move a staged file over `dest`.
///
/// A plain `rename()` is used when both paths are on one filesystem. Across
/// filesystems the bytes are copied into a fresh sibling of `dest` and that
/// sibling is renamed into place, so `dest` is only ever the old or the new
/// file. If the fallback fails, the partial sibling is removed and `dest` is
/// left as it was. A failed directory sync after the rename is logged at
/// `warn`; the move still counts as done.
pub fn atomic_move(staged: &Path, dest: &Path) -> Result<(), FsError> {
    atomic_move_with(staged, dest, fsync_dir)
}

/// [`atomic_move`] with the directory sync supplied by the caller.
pub(crate) fn atomic_move_with<S>(staged: &Path, dest: &Path, sync: S) -> Result<(), FsError>
where
    S: FnOnce(&Path) -> io::Result<()>,
{
    match fs::rename(staged, dest) {
        Ok(()) => {
            sync_after_commit(parent_dir(dest), sync(parent_dir(dest)));
            debug!("committed {} to {}", staged.display(), dest.display());
            Ok(())
        }
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            debug!(
                "{} and {} are on different filesystems, copying",
                staged.display(),
                dest.display()
            );
            copy_across_with(staged, dest, io::copy)
        }
        Err(e) => Err(FsError::io("rename", dest)(e)),
    }
}

/// Cross-filesystem commit. `copy` streams the staged bytes into the sibling.
pub(crate) fn copy_across_with<F>(staged: &Path, dest: &Path, copy: F) -> Result<(), FsError>
where
    F: FnOnce(&mut File, &mut File) -> io::Result<u64>,
{
    let dir = parent_dir(dest);
    let mut source = File::open(staged).map_err(FsError::io("open", staged))?;
    let permissions = source
        .metadata()
        .map_err(FsError::io("stat", staged))?
        .permissions();

    // Dropping `sibling` on any early return deletes the partial copy.
    let mut sibling = NamedTempFile::new_in(dir).map_err(FsError::io("create a file in", dir))?;
    copy(&mut source, sibling.as_file_mut()).map_err(FsError::io("copy into", sibling.path()))?;
    let sibling_file = sibling.as_file();
    sibling_file
        .set_permissions(permissions)
        .map_err(FsError::io("change mode of", sibling.path()))?;
    sibling_file
        .sync_all()
        .map_err(FsError::io("sync", sibling.path()))?;
    sibling
        .persist(dest)
        .map_err(|e| FsError::io("rename", dest)(e.error))?;
    sync_after_commit(dir, fsync_dir(dir));

    if let Err(e) = fs::remove_file(staged) {
        warn!("could not remove staged file {}: {e}", staged.display());
    }
    debug!("copied {} into place at {}", staged.display(), dest.display());
    Ok(())
}

/// The rename has already replaced `dest`, so a failed directory sync only
/// weakens durability across a crash. It is logged, not reported as failure.
pub(crate) fn sync_after_commit(dir: &Path, synced: io::Result<()>) {
    if let Err(e) = synced {
        warn!("could not sync directory {} after commit: {e}", dir.display());
    }
}

/// Stage a file in `scratch` via `fill`, give it `mode`, and commit it over `dest`.
/// The staged file is removed if any step fails.
fn stage_and_commit<W>(
    scratch: &Scratch,
    prefix: &str,
    dest: &Path,
    mode: u32,
    fill: W,
) -> Result<(), FsError>
where
    W: FnOnce(&mut File) -> io::Result<()>,
{
    let (mut file, staged) = scratch.stage(prefix)?;
    let result = write_staged(&mut file, &staged, mode, fill)
        .and_then(|()| atomic_move(&staged, dest));
    drop(file);
    if result.is_err() {
        match fs::remove_file(&staged) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove staged file {}: {e}", staged.display()),
        }
    }
    result
}

fn write_staged<W>(file: &mut File, staged: &Path, mode: u32, fill: W) -> Result<(), FsError>
where
    W: FnOnce(&mut File) -> io::Result<()>,
{
    fill(file).map_err(FsError::io("write", staged))?;
    file.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(FsError::io("change mode of", staged))?;
    file.sync_all().map_err(FsError::io("sync", staged))?;
    debug!("staged {} with mode {mode:04o}", staged.display());
    Ok(())
}

/// Converge `dest` to hold exactly `content` with permission bits `mode`.
///
/// Identical content and bits: nothing happens. Identical content with other
/// bits: the bits are changed in place. Anything else: the content is staged
/// and committed with [`atomic_move`].
pub fn replace_file(
    scratch: &Scratch,
    dest: &Path,
    content: &[u8],
    mode: u32,
) -> Result<MutationOutcome, FsError> {
    let mode = mode & MODE_MASK;
    if content_matches(dest, content)? {
        if permission_bits(dest)? == mode {
            debug!("{} already up to date", dest.display());
            return Ok(MutationOutcome::unchanged(dest));
        }
        set_permission_bits(dest, mode)?;
        info!("changed mode of {} to {mode:04o}", dest.display());
        return Ok(MutationOutcome::changed(dest));
    }

    stage_and_commit(scratch, "write-", dest, mode, |f| f.write_all(content))?;
    info!("wrote {} ({} bytes)", dest.display(), content.len());
    Ok(MutationOutcome::changed(dest))
}

/// Converge `dest` to be a byte copy of `src`.
///
/// `mode` of `None` takes the source file's bits.
pub fn copy_file(
    scratch: &Scratch,
    src: &Path,
    dest: &Path,
    mode: Option<u32>,
) -> Result<MutationOutcome, FsError> {
    let mode = match mode {
        Some(m) => m & MODE_MASK,
        None => permission_bits(src)?,
    };
    if files_equal(src, dest)? {
        if permission_bits(dest)? == mode {
            debug!("{} already matches {}", dest.display(), src.display());
            return Ok(MutationOutcome::unchanged(dest));
        }
        set_permission_bits(dest, mode)?;
        info!("changed mode of {} to {mode:04o}", dest.display());
        return Ok(MutationOutcome::changed(dest));
    }

    let mut input = File::open(src).map_err(FsError::io("open", src))?;
    stage_and_commit(scratch, "copy-", dest, mode, |f| {
        io::copy(&mut input, f).map(|_| ())
    })?;
    info!("copied {} to {}", src.display(), dest.display());
    Ok(MutationOutcome::changed(dest))
}
