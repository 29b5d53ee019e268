use crate::{FsError, MutationOutcome};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Permission, setuid/setgid and sticky bits.
pub(crate) const MODE_MASK: u32 = 0o7777;

/// Snapshot of a path's metadata, taken without following a final symlink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub exists: bool,
    pub path: PathBuf,
    /// Permission bits in octal, e.g. `"0644"`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mode: String,
    pub size: u64,
    pub isdir: bool,
    pub isreg: bool,
    pub islnk: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lnk_target: Option<PathBuf>,
    pub mtime: i64,
}

/// Stat `path`. A missing path yields a record with `exists = false`.
pub fn file_stat(path: &Path) -> Result<FileStat, FsError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(FileStat {
                path: path.to_path_buf(),
                ..FileStat::default()
            })
        }
        Err(e) => return Err(FsError::io("stat", path)(e)),
    };
    let file_type = meta.file_type();
    let lnk_target = if file_type.is_symlink() {
        Some(fs::read_link(path).map_err(FsError::io("read link", path))?)
    } else {
        None
    };
    Ok(FileStat {
        exists: true,
        path: path.to_path_buf(),
        mode: format!("{:04o}", meta.permissions().mode() & MODE_MASK),
        size: meta.len(),
        isdir: file_type.is_dir(),
        isreg: file_type.is_file(),
        islnk: file_type.is_symlink(),
        lnk_target,
        mtime: meta.mtime(),
    })
}

/// True if anything, including a dangling symlink, occupies `path`.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

pub fn is_dir(path: &Path) -> bool {
    path.is_dir()
}

pub fn is_file(path: &Path) -> bool {
    path.is_file()
}

pub fn is_symlink(path: &Path) -> bool {
    path.is_symlink()
}

/// True if any execute bit is set on the (followed) target.
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Current mode bits of `path`, following symlinks.
pub fn permission_bits(path: &Path) -> Result<u32, FsError> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
        _ => FsError::io("stat", path)(e),
    })?;
    Ok(meta.permissions().mode() & MODE_MASK)
}

pub(crate) fn set_permission_bits(path: &Path, mode: u32) -> Result<(), FsError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(FsError::io("change mode of", path))
}

/// Converge the permission bits of an existing path.
pub fn ensure_mode(path: &Path, mode: u32) -> Result<MutationOutcome, FsError> {
    let mode = mode & MODE_MASK;
    let current = permission_bits(path)?;
    if current == mode {
        debug!("{} already has mode {mode:04o}", path.display());
        return Ok(MutationOutcome::unchanged(path));
    }
    set_permission_bits(path, mode)?;
    info!(
        "changed mode of {} from {current:04o} to {mode:04o}",
        path.display()
    );
    Ok(MutationOutcome::changed(path))
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, FsError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
        _ => FsError::io("read", path)(e),
    })
}

pub fn read_text(path: &Path) -> Result<String, FsError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
        _ => FsError::io("read", path)(e),
    })
}

/// SELinux labels are not managed; callers get `Unsupported` and decide
/// whether that matters.
pub fn preserve_selinux_context(path: &Path) -> Result<(), FsError> {
    Err(FsError::Unsupported(format!(
        "preserving the SELinux context of {}",
        path.display()
    )))
}
