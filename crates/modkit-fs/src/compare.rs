use crate::FsError;
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::Path;

/// Hex characters kept from the blake3 output (128 bits).
const DIGEST_HEX_LEN: usize = 32;

fn truncate(hash: &blake3::Hash) -> String {
    hash.to_hex().as_str()[..DIGEST_HEX_LEN].to_owned()
}

/// 128-bit blake3-derived content digest of a file, as lowercase hex.
pub fn file_digest(path: &Path) -> Result<String, FsError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
        _ => FsError::io("open", path)(e),
    })?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(FsError::io("read", path))?;
    Ok(truncate(&hasher.finalize()))
}

fn bytes_digest(content: &[u8]) -> String {
    truncate(&blake3::hash(content))
}

/// Whether two files hold identical bytes.
///
/// `a` must exist. A missing `b` is simply "not equal". Sizes are compared
/// before any content is read.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool, FsError> {
    let meta_a = match fs::metadata(a) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FsError::NotFound(a.to_path_buf()))
        }
        Err(e) => return Err(FsError::io("stat", a)(e)),
    };
    let meta_b = match fs::metadata(b) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FsError::io("stat", b)(e)),
    };
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(file_digest(a)? == file_digest(b)?)
}

/// Whether the file at `path` already holds exactly `content`.
/// A missing file never matches.
pub fn content_matches(path: &Path, content: &[u8]) -> Result<bool, FsError> {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FsError::io("stat", path)(e)),
    };
    if !meta.is_file() || meta.len() != content.len() as u64 {
        return Ok(false);
    }
    Ok(file_digest(path)? == bytes_digest(content))
}
