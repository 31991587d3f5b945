//! Atomic "write to completion, then rename" helper.
//!
//! Used anywhere a file must never be observed half-written: the database
//! writer and the backup service both route through here so a crash or
//! cancellation mid-write leaves the original file untouched instead of a
//! truncated one.

use std::io::Write;
use std::path::Path;

/// Write `bytes` to `path` via a sibling temp file, flushing and closing it
/// before an atomic rename onto `path`. On any failure the temp file is
/// removed and `path` is left exactly as it was.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| e.error)?;

    Ok(())
}
