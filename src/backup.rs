//! Byte-exact copy of the database file to a timestamped sibling, taken
//! immediately before any mutation.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("failed to back up database: {0}")]
    Io(#[from] std::io::Error),
}

/// Copy `db_path` to `<db_path>.backup.<unix-seconds>` and return the
/// backup path. The copy is fully flushed and closed before returning, so
/// a caller can rely on the backup being durable before proceeding to
/// write the database.
pub fn backup_database(db_path: &Path) -> Result<PathBuf, BackupError> {
    let epoch_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let backup_path = append_suffix(db_path, &format!(".backup.{epoch_seconds}"));

    std::fs::copy(db_path, &backup_path)?;
    info!("backed up database to {:?}", backup_path);

    Ok(backup_path)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os_string = path.as_os_str().to_owned();
    os_string.push(suffix);
    PathBuf::from(os_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_is_byte_exact_copy() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("database V2");
        std::fs::write(&db_path, b"original contents").unwrap();

        let backup_path = backup_database(&db_path).unwrap();

        assert_eq!(
            std::fs::read(&backup_path).unwrap(),
            std::fs::read(&db_path).unwrap()
        );
    }

    #[test]
    fn backup_path_has_timestamp_suffix() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("database V2");
        std::fs::write(&db_path, b"x").unwrap();

        let backup_path = backup_database(&db_path).unwrap();
        let name = backup_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("database V2.backup."));
    }

    #[test]
    fn backup_fails_if_source_missing() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("does-not-exist");
        assert!(backup_database(&db_path).is_err());
    }
}
