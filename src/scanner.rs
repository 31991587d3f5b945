//! Recursive library walk that groups audio files by their parent
//! directory, relative to the library root.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "aif", "aiff", "wav", "flac", "ogg"];
const MAX_RECURSION_DEPTH: usize = 10;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to read directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to strip library root from {path:?}: {source}")]
    StripPrefix {
        path: PathBuf,
        #[source]
        source: std::path::StripPrefixError,
    },
    #[error("failed to canonicalize {path:?}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Maps a relative directory (from the library root, `"."` for the root
/// itself) to the ordered list of relative audio-file paths directly under
/// it. Each directory owns only its direct files — the map is not
/// recursive per entry.
pub type LibraryMap = BTreeMap<String, Vec<String>>;

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively scan `library_root`, returning a map from relative
/// directory to the audio files directly inside it.
///
/// IO errors on any subtree are fatal: a partial library map would
/// silently under-report new tracks to the rest of the sync pipeline.
/// Symlinked directories are followed once each — a canonicalized-path
/// visited set catches cycles, and `MAX_RECURSION_DEPTH` is a backstop
/// against unbounded non-cyclic nesting.
pub fn scan_library(library_root: &Path) -> Result<LibraryMap, ScanError> {
    info!("scanning library at {:?}", library_root);

    let mut map = LibraryMap::new();
    let mut visited = HashSet::new();
    visited.insert(canonicalize(library_root)?);
    scan_dir(library_root, library_root, 0, &mut visited, &mut map)?;

    info!(
        "scan found {} director{} with audio files",
        map.len(),
        if map.len() == 1 { "y" } else { "ies" }
    );

    Ok(map)
}

fn canonicalize(path: &Path) -> Result<PathBuf, ScanError> {
    fs::canonicalize(path).map_err(|source| ScanError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

fn scan_dir(
    dir: &Path,
    library_root: &Path,
    depth: usize,
    visited: &mut HashSet<PathBuf>,
    map: &mut LibraryMap,
) -> Result<(), ScanError> {
    if depth > MAX_RECURSION_DEPTH {
        warn!(
            "max recursion depth {} reached at {:?}, stopping",
            MAX_RECURSION_DEPTH, dir
        );
        return Ok(());
    }

    let entries = fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let relative_dir = relative_slash_path(dir, library_root)?;
    let mut files_here = Vec::new();

    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            subdirs.push(path);
        } else if path.is_file() && is_audio_file(&path) {
            let relative_file = relative_slash_path(&path, library_root)?;
            files_here.push(relative_file);
        }
    }

    if !files_here.is_empty() {
        files_here.sort();
        debug!("{} has {} audio file(s)", relative_dir, files_here.len());
        map.entry(relative_dir).or_default().extend(files_here);
    }

    for subdir in subdirs {
        let canonical = canonicalize(&subdir)?;
        if !visited.insert(canonical) {
            warn!("skipping already-visited directory {:?}", subdir);
            continue;
        }
        scan_dir(&subdir, library_root, depth + 1, visited, map)?;
    }

    Ok(())
}

fn relative_slash_path(path: &Path, library_root: &Path) -> Result<String, ScanError> {
    let relative = path
        .strip_prefix(library_root)
        .map_err(|source| ScanError::StripPrefix {
            path: path.to_path_buf(),
            source,
        })?;

    if relative.as_os_str().is_empty() {
        return Ok(".".to_string());
    }

    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_library_yields_empty_map() {
        let dir = TempDir::new().unwrap();
        let map = scan_library(dir.path()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn groups_files_by_parent_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("House")).unwrap();
        fs::write(dir.path().join("House").join("track.flac"), b"x").unwrap();

        let map = scan_library(dir.path()).unwrap();
        assert_eq!(
            map.get("House").unwrap(),
            &vec!["House/track.flac".to_string()]
        );
    }

    #[test]
    fn nested_directories_get_their_own_entries() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("Electronic").join("Techno").join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("a.mp3"), b"x").unwrap();

        let map = scan_library(dir.path()).unwrap();
        assert_eq!(
            map.get("Electronic/Techno/2024").unwrap(),
            &vec!["Electronic/Techno/2024/a.mp3".to_string()]
        );
    }

    #[test]
    fn root_level_files_use_dot_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("root_track.wav"), b"x").unwrap();

        let map = scan_library(dir.path()).unwrap();
        assert_eq!(map.get(".").unwrap(), &vec!["root_track.wav".to_string()]);
    }

    #[test]
    fn non_audio_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cover.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let map = scan_library(dir.path()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn extensions_are_matched_case_insensitively() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("track.FLAC"), b"x").unwrap();

        let map = scan_library(dir.path()).unwrap();
        assert_eq!(map.get(".").unwrap(), &vec!["track.FLAC".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_cycle_terminates_instead_of_recursing_forever() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("House");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("track.flac"), b"x").unwrap();

        // A symlink back to the library root creates a directory cycle.
        std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

        let map = scan_library(dir.path()).unwrap();
        assert_eq!(map.get("House").unwrap(), &vec!["House/track.flac".to_string()]);
    }
}
