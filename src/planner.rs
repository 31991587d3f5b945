//! Turns a scanned library map into the list of crate files that need to
//! exist, one per non-root directory.

use std::path::PathBuf;

use crate::scanner::LibraryMap;

/// One crate to (potentially) write: its output path under
/// `Subcrates/`, and the full library-prefixed track paths it should
/// contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CratePlan {
    pub crate_path: PathBuf,
    pub track_paths: Vec<String>,
}

/// Join the library prefix and a relative file path with `/`, as stored in
/// crate and database records. If the prefix is empty the joined path
/// starts with the file's own first segment.
pub fn build_ptrk(library_prefix: &str, relative_file: &str) -> String {
    if library_prefix.is_empty() {
        relative_file.to_string()
    } else {
        format!("{library_prefix}/{relative_file}")
    }
}

/// Build one crate plan per non-root library-map entry. Root-level files
/// (`relative_dir == "."`) are not eligible for crate membership — Serato's
/// convention is that a crate is a directory.
pub fn build_crate_plans(
    library_map: &LibraryMap,
    serato_root: &std::path::Path,
    library_prefix: &str,
) -> Vec<CratePlan> {
    let mut plans = Vec::new();

    for (relative_dir, files) in library_map {
        if relative_dir == "." {
            continue;
        }

        let crate_name = format!("{}.crate", relative_dir.replace('/', "%%"));
        let crate_path = serato_root.join("Subcrates").join(crate_name);

        let track_paths = files
            .iter()
            .map(|f| build_ptrk(library_prefix, f))
            .collect();

        plans.push(CratePlan {
            crate_path,
            track_paths,
        });
    }

    plans
}
