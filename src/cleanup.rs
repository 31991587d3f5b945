//! Database hygiene pass: prunes corrupted, path-less, metadata-less, and
//! duplicate records.

use std::collections::HashSet;

use crate::serato_db::Record;

/// Counts produced by a cleanup pass, for the cleanup report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub original: usize,
    pub removed_no_path: usize,
    pub removed_corrupted: usize,
    pub removed_no_metadata: usize,
    pub removed_duplicates: usize,
    pub final_count: usize,
}

/// Filter `records` in order, classifying and dropping the ones that fail
/// validity, corruption, metadata, or duplicate checks.
pub fn clean_records(
    records: Vec<Record>,
    remove_duplicates: bool,
    require_metadata: bool,
) -> (Vec<Record>, CleanupStats) {
    let mut stats = CleanupStats {
        original: records.len(),
        ..Default::default()
    };

    let mut kept = Vec::new();
    let mut seen_paths: HashSet<String> = HashSet::new();

    for record in records {
        let Some(pfil) = record.text(b"pfil") else {
            stats.removed_no_path += 1;
            continue;
        };
        let trimmed = pfil.trim();
        if trimmed.is_empty() {
            stats.removed_no_path += 1;
            continue;
        }

        if trimmed.len() < 3 || trimmed.contains('\0') {
            stats.removed_corrupted += 1;
            continue;
        }

        if require_metadata && has_no_metadata(&record) {
            stats.removed_no_metadata += 1;
            continue;
        }

        if remove_duplicates {
            let normalized = crate::path_normalizer::clean_path(trimmed).to_lowercase();
            if !seen_paths.insert(normalized) {
                stats.removed_duplicates += 1;
                continue;
            }
        }

        kept.push(record);
    }

    stats.final_count = kept.len();
    (kept, stats)
}

fn has_no_metadata(record: &Record) -> bool {
    [b"ttit", b"tart", b"talb"]
        .iter()
        .all(|tag| is_blank(record.text(*tag)))
}

fn is_blank(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(s) => s.trim().is_empty(),
    }
}
