//! Canonicalizes a file path for cross-database comparison.
//!
//! Serato stores paths with whatever separator and drive convention the
//! writing OS used. `clean_path` reduces a path to a comparable
//! forward-slash form without ever being written back to a file — files
//! keep whatever native form Serato wrote.

/// Normalize a path for comparison: backslashes to forward slashes, strip
/// a leading drive letter (`C:`), trim leading/trailing slashes.
pub fn clean_path(p: &str) -> String {
    let slashed = p.replace('\\', "/");

    let without_drive = if slashed.len() >= 2 && slashed.as_bytes()[1] == b':' {
        &slashed[2..]
    } else {
        slashed.as_str()
    };

    without_drive.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_backslashes() {
        assert_eq!(clean_path("Music\\House\\track.flac"), "Music/House/track.flac");
    }

    #[test]
    fn strips_drive_letter() {
        assert_eq!(clean_path("C:\\Music\\a.mp3"), "Music/a.mp3");
        assert_eq!(clean_path("C:/Music/a.mp3"), "Music/a.mp3");
    }

    #[test]
    fn trims_leading_and_trailing_slashes() {
        assert_eq!(clean_path("/Music/a.mp3/"), "Music/a.mp3");
    }

    #[test]
    fn is_a_fixed_point() {
        for p in ["C:\\Music\\a.mp3", "/Music/a.mp3", "Music/a.mp3", ""] {
            let once = clean_path(p);
            let twice = clean_path(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn empty_path_is_empty() {
        assert_eq!(clean_path(""), "");
    }
}
