//! Reads and writes Serato crate files: a flat stream of `vrsn` + `otrk`
//! chunks under `_Serato_/Subcrates/`, one file per user-visible playlist.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::tlv::{self, TlvError};

const CRATE_VERSION: &str = "1.0/Serato ScratchLive Crate";

#[derive(Error, Debug)]
pub enum CrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

/// Write a crate file containing one `otrk`/`ptrk` pair per track path.
///
/// Track paths are forward-slash-joined and already prefixed with the
/// library prefix (see `planner::build_ptrk`). Parent directories are
/// created as needed.
pub fn write_crate(path: &Path, track_paths: &[String]) -> Result<(), CrateError> {
    let mut out = tlv::encode_chunk(b"vrsn", &tlv::encode_utf16be(CRATE_VERSION));

    for track_path in track_paths {
        let ptrk = tlv::encode_chunk(b"ptrk", &tlv::encode_utf16be(track_path));
        out.extend(tlv::encode_chunk(b"otrk", &ptrk));
    }

    crate::atomic_write::write_atomic(path, &out)?;
    debug!(
        "wrote crate {:?} with {} track(s)",
        path,
        track_paths.len()
    );
    Ok(())
}

/// Read the track paths out of a crate file.
///
/// A nonexistent file is an empty list, not an error — it represents a
/// crate that hasn't been written yet. A decode error on a single `ptrk`
/// is skipped so one corrupt record doesn't prevent reading the rest.
pub fn read_crate(path: &Path) -> Result<Vec<String>, CrateError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let buf = fs::read(path)?;
    let top_level = tlv::iter_top_level(&buf)?;

    let mut tracks = Vec::new();
    for chunk in top_level {
        if &chunk.tag != b"otrk" {
            continue;
        }
        for nested in tlv::iter_nested(&chunk.value) {
            if &nested.tag != b"ptrk" {
                continue;
            }
            match tlv::decode_utf16be(&nested.value) {
                Ok(text) => tracks.push(text),
                Err(e) => warn!("skipping corrupt ptrk in {:?}: {}", path, e),
            }
        }
    }

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_missing_crate_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Subcrates").join("Nope.crate");
        assert_eq!(read_crate(&path).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Subcrates").join("House.crate");
        let tracks = vec![
            "Music/House/a.flac".to_string(),
            "Music/House/b.mp3".to_string(),
        ];

        write_crate(&path, &tracks).unwrap();
        assert_eq!(read_crate(&path).unwrap(), tracks);
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("c.crate");
        write_crate(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn leading_vrsn_chunk_has_fixed_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.crate");
        write_crate(&path, &[]).unwrap();

        let buf = fs::read(&path).unwrap();
        let chunks = tlv::iter_top_level(&buf).unwrap();
        assert_eq!(&chunks[0].tag, b"vrsn");
        assert_eq!(
            tlv::decode_utf16be(&chunks[0].value).unwrap(),
            CRATE_VERSION
        );
    }

    #[test]
    fn corrupt_ptrk_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.crate");

        let mut buf = tlv::encode_chunk(b"vrsn", &tlv::encode_utf16be(CRATE_VERSION));
        // A ptrk with an odd-length (malformed) UTF-16BE payload.
        let bad_ptrk = tlv::encode_chunk(b"ptrk", &[0, 1, 2]);
        buf.extend(tlv::encode_chunk(b"otrk", &bad_ptrk));
        // A good record following the bad one.
        let good_ptrk = tlv::encode_chunk(b"ptrk", &tlv::encode_utf16be("Music/ok.flac"));
        buf.extend(tlv::encode_chunk(b"otrk", &good_ptrk));

        fs::write(&path, &buf).unwrap();

        let tracks = read_crate(&path).unwrap();
        assert_eq!(tracks, vec!["Music/ok.flac".to_string()]);
    }
}
