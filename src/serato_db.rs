//! Reads and writes Serato's Database V2 master index: a flat stream of
//! `vrsn` + `otrk` chunks, each `otrk` a nested chunk stream describing one
//! track's fields.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::path_normalizer::clean_path;
use crate::tlv::{self, Tag, TlvError};

const DB_VERSION: &str = "2.0/Serato Scratch LIVE Database";

/// Leaf tags whose payload is UTF-16BE text. Every other tag is opaque
/// bytes that must round-trip bit-for-bit, since a naive reader that
/// decodes every leaf as text would corrupt binary leaves on write.
const TEXT_TAGS: &[&[u8; 4]] = &[
    b"pfil", b"ttyp", b"tadd", b"talb", b"tart", b"ttit", b"tgen", b"tkey", b"tcom", b"tgrp",
    b"tbit", b"tsmp", b"tbpm", b"tlen", b"tmod",
];

fn is_text_tag(tag: &Tag) -> bool {
    TEXT_TAGS.contains(&tag)
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

/// A single field value: decoded text for recognized text tags, opaque
/// bytes for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text(String),
    Raw(Vec<u8>),
}

/// One track record: its fields in the order they were read (or inserted
/// for new records). Field order within a record is preserved rather than
/// normalized, since nothing in the format requires a canonical order and
/// preserving read order is the conservative choice if Serato ever keys on
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(Tag, Field)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag, field: Field) {
        self.fields.push((tag, field));
    }

    pub fn fields(&self) -> &[(Tag, Field)] {
        &self.fields
    }

    /// Look up the decoded text value of a recognized text field, if present.
    pub fn text(&self, tag: &Tag) -> Option<&str> {
        self.fields.iter().find_map(|(t, f)| {
            if t == tag {
                match f {
                    Field::Text(s) => Some(s.as_str()),
                    Field::Raw(_) => None,
                }
            } else {
                None
            }
        })
    }

    /// Build a minimal record containing only a `pfil` path, as inserted
    /// for newly discovered tracks (Serato fills in the rest on analysis).
    pub fn with_path(path: &str) -> Self {
        let mut record = Record::new();
        record.push(*b"pfil", Field::Text(path.to_string()));
        record
    }
}

/// Result of reading a database: the records in read order, the set of
/// in-library paths stripped of the library prefix (for fast new-track
/// diffing), and the inferred library prefix itself.
pub struct ReadDatabase {
    pub records: Vec<Record>,
    pub stripped_paths: HashSet<String>,
    pub library_prefix: String,
}

/// Read a Database V2 file.
///
/// Records whose recognized text tags fail to decode are skipped
/// entirely rather than aborting the read, so a single corrupt track
/// doesn't take down the whole library.
pub fn read_database(db_path: &Path, library_path: &str) -> Result<ReadDatabase, DbError> {
    let buf = fs::read(db_path)?;
    let top_level = tlv::iter_top_level(&buf)?;

    let mut records = Vec::new();
    for chunk in top_level {
        if &chunk.tag != b"otrk" {
            continue;
        }

        match parse_record(&chunk.value) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping corrupt otrk record: {}", e),
        }
    }

    let library_prefix = clean_path(library_path);
    let stripped_paths = build_stripped_path_set(&records, &library_prefix);

    Ok(ReadDatabase {
        records,
        stripped_paths,
        library_prefix,
    })
}

fn parse_record(payload: &[u8]) -> Result<Record, TlvError> {
    let mut record = Record::new();

    for nested in tlv::iter_nested(payload) {
        if is_text_tag(&nested.tag) {
            let text = tlv::decode_utf16be(&nested.value)?;
            record.push(nested.tag, Field::Text(text));
        } else {
            record.push(nested.tag, Field::Raw(nested.value));
        }
    }

    Ok(record)
}

/// For each record whose `pfil` (after `clean_path`) starts with
/// `library_prefix + "/"` (or unconditionally, when the prefix is empty),
/// insert the remainder into the set. Paths outside the prefix can't be
/// compared against the local library and are excluded.
fn build_stripped_path_set(records: &[Record], library_prefix: &str) -> HashSet<String> {
    let mut set = HashSet::new();

    for record in records {
        let Some(pfil) = record.text(b"pfil") else {
            continue;
        };
        let cleaned = clean_path(pfil);

        if library_prefix.is_empty() {
            set.insert(cleaned);
        } else if let Some(rest) = cleaned.strip_prefix(&format!("{library_prefix}/")) {
            set.insert(rest.to_string());
        }
    }

    set
}

/// Write a Database V2 file. Records are emitted in the order given; the
/// caller is responsible for appending new records after existing ones
/// rather than interleaving, per the format's ordering invariant.
pub fn write_database(db_path: &Path, records: &[Record]) -> Result<(), DbError> {
    let mut out = tlv::encode_chunk(b"vrsn", &tlv::encode_utf16be(DB_VERSION));

    for record in records {
        let mut nested = Vec::new();
        for (tag, field) in &record.fields {
            let payload = match field {
                Field::Text(s) => tlv::encode_utf16be(s),
                Field::Raw(bytes) => bytes.clone(),
            };
            nested.extend(tlv::encode_chunk(tag, &payload));
        }
        out.extend(tlv::encode_chunk(b"otrk", &nested));
    }

    crate::atomic_write::write_atomic(db_path, &out)?;
    Ok(())
}
