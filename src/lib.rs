//! Synchronizes an on-disk music library with a Serato DJ library: the
//! `_Serato_/Database V2` master index and the per-folder crate files
//! under `_Serato_/Subcrates/`.
//!
//! [`sync`] wires the rest of the modules together; everything else is a
//! focused single-responsibility piece of that pipeline.

pub mod atomic_write;
pub mod backup;
pub mod cleanup;
pub mod config;
pub mod crate_file;
pub mod detector;
pub mod path_normalizer;
pub mod planner;
pub mod scanner;
pub mod serato_db;
pub mod sync;
pub mod tlv;

pub use config::Config;
pub use sync::{CleanSummary, Orchestrator, SyncError, SyncSummary};
