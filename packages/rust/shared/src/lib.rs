//! Shared types, error model, and configuration for qabase.
//!
//! This crate is the foundation depended on by all other qabase crates.
//! It provides:
//! - [`QaBaseError`], the unified error type
//! - Domain types ([`QaEntry`], [`Submission`], [`Status`], [`EntryId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ListingConfig, SearchConfig, ServerConfig, StorageConfig, TranscriptionConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{QaBaseError, Result};
pub use types::{
    AnswerRecord, AnswerSource, Attribution, BatchReport, EntryId, EntryPatch, QaEntry,
    QuestionLogItem, RowError, Source, Status, Submission, timestamp_now,
};
