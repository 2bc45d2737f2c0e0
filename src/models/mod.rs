// src/models/mod.rs

//! Domain models for the pipeline.
//!
//! Contains the initiative record and artifact shapes, configuration
//! structures and the per-run report types.

mod config;
mod field_map;
mod initiative;
mod report;

// Re-export all public types
pub use config::{Config, FetchConfig, ListingConfig, PathsConfig, SourceConfig};
pub use field_map::{Extract, FieldMap, FieldRule, RecordField};
pub use initiative::{Artifact, ArtifactMetadata, InitiativeRecord, Language, Stance};
pub(crate) use initiative::vote_sort_key;
pub use report::{DropReason, DroppedRecord, RunReport};
