// src/lib.rs

//! Swiss popular-initiative ingestion pipeline.
//!
//! Fetches the swissvotes.ch listing, parses per-vote detail pages,
//! extracts multilingual brochure text from the official PDFs and
//! publishes a validated JSON dataset for the read-only query layer.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
