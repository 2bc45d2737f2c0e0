//! Service layer for the pipeline.
//!
//! This module contains the network-facing stages:
//! - HTTP fetching with retry (`Fetcher`)
//! - Listing page parsing (`parse_listing`)
//! - Detail page parsing (`parse_detail`)
//! - Brochure PDF text extraction (`BrochureExtractor`)

mod brochure;
mod detail;
mod fetcher;
mod listing;

pub use brochure::{BrochureExtractor, BrochureJob, BrochureOutcome, extract_text, language_urls};
pub use detail::parse_detail;
pub use fetcher::Fetcher;
pub use listing::{ListingEntry, parse_listing};
