//! Pipeline stages and entry points.
//!
//! - `assemble`: merge freshly parsed records against the previous artifact
//! - `validate`: classify data-quality problems as warnings or defects
//! - `run_pipeline`: full fetch → parse → extract → assemble → validate →
//!   publish batch
//! - `run_validate`: standalone validation of an existing artifact

pub mod assemble;
pub mod run;
pub mod validate;

pub use assemble::assemble;
pub use run::run_pipeline;
pub use validate::{ValidationIssue, ValidationReport, run_validate, validate};
