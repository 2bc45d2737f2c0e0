// src/pipeline/run.rs

//! Full pipeline orchestration.
//!
//! One invocation is one batch: fetch the listing, fetch and parse detail
//! pages, extract brochure texts, merge against the previous artifact,
//! validate and publish. Failures are isolated to the smallest affected
//! unit; only a listing fetch failure or blocking validation defects
//! abort the run.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    Artifact, Config, DropReason, DroppedRecord, InitiativeRecord, RunReport,
};
use crate::pipeline::validate::log_report;
use crate::pipeline::{assemble, validate};
use crate::services::{
    BrochureExtractor, BrochureJob, BrochureOutcome, Fetcher, parse_detail, parse_listing,
};
use crate::storage::{ArtifactStore, Manifest};

/// Run the full pipeline against the configured source and storage.
pub async fn run_pipeline(config: &Config, storage: &dyn ArtifactStore) -> Result<RunReport> {
    let started = Utc::now();
    log::info!("Pipeline starting");

    let fetcher = Fetcher::new(&config.fetch)?;

    let previous = storage
        .load_artifact()
        .await?
        .map(|artifact| artifact.initiatives)
        .unwrap_or_default();
    log::info!("Previous artifact: {} records", previous.len());

    // Stage 1: listing. A failure here is catastrophic for the run.
    let listing_url = config.source.listing_url();
    let listing_html = fetcher.get_text(&listing_url).await?;
    let entries = parse_listing(
        &listing_html,
        &config.listing,
        &config.source.base_url,
        started.date_naive(),
    )?;
    log::info!("Discovered {} initiatives in the listing", entries.len());

    let mut report = RunReport {
        discovered: entries.len(),
        ..RunReport::default()
    };

    // Stage 2: detail pages, bounded concurrency. A bad page drops that
    // record for this run, nothing more.
    let delay = Duration::from_millis(config.fetch.request_delay_ms);
    let concurrency = config.fetch.max_concurrent.max(1);
    let fetcher_ref = &fetcher;

    let mut records: Vec<InitiativeRecord> = Vec::new();
    let mut detail_stream = stream::iter(entries.iter())
        .map(|entry| async move {
            let result = fetcher_ref.get_text(&entry.detail_url).await;
            (entry, result)
        })
        .buffer_unordered(concurrency);

    while let Some((entry, result)) = detail_stream.next().await {
        match result {
            Ok(html) => {
                match parse_detail(&html, entry, &config.detail, &config.source.base_url, started)
                {
                    Ok(record) => records.push(record),
                    Err(error) => {
                        log::warn!("Dropping vote {}: {}", entry.vote_id, error);
                        report.dropped.push(DroppedRecord {
                            vote_id: entry.vote_id.clone(),
                            reason: DropReason::ParseFailed,
                            message: error.to_string(),
                        });
                    }
                }
            }
            Err(error) => {
                log::warn!(
                    "Failed to fetch detail page for vote {}: {}",
                    entry.vote_id,
                    error
                );
                report.dropped.push(DroppedRecord {
                    vote_id: entry.vote_id.clone(),
                    reason: DropReason::DetailFetchFailed,
                    message: error.to_string(),
                });
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    drop(detail_stream);
    report.parsed = records.len();

    // Stage 3: brochure texts, one job per language variant. Jobs are
    // keyed on the full official number so sub-items of the same vote
    // never share an intermediate text map.
    let extractor = BrochureExtractor::new(&fetcher, &config.fetch);
    let jobs: Vec<BrochureJob> = records
        .iter()
        .filter_map(|record| {
            record
                .brochure_pdf_url
                .as_deref()
                .map(|url| BrochureExtractor::jobs_for(&record.official_number, url))
        })
        .flatten()
        .collect();

    let mut outcome = extractor.extract_all(jobs).await;
    report.brochures_attempted = outcome.attempted;
    report.brochures_extracted = outcome.extracted();
    report.extraction_failures = outcome.failures;

    attach_texts(&mut records, &mut outcome);

    // Stage 4: merge against the previous artifact.
    let merged = assemble(records, &previous);
    report.carried_forward = merged.len() - report.parsed;

    // Stages 5 and 6: validate, then publish or fail closed.
    validate_and_publish(merged, config, storage, &mut report).await?;

    log::info!("Run summary: {}", report.summary());
    Ok(report)
}

/// Move extracted brochure texts onto their records, matched by the full
/// official number.
fn attach_texts(records: &mut [InitiativeRecord], outcome: &mut BrochureOutcome) {
    for record in records {
        if let Some(texts) = outcome.texts.remove(&record.official_number) {
            record.brochure_texts = texts;
        }
    }
}

/// Validate the merged record set and publish it atomically.
///
/// On blocking defects the destination is not touched and the previous
/// artifact remains the published state.
pub async fn validate_and_publish(
    merged: Vec<InitiativeRecord>,
    config: &Config,
    storage: &dyn ArtifactStore,
    report: &mut RunReport,
) -> Result<()> {
    let validation = validate(&merged, &config.listing.date_format);
    log_report(&validation);
    report.warning_count = validation.warnings.len();
    report.record_count = merged.len();

    if !validation.is_publishable() {
        log::error!(
            "{} blocking defects; artifact left untouched",
            validation.defects.len()
        );
        return Err(AppError::validation(format!(
            "{} blocking defects prevented publish",
            validation.defects.len()
        )));
    }

    let artifact = Artifact::new(
        merged,
        config.source.data_version.clone(),
        config.source.sources.clone(),
    );
    storage.write_artifact(&artifact).await?;

    let manifest = Manifest::for_artifact(&artifact, report.warning_count);
    storage.write_manifest(&manifest).await?;

    report.published = true;
    log::info!("Published {} records", artifact.initiatives.len());
    Ok(())
}
