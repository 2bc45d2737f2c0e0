// src/services/brochure.rs

//! Brochure PDF download and text extraction.
//!
//! Each vote links one brochure PDF; the German, French and Italian
//! variants live at sibling URLs (`brochure-de.pdf` etc.). Every language
//! is fetched and extracted independently so one corrupt or missing
//! variant never costs the others.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{FetchConfig, Language};
use crate::services::Fetcher;

/// One language variant to download and extract.
#[derive(Debug, Clone)]
pub struct BrochureJob {
    /// Full official number; sub-items of the same vote stay separate
    pub official_number: String,
    pub language: Language,
    pub url: String,
}

/// Result of a brochure extraction pass.
#[derive(Debug, Default)]
pub struct BrochureOutcome {
    /// official number → language code → extracted text
    pub texts: BTreeMap<String, BTreeMap<String, String>>,

    /// Language variants attempted
    pub attempted: usize,

    /// Language variants that failed to download or extract
    pub failures: usize,
}

impl BrochureOutcome {
    /// Total language variants successfully extracted.
    pub fn extracted(&self) -> usize {
        self.texts.values().map(BTreeMap::len).sum()
    }
}

/// Derive the per-language brochure URLs from a single linked PDF.
///
/// When the URL does not follow the `brochure-{lang}.pdf` pattern the
/// sibling variants cannot be derived and only the linked document is
/// attempted, under German (the language the source links by default).
pub fn language_urls(pdf_url: &str) -> Vec<(Language, String)> {
    for base in Language::ALL {
        let marker = format!("brochure-{}.pdf", base.code());
        if pdf_url.contains(&marker) {
            return Language::ALL
                .iter()
                .map(|lang| {
                    let variant = format!("brochure-{}.pdf", lang.code());
                    (*lang, pdf_url.replace(&marker, &variant))
                })
                .collect();
        }
    }
    vec![(Language::De, pdf_url.to_string())]
}

/// Extract plain text from PDF bytes.
///
/// `pdf-extract` emits text in content-stream order, which keeps
/// multi-column brochures in reading order; re-sorting glyphs by page
/// position would interleave the columns row by row and is deliberately
/// not done. The raw output is re-flowed for downstream text consumers.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(AppError::pdf)?;
    let text = reflow(&raw);
    if text.trim().is_empty() {
        return Err(AppError::pdf("document contains no extractable text"));
    }
    Ok(text)
}

/// Re-flow raw extraction output: join words hyphenated across line
/// breaks, trim trailing whitespace and collapse blank-line runs into
/// single paragraph breaks.
fn reflow(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let mut out = String::with_capacity(raw.len());
    let mut paragraph_break = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            paragraph_break = !out.is_empty();
            i += 1;
            continue;
        }

        if !out.is_empty() {
            out.push_str(if paragraph_break { "\n\n" } else { "\n" });
        }
        paragraph_break = false;

        let mut current = line.to_string();
        // pull following lines up while the current one ends mid-word
        while current.ends_with('-') && i + 1 < lines.len() {
            let next = lines[i + 1].trim_start();
            if next.chars().next().is_some_and(char::is_lowercase) {
                current.pop();
                current.push_str(next);
                i += 1;
            } else {
                break;
            }
        }
        out.push_str(&current);
        i += 1;
    }

    out
}

/// Downloads and extracts brochure variants with bounded concurrency.
pub struct BrochureExtractor<'a> {
    fetcher: &'a Fetcher,
    max_concurrent: usize,
    delay: Duration,
}

impl<'a> BrochureExtractor<'a> {
    /// Create an extractor sharing the pipeline's fetcher.
    pub fn new(fetcher: &'a Fetcher, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            max_concurrent: config.max_concurrent.max(1),
            delay: Duration::from_millis(config.request_delay_ms),
        }
    }

    /// Build the jobs for one record's linked brochure.
    pub fn jobs_for(official_number: &str, pdf_url: &str) -> Vec<BrochureJob> {
        language_urls(pdf_url)
            .into_iter()
            .map(|(language, url)| BrochureJob {
                official_number: official_number.to_string(),
                language,
                url,
            })
            .collect()
    }

    /// Run all jobs concurrently; failures are logged and counted, never
    /// propagated. Results merge deterministically because they are keyed
    /// on `(official_number, language)`.
    pub async fn extract_all(&self, jobs: Vec<BrochureJob>) -> BrochureOutcome {
        let mut outcome = BrochureOutcome {
            attempted: jobs.len(),
            ..BrochureOutcome::default()
        };

        let mut job_stream = stream::iter(jobs)
            .map(|job| async move {
                let result = self.extract_one(&job).await;
                (job, result)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((job, result)) = job_stream.next().await {
            match result {
                Ok(text) => {
                    outcome
                        .texts
                        .entry(job.official_number)
                        .or_default()
                        .insert(job.language.code().to_string(), text);
                }
                Err(error) => {
                    outcome.failures += 1;
                    log::warn!(
                        "Brochure extraction failed for vote {} ({}): {}",
                        job.official_number,
                        job.language,
                        error
                    );
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        outcome
    }

    async fn extract_one(&self, job: &BrochureJob) -> Result<String> {
        let bytes = self.fetcher.get_bytes(&job.url).await?;
        extract_text(&bytes)
    }
}
