// src/pipeline/validate.rs

//! Dataset validation.
//!
//! A pure function over the assembled record set: no network access, no
//! side effects. Problems are either warnings (recorded in the run
//! summary, publish proceeds) or blocking defects (the run aborts and the
//! previous artifact stays in place).

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, InitiativeRecord, Language, Stance};
use crate::storage::ArtifactStore;

/// One validation finding, attached to a record.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub vote_id: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(vote_id: &str, message: impl Into<String>) -> Self {
        Self {
            vote_id: vote_id.to_string(),
            message: message.into(),
        }
    }
}

/// Validation outcome, split by severity.
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationIssue>,
    pub defects: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// The run may publish only when no blocking defect was found.
    pub fn is_publishable(&self) -> bool {
        self.defects.is_empty()
    }
}

/// Validate the assembled record set.
///
/// Blocking defects: duplicate or empty `vote_id`, empty title, a voting
/// date that does not parse with `date_format`, a `brochure_texts` key
/// outside {de, fr, it}, or an empty brochure text standing in for a
/// failed extraction. Warnings: stance labels outside the fixed
/// vocabulary and a missing brochure PDF link.
pub fn validate(records: &[InitiativeRecord], date_format: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *seen.entry(record.vote_id.as_str()).or_insert(0) += 1;
    }
    for (vote_id, count) in &seen {
        if *count > 1 {
            report.defects.push(ValidationIssue::new(
                vote_id,
                format!("duplicate vote_id ({count} records)"),
            ));
        }
    }

    for record in records {
        let vote_id = record.vote_id.as_str();

        if vote_id.trim().is_empty() {
            report
                .defects
                .push(ValidationIssue::new(vote_id, "empty vote_id"));
        }
        if record.title.trim().is_empty() {
            report
                .defects
                .push(ValidationIssue::new(vote_id, "empty title"));
        }

        if record.parse_voting_date(date_format).is_none() {
            report.defects.push(ValidationIssue::new(
                vote_id,
                format!("unparsable voting_date '{}'", record.voting_date),
            ));
        }

        for (language, text) in &record.brochure_texts {
            if Language::from_code(language).is_none() {
                report.defects.push(ValidationIssue::new(
                    vote_id,
                    format!("unknown brochure language key '{language}'"),
                ));
            }
            if text.trim().is_empty() {
                report.defects.push(ValidationIssue::new(
                    vote_id,
                    format!("empty brochure text for '{language}'"),
                ));
            }
        }

        for (party, stance) in &record.party_recommendations {
            if Stance::from_label(stance).is_none() {
                report.warnings.push(ValidationIssue::new(
                    vote_id,
                    format!("unrecognized stance '{stance}' for party '{party}'"),
                ));
            }
        }
        for (label, position) in [
            ("federal_council_position", &record.federal_council_position),
            ("parliament_position", &record.parliament_position),
        ] {
            if let Some(position) = position {
                if Stance::from_label(position).is_none() {
                    report.warnings.push(ValidationIssue::new(
                        vote_id,
                        format!("unrecognized stance '{position}' in {label}"),
                    ));
                }
            }
        }

        if record.brochure_pdf_url.is_none() {
            report
                .warnings
                .push(ValidationIssue::new(vote_id, "no brochure PDF linked"));
        }
    }

    report
}

/// Validate an existing artifact from storage, logging every finding.
///
/// Returns an error when no artifact exists or blocking defects were
/// found, so the CLI exit code reflects the result.
pub async fn run_validate(config: &Config, storage: &dyn ArtifactStore) -> Result<ValidationReport> {
    let artifact = storage
        .load_artifact()
        .await?
        .ok_or_else(|| AppError::config("No artifact found to validate"))?;

    log::info!(
        "Validating {} records (generated {})",
        artifact.initiatives.len(),
        artifact.metadata.generated_at
    );

    let report = validate(&artifact.initiatives, &config.listing.date_format);
    log_report(&report);

    if !report.is_publishable() {
        return Err(AppError::validation(format!(
            "{} blocking defects found",
            report.defects.len()
        )));
    }

    log::info!(
        "Validation passed with {} warnings",
        report.warnings.len()
    );
    Ok(report)
}

/// Log warnings and defects at their matching levels.
pub(crate) fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        log::warn!("[{}] {}", warning.vote_id, warning.message);
    }
    for defect in &report.defects {
        log::error!("[{}] {}", defect.vote_id, defect.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    const DATE_FORMAT: &str = "%d.%m.%Y";

    fn record(vote_id: &str) -> InitiativeRecord {
        InitiativeRecord {
            vote_id: vote_id.to_string(),
            official_number: vote_id.to_string(),
            title: "Initiative für eine Zukunft".to_string(),
            keyword: None,
            voting_date: "30.11.2025".to_string(),
            legal_form: Some("Volksinitiative".to_string()),
            policy_area: None,
            initiators: Vec::new(),
            signature_count: Some(124_551),
            federal_council_position: Some("Ablehnung".to_string()),
            parliament_position: None,
            party_recommendations: BTreeMap::new(),
            brochure_pdf_url: Some("https://swissvotes.ch/x/brochure-de.pdf".to_string()),
            initiative_text_pdf_url: None,
            federal_council_message_pdf_url: None,
            description_url: None,
            brochure_texts: BTreeMap::from([("de".to_string(), "Text".to_string())]),
            details_url: "https://swissvotes.ch/vote/681".to_string(),
            last_verified: Utc::now(),
        }
    }

    #[test]
    fn clean_record_passes() {
        let report = validate(&[record("681")], DATE_FORMAT);
        assert!(report.is_publishable());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicate_vote_id_is_blocking() {
        let report = validate(&[record("681"), record("681")], DATE_FORMAT);
        assert!(!report.is_publishable());
        assert!(report.defects[0].message.contains("duplicate"));
    }

    #[test]
    fn unparsable_date_is_blocking() {
        let mut bad = record("681");
        bad.voting_date = "Ende November".to_string();
        let report = validate(&[bad], DATE_FORMAT);
        assert!(!report.is_publishable());
    }

    #[test]
    fn unknown_language_key_is_blocking() {
        let mut bad = record("681");
        bad.brochure_texts
            .insert("en".to_string(), "text".to_string());
        let report = validate(&[bad], DATE_FORMAT);
        assert!(!report.is_publishable());
    }

    #[test]
    fn empty_brochure_text_is_blocking() {
        let mut bad = record("681");
        bad.brochure_texts.insert("fr".to_string(), "  ".to_string());
        let report = validate(&[bad], DATE_FORMAT);
        assert!(!report.is_publishable());
    }

    #[test]
    fn unknown_stance_is_a_warning_only() {
        let mut odd = record("681");
        odd.party_recommendations
            .insert("SP".to_string(), "Jein".to_string());
        let report = validate(&[odd], DATE_FORMAT);
        assert!(report.is_publishable());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn unknown_position_label_is_a_warning_only() {
        let mut odd = record("681");
        odd.federal_council_position = Some("Unklar".to_string());
        let report = validate(&[odd], DATE_FORMAT);
        assert!(report.is_publishable());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn missing_brochure_link_is_a_warning_only() {
        let mut odd = record("681");
        odd.brochure_pdf_url = None;
        let report = validate(&[odd], DATE_FORMAT);
        assert!(report.is_publishable());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn empty_title_is_blocking() {
        let mut bad = record("681");
        bad.title = " ".to_string();
        let report = validate(&[bad], DATE_FORMAT);
        assert!(!report.is_publishable());
    }
}
