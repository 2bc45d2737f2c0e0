//! Initiative record, stance vocabulary and artifact structures.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Language variants of the official voting brochure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    De,
    Fr,
    It,
}

impl Language {
    /// All brochure languages, in artifact key order.
    pub const ALL: [Language; 3] = [Language::De, Language::Fr, Language::It];

    /// ISO 639-1 code used as the `brochure_texts` key.
    pub fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::Fr => "fr",
            Language::It => "it",
        }
    }

    /// Parse a language code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "de" => Some(Language::De),
            "fr" => Some(Language::Fr),
            "it" => Some(Language::It),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Normalized stance vocabulary for party and government positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Support,
    Oppose,
    Neutral,
    NoRecommendation,
}

impl Stance {
    /// Map a raw stance label from the source to the fixed vocabulary.
    ///
    /// The source uses German labels on detail pages; French and Italian
    /// variants appear in the recommendation blocks of some votes.
    /// Unrecognized labels are a data-quality warning, not an error.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().trim_end_matches(':').to_lowercase();
        match normalized.as_str() {
            "ja" | "oui" | "sì" | "si" | "annahme" | "befürwortend" => Some(Stance::Support),
            "nein" | "non" | "no" | "ablehnung" | "ablehnend" => Some(Stance::Oppose),
            "stimmfreigabe" | "liberté de vote" | "libertà di voto" | "neutral" => {
                Some(Stance::Neutral)
            }
            "keine" | "keine parole" | "keine empfehlung" => Some(Stance::NoRecommendation),
            _ => None,
        }
    }
}

/// One Swiss popular initiative as published in the artifact.
///
/// Optional fields are `None` when the source never provided them; the
/// parser does not emit empty strings as placeholders. `brochure_texts`
/// holds only languages that were actually extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitiativeRecord {
    /// Short unique identifier; merge key between runs
    pub vote_id: String,

    /// Full identifier, may encode sub-items (e.g. "681.1")
    pub official_number: String,

    /// Official title
    pub title: String,

    /// Short topic tag ("Schlagwort")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Voting date as scraped (`DD.MM.YYYY`); the validator parses it
    pub voting_date: String,

    /// Legal form category (e.g. "Volksinitiative")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_form: Option<String>,

    /// Policy area, joined when the source lists several
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_area: Option<String>,

    /// Ordered list of author names
    #[serde(default)]
    pub initiators: Vec<String>,

    /// Valid signature count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_count: Option<u64>,

    /// Federal council stance label, as scraped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federal_council_position: Option<String>,

    /// Parliament stance label, as scraped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parliament_position: Option<String>,

    /// Party code to stance label
    #[serde(default)]
    pub party_recommendations: BTreeMap<String, String>,

    /// URL of the official voting brochure PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brochure_pdf_url: Option<String>,

    /// URL of the initiative text PDF ("Abstimmungstext")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_text_pdf_url: Option<String>,

    /// URL of the federal council message PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federal_council_message_pdf_url: Option<String>,

    /// URL of the Année Politique Suisse description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_url: Option<String>,

    /// Extracted brochure text per language code; keys are a subset of
    /// {de, fr, it} and an absent key means "not yet extracted"
    #[serde(default)]
    pub brochure_texts: BTreeMap<String, String>,

    /// URL of the source detail page
    pub details_url: String,

    /// Timestamp of the run that last saw this record in the listing
    pub last_verified: DateTime<Utc>,
}

impl InitiativeRecord {
    /// Parse the scraped voting date with the given `chrono` format.
    pub fn parse_voting_date(&self, format: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.voting_date, format).ok()
    }
}

/// Sort key for deterministic artifact ordering: numeric vote ids first,
/// in numeric order, then everything else lexicographically.
pub(crate) fn vote_sort_key(vote_id: &str) -> (u64, &str) {
    (vote_id.parse::<u64>().unwrap_or(u64::MAX), vote_id)
}

/// Header of the published artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Timestamp of the publishing run
    pub generated_at: DateTime<Utc>,

    /// Dataset schema version
    pub data_version: String,

    /// Upstream sources the data was assembled from
    pub sources: Vec<String>,
}

/// The published dataset: metadata header plus all initiative records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub metadata: ArtifactMetadata,
    pub initiatives: Vec<InitiativeRecord>,
}

impl Artifact {
    /// Build an artifact with records sorted for deterministic output.
    pub fn new(
        mut initiatives: Vec<InitiativeRecord>,
        data_version: impl Into<String>,
        sources: Vec<String>,
    ) -> Self {
        initiatives.sort_by(|a, b| vote_sort_key(&a.vote_id).cmp(&vote_sort_key(&b.vote_id)));
        Self {
            metadata: ArtifactMetadata {
                generated_at: Utc::now(),
                data_version: data_version.into(),
                sources,
            },
            initiatives,
        }
    }

    /// Look up a record by vote id.
    pub fn find(&self, vote_id: &str) -> Option<&InitiativeRecord> {
        self.initiatives.iter().find(|r| r.vote_id == vote_id)
    }
}
