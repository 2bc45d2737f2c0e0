//! Detail-page field mapping, kept as data.
//!
//! The source markup is a brittle external contract: detail pages are
//! label/value tables whose German labels change independently of this
//! crate. The mapping from label to record field therefore lives in
//! configuration, with the full label set of the current layout as the
//! default. A source layout change is a config update, not a code change.

use serde::{Deserialize, Serialize};

/// Target field of an `InitiativeRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Title,
    Keyword,
    VotingDate,
    OfficialNumber,
    LegalForm,
    PolicyArea,
    Initiators,
    SignatureCount,
    FederalCouncilPosition,
    ParliamentPosition,
    PartyRecommendations,
    BrochurePdf,
    InitiativeTextPdf,
    FederalCouncilMessagePdf,
    DescriptionUrl,
}

/// How the value is pulled out of the table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Extract {
    /// Whitespace-normalized cell text
    #[default]
    Text,

    /// `href` of the first link in the cell, falling back to text
    Href,

    /// Joined `span` texts, falling back to text
    Spans,

    /// Party recommendation structure (`dl.recommendation` or plain lines)
    Recommendations,
}

/// One label-to-field rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// Exact label in the left table cell, after whitespace normalization
    pub label: String,

    /// Record field the value maps to
    pub field: RecordField,

    /// Extraction mode for the right cell
    #[serde(default)]
    pub extract: Extract,
}

/// The complete detail-page mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default = "defaults::rules")]
    pub fields: Vec<FieldRule>,
}

impl FieldMap {
    /// Find the rule for a normalized label.
    pub fn rule_for(&self, label: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.label == label)
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            fields: defaults::rules(),
        }
    }
}

mod defaults {
    use super::{Extract, FieldRule, RecordField};

    fn rule(label: &str, field: RecordField, extract: Extract) -> FieldRule {
        FieldRule {
            label: label.to_string(),
            field,
            extract,
        }
    }

    /// Label set of the current swissvotes.ch detail layout.
    pub fn rules() -> Vec<FieldRule> {
        use Extract::{Href, Recommendations, Spans, Text};
        use RecordField::*;

        vec![
            rule("Offizieller Titel", Title, Text),
            rule("Schlagwort", Keyword, Text),
            rule("Abstimmungsdatum", VotingDate, Text),
            rule("Abstimmungsnummer", OfficialNumber, Text),
            rule("Rechtsform", LegalForm, Text),
            rule("Politikbereich", PolicyArea, Spans),
            rule("Urheber:innen", Initiators, Text),
            rule("Unterschriften", SignatureCount, Text),
            rule("Position des Bundesrats", FederalCouncilPosition, Text),
            rule("Position des Parlaments", ParliamentPosition, Text),
            rule("Parteiparolen", PartyRecommendations, Recommendations),
            rule("Offizielles Abstimmungsbüchlein", BrochurePdf, Href),
            rule("Abstimmungstext", InitiativeTextPdf, Href),
            rule("Botschaft des Bundesrats", FederalCouncilMessagePdf, Href),
            rule("Beschreibung Année Politique Suisse", DescriptionUrl, Href),
        ]
    }
}
