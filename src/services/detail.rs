// src/services/detail.rs

//! Detail page parsing.
//!
//! Detail pages are label/value tables; the mapping from label to record
//! field comes from the configured [`FieldMap`], so a source layout change
//! stays a configuration update.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Extract, FieldMap, InitiativeRecord, RecordField};
use crate::services::ListingEntry;
use crate::utils::{normalize_whitespace, resolve};

/// Parse a detail page into an initiative record.
///
/// Mandatory fields are the title and the voting date; a page missing
/// either is a parse error and the caller drops the record for this run.
/// Everything else is optional and maps to an absent field when the
/// source does not provide it.
pub fn parse_detail(
    html: &str,
    entry: &ListingEntry,
    field_map: &FieldMap,
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<InitiativeRecord> {
    let document = Html::parse_document(html);
    let row_sel = parse_selector("table tr")?;
    let link_sel = parse_selector("a[href]")?;
    let span_sel = parse_selector("span")?;
    let dl_sel = parse_selector("dl.recommendation")?;
    let h1_sel = parse_selector("h1")?;

    let mut title: Option<String> = None;
    let mut keyword: Option<String> = None;
    let mut voting_date: Option<String> = None;
    let mut official_number: Option<String> = None;
    let mut legal_form: Option<String> = None;
    let mut policy_area: Option<String> = None;
    let mut initiators: Vec<String> = Vec::new();
    let mut signature_count: Option<u64> = None;
    let mut federal_council_position: Option<String> = None;
    let mut parliament_position: Option<String> = None;
    let mut party_recommendations: BTreeMap<String, String> = BTreeMap::new();
    let mut brochure_pdf_url: Option<String> = None;
    let mut initiative_text_pdf_url: Option<String> = None;
    let mut federal_council_message_pdf_url: Option<String> = None;
    let mut description_url: Option<String> = None;

    for row in document.select(&row_sel) {
        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "th" | "td"))
            .collect();
        if cells.len() != 2 {
            continue;
        }
        // section header rows span the table or carry no value
        if cells[0].value().name() == "th"
            && (cells[0].value().attr("colspan").is_some() || cell_text(&cells[1]).is_empty())
        {
            continue;
        }

        let label = cell_text(&cells[0]);
        let Some(rule) = field_map.rule_for(&label) else {
            continue;
        };
        let value_cell = &cells[1];

        match rule.field {
            RecordField::PartyRecommendations => {
                party_recommendations = parse_recommendations(value_cell, &dl_sel);
            }
            RecordField::SignatureCount => {
                signature_count = parse_signature_count(&cell_text(value_cell));
            }
            RecordField::Initiators => {
                initiators = split_initiators(&cell_text(value_cell));
            }
            field => {
                let value = match rule.extract {
                    Extract::Text => some_nonempty(cell_text(value_cell)),
                    Extract::Href => cell_link(value_cell, &link_sel, base_url)
                        .or_else(|| some_nonempty(cell_text(value_cell))),
                    Extract::Spans => some_nonempty(cell_spans(value_cell, &span_sel)),
                    Extract::Recommendations => None,
                };
                let Some(value) = value else {
                    continue;
                };
                match field {
                    RecordField::Title => title = Some(value),
                    RecordField::Keyword => keyword = Some(value),
                    RecordField::VotingDate => voting_date = Some(value),
                    RecordField::OfficialNumber => official_number = Some(value),
                    RecordField::LegalForm => legal_form = Some(value),
                    RecordField::PolicyArea => policy_area = Some(value),
                    RecordField::FederalCouncilPosition => federal_council_position = Some(value),
                    RecordField::ParliamentPosition => parliament_position = Some(value),
                    RecordField::BrochurePdf => brochure_pdf_url = Some(value),
                    RecordField::InitiativeTextPdf => initiative_text_pdf_url = Some(value),
                    RecordField::FederalCouncilMessagePdf => {
                        federal_council_message_pdf_url = Some(value)
                    }
                    RecordField::DescriptionUrl => description_url = Some(value),
                    _ => {}
                }
            }
        }
    }

    // page heading as title fallback
    if title.is_none() {
        title = document
            .select(&h1_sel)
            .next()
            .and_then(|h1| some_nonempty(normalize_whitespace(&h1.text().collect::<String>())));
    }

    let context = format!("vote {}", entry.vote_id);
    let title = title
        .ok_or_else(|| AppError::parse(context.as_str(), "missing mandatory field: title"))?;
    let voting_date = voting_date.ok_or_else(|| {
        AppError::parse(context.as_str(), "missing mandatory field: voting_date")
    })?;

    Ok(InitiativeRecord {
        vote_id: entry.vote_id.clone(),
        official_number: official_number.unwrap_or_else(|| entry.official_number.clone()),
        title,
        keyword,
        voting_date,
        legal_form,
        policy_area,
        initiators,
        signature_count,
        federal_council_position,
        parliament_position,
        party_recommendations,
        brochure_pdf_url,
        initiative_text_pdf_url,
        federal_council_message_pdf_url,
        description_url,
        brochure_texts: BTreeMap::new(),
        details_url: entry.detail_url.clone(),
        last_verified: now,
    })
}

fn cell_text(cell: &ElementRef) -> String {
    normalize_whitespace(&cell.text().collect::<String>())
}

fn cell_link(cell: &ElementRef, link_sel: &Selector, base_url: &str) -> Option<String> {
    let href = cell.select(link_sel).next()?.value().attr("href")?;
    Some(resolve(base_url, href).unwrap_or_else(|| href.to_string()))
}

fn cell_spans(cell: &ElementRef, span_sel: &Selector) -> String {
    let spans: Vec<String> = cell
        .select(span_sel)
        .map(|span| normalize_whitespace(&span.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();
    if spans.is_empty() {
        cell_text(cell)
    } else {
        spans.join("; ")
    }
}

/// Parse the recommendation block into party → stance label.
///
/// The structured form is one `dl.recommendation` per stance, with the
/// stance in `dt` and one party per `dd`. Older pages render plain
/// `Stance: Party, Party` lines instead.
fn parse_recommendations(cell: &ElementRef, dl_sel: &Selector) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut found_structure = false;

    for dl in cell.select(dl_sel) {
        found_structure = true;
        let mut current_stance: Option<String> = None;
        for child in dl.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "dt" => {
                    current_stance =
                        some_nonempty(normalize_whitespace(&child.text().collect::<String>()));
                }
                "dd" => {
                    if let Some(stance) = &current_stance {
                        let party = normalize_whitespace(&child.text().collect::<String>());
                        if !party.is_empty() {
                            map.insert(party, stance.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if !found_structure {
        for segment in cell.text() {
            for line in segment.split('\n') {
                let Some((stance, parties)) = line.split_once(':') else {
                    continue;
                };
                let stance = stance.trim();
                if stance.is_empty() {
                    continue;
                }
                for party in parties.split(',') {
                    let party = party.trim();
                    if !party.is_empty() {
                        map.insert(party.to_string(), stance.to_string());
                    }
                }
            }
        }
    }

    map
}

/// Parse a signature count like `124'551 gültige Unterschriften`.
fn parse_signature_count(raw: &str) -> Option<u64> {
    let pattern = Regex::new(r"\d[\d'’\u{202f}\u{00a0} ]*").ok()?;
    let matched = pattern.find(raw)?;
    let digits: String = matched
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Split the author cell into an ordered name list.
fn split_initiators(raw: &str) -> Vec<String> {
    let separator = if raw.contains(';') { ';' } else { ',' };
    raw.split(separator)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

fn some_nonempty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMap;

    const BASE: &str = "https://swissvotes.ch";

    fn entry() -> ListingEntry {
        ListingEntry {
            vote_id: "681".into(),
            official_number: "681".into(),
            detail_url: "https://swissvotes.ch/vote/681".into(),
        }
    }

    fn detail_html() -> String {
        r#"<html><body>
        <h1>Eidgenössische Volksinitiative</h1>
        <table>
          <tr><th colspan="2">Basisdaten</th></tr>
          <tr><th>Offizieller Titel</th><td>Initiative für eine Zukunft</td></tr>
          <tr><th>Schlagwort</th><td>Steuern</td></tr>
          <tr><th>Abstimmungsdatum</th><td>30.11.2025</td></tr>
          <tr><th>Abstimmungsnummer</th><td>681</td></tr>
          <tr><th>Rechtsform</th><td>Volksinitiative</td></tr>
          <tr><th>Politikbereich</th><td><span>Finanzwesen</span><span>Sozialpolitik</span></td></tr>
          <tr><th>Urheber:innen</th><td>JUSO Schweiz; Komitee für eine Zukunft</td></tr>
          <tr><th>Unterschriften</th><td>124'551 gültige</td></tr>
          <tr><th>Position des Bundesrats</th><td>Ablehnung</td></tr>
          <tr><th>Position des Parlaments</th><td>Ablehnung</td></tr>
          <tr><th>Parteiparolen</th><td>
            <dl class="recommendation"><dt>Ja</dt><dd>SP</dd><dd>GRÜNE</dd></dl>
            <dl class="recommendation"><dt>Nein</dt><dd>SVP</dd><dd>FDP</dd></dl>
          </td></tr>
          <tr><th>Offizielles Abstimmungsbüchlein</th><td><a href="/attachments/brochure-de.pdf">PDF</a></td></tr>
          <tr><th>Abstimmungstext</th><td><a href="/attachments/text-de.pdf">PDF</a></td></tr>
          <tr><th>Botschaft des Bundesrats</th><td><a href="/attachments/message-de.pdf">PDF</a></td></tr>
        </table>
        </body></html>"#
            .to_string()
    }

    #[test]
    fn parses_full_detail_page() {
        let record = parse_detail(
            &detail_html(),
            &entry(),
            &FieldMap::default(),
            BASE,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(record.vote_id, "681");
        assert_eq!(record.title, "Initiative für eine Zukunft");
        assert_eq!(record.keyword.as_deref(), Some("Steuern"));
        assert_eq!(record.voting_date, "30.11.2025");
        assert_eq!(record.legal_form.as_deref(), Some("Volksinitiative"));
        assert_eq!(
            record.policy_area.as_deref(),
            Some("Finanzwesen; Sozialpolitik")
        );
        assert_eq!(
            record.initiators,
            vec!["JUSO Schweiz", "Komitee für eine Zukunft"]
        );
        assert_eq!(record.signature_count, Some(124_551));
        assert_eq!(record.federal_council_position.as_deref(), Some("Ablehnung"));
        assert_eq!(record.parliament_position.as_deref(), Some("Ablehnung"));
        assert_eq!(
            record.brochure_pdf_url.as_deref(),
            Some("https://swissvotes.ch/attachments/brochure-de.pdf")
        );
        assert_eq!(record.party_recommendations.get("SP").map(String::as_str), Some("Ja"));
        assert_eq!(
            record.party_recommendations.get("SVP").map(String::as_str),
            Some("Nein")
        );
        assert!(record.brochure_texts.is_empty());
    }

    #[test]
    fn h1_is_title_fallback() {
        let html = r#"<html><body><h1>Initiative für eine Zukunft</h1>
            <table><tr><th>Abstimmungsdatum</th><td>30.11.2025</td></tr></table>
            </body></html>"#;
        let record =
            parse_detail(html, &entry(), &FieldMap::default(), BASE, Utc::now()).unwrap();
        assert_eq!(record.title, "Initiative für eine Zukunft");
    }

    #[test]
    fn missing_voting_date_is_a_parse_error() {
        let html = r#"<html><body><table>
            <tr><th>Offizieller Titel</th><td>Initiative für eine Zukunft</td></tr>
            </table></body></html>"#;
        let result = parse_detail(html, &entry(), &FieldMap::default(), BASE, Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn missing_title_is_a_parse_error() {
        let html = r#"<html><body><table>
            <tr><th>Abstimmungsdatum</th><td>30.11.2025</td></tr>
            </table></body></html>"#;
        let result = parse_detail(html, &entry(), &FieldMap::default(), BASE, Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn empty_optional_cells_stay_absent() {
        let html = r#"<html><body><table>
            <tr><th>Offizieller Titel</th><td>Initiative für eine Zukunft</td></tr>
            <tr><th>Abstimmungsdatum</th><td>30.11.2025</td></tr>
            <tr><th>Schlagwort</th><td>  </td></tr>
            </table></body></html>"#;
        let record =
            parse_detail(html, &entry(), &FieldMap::default(), BASE, Utc::now()).unwrap();
        assert_eq!(record.keyword, None);
        assert_eq!(record.signature_count, None);
    }

    #[test]
    fn recommendations_plain_text_fallback() {
        let html = r#"<html><body><table>
            <tr><th>Offizieller Titel</th><td>Initiative für eine Zukunft</td></tr>
            <tr><th>Abstimmungsdatum</th><td>30.11.2025</td></tr>
            <tr><th>Parteiparolen</th><td>Ja: SP, GRÜNE
Nein: SVP</td></tr>
            </table></body></html>"#;
        let record =
            parse_detail(html, &entry(), &FieldMap::default(), BASE, Utc::now()).unwrap();
        assert_eq!(record.party_recommendations.get("GRÜNE").map(String::as_str), Some("Ja"));
        assert_eq!(record.party_recommendations.get("SVP").map(String::as_str), Some("Nein"));
    }

    #[test]
    fn signature_count_variants() {
        assert_eq!(parse_signature_count("124'551"), Some(124_551));
        assert_eq!(parse_signature_count("124551 gültige"), Some(124_551));
        assert_eq!(parse_signature_count("ca. 105 000"), Some(105_000));
        assert_eq!(parse_signature_count("keine Angabe"), None);
    }

    #[test]
    fn initiators_split_on_semicolon_before_comma() {
        assert_eq!(
            split_initiators("A; B, C"),
            vec!["A".to_string(), "B, C".to_string()]
        );
        assert_eq!(split_initiators("A, B"), vec!["A", "B"]);
        assert_eq!(split_initiators("  "), Vec::<String>::new());
    }
}
