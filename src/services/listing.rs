// src/services/listing.rs

//! Listing page parsing.
//!
//! The votes overview is a plain table; each row carries the voting date,
//! the legal form and the result columns. Upcoming votes are the rows
//! whose result cells are still empty placeholders.

use chrono::NaiveDate;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::ListingConfig;
use crate::utils::{extract_vote_ref, normalize_whitespace, resolve};

// Column layout of the votes table.
const COL_DATE: usize = 1;
const COL_LEGAL_FORM: usize = 2;
const COL_RESULT: usize = 4;
const COL_YES_SHARE: usize = 5;
const COL_TURNOUT: usize = 6;

/// One initiative discovered on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Short unique identifier (official number without sub-item suffix)
    pub vote_id: String,

    /// Full identifier as referenced by the detail link
    pub official_number: String,

    /// Absolute URL of the detail page
    pub detail_url: String,
}

/// Parse the listing page into an ordered, deduplicated entry sequence.
///
/// Rows that do not match the configured legal form, rows whose vote has
/// already been decided and rows without a usable detail link are skipped
/// silently; the listing mixes many ballot types and most rows are not
/// initiatives.
pub fn parse_listing(
    html: &str,
    config: &ListingConfig,
    base_url: &str,
    today: NaiveDate,
) -> Result<Vec<ListingEntry>> {
    let document = Html::parse_document(html);
    let row_sel = parse_selector(&config.row_selector)?;
    let cell_sel = parse_selector("td")?;
    let link_sel = parse_selector("a[href]")?;

    let mut entries: Vec<ListingEntry> = Vec::new();

    for row in document.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < config.min_columns {
            continue;
        }

        // min_columns is configurable, so the fixed columns may still be
        // out of range; a short row is skipped, never indexed
        let Some(legal_form) = cells.get(COL_LEGAL_FORM).map(cell_text) else {
            continue;
        };
        if legal_form != config.legal_form {
            continue;
        }

        if config.require_upcoming {
            let Some(date_str) = cells.get(COL_DATE).map(cell_text) else {
                continue;
            };
            let Ok(vote_date) = NaiveDate::parse_from_str(&date_str, &config.date_format) else {
                continue;
            };
            let (Some(result), Some(yes_share), Some(turnout)) = (
                cells.get(COL_RESULT).map(cell_text),
                cells.get(COL_YES_SHARE).map(cell_text),
                cells.get(COL_TURNOUT).map(cell_text),
            ) else {
                continue;
            };

            // decided votes carry a result and percentage values
            if !result.is_empty() || yes_share != "%" || turnout != "%" || vote_date < today {
                continue;
            }
        }

        let Some(href) = cells
            .last()
            .and_then(|cell| cell.select(&link_sel).next())
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let Some(official_number) = extract_vote_ref(href) else {
            continue;
        };

        if entries.iter().any(|e| e.official_number == official_number) {
            continue;
        }

        let vote_id = official_number
            .split('.')
            .next()
            .unwrap_or(&official_number)
            .to_string();
        let detail_url =
            resolve(base_url, href).unwrap_or_else(|| format!("{base_url}/vote/{official_number}"));

        entries.push(ListingEntry {
            vote_id,
            official_number,
            detail_url,
        });
    }

    Ok(entries)
}

fn cell_text(cell: &scraper::ElementRef) -> String {
    normalize_whitespace(&cell.text().collect::<String>())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://swissvotes.ch";

    fn row(date: &str, form: &str, result: &str, yes: &str, turnout: &str, href: &str) -> String {
        format!(
            "<tr><td>Titel</td><td>{date}</td><td>{form}</td><td>Bund</td>\
             <td>{result}</td><td>{yes}</td><td>{turnout}</td>\
             <td><a href=\"{href}\">Details</a></td></tr>"
        )
    }

    fn listing(rows: &[String]) -> String {
        format!("<html><body><table>{}</table></body></html>", rows.join(""))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn keeps_upcoming_initiative_rows() {
        let html = listing(&[row(
            "30.11.2025",
            "Volksinitiative",
            "",
            "%",
            "%",
            "/vote/681",
        )]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vote_id, "681");
        assert_eq!(entries[0].official_number, "681");
        assert_eq!(entries[0].detail_url, "https://swissvotes.ch/vote/681");
    }

    #[test]
    fn sub_item_reference_keeps_full_number() {
        let html = listing(&[row(
            "30.11.2025",
            "Volksinitiative",
            "",
            "%",
            "%",
            "/vote/681.1",
        )]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();

        assert_eq!(entries[0].vote_id, "681");
        assert_eq!(entries[0].official_number, "681.1");
    }

    #[test]
    fn skips_other_legal_forms() {
        let html = listing(&[row(
            "30.11.2025",
            "Obligatorisches Referendum",
            "",
            "%",
            "%",
            "/vote/682",
        )]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn skips_decided_votes() {
        let html = listing(&[
            row(
                "09.02.2025",
                "Volksinitiative",
                "angenommen",
                "54.2%",
                "41.3%",
                "/vote/670",
            ),
            row("30.11.2025", "Volksinitiative", "", "%", "%", "/vote/681"),
        ]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vote_id, "681");
    }

    #[test]
    fn skips_past_dates_even_without_result() {
        let html = listing(&[row(
            "01.01.2024",
            "Volksinitiative",
            "",
            "%",
            "%",
            "/vote/650",
        )]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn skips_unparsable_dates() {
        let html = listing(&[row(
            "irgendwann",
            "Volksinitiative",
            "",
            "%",
            "%",
            "/vote/683",
        )]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn deduplicates_preserving_order() {
        let html = listing(&[
            row("30.11.2025", "Volksinitiative", "", "%", "%", "/vote/681"),
            row("08.03.2026", "Volksinitiative", "", "%", "%", "/vote/684"),
            row("30.11.2025", "Volksinitiative", "", "%", "%", "/vote/681"),
        ]);
        let entries = parse_listing(&html, &ListingConfig::default(), BASE, today()).unwrap();

        let ids: Vec<&str> = entries.iter().map(|e| e.vote_id.as_str()).collect();
        assert_eq!(ids, vec!["681", "684"]);
    }

    #[test]
    fn ignores_short_rows() {
        let html = "<table><tr><td>header</td></tr></table>";
        let entries = parse_listing(html, &ListingConfig::default(), BASE, today()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn short_rows_are_skipped_with_low_min_columns() {
        // a config may lower min_columns below the fixed column layout;
        // rows missing those columns are skipped, not indexed
        let mut config = ListingConfig::default();
        config.min_columns = 3;
        let html = format!(
            "<html><body><table>\
             <tr><td>Titel</td><td>30.11.2025</td><td>Volksinitiative</td></tr>\
             {}</table></body></html>",
            row("30.11.2025", "Volksinitiative", "", "%", "%", "/vote/681")
        );
        let entries = parse_listing(&html, &config, BASE, today()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vote_id, "681");
    }

    #[test]
    fn include_past_when_upcoming_filter_disabled() {
        let mut config = ListingConfig::default();
        config.require_upcoming = false;
        let html = listing(&[row(
            "09.02.2025",
            "Volksinitiative",
            "angenommen",
            "54.2%",
            "41.3%",
            "/vote/670",
        )]);
        let entries = parse_listing(&html, &config, BASE, today()).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
