// src/pipeline/assemble.rs

//! Merge freshly parsed records against the previous artifact.
//!
//! The merge key is `vote_id`. Fresh metadata always wins; brochure texts
//! merge per language key so a transient extraction outage never erases
//! previously good text. Records that fell out of the listing are carried
//! forward untouched, never deleted.

use std::collections::{HashMap, HashSet};

use crate::models::{InitiativeRecord, vote_sort_key};

/// Merge this run's records with the previously published ones.
///
/// Output ordering is deterministic regardless of fetch or extraction
/// completion order.
pub fn assemble(
    mut fresh: Vec<InitiativeRecord>,
    previous: &[InitiativeRecord],
) -> Vec<InitiativeRecord> {
    let previous_by_id: HashMap<&str, &InitiativeRecord> =
        previous.iter().map(|r| (r.vote_id.as_str(), r)).collect();
    let fresh_ids: HashSet<String> = fresh.iter().map(|r| r.vote_id.clone()).collect();

    for record in &mut fresh {
        if let Some(prev) = previous_by_id.get(record.vote_id.as_str()) {
            // start from the previous texts so languages not re-extracted
            // this run are carried forward
            let mut texts = prev.brochure_texts.clone();
            for (language, text) in std::mem::take(&mut record.brochure_texts) {
                texts.insert(language, text);
            }
            record.brochure_texts = texts;
        }
    }

    let mut merged = fresh;
    for prev in previous {
        if !fresh_ids.contains(&prev.vote_id) {
            merged.push(prev.clone());
        }
    }

    merged.sort_by(|a, b| vote_sort_key(&a.vote_id).cmp(&vote_sort_key(&b.vote_id)));
    merged
}
