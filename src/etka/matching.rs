//! Part resolver: pure text matching over rows and cells collected in-page.
//!
//! Everything here runs without a browser. The navigator ships raw texts,
//! attributes, and computed colors; these functions decide which listing row
//! to click and which detail cell is the requested part.

use super::types::{CandidateRow, DetailCell, PartRecord};

/// Alias sets for the known part categories, as labelled on the catalogue.
const COMPRESSOR_ALIASES: &[&str] = &[
    "compressor",
    "ac compressor",
    "a/c compressor",
    "a c compressor",
];
const CONDENSER_ALIASES: &[&str] = &["condenser"];
const EVAPORATOR_ALIASES: &[&str] = &["evaporator"];
const EXPANSION_ALIASES: &[&str] = &["expansion", "expansion valve", "valve", "regulation valve"];

/// Terms that disqualify a detail-cell match for a category.
const COMPRESSOR_DISALLOWED: &[&str] = &["bracket", "oil"];
const EXPANSION_DISALLOWED: &[&str] = &["evaporator"];

/// The one category whose detail match must anchor the start of the text.
const PREFIX_CATEGORY: &str = "expansion";

/// Listing-row fallback keywords for part types sometimes filed under a
/// related engineering term.
const EXPANSION_SECONDARY: &[&str] = &["evaporator", "electronic regulation"];
const EVAPORATOR_SECONDARY: &[&str] = &["electronic regulation"];

/// Lowercase, drop everything outside ASCII alphanumerics and whitespace,
/// collapse whitespace runs.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Labels a category may appear under. Unknown categories match themselves.
pub fn category_aliases(category: &str) -> Vec<String> {
    let aliases: &[&str] = match category {
        "compressor" => COMPRESSOR_ALIASES,
        "condenser" => CONDENSER_ALIASES,
        "evaporator" => EVAPORATOR_ALIASES,
        "expansion" => EXPANSION_ALIASES,
        _ => return vec![category.to_string()],
    };
    aliases.iter().map(|alias| alias.to_string()).collect()
}

/// Terms whose presence disqualifies a detail match for the category.
pub fn disallowed_terms(category: &str) -> &'static [&'static str] {
    match category {
        "compressor" => COMPRESSOR_DISALLOWED,
        "expansion" => EXPANSION_DISALLOWED,
        _ => &[],
    }
}

/// Fallback keywords tried when the primary listing keyword finds nothing.
pub fn secondary_keywords(category: &str) -> Option<&'static [&'static str]> {
    match category {
        "expansion" => Some(EXPANSION_SECONDARY),
        "evaporator" => Some(EVAPORATOR_SECONDARY),
        _ => None,
    }
}

/// Walk the detail cells in document order and resolve the requested part.
///
/// Number-bearing active cells move a "last known active part" pointer; the
/// first active cell whose text passes the alias and disallowed-term rules
/// confirms the pointer and ends the walk. Greyed-out cells are invisible to
/// both sides of that mechanism.
pub fn find_part(cells: &[DetailCell], category: &str) -> Option<PartRecord> {
    let category = normalize(category);
    if category.is_empty() {
        return None;
    }

    let aliases: Vec<String> = category_aliases(&category)
        .into_iter()
        .map(|alias| normalize(&alias))
        .filter(|alias| !alias.is_empty())
        .collect();
    let disallowed = disallowed_terms(&category);
    let prefix_only = category == PREFIX_CATEGORY;

    let mut candidate: Option<PartRecord> = None;

    for cell in cells {
        if !cell.is_active() {
            continue;
        }

        let text = normalize(&cell.text);
        if text.is_empty() {
            continue;
        }

        if let Some(num) = cell.num.as_deref().filter(|num| !num.is_empty()) {
            candidate = Some(PartRecord {
                num: num.to_string(),
                numn: cell.numn.clone(),
                title: cell.title.clone(),
                text: cell.text.trim().to_string(),
            });
        }

        if candidate.is_none() {
            continue;
        }
        if disallowed.iter().any(|term| text.contains(term)) {
            continue;
        }

        let matched = aliases.iter().any(|alias| {
            if prefix_only {
                // Only aliases anchored on the category name count for the
                // prefix rule; a bare "valve ..." row is not an expansion part.
                alias.starts_with(&category) && text.starts_with(alias.as_str())
            } else {
                text.contains(alias.as_str())
            }
        });
        if matched {
            return candidate;
        }
    }

    None
}

/// Pick the listing row to click for a category: exact match first, then
/// prefix, then substring, active rows only. Secondary keywords are tried
/// when the primary keyword finds nothing.
pub fn select_row(rows: &[CandidateRow], category: &str) -> Option<usize> {
    let keyword = normalize(category);
    if keyword.is_empty() {
        return None;
    }

    if let Some(index) = find_match(rows, &keyword) {
        return Some(index);
    }

    secondary_keywords(&keyword)?
        .iter()
        .find_map(|keyword| find_match(rows, &normalize(keyword)))
}

fn find_match(rows: &[CandidateRow], keyword: &str) -> Option<usize> {
    if keyword.is_empty() {
        return None;
    }
    find_by(rows, |text| text == keyword)
        .or_else(|| find_by(rows, |text| text.starts_with(keyword)))
        .or_else(|| find_by(rows, |text| text.contains(keyword)))
}

fn find_by(rows: &[CandidateRow], pred: impl Fn(&str) -> bool) -> Option<usize> {
    rows.iter()
        .filter(|row| row.is_active())
        .find(|row| pred(&normalize(&row.text)))
        .map(|row| row.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etka::types::ACTIVE_TEXT_COLOR;

    const GREY: &str = "#808080";

    fn cell(text: &str, num: Option<&str>, color: &str) -> DetailCell {
        DetailCell {
            text: text.to_string(),
            num: num.map(String::from),
            numn: None,
            title: None,
            color: color.to_string(),
        }
    }

    fn active_cell(text: &str, num: &str) -> DetailCell {
        cell(text, Some(num), ACTIVE_TEXT_COLOR)
    }

    fn label_cell(text: &str) -> DetailCell {
        cell(text, None, ACTIVE_TEXT_COLOR)
    }

    fn grey_cell(text: &str, num: &str) -> DetailCell {
        cell(text, Some(num), GREY)
    }

    fn active_row(index: usize, text: &str) -> CandidateRow {
        CandidateRow {
            index,
            text: text.to_string(),
            colors: vec![ACTIVE_TEXT_COLOR.to_string()],
        }
    }

    fn grey_row(index: usize, text: &str) -> CandidateRow {
        CandidateRow {
            index,
            text: text.to_string(),
            colors: vec![GREY.to_string()],
        }
    }

    #[test]
    fn test_normalize_case_and_punctuation() {
        assert_eq!(normalize("A/C Compressor"), "ac compressor");
        assert_eq!(normalize("  Expansion,   VALVE!  "), "expansion valve");
        assert_eq!(normalize("Condenser, air conditioning"), "condenser air conditioning");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("???"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize("Condenser, air conditioning 64539888777");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_category_aliases() {
        assert!(category_aliases("compressor").contains(&"a c compressor".to_string()));
        assert_eq!(category_aliases("condenser"), vec!["condenser"]);
        assert_eq!(category_aliases("heater core"), vec!["heater core"]);
    }

    #[test]
    fn test_disallowed_terms() {
        assert_eq!(disallowed_terms("compressor"), &["bracket", "oil"]);
        assert_eq!(disallowed_terms("expansion"), &["evaporator"]);
        assert!(disallowed_terms("condenser").is_empty());
    }

    #[test]
    fn test_find_part_condenser_on_active_row() {
        let cells = vec![active_cell("Condenser, air conditioning 64539888777", "64539888777")];

        let part = find_part(&cells, "condenser").unwrap();
        assert_eq!(part.num, "64539888777");
        assert_eq!(part.text, "Condenser, air conditioning 64539888777");
    }

    #[test]
    fn test_find_part_requires_active_color() {
        // A text match on a greyed-out cell must never produce a record.
        let cells = vec![grey_cell("Compressor 64529999999", "64529999999")];
        assert!(find_part(&cells, "compressor").is_none());
    }

    #[test]
    fn test_find_part_disallowed_terms_exclude_candidate() {
        // Active bracket entry plus an inactive clean entry: nothing qualifies.
        let cells = vec![
            active_cell("A/C Compressor Bracket 64529123456", "64529123456"),
            grey_cell("Compressor 64529999999", "64529999999"),
        ];
        assert!(find_part(&cells, "compressor").is_none());
    }

    #[test]
    fn test_find_part_later_active_match_wins() {
        let cells = vec![
            active_cell("A/C Compressor Bracket 64529123456", "64529123456"),
            active_cell("Compressor 64529999999", "64529999999"),
        ];

        let part = find_part(&cells, "compressor").unwrap();
        assert_eq!(part.num, "64529999999");
    }

    #[test]
    fn test_find_part_label_cell_confirms_number_cell() {
        // Real layout: the number cell and the descriptive cell are separate.
        let cells = vec![
            active_cell("64526956715", "64526956715"),
            label_cell("A/C Compressor"),
        ];

        let part = find_part(&cells, "compressor").unwrap();
        assert_eq!(part.num, "64526956715");
    }

    #[test]
    fn test_find_part_oil_entry_is_skipped_not_fatal() {
        let cells = vec![
            active_cell("Compressor oil 100ml G052300A2", "G052300A2"),
            active_cell("A/C Compressor 64526956715", "64526956715"),
        ];

        let part = find_part(&cells, "compressor").unwrap();
        assert_eq!(part.num, "64526956715");
    }

    #[test]
    fn test_find_part_expansion_requires_prefix() {
        let hit = vec![active_cell("Expansion valve assembly 1K0820679", "1K0820679")];
        assert_eq!(find_part(&hit, "expansion").unwrap().num, "1K0820679");

        let miss = vec![active_cell("Valve expansion kit 1K0820680", "1K0820680")];
        assert!(find_part(&miss, "expansion").is_none());
    }

    #[test]
    fn test_find_part_expansion_rejects_evaporator_text() {
        let cells = vec![active_cell("Expansion valve, evaporator side 3C1820679", "3C1820679")];
        assert!(find_part(&cells, "expansion").is_none());
    }

    #[test]
    fn test_find_part_category_input_is_normalized() {
        let cells = vec![active_cell("Condenser 64539888777", "64539888777")];
        assert!(find_part(&cells, "CONDENSER").is_some());
        assert!(find_part(&cells, " condenser! ").is_some());
    }

    #[test]
    fn test_find_part_unknown_category_matches_itself() {
        let cells = vec![active_cell("Heater core 5Q0819031", "5Q0819031")];
        assert_eq!(find_part(&cells, "heater core").unwrap().num, "5Q0819031");
        assert!(find_part(&cells, "condenser").is_none());
    }

    #[test]
    fn test_find_part_empty_inputs() {
        assert!(find_part(&[], "compressor").is_none());

        let cells = vec![active_cell("Compressor 64529999999", "64529999999")];
        assert!(find_part(&cells, "").is_none());
        assert!(find_part(&cells, "   ").is_none());
    }

    #[test]
    fn test_find_part_is_idempotent() {
        let cells = vec![
            active_cell("A/C Compressor Bracket 64529123456", "64529123456"),
            active_cell("Compressor 64529999999", "64529999999"),
        ];

        let first = find_part(&cells, "compressor");
        let second = find_part(&cells, "compressor");
        assert_eq!(first, second);
    }

    #[test]
    fn test_select_row_exact_beats_prefix() {
        let rows = vec![
            active_row(0, "Expansion valve assembly"),
            active_row(1, "Expansion"),
        ];
        assert_eq!(select_row(&rows, "expansion"), Some(1));
    }

    #[test]
    fn test_select_row_prefix_beats_substring() {
        let rows = vec![
            active_row(0, "Electric compressor unit"),
            active_row(1, "Compressor mounting"),
        ];
        assert_eq!(select_row(&rows, "compressor"), Some(1));
    }

    #[test]
    fn test_select_row_substring_fallback() {
        let rows = vec![active_row(0, "A/C compressor with magnetic clutch")];
        assert_eq!(select_row(&rows, "compressor"), Some(0));
    }

    #[test]
    fn test_select_row_skips_inactive_rows() {
        let rows = vec![
            grey_row(0, "Compressor"),
            active_row(1, "Compressor"),
        ];
        assert_eq!(select_row(&rows, "compressor"), Some(1));
    }

    #[test]
    fn test_select_row_secondary_keywords() {
        let rows = vec![active_row(0, "Evaporator, electronic regulation")];
        assert_eq!(select_row(&rows, "expansion"), Some(0));

        let regulation_only = vec![active_row(0, "Electronic regulation")];
        assert_eq!(select_row(&regulation_only, "evaporator"), Some(0));
        assert_eq!(select_row(&regulation_only, "condenser"), None);
    }

    #[test]
    fn test_select_row_first_active_match_in_document_order() {
        let rows = vec![
            active_row(0, "Condenser with dryer"),
            active_row(1, "Condenser with dryer"),
        ];
        assert_eq!(select_row(&rows, "condenser"), Some(0));
    }

    #[test]
    fn test_select_row_empty_inputs() {
        assert_eq!(select_row(&[], "compressor"), None);

        let rows = vec![active_row(0, "Compressor")];
        assert_eq!(select_row(&rows, ""), None);
    }
}
