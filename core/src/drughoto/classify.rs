use regex::Regex;
use std::sync::LazyLock;

use super::model::{DrugEntry, TotalEntry};

pub const HEADER_MARKER: &str = "DAILY DRUGS HOTO";

static USAGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+x([0-9]+)$").expect("usage line pattern"));
static BLOCK_DRUG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^-\s+(.+?)\s+x([0-9]+)$").expect("block drug pattern"));
static MARKER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*([A-Za-z0-9]+)\*$").expect("marker pattern"));
static TOTAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z ]+):\s*([0-9]+|-)\s*$").expect("total pattern"));
static TOTALS_HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:drugs?\s+)?totals?\s*:$").expect("totals heading pattern")
});

/// Shape of a single handover line. The duty line has no shape of its own; the
/// parser assigns it by position (first non-blank line after the header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Header,
    Marker(String),
    TotalsHeading,
    Total(TotalEntry),
    DrugLine(DrugEntry),
    Other,
}

pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.contains(HEADER_MARKER) {
        return LineKind::Header;
    }
    if let Some(call_sign) = parse_marker(trimmed) {
        return LineKind::Marker(call_sign);
    }
    if TOTALS_HEADING_LINE.is_match(trimmed) {
        return LineKind::TotalsHeading;
    }
    if let Some(total) = parse_total_line(trimmed) {
        return LineKind::Total(total);
    }
    if let Some(drug) = parse_block_drug_line(trimmed) {
        return LineKind::DrugLine(drug);
    }
    LineKind::Other
}

/// `*A441D*` -> `A441D`.
pub fn parse_marker(line: &str) -> Option<String> {
    MARKER_LINE
        .captures(line.trim())
        .map(|caps| caps[1].trim().to_string())
}

pub fn parse_total_line(line: &str) -> Option<TotalEntry> {
    let caps = TOTAL_LINE.captures(line.trim())?;
    TotalEntry::from_written(caps[1].trim(), &caps[2])
}

/// A `<name> xN` line from the usage box.
pub fn parse_usage_line(line: &str) -> Option<DrugEntry> {
    let caps = USAGE_LINE.captures(line.trim())?;
    Some(DrugEntry::new(caps[1].trim(), parse_count(&caps[2])))
}

/// A `- <name> xN` line inside a call-sign block.
pub fn parse_block_drug_line(line: &str) -> Option<DrugEntry> {
    let caps = BLOCK_DRUG_LINE.captures(line.trim())?;
    Some(DrugEntry::new(caps[1].trim(), parse_count(&caps[2])))
}

// Only ever called on an ASCII `[0-9]+` capture, so the sole failure is overflow.
fn parse_count(digits: &str) -> u32 {
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drughoto::model::TotalCount;

    #[test]
    fn test_classify_each_shape() {
        assert_eq!(classify_line("   "), LineKind::Blank);
        assert_eq!(classify_line("*** DAILY DRUGS HOTO ***"), LineKind::Header);
        assert_eq!(classify_line(" *A441D* "), LineKind::Marker("A441D".to_string()));
        assert_eq!(classify_line("Drug totals:"), LineKind::TotalsHeading);
        assert_eq!(classify_line("TOTALS:"), LineKind::TotalsHeading);
        assert_eq!(
            classify_line("Morphine: 4"),
            LineKind::Total(TotalEntry::new("Morphine", TotalCount::Tallied(4)))
        );
        assert_eq!(
            classify_line("- Midazolam x1"),
            LineKind::DrugLine(DrugEntry::new("Midazolam", 1))
        );
        assert_eq!(classify_line("Drugs used:"), LineKind::Other);
        assert_eq!(classify_line("- Nil"), LineKind::Other);
    }

    #[test]
    fn test_marker_rejects_punctuation_and_spaces() {
        assert!(parse_marker("*A4-41*").is_none());
        assert!(parse_marker("*A 441*").is_none());
        assert!(parse_marker("**").is_none());
        assert!(parse_marker("*A441D* extra").is_none());
    }

    #[test]
    fn test_total_line_needs_letters_and_count() {
        assert!(parse_total_line("Adrenaline 1mg: 2").is_none());
        assert!(parse_total_line("Morphine:").is_none());
        assert!(parse_total_line("Morphine: two").is_none());
        assert_eq!(
            parse_total_line("Normal Saline:-"),
            Some(TotalEntry::new("Normal Saline", TotalCount::Untallied))
        );
    }

    #[test]
    fn test_usage_line_x_is_case_insensitive() {
        assert_eq!(parse_usage_line("Ondansetron X3"), Some(DrugEntry::new("Ondansetron", 3)));
        assert_eq!(parse_usage_line("Morphinex2"), None);
        assert_eq!(parse_usage_line("Morphine x2 ampoules"), None);
    }

    #[test]
    fn test_non_ascii_digits_are_not_counts() {
        assert_eq!(parse_usage_line("Morphine x\u{ff12}"), None);
        assert_eq!(parse_usage_line("Morphine x\u{0663}"), None);
        assert_eq!(parse_block_drug_line("- Morphine x\u{0663}"), None);
        assert!(parse_total_line("Morphine: \u{ff15}").is_none());
    }

    #[test]
    fn test_total_line_keeps_padded_count() {
        let total = parse_total_line("Adrenaline: 05").unwrap();
        assert_eq!(total.count, TotalCount::Tallied(5));
        assert_eq!(total.count_text.as_deref(), Some("05"));
        assert_eq!(parse_total_line("Adrenaline: 5").unwrap().count_text, None);
    }

    #[test]
    fn test_oversized_count_saturates() {
        let entry = parse_usage_line("Saline x99999999999").unwrap();
        assert_eq!(entry.count, u32::MAX);
    }
}
