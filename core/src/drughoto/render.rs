use std::sync::LazyLock;

use time::format_description::{self, OwnedFormatItem};
use time::Date;

use super::classify::HEADER_MARKER;
use super::model::{DrugEntry, ParsedHoto, TotalCount, TotalEntry};

pub const DRUGS_USED_LINE: &str = "Drugs used:";
pub const NIL_LINE: &str = "- Nil";
pub const TOTALS_HEADING: &str = "Drug totals:";

/// Canonical block for one call sign. [`parse_drugs_from_block`] reads this
/// format back.
///
/// [`parse_drugs_from_block`]: super::parser::parse_drugs_from_block
pub fn build_drug_block(call_sign: &str, drugs: &[DrugEntry]) -> Vec<String> {
    let mut lines = vec![format!("*{}*", call_sign), DRUGS_USED_LINE.to_string()];
    if drugs.is_empty() {
        lines.push(NIL_LINE.to_string());
    } else {
        lines.extend(drugs.iter().map(|d| format!("- {} x{}", d.name, d.count)));
    }
    lines
}

/// `2025-02-11` -> `11/02/2025`. Anything that is not a valid ISO calendar
/// date comes back unchanged.
pub fn format_date(iso: &str) -> String {
    let (Some(iso_format), Some(display_format)) = (ISO_DATE.as_ref(), DISPLAY_DATE.as_ref()) else {
        return iso.to_string();
    };
    Date::parse(iso.trim(), iso_format)
        .ok()
        .and_then(|date| date.format(display_format).ok())
        .unwrap_or_else(|| iso.to_string())
}

static ISO_DATE: LazyLock<Option<OwnedFormatItem>> =
    LazyLock::new(|| format_description::parse_owned::<2>("[year]-[month]-[day]").ok());
static DISPLAY_DATE: LazyLock<Option<OwnedFormatItem>> =
    LazyLock::new(|| format_description::parse_owned::<2>("[day]/[month]/[year]").ok());

/// A brand-new handover: header, duty line, the call sign's block and an
/// untallied total per drug.
pub fn render_fresh(date_display: &str, duty: &str, call_sign: &str, drugs: &[DrugEntry]) -> String {
    let mut lines = vec![
        HEADER_MARKER.to_string(),
        format!("{} {}", date_display, duty),
        String::new(),
    ];
    if !call_sign.is_empty() {
        lines.extend(build_drug_block(call_sign, drugs));
        lines.push(String::new());
    }
    if !drugs.is_empty() {
        lines.push(TOTALS_HEADING.to_string());
        lines.extend(
            drugs
                .iter()
                .map(|d| TotalEntry::new(d.name.clone(), TotalCount::Untallied).to_line()),
        );
    }
    lines.join("\n")
}

/// Serialize a parsed handover back to text, one blank line after the heading
/// lines, the preamble and each block.
pub fn render_hoto(parsed: &ParsedHoto) -> String {
    let mut out: Vec<String> = Vec::new();
    if !parsed.header_line.is_empty() {
        out.push(parsed.header_line.clone());
    }
    if !parsed.duty_line.is_empty() {
        out.push(parsed.duty_line.clone());
    }
    if !out.is_empty() {
        out.push(String::new());
    }

    if !parsed.preamble.is_empty() {
        out.extend(parsed.preamble.iter().cloned());
        out.push(String::new());
    }

    for block in &parsed.blocks {
        out.extend(block.lines.iter().cloned());
        out.push(String::new());
    }

    if let Some(heading) = &parsed.totals_heading {
        out.push(heading.clone());
    }
    out.extend(parsed.totals.iter().map(TotalEntry::to_line));
    out.extend(parsed.trailing_lines.iter().cloned());

    out.join("\n").trim_end().to_string()
}
