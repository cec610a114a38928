use tracing::{debug, trace};

use super::classify::{
    classify_line, parse_block_drug_line, parse_total_line, parse_usage_line, LineKind,
};
use super::model::{CallSignBlock, DrugEntry, ParsedHoto};

/// Parse the free-text usage box, one drug per line.
///
/// Lines that do not read as `<name> xN` are kept as zero-count entries so a
/// typo never blocks the handover.
pub fn parse_drugs(text: &str) -> Vec<DrugEntry> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_usage_line(line).unwrap_or_else(|| DrugEntry::new(line, 0)))
        .collect()
}

/// Recover the drugs recorded in an existing call-sign block. Only
/// `- <name> xN` lines count; `Drugs used:`, the marker and `- Nil` are skipped.
pub fn parse_drugs_from_block(lines: &[String]) -> Vec<DrugEntry> {
    lines
        .iter()
        .filter_map(|line| parse_block_drug_line(line))
        .collect()
}

/// Where the segmenter is within a handover message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    BeforeHeader,
    InPreamble,
    InBlocks,
    InTotals,
    InTrailing,
}

/// Decide whether line `idx` opens the totals section.
///
/// A `Drug totals:` heading always does. A totals-shaped line (`Name: N`) only
/// does when the following line exists and is blank or totals-shaped as well;
/// otherwise it is treated as free text of the enclosing block.
pub fn starts_totals_section(lines: &[&str], kinds: &[LineKind], idx: usize) -> bool {
    match kinds.get(idx) {
        Some(LineKind::TotalsHeading) => true,
        Some(LineKind::Total(_)) => lines
            .get(idx + 1)
            .is_some_and(|next| next.trim().is_empty() || parse_total_line(next).is_some()),
        _ => false,
    }
}

/// Split a handover message into header, duty, blocks, totals and trailing
/// text. Returns `None` only for blank input; every other input yields a
/// (possibly sparse) decomposition.
pub fn parse_hoto(text: &str) -> Option<ParsedHoto> {
    if text.trim().is_empty() {
        debug!("existing handover is blank, nothing to merge into");
        return None;
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let kinds: Vec<LineKind> = lines.iter().map(|line| classify_line(line)).collect();
    let header_idx = kinds.iter().position(|kind| *kind == LineKind::Header);

    let mut parsed = ParsedHoto::default();
    let mut stage = if header_idx.is_some() {
        ParseStage::BeforeHeader
    } else {
        debug!("no DAILY DRUGS HOTO header, scanning from the top");
        ParseStage::InPreamble
    };
    let mut awaiting_duty = false;

    for (idx, (line, kind)) in lines.iter().zip(kinds.iter()).enumerate() {
        trace!(idx, ?stage, ?kind, "classified line");
        match stage {
            ParseStage::BeforeHeader => {
                if Some(idx) == header_idx {
                    parsed.header_line = line.to_string();
                    awaiting_duty = true;
                    stage = ParseStage::InPreamble;
                } else if !line.trim().is_empty() {
                    debug!(idx, "dropping text above the header");
                }
            }
            ParseStage::InPreamble => {
                if starts_totals_section(&lines, &kinds, idx) {
                    awaiting_duty = false;
                    stage = open_totals(&mut parsed, line, kind);
                    continue;
                }
                match kind {
                    LineKind::Blank => {}
                    LineKind::Marker(call_sign) => {
                        awaiting_duty = false;
                        open_block(&mut parsed, call_sign, line);
                        stage = ParseStage::InBlocks;
                    }
                    _ if awaiting_duty => {
                        parsed.duty_line = line.trim().to_string();
                        awaiting_duty = false;
                    }
                    _ => parsed.preamble.push(line.to_string()),
                }
            }
            ParseStage::InBlocks => {
                if let LineKind::Marker(call_sign) = kind {
                    close_block(&mut parsed);
                    open_block(&mut parsed, call_sign, line);
                } else if starts_totals_section(&lines, &kinds, idx) {
                    close_block(&mut parsed);
                    stage = open_totals(&mut parsed, line, kind);
                } else if let Some(block) = parsed.blocks.last_mut() {
                    block.lines.push(line.to_string());
                }
            }
            ParseStage::InTotals | ParseStage::InTrailing => match kind {
                LineKind::Total(total) => parsed.totals.push(total.clone()),
                _ => {
                    parsed.trailing_lines.push(line.to_string());
                    stage = ParseStage::InTrailing;
                }
            },
        }
    }
    if stage == ParseStage::InBlocks {
        close_block(&mut parsed);
    }

    debug!(
        header = !parsed.header_line.is_empty(),
        blocks = parsed.blocks.len(),
        totals = parsed.totals.len(),
        trailing = parsed.trailing_lines.len(),
        "parsed handover"
    );
    Some(parsed)
}

fn open_block(parsed: &mut ParsedHoto, call_sign: &str, marker_line: &str) {
    debug!(call_sign, "call sign block");
    parsed.blocks.push(CallSignBlock {
        call_sign: call_sign.to_string(),
        lines: vec![marker_line.to_string()],
    });
}

// Blank lines at the end of a block separate it from what follows; the
// renderer puts exactly one back.
fn close_block(parsed: &mut ParsedHoto) {
    if let Some(block) = parsed.blocks.last_mut() {
        while block.lines.len() > 1 && block.lines.last().is_some_and(|l| l.trim().is_empty()) {
            block.lines.pop();
        }
    }
}

fn open_totals(parsed: &mut ParsedHoto, line: &str, kind: &LineKind) -> ParseStage {
    match kind {
        LineKind::TotalsHeading => parsed.totals_heading = Some(line.to_string()),
        LineKind::Total(total) => parsed.totals.push(total.clone()),
        _ => parsed.trailing_lines.push(line.to_string()),
    }
    ParseStage::InTotals
}
