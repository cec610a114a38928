use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::model::{CallSignBlock, DrugEntry, ParsedHoto};
use super::parser::{parse_drugs, parse_drugs_from_block, parse_hoto};
use super::render::{build_drug_block, format_date, render_fresh, render_hoto, TOTALS_HEADING};
use super::totals::recalc_totals;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HotoMode {
    #[default]
    Create,
    Update,
}

impl HotoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotoMode::Create => "create",
            HotoMode::Update => "update",
        }
    }
}

impl FromStr for HotoMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(HotoMode::Create),
            "update" => Ok(HotoMode::Update),
            other => Err(CoreError::InvalidInput(format!(
                "mode must be create or update, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for HotoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day duty or night duty.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Duty {
    #[default]
    DD,
    ND,
}

impl Duty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Duty::DD => "DD",
            Duty::ND => "ND",
        }
    }
}

impl FromStr for Duty {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DD" => Ok(Duty::DD),
            "ND" => Ok(Duty::ND),
            other => Err(CoreError::InvalidInput(format!(
                "duty must be DD or ND, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the handover form holds at one moment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HotoRequest {
    #[serde(default)]
    pub mode: HotoMode,
    /// ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub duty: Duty,
    #[serde(default)]
    pub call_sign: String,
    #[serde(default)]
    pub drugs_text: String,
    #[serde(default)]
    pub existing_text: String,
    /// Call sign the form held before this edit. Lets a cleared call sign drop
    /// the block it used to own.
    #[serde(default)]
    pub previous_call_sign: Option<String>,
}

impl HotoRequest {
    pub fn from_json(json_str: &str) -> CoreResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| CoreError::InvalidInput(format!("Failed to parse HOTO request: {}", e)))
    }
}

/// Produce the handover text for the current form contents. Never fails:
/// unreadable input degrades to a fresh handover or passes through unchanged.
pub fn build_output(req: &HotoRequest) -> String {
    let drugs = parse_drugs(&req.drugs_text);
    let call_sign = req.call_sign.trim();

    if req.mode == HotoMode::Create || req.existing_text.trim().is_empty() {
        debug!(mode = %req.mode, call_sign, drugs = drugs.len(), "fresh handover");
        return render_fresh(&format_date(&req.date), req.duty.as_str(), call_sign, &drugs);
    }

    let Some(parsed) = parse_hoto(&req.existing_text) else {
        return render_fresh(&format_date(&req.date), req.duty.as_str(), call_sign, &drugs);
    };

    let merged = merge_call_sign(parsed, call_sign, req.previous_call_sign.as_deref(), &drugs);
    render_hoto(&merged)
}

/// Fold one call sign's usage into a parsed handover.
///
/// The block for `call_sign` (case-insensitive) is replaced in place, or
/// appended when absent. With an empty `call_sign` the block of
/// `previous_call_sign` is removed instead. Totals move by the difference
/// between the drugs the old block listed and `drugs`.
pub fn merge_call_sign(
    parsed: ParsedHoto,
    call_sign: &str,
    previous_call_sign: Option<&str>,
    drugs: &[DrugEntry],
) -> ParsedHoto {
    let call_sign = call_sign.trim();
    let lookup = if call_sign.is_empty() {
        previous_call_sign.map(str::trim).unwrap_or_default()
    } else {
        call_sign
    };

    let old_idx = parsed.find_block(lookup);
    let old_drugs = old_idx
        .map(|idx| parse_drugs_from_block(&parsed.blocks[idx].lines))
        .unwrap_or_default();

    let new_block = (!call_sign.is_empty()).then(|| CallSignBlock {
        call_sign: call_sign.to_string(),
        lines: build_drug_block(call_sign, drugs),
    });

    let blocks = match (old_idx, new_block) {
        (Some(idx), Some(replacement)) => {
            debug!(call_sign, idx, "replacing call sign block");
            let mut replacement = Some(replacement);
            parsed
                .blocks
                .into_iter()
                .enumerate()
                .map(|(i, block)| {
                    if i == idx {
                        replacement.take().unwrap_or(block)
                    } else {
                        block
                    }
                })
                .collect()
        }
        (Some(idx), None) => {
            debug!(call_sign = lookup, idx, "removing call sign block");
            parsed
                .blocks
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, block)| block)
                .collect()
        }
        (None, Some(appended)) => {
            debug!(call_sign, "appending call sign block");
            parsed
                .blocks
                .into_iter()
                .chain(std::iter::once(appended))
                .collect()
        }
        (None, None) => parsed.blocks,
    };

    let totals = recalc_totals(&parsed.totals, &old_drugs, drugs);
    let totals_heading = match parsed.totals_heading {
        None if parsed.totals.is_empty() && !totals.is_empty() => Some(TOTALS_HEADING.to_string()),
        heading => heading,
    };

    ParsedHoto {
        header_line: parsed.header_line,
        duty_line: parsed.duty_line,
        preamble: parsed.preamble,
        blocks,
        totals_heading,
        totals,
        trailing_lines: parsed.trailing_lines,
    }
}
