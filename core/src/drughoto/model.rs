use serde::{Deserialize, Serialize};
use std::fmt;

/// One drug line from the usage box, e.g. `Morphine x2`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrugEntry {
    pub name: String,
    pub count: u32,
}

impl DrugEntry {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    pub fn key(&self) -> DrugKey {
        DrugKey::from_name(&self.name)
    }
}

/// Case-insensitive identity of a drug name. The display casing is kept on the
/// owning record, never on the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrugKey(String);

impl DrugKey {
    pub fn from_name(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrugKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contiguous section of a handover owned by one call sign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallSignBlock {
    pub call_sign: String,
    /// Raw lines, starting with the `*CALLSIGN*` marker line.
    pub lines: Vec<String>,
}

impl CallSignBlock {
    pub fn matches(&self, call_sign: &str) -> bool {
        self.call_sign.to_lowercase() == call_sign.trim().to_lowercase()
    }
}

/// Running total for one drug. `Untallied` is the `-` sentinel: present in the
/// handover but never counted, which is not the same as zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TotalCount {
    Tallied(u32),
    Untallied,
}

impl TotalCount {
    pub const SENTINEL: &'static str = "-";

    /// Reads the count column of a totals line. Anything that is not the
    /// sentinel or a base-10 integer yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == Self::SENTINEL {
            return Some(TotalCount::Untallied);
        }
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(TotalCount::Tallied(raw.parse::<u32>().unwrap_or(u32::MAX)))
    }
}

impl fmt::Display for TotalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalCount::Tallied(n) => write!(f, "{}", n),
            TotalCount::Untallied => f.write_str(Self::SENTINEL),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TotalEntry {
    pub drug: String,
    pub count: TotalCount,
    /// Count as written in the handover when that differs from how `count`
    /// renders (`05`, or digits past `u32::MAX`). Cleared once a merge changes
    /// the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_text: Option<String>,
}

impl TotalEntry {
    pub fn new(drug: impl Into<String>, count: TotalCount) -> Self {
        Self {
            drug: drug.into(),
            count,
            count_text: None,
        }
    }

    /// Build from the count column of a totals line, keeping the written text
    /// when it would not survive a re-render.
    pub fn from_written(drug: impl Into<String>, raw_count: &str) -> Option<Self> {
        let count = TotalCount::parse(raw_count)?;
        let raw_count = raw_count.trim();
        let count_text = (count.to_string() != raw_count).then(|| raw_count.to_string());
        Some(Self {
            drug: drug.into(),
            count,
            count_text,
        })
    }

    pub fn key(&self) -> DrugKey {
        DrugKey::from_name(&self.drug)
    }

    pub fn to_line(&self) -> String {
        match &self.count_text {
            Some(written) => format!("{}: {}", self.drug, written),
            None => format!("{}: {}", self.drug, self.count),
        }
    }
}

/// Full decomposition of one handover message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedHoto {
    pub header_line: String,
    pub duty_line: String,
    /// Free text between the duty line and the first block.
    pub preamble: Vec<String>,
    pub blocks: Vec<CallSignBlock>,
    /// `Drug totals:` line as written, when the message has one.
    pub totals_heading: Option<String>,
    pub totals: Vec<TotalEntry>,
    pub trailing_lines: Vec<String>,
}

impl ParsedHoto {
    pub fn find_block(&self, call_sign: &str) -> Option<usize> {
        if call_sign.trim().is_empty() {
            return None;
        }
        self.blocks.iter().position(|b| b.matches(call_sign))
    }
}
