//! Daily Drugs HOTO (hand-over / take-over) message engine.
//!
//! Parses the previous shift's handover, folds in one call sign's drug usage
//! and writes the handover back out. Pure string-in, string-out; nothing here
//! touches storage or the clock.

pub mod classify;
pub mod model;
pub mod parser;
pub mod render;
pub mod totals;
pub mod workflow;

pub use model::{CallSignBlock, DrugEntry, DrugKey, ParsedHoto, TotalCount, TotalEntry};
pub use parser::{parse_drugs, parse_drugs_from_block, parse_hoto};
pub use render::{build_drug_block, format_date, render_hoto};
pub use totals::recalc_totals;
pub use workflow::{build_output, merge_call_sign, Duty, HotoMode, HotoRequest};
