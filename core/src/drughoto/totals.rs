use tracing::debug;

use super::model::{DrugEntry, DrugKey, TotalCount, TotalEntry};

/// Apply one call sign's change in usage to the running totals.
///
/// For every drug named in `old` or `new` the net change `new - old` is added
/// to its existing tallied total, clamped at zero. Untallied (`-`) totals are
/// never computed. Drugs without a total are appended as untallied so the
/// crew fills them in by hand. Totals not touched by either list keep their
/// position and value.
pub fn recalc_totals(
    existing: &[TotalEntry],
    old: &[DrugEntry],
    new: &[DrugEntry],
) -> Vec<TotalEntry> {
    let mut result = existing.to_vec();

    for key in distinct_keys(old.iter().chain(new.iter())) {
        let old_entry = find_drug(old, &key);
        let new_entry = find_drug(new, &key);
        let old_count = old_entry.map_or(0, |d| d.count);
        let new_count = new_entry.map_or(0, |d| d.count);

        match result.iter().position(|t| t.key() == key) {
            Some(idx) => {
                let total = &mut result[idx];
                match total.count {
                    TotalCount::Untallied => {}
                    TotalCount::Tallied(current) => {
                        let updated = apply_delta(current, old_count, new_count);
                        debug!(drug = %key, current, old_count, new_count, updated, "adjusted total");
                        if updated != current {
                            total.count = TotalCount::Tallied(updated);
                            total.count_text = None;
                        }
                    }
                }
            }
            None => {
                let display_name = new_entry
                    .or(old_entry)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| key.to_string());
                debug!(drug = %display_name, "new drug, total left untallied");
                result.push(TotalEntry::new(display_name, TotalCount::Untallied));
            }
        }
    }

    result
}

fn distinct_keys<'a>(drugs: impl Iterator<Item = &'a DrugEntry>) -> Vec<DrugKey> {
    let mut keys: Vec<DrugKey> = Vec::new();
    for key in drugs.map(DrugEntry::key) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

fn find_drug<'a>(drugs: &'a [DrugEntry], key: &DrugKey) -> Option<&'a DrugEntry> {
    drugs.iter().find(|d| d.key() == *key)
}

fn apply_delta(current: u32, old_count: u32, new_count: u32) -> u32 {
    let updated = i64::from(current) - i64::from(old_count) + i64::from(new_count);
    updated.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drughoto::classify::parse_total_line;

    fn tallied(drug: &str, n: u32) -> TotalEntry {
        TotalEntry::new(drug, TotalCount::Tallied(n))
    }

    #[test]
    fn test_delta_applied_to_existing_total() {
        let out = recalc_totals(
            &[tallied("Morphine", 5)],
            &[DrugEntry::new("Morphine", 2)],
            &[DrugEntry::new("Morphine", 4)],
        );
        assert_eq!(out, vec![tallied("Morphine", 7)]);
    }

    #[test]
    fn test_negative_total_clamps_to_zero() {
        let out = recalc_totals(
            &[tallied("Morphine", 1)],
            &[DrugEntry::new("Morphine", 5)],
            &[DrugEntry::new("Morphine", 0)],
        );
        assert_eq!(out, vec![tallied("Morphine", 0)]);
    }

    #[test]
    fn test_sentinel_is_never_computed() {
        let existing = vec![TotalEntry::new("Morphine", TotalCount::Untallied)];
        let out = recalc_totals(
            &existing,
            &[DrugEntry::new("Morphine", 1)],
            &[DrugEntry::new("Morphine", 9)],
        );
        assert_eq!(out, existing);
    }

    #[test]
    fn test_unknown_drug_appended_untallied_after_existing() {
        let out = recalc_totals(
            &[tallied("Morphine", 3), tallied("Ketamine", 1)],
            &[],
            &[DrugEntry::new("ondansetron", 1), DrugEntry::new("MORPHINE", 1)],
        );
        assert_eq!(
            out,
            vec![
                tallied("Morphine", 4),
                tallied("Ketamine", 1),
                TotalEntry::new("ondansetron", TotalCount::Untallied),
            ]
        );
    }

    #[test]
    fn test_display_name_prefers_new_then_old() {
        let out = recalc_totals(
            &[],
            &[DrugEntry::new("midazolam", 1), DrugEntry::new("Fentanyl", 1)],
            &[DrugEntry::new("Midazolam", 2)],
        );
        assert_eq!(
            out,
            vec![
                TotalEntry::new("Midazolam", TotalCount::Untallied),
                TotalEntry::new("Fentanyl", TotalCount::Untallied),
            ]
        );
    }

    #[test]
    fn test_removed_drug_subtracts_old_count() {
        let out = recalc_totals(
            &[tallied("Morphine", 6), tallied("Midazolam", 2)],
            &[DrugEntry::new("Morphine", 2), DrugEntry::new("Midazolam", 1)],
            &[DrugEntry::new("Morphine", 2)],
        );
        assert_eq!(out, vec![tallied("Morphine", 6), tallied("Midazolam", 1)]);
    }

    #[test]
    fn test_untouched_total_keeps_written_count() {
        let existing = vec![parse_total_line("Adrenaline: 05").unwrap(), tallied("Morphine", 1)];
        let out = recalc_totals(&existing, &[], &[DrugEntry::new("Morphine", 1)]);
        assert_eq!(out[0].to_line(), "Adrenaline: 05");
        assert_eq!(out[1].to_line(), "Morphine: 2");
    }

    #[test]
    fn test_adjusted_total_is_rewritten_canonically() {
        let existing = vec![parse_total_line("Morphine: 05").unwrap()];
        let out = recalc_totals(&existing, &[], &[DrugEntry::new("Morphine", 1)]);
        assert_eq!(out[0].to_line(), "Morphine: 6");

        let same = recalc_totals(&existing, &[DrugEntry::new("Morphine", 1)], &[DrugEntry::new("Morphine", 1)]);
        assert_eq!(same[0].to_line(), "Morphine: 05");
    }

    #[test]
    fn test_untouched_totals_pass_through() {
        let existing = vec![tallied("Adrenaline", 2), tallied("Morphine", 1)];
        let out = recalc_totals(&existing, &[], &[]);
        assert_eq!(out, existing);
    }
}
