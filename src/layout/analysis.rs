//! Relationship analysis ahead of routing.

use std::collections::HashMap;

use crate::model::Relationship;

use super::types::SiblingSlot;

/// Unordered table pair key.
fn pair_key(rel: &Relationship) -> (&str, &str) {
    let (a, b) = (rel.from_table_id.as_str(), rel.to_table_id.as_str());
    if a <= b { (a, b) } else { (b, a) }
}

/// Assign each relationship its index among the relationships joining the
/// same unordered table pair. The result is parallel to `relationships`.
pub fn assign_sibling_slots(relationships: &[Relationship]) -> Vec<SiblingSlot> {
    let mut totals: HashMap<(&str, &str), usize> = HashMap::new();
    for rel in relationships {
        *totals.entry(pair_key(rel)).or_insert(0) += 1;
    }

    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    relationships
        .iter()
        .map(|rel| {
            let key = pair_key(rel);
            let index = seen.entry(key).or_insert(0);
            let slot = SiblingSlot {
                index: *index,
                total: totals[&key],
            };
            *index += 1;
            slot
        })
        .collect()
}
