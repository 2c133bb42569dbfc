use std::collections::HashMap;

use crate::error::ReconError;
use crate::model::{MatchOutput, MatchedPair, RecordSet, Row};
use crate::params::MatchKeySpec;

/// Canonical key form: trimmed, compared as an opaque string. Numeric-looking
/// keys are never coerced, so "001" does not join "1". A missing or blank key
/// cell yields no key at all; the row can only become an orphan.
fn key_of(row: &Row, column: &str) -> Option<String> {
    let value = row.get(column)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Pair rows across two record sets by equality of their configured key
/// columns, one-to-one. Duplicate right-side keys resolve to the first
/// unconsumed candidate in input order; later left rows may still claim the
/// remaining candidates.
///
/// Every left row lands in exactly one of {pairs, left_orphans} and every
/// right row in exactly one of {pairs, right_orphans}.
pub fn match_by_key(
    left: &RecordSet,
    right: &RecordSet,
    keys: &MatchKeySpec,
) -> Result<MatchOutput, ReconError> {
    // Schema check before any row processing.
    if !left.has_column(&keys.left) {
        return Err(ReconError::MissingColumn {
            record_set: left.name().into(),
            column: keys.left.clone(),
        });
    }
    if !right.has_column(&keys.right) {
        return Err(ReconError::MissingColumn {
            record_set: right.name().into(),
            column: keys.right.clone(),
        });
    }

    // Key → right row indices, preserving input order per key.
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(key) = key_of(row, &keys.right) {
            index.entry(key).or_default().push(i);
        }
    }

    let mut consumed = vec![false; right.len()];
    let mut pairs = Vec::new();
    let mut left_orphans = Vec::new();

    for left_row in left.rows() {
        let Some(key) = key_of(left_row, &keys.left) else {
            left_orphans.push(left_row.clone());
            continue;
        };

        let candidate = index
            .get(&key)
            .and_then(|indices| indices.iter().copied().find(|&i| !consumed[i]));

        match candidate {
            Some(i) => {
                consumed[i] = true;
                pairs.push(MatchedPair {
                    key,
                    left: left_row.clone(),
                    right: right.rows()[i].clone(),
                });
            }
            None => left_orphans.push(left_row.clone()),
        }
    }

    let right_orphans: Vec<Row> = right
        .rows()
        .iter()
        .enumerate()
        .filter(|(i, _)| !consumed[*i])
        .map(|(_, row)| row.clone())
        .collect();

    Ok(MatchOutput {
        pairs,
        left_orphans,
        right_orphans,
    })
}
