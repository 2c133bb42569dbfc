use std::collections::HashMap;

use crate::model::{Inconsistency, PairVerdict, ReconSummary, Row};

/// Compute summary statistics for a classified run.
pub fn compute_summary(
    matched: &[PairVerdict],
    left_orphans: &[Row],
    right_orphans: &[Row],
    inconsistencies: &[Inconsistency],
) -> ReconSummary {
    let valid = matched.iter().filter(|v| v.valid).count();

    let mut severity_counts: HashMap<String, usize> = HashMap::new();
    for inc in inconsistencies {
        *severity_counts.entry(inc.severity.to_string()).or_insert(0) += 1;
    }

    ReconSummary {
        pairs: matched.len(),
        valid,
        invalid: matched.len() - valid,
        left_orphans: left_orphans.len(),
        right_orphans: right_orphans.len(),
        inconsistencies: inconsistencies.len(),
        severity_counts,
    }
}
