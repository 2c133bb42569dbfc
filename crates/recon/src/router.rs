use serde::Serialize;

use crate::model::{FailReason, PairVerdict, ReconResult, Row};
use crate::params::{Mode, ReconParams, UnmatchedPolicy};

/// An ordered, named table of output rows with a declared column order.
/// Serializing it to CSV or elsewhere is the caller's concern.
#[derive(Debug, Clone, Serialize)]
pub struct OutputTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Partition a result into report buckets per the declarative report policy.
///
/// Pass/fail mode emits the matched bucket (suppressed under
/// `report_only_on_fail`) and the unmatched bucket (invalid pairs, then left
/// orphans, then right orphans). Severity mode emits a single inconsistency
/// bucket, plus the unmatched bucket when the policy asks for orphans.
pub fn route(
    result: &ReconResult,
    params: &ReconParams,
    left_schema: &[String],
    right_schema: &[String],
) -> Vec<OutputTable> {
    match result.meta.mode {
        Mode::PassFail => route_passfail(result, params, left_schema, right_schema),
        Mode::Severity => route_severity(result, params, left_schema, right_schema),
    }
}

fn route_passfail(
    result: &ReconResult,
    params: &ReconParams,
    left_schema: &[String],
    right_schema: &[String],
) -> Vec<OutputTable> {
    let merged = merged_columns(left_schema, right_schema);
    let mut tables = Vec::new();

    if !params.report.report_only_on_fail {
        let rows = result
            .matched
            .iter()
            .filter(|v| v.valid)
            .map(|v| merged_row(&merged, Some(&v.left), Some(&v.right), left_schema, right_schema))
            .collect();
        tables.push(OutputTable {
            name: params.report.matched_bucket.clone(),
            columns: merged.clone(),
            rows,
        });
    }

    let mut columns = merged.clone();
    columns.push("difference".into());
    columns.push("validation_error".into());

    let mut rows = Vec::new();
    for verdict in result.matched.iter().filter(|v| !v.valid) {
        let mut row = merged_row(
            &merged,
            Some(&verdict.left),
            Some(&verdict.right),
            left_schema,
            right_schema,
        );
        row.push(difference_cell(verdict));
        row.push(validation_error_cell(verdict));
        rows.push(row);
    }
    for orphan in &result.left_orphans {
        let mut row = merged_row(&merged, Some(orphan), None, left_schema, right_schema);
        row.push(String::new());
        row.push(String::new());
        rows.push(row);
    }
    for orphan in &result.right_orphans {
        let mut row = merged_row(&merged, None, Some(orphan), left_schema, right_schema);
        row.push(String::new());
        row.push(String::new());
        rows.push(row);
    }

    tables.push(OutputTable {
        name: params.report.unmatched_bucket.clone(),
        columns,
        rows,
    });

    tables
}

fn route_severity(
    result: &ReconResult,
    params: &ReconParams,
    left_schema: &[String],
    right_schema: &[String],
) -> Vec<OutputTable> {
    let columns = vec![
        params.match_keys.left.clone(),
        "field".into(),
        "left_value".into(),
        "right_value".into(),
        "severity".into(),
    ];

    let rows = result
        .inconsistencies
        .iter()
        .map(|inc| {
            vec![
                inc.key.clone(),
                inc.field.clone(),
                inc.left_value.clone(),
                inc.right_value.clone(),
                inc.severity.to_string(),
            ]
        })
        .collect();

    let mut tables = vec![OutputTable {
        name: params.report.inconsistency_bucket.clone(),
        columns,
        rows,
    }];

    if params.report.unmatched == UnmatchedPolicy::Report {
        let merged = merged_columns(left_schema, right_schema);
        let rows = result
            .left_orphans
            .iter()
            .map(|o| merged_row(&merged, Some(o), None, left_schema, right_schema))
            .chain(
                result
                    .right_orphans
                    .iter()
                    .map(|o| merged_row(&merged, None, Some(o), left_schema, right_schema)),
            )
            .collect();
        tables.push(OutputTable {
            name: params.report.unmatched_bucket.clone(),
            columns: merged,
            rows,
        });
    }

    tables
}

/// Union of both schemas: left columns in declared order, then right
/// columns not already present.
fn merged_columns(left_schema: &[String], right_schema: &[String]) -> Vec<String> {
    let mut columns = left_schema.to_vec();
    for col in right_schema {
        if !columns.contains(col) {
            columns.push(col.clone());
        }
    }
    columns
}

/// Build one output row over the merged columns. For a column both sides
/// declare, the right side's value wins; a missing side leaves its columns
/// blank (orphan rows).
fn merged_row(
    columns: &[String],
    left: Option<&Row>,
    right: Option<&Row>,
    left_schema: &[String],
    right_schema: &[String],
) -> Vec<String> {
    columns
        .iter()
        .map(|col| {
            if let Some(row) = right {
                if right_schema.contains(col) {
                    return row.get(col).unwrap_or("").to_string();
                }
            }
            if let Some(row) = left {
                if left_schema.contains(col) {
                    return row.get(col).unwrap_or("").to_string();
                }
            }
            String::new()
        })
        .collect()
}

fn difference_cell(verdict: &PairVerdict) -> String {
    verdict
        .failures
        .iter()
        .find_map(|f| f.difference)
        .map(|d| format!("{d}"))
        .unwrap_or_default()
}

fn validation_error_cell(verdict: &PairVerdict) -> String {
    if verdict
        .failures
        .iter()
        .any(|f| f.reason == FailReason::InvalidNumeric)
    {
        FailReason::InvalidNumeric.to_string()
    } else {
        String::new()
    }
}
