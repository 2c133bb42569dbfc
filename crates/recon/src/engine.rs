use crate::error::ReconError;
use crate::matcher::match_by_key;
use crate::model::{Outcome, PairVerdict, RecordSet, ReconMeta, ReconResult};
use crate::params::{Mode, ReconParams};
use crate::summary::compute_summary;
use crate::validate::evaluate;

/// Run one reconciliation: validate the parameter object, match by key,
/// evaluate the configured rules per pair, classify.
///
/// Straight pipeline, no retries, no state held across invocations. A
/// `ReconError` means no output at all; per-row data problems surface as
/// failed outcomes inside the result instead.
pub fn run(
    params: &ReconParams,
    left: &RecordSet,
    right: &RecordSet,
) -> Result<ReconResult, ReconError> {
    params.validate()?;
    check_rule_columns(params, left, right)?;

    let matched = match_by_key(left, right, &params.match_keys)?;

    let mut verdicts = Vec::new();
    let mut inconsistencies = Vec::new();

    match params.mode {
        Mode::PassFail => {
            for pair in &matched.pairs {
                let mut failures = Vec::new();
                for rule in &params.validation_rules {
                    match evaluate(pair, rule) {
                        Outcome::Pass => {}
                        Outcome::Fail(detail) => failures.push(detail),
                        // validate() rejects severity rules in this mode
                        Outcome::Inconsistency(_) => {}
                    }
                }
                verdicts.push(PairVerdict {
                    key: pair.key.clone(),
                    left: pair.left.clone(),
                    right: pair.right.clone(),
                    valid: failures.is_empty(),
                    failures,
                });
            }
        }
        Mode::Severity => {
            // Ordered by left input row order, then rule order.
            for pair in &matched.pairs {
                for rule in &params.validation_rules {
                    if let Outcome::Inconsistency(inc) = evaluate(pair, rule) {
                        inconsistencies.push(inc);
                    }
                }
            }
        }
    }

    let summary = compute_summary(
        &verdicts,
        &matched.left_orphans,
        &matched.right_orphans,
        &inconsistencies,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            name: params.name.clone(),
            mode: params.mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        matched: verdicts,
        left_orphans: matched.left_orphans,
        right_orphans: matched.right_orphans,
        inconsistencies,
    })
}

/// Every rule's comparison columns must exist on their side. Checked before
/// any matching so a bad configuration never partially classifies data.
fn check_rule_columns(
    params: &ReconParams,
    left: &RecordSet,
    right: &RecordSet,
) -> Result<(), ReconError> {
    for rule in &params.validation_rules {
        if !left.has_column(rule.left_column()) {
            return Err(ReconError::MissingColumn {
                record_set: left.name().into(),
                column: rule.left_column().into(),
            });
        }
        if !right.has_column(rule.right_column()) {
            return Err(ReconError::MissingColumn {
                record_set: right.name().into(),
                column: rule.right_column().into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;

    fn deposits(rows: &[(&str, &str)]) -> RecordSet {
        RecordSet::new(
            "deposits",
            vec!["receipt_no".into(), "amount".into()],
            rows.iter()
                .map(|(k, amt)| Row::from_pairs([("receipt_no", *k), ("amount", *amt)]))
                .collect(),
        )
    }

    fn billing(rows: &[(&str, &str)]) -> RecordSet {
        RecordSet::new(
            "billing",
            vec!["invoice_number".into(), "amount".into()],
            rows.iter()
                .map(|(k, amt)| Row::from_pairs([("invoice_number", *k), ("amount", *amt)]))
                .collect(),
        )
    }

    fn passfail_params(toml: &str) -> ReconParams {
        ReconParams::from_toml(toml).unwrap()
    }

    const EXACT_AMOUNT: &str = r#"
name = "receivables"

[match_keys]
left  = "receipt_no"
right = "invoice_number"

[[validation_rules]]
kind = "exact"
left_column = "amount"
"#;

    #[test]
    fn exact_matching_scenario() {
        let left = deposits(&[("INV-001", "10000"), ("INV-002", "15000")]);
        let right = billing(&[("INV-001", "10000"), ("INV-003", "20000")]);

        let result = run(&passfail_params(EXACT_AMOUNT), &left, &right).unwrap();

        assert_eq!(result.summary.pairs, 1);
        assert_eq!(result.summary.valid, 1);
        assert_eq!(result.summary.invalid, 0);
        assert_eq!(result.summary.left_orphans, 1);
        assert_eq!(result.summary.right_orphans, 1);
        assert_eq!(result.matched[0].key, "INV-001");
        assert!(result.matched[0].valid);
        assert_eq!(result.left_orphans[0].get("receipt_no"), Some("INV-002"));
        assert_eq!(result.right_orphans[0].get("invoice_number"), Some("INV-003"));
    }

    #[test]
    fn any_failing_rule_invalidates_pair() {
        let toml = r#"
[match_keys]
left  = "receipt_no"
right = "invoice_number"

[[validation_rules]]
kind = "exact"
left_column = "receipt_no"
right_column = "invoice_number"

[[validation_rules]]
kind = "tolerance"
left_column = "amount"
tolerance = 0.0
"#;
        let left = deposits(&[("INV-001", "10000")]);
        let right = billing(&[("INV-001", "9990")]);

        let result = run(&passfail_params(toml), &left, &right).unwrap();
        assert_eq!(result.summary.invalid, 1);
        let verdict = &result.matched[0];
        assert!(!verdict.valid);
        // Only the tolerance rule failed; the key-equality rule passed.
        assert_eq!(verdict.failures.len(), 1);
        assert_eq!(verdict.failures[0].left_column, "amount");
    }

    #[test]
    fn severity_mode_orders_by_row_then_rule() {
        let toml = r#"
mode = "severity"

[match_keys]
left  = "employee_id"
right = "emp_id"

[[validation_rules]]
kind = "severity"
left_column = "department_code"
right_column = "dept"
severity = "Warning"

[[validation_rules]]
kind = "severity"
left_column = "title_code"
severity = "Error"
"#;
        let left = RecordSet::new(
            "hr_master",
            vec!["employee_id".into(), "department_code".into(), "title_code".into()],
            vec![
                Row::from_pairs([
                    ("employee_id", "E-2"),
                    ("department_code", "D-10"),
                    ("title_code", "T-1"),
                ]),
                Row::from_pairs([
                    ("employee_id", "E-1"),
                    ("department_code", "D-30"),
                    ("title_code", "T-9"),
                ]),
            ],
        );
        let right = RecordSet::new(
            "roster",
            vec!["emp_id".into(), "dept".into(), "title_code".into()],
            vec![
                Row::from_pairs([("emp_id", "E-1"), ("dept", "D-31"), ("title_code", "T-8")]),
                Row::from_pairs([("emp_id", "E-2"), ("dept", "D-10"), ("title_code", "T-2")]),
            ],
        );

        let result = run(&ReconParams::from_toml(toml).unwrap(), &left, &right).unwrap();

        // E-2 (first left row): title only; E-1: both fields differ.
        assert_eq!(result.summary.inconsistencies, 3);
        let keys: Vec<&str> = result.inconsistencies.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["E-2", "E-1", "E-1"]);
        assert_eq!(result.inconsistencies[0].field, "title_code");
        assert_eq!(result.inconsistencies[1].field, "department_code");
        assert_eq!(result.summary.severity_counts.get("Warning"), Some(&1));
        assert_eq!(result.summary.severity_counts.get("Error"), Some(&2));
    }

    #[test]
    fn missing_rule_column_aborts_before_matching() {
        let toml = r#"
[match_keys]
left  = "receipt_no"
right = "invoice_number"

[[validation_rules]]
kind = "exact"
left_column = "no_such_column"
"#;
        let left = deposits(&[("INV-001", "10000")]);
        let right = billing(&[("INV-001", "10000")]);

        let err = run(&passfail_params(toml), &left, &right).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
        assert!(err.to_string().contains("no_such_column"));
    }

    #[test]
    fn missing_match_key_column_aborts() {
        let toml = r#"
[match_keys]
left  = "receipt_no"
right = "wrong_key"

[[validation_rules]]
kind = "exact"
left_column = "amount"
"#;
        let left = deposits(&[("INV-001", "10000")]);
        let right = billing(&[("INV-001", "10000")]);

        let err = run(&passfail_params(toml), &left, &right).unwrap_err();
        assert!(err.to_string().contains("wrong_key"));
    }

    #[test]
    fn invalid_numeric_flags_row_without_aborting() {
        let toml = r#"
[match_keys]
left  = "receipt_no"
right = "invoice_number"

[[validation_rules]]
kind = "tolerance"
left_column = "amount"
tolerance = 0.01
"#;
        let left = deposits(&[("INV-001", "pending"), ("INV-002", "500")]);
        let right = billing(&[("INV-001", "10000"), ("INV-002", "500")]);

        let result = run(&passfail_params(toml), &left, &right).unwrap();
        assert_eq!(result.summary.pairs, 2);
        assert_eq!(result.summary.invalid, 1);
        assert_eq!(result.summary.valid, 1);
        assert_eq!(
            result.matched[0].failures[0].reason,
            crate::model::FailReason::InvalidNumeric
        );
    }

    #[test]
    fn meta_records_mode_and_version() {
        let left = deposits(&[("INV-001", "1")]);
        let right = billing(&[("INV-001", "1")]);
        let result = run(&passfail_params(EXACT_AMOUNT), &left, &right).unwrap();
        assert_eq!(result.meta.name, "receivables");
        assert_eq!(result.meta.mode, Mode::PassFail);
        assert_eq!(result.meta.engine_version, env!("CARGO_PKG_VERSION"));
    }
}
