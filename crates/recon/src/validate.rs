use chrono::NaiveDate;

use crate::model::{FailDetail, FailReason, Inconsistency, MatchedPair, Outcome};
use crate::params::RuleSpec;

/// Floor for the relative-difference denominator, so two zero values
/// compare without dividing by zero.
const EPSILON: f64 = 1e-9;

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Equality after canonicalization: trimmed; numeric when both sides parse
/// as numbers, date when both parse as ISO dates, plain string otherwise.
fn canonical_eq(left: &str, right: &str) -> bool {
    if let (Some(l), Some(r)) = (parse_number(left), parse_number(right)) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (parse_date(left), parse_date(right)) {
        return l == r;
    }
    left == right
}

/// Evaluate one rule against one matched pair. Stateless and pure: the same
/// inputs always produce the same outcome, so rules may run in any order.
pub fn evaluate(pair: &MatchedPair, rule: &RuleSpec) -> Outcome {
    let left_value = pair.left.get(rule.left_column()).unwrap_or("").trim().to_string();
    let right_value = pair.right.get(rule.right_column()).unwrap_or("").trim().to_string();

    match rule {
        RuleSpec::Exact { .. } => {
            if canonical_eq(&left_value, &right_value) {
                Outcome::Pass
            } else {
                Outcome::Fail(FailDetail {
                    left_column: rule.left_column().into(),
                    right_column: rule.right_column().into(),
                    left_value,
                    right_value,
                    difference: None,
                    reason: FailReason::ValueMismatch,
                })
            }
        }

        RuleSpec::Tolerance { tolerance, .. } => {
            let (Some(l), Some(r)) = (parse_number(&left_value), parse_number(&right_value))
            else {
                // Present but unparseable: per-row data-quality flag, the
                // run continues.
                return Outcome::Fail(FailDetail {
                    left_column: rule.left_column().into(),
                    right_column: rule.right_column().into(),
                    left_value,
                    right_value,
                    difference: None,
                    reason: FailReason::InvalidNumeric,
                });
            };

            let bound = tolerance * l.abs().max(r.abs()).max(EPSILON);
            if (l - r).abs() <= bound {
                Outcome::Pass
            } else {
                Outcome::Fail(FailDetail {
                    left_column: rule.left_column().into(),
                    right_column: rule.right_column().into(),
                    left_value,
                    right_value,
                    difference: Some(r - l),
                    reason: FailReason::ToleranceExceeded,
                })
            }
        }

        RuleSpec::Severity { severity, .. } => {
            if canonical_eq(&left_value, &right_value) {
                Outcome::Pass
            } else {
                Outcome::Inconsistency(Inconsistency {
                    key: pair.key.clone(),
                    field: rule.left_column().into(),
                    left_value,
                    right_value,
                    severity: severity.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Row, Severity};

    fn pair(left: [(&str, &str); 2], right: [(&str, &str); 2]) -> MatchedPair {
        MatchedPair {
            key: "k1".into(),
            left: Row::from_pairs(left),
            right: Row::from_pairs(right),
        }
    }

    fn exact(column: &str) -> RuleSpec {
        RuleSpec::Exact {
            left_column: column.into(),
            right_column: None,
        }
    }

    fn tolerance(column: &str, t: f64) -> RuleSpec {
        RuleSpec::Tolerance {
            left_column: column.into(),
            right_column: None,
            tolerance: t,
        }
    }

    fn severity(column: &str, tag: Severity) -> RuleSpec {
        RuleSpec::Severity {
            left_column: column.into(),
            right_column: None,
            severity: tag,
        }
    }

    #[test]
    fn exact_passes_on_equal_strings() {
        let p = pair([("k", "k1"), ("name", "Widget")], [("k", "k1"), ("name", "Widget")]);
        assert_eq!(evaluate(&p, &exact("name")), Outcome::Pass);
    }

    #[test]
    fn exact_trims_whitespace() {
        let p = pair([("k", "k1"), ("name", " Widget ")], [("k", "k1"), ("name", "Widget")]);
        assert_eq!(evaluate(&p, &exact("name")), Outcome::Pass);
    }

    #[test]
    fn exact_canonicalizes_numeric_strings() {
        let p = pair([("k", "k1"), ("amount", "100.0")], [("k", "k1"), ("amount", "100")]);
        assert_eq!(evaluate(&p, &exact("amount")), Outcome::Pass);
    }

    #[test]
    fn exact_canonicalizes_dates() {
        let p = pair(
            [("k", "k1"), ("posted", "2026-01-05")],
            [("k", "k1"), ("posted", "2026-1-5")],
        );
        assert_eq!(evaluate(&p, &exact("posted")), Outcome::Pass);
    }

    #[test]
    fn exact_fail_carries_raw_values() {
        let p = pair([("k", "k1"), ("name", "Widget")], [("k", "k1"), ("name", "Gadget")]);
        match evaluate(&p, &exact("name")) {
            Outcome::Fail(detail) => {
                assert_eq!(detail.reason, FailReason::ValueMismatch);
                assert_eq!(detail.left_value, "Widget");
                assert_eq!(detail.right_value, "Gadget");
            }
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[test]
    fn exact_is_idempotent() {
        let p = pair([("k", "k1"), ("name", "a")], [("k", "k1"), ("name", "b")]);
        let rule = exact("name");
        assert_eq!(evaluate(&p, &rule), evaluate(&p, &rule));
    }

    #[test]
    fn tolerance_boundary_passes() {
        // |100 - 98| = 2 = 0.02 * 100: at the boundary, not over it.
        let p = pair([("k", "k1"), ("qty", "100")], [("k", "k1"), ("qty", "98")]);
        assert_eq!(evaluate(&p, &tolerance("qty", 0.02)), Outcome::Pass);
    }

    #[test]
    fn tolerance_one_over_boundary_fails() {
        let p = pair([("k", "k1"), ("qty", "100")], [("k", "k1"), ("qty", "97")]);
        match evaluate(&p, &tolerance("qty", 0.02)) {
            Outcome::Fail(detail) => {
                assert_eq!(detail.reason, FailReason::ToleranceExceeded);
                assert_eq!(detail.difference, Some(-3.0));
            }
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[test]
    fn tolerance_zero_against_zero_passes() {
        let p = pair([("k", "k1"), ("qty", "0")], [("k", "k1"), ("qty", "0")]);
        assert_eq!(evaluate(&p, &tolerance("qty", 0.0)), Outcome::Pass);
    }

    #[test]
    fn tolerance_uses_larger_magnitude_as_base() {
        // |50 - 49| = 1 ≤ 0.02 * max(50, 49) = 1.0
        let p = pair([("k", "k1"), ("qty", "49")], [("k", "k1"), ("qty", "50")]);
        assert_eq!(evaluate(&p, &tolerance("qty", 0.02)), Outcome::Pass);
    }

    #[test]
    fn tolerance_flags_non_numeric_value() {
        let p = pair([("k", "k1"), ("qty", "n/a")], [("k", "k1"), ("qty", "100")]);
        match evaluate(&p, &tolerance("qty", 0.05)) {
            Outcome::Fail(detail) => {
                assert_eq!(detail.reason, FailReason::InvalidNumeric);
                assert_eq!(detail.left_value, "n/a");
                assert_eq!(detail.difference, None);
            }
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[test]
    fn severity_emits_tagged_inconsistency() {
        let p = pair(
            [("k", "k1"), ("department_code", "D-10")],
            [("k", "k1"), ("department_code", "D-20")],
        );
        match evaluate(&p, &severity("department_code", Severity::Warning)) {
            Outcome::Inconsistency(inc) => {
                assert_eq!(inc.key, "k1");
                assert_eq!(inc.field, "department_code");
                assert_eq!(inc.left_value, "D-10");
                assert_eq!(inc.right_value, "D-20");
                assert_eq!(inc.severity, Severity::Warning);
            }
            other => panic!("expected Inconsistency, got {other:?}"),
        }
    }

    #[test]
    fn severity_passes_silently_on_match() {
        let p = pair(
            [("k", "k1"), ("title_code", "T-1")],
            [("k", "k1"), ("title_code", "T-1")],
        );
        assert_eq!(evaluate(&p, &severity("title_code", Severity::Error)), Outcome::Pass);
    }

    #[test]
    fn missing_cell_compares_as_blank() {
        let p = MatchedPair {
            key: "k1".into(),
            left: Row::from_pairs([("k", "k1")]),
            right: Row::from_pairs([("k", "k1"), ("name", "")]),
        };
        assert_eq!(evaluate(&p, &exact("name")), Outcome::Pass);
    }
}
