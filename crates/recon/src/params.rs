use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Severity;

// ---------------------------------------------------------------------------
// Top-level parameter object
// ---------------------------------------------------------------------------

/// The structured parameter object an external planner emits. Accepted as
/// TOML or JSON; validated defensively before any record set is touched,
/// since it originates outside the engine's control.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: Mode,
    pub match_keys: MatchKeySpec,
    #[serde(alias = "validation_rule", deserialize_with = "one_or_many")]
    pub validation_rules: Vec<RuleSpec>,
    #[serde(default, alias = "report_policy")]
    pub report: ReportPolicy,
}

/// Accept either a single rule object or a list of them
/// (`validation_rule` vs `validation_rules`).
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<RuleSpec>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Box<RuleSpec>),
        Many(Vec<RuleSpec>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(rule) => vec![*rule],
        OneOrMany::Many(rules) => rules,
    })
}

// ---------------------------------------------------------------------------
// Match keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchKeySpec {
    pub left: String,
    pub right: String,
}

// ---------------------------------------------------------------------------
// Validation rules
// ---------------------------------------------------------------------------

/// Closed set of rule variants dispatched through a single evaluation
/// interface; no string-keyed lookup at run time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    Exact {
        left_column: String,
        #[serde(default)]
        right_column: Option<String>,
    },
    Tolerance {
        left_column: String,
        #[serde(default)]
        right_column: Option<String>,
        tolerance: f64,
    },
    Severity {
        left_column: String,
        #[serde(default)]
        right_column: Option<String>,
        severity: Severity,
    },
}

impl RuleSpec {
    pub fn left_column(&self) -> &str {
        match self {
            Self::Exact { left_column, .. }
            | Self::Tolerance { left_column, .. }
            | Self::Severity { left_column, .. } => left_column,
        }
    }

    /// The right-side column; defaults to the left column name when the
    /// two schemas agree.
    pub fn right_column(&self) -> &str {
        let (left, right) = match self {
            Self::Exact { left_column, right_column }
            | Self::Tolerance { left_column, right_column, .. }
            | Self::Severity { left_column, right_column, .. } => (left_column, right_column),
        };
        right.as_deref().unwrap_or(left)
    }

    pub fn is_severity(&self) -> bool {
        matches!(self, Self::Severity { .. })
    }
}

// ---------------------------------------------------------------------------
// Mode + report policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[serde(rename = "passfail")]
    PassFail,
    Severity,
}

impl Default for Mode {
    fn default() -> Self {
        Self::PassFail
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassFail => write!(f, "passfail"),
            Self::Severity => write!(f, "severity"),
        }
    }
}

/// What severity mode does with orphans. The observed HR scenarios never
/// report them, so `Ignore` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    Ignore,
    Report,
}

impl Default for UnmatchedPolicy {
    fn default() -> Self {
        Self::Ignore
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportPolicy {
    #[serde(default = "default_matched_bucket")]
    pub matched_bucket: String,
    #[serde(default = "default_unmatched_bucket")]
    pub unmatched_bucket: String,
    #[serde(default = "default_inconsistency_bucket")]
    pub inconsistency_bucket: String,
    /// Drop passing pairs from output entirely; only differences appear.
    #[serde(default)]
    pub report_only_on_fail: bool,
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
}

fn default_matched_bucket() -> String {
    "reconciled".into()
}

fn default_unmatched_bucket() -> String {
    "unreconciled".into()
}

fn default_inconsistency_bucket() -> String {
    "inconsistencies".into()
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            matched_bucket: default_matched_bucket(),
            unmatched_bucket: default_unmatched_bucket(),
            inconsistency_bucket: default_inconsistency_bucket(),
            report_only_on_fail: false,
            unmatched: UnmatchedPolicy::Ignore,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconParams {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let params: ReconParams =
            toml::from_str(input).map_err(|e| ReconError::ParamParse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        let params: ReconParams =
            serde_json::from_str(input).map_err(|e| ReconError::ParamParse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.match_keys.left.trim().is_empty() || self.match_keys.right.trim().is_empty() {
            return Err(ReconError::ParamValidation(
                "match_keys.left and match_keys.right must be non-empty column names".into(),
            ));
        }

        if self.validation_rules.is_empty() {
            return Err(ReconError::ParamValidation(
                "at least one validation rule is required".into(),
            ));
        }

        for (i, rule) in self.validation_rules.iter().enumerate() {
            if rule.left_column().trim().is_empty() || rule.right_column().trim().is_empty() {
                return Err(ReconError::ParamValidation(format!(
                    "rule #{}: comparison columns must be non-empty",
                    i + 1
                )));
            }

            if let RuleSpec::Tolerance { tolerance, .. } = rule {
                if !(0.0..1.0).contains(tolerance) {
                    return Err(ReconError::ParamValidation(format!(
                        "rule #{}: tolerance must be in [0, 1), got {tolerance}",
                        i + 1
                    )));
                }
            }

            match self.mode {
                Mode::PassFail if rule.is_severity() => {
                    return Err(ReconError::ParamValidation(format!(
                        "rule #{}: severity rules require mode = \"severity\"",
                        i + 1
                    )));
                }
                Mode::Severity if !rule.is_severity() => {
                    return Err(ReconError::ParamValidation(format!(
                        "rule #{}: mode = \"severity\" accepts severity rules only",
                        i + 1
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
