use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single decoded row: column name → raw string value.
///
/// Values stay as decoded strings; numeric and date typing happens at
/// comparison time (see `validate::canonicalize`). Rows are immutable after
/// construction.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Convenience constructor for literal rows.
    pub fn from_pairs<const N: usize>(pairs: [(&str, &str); N]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.as_str())
    }
}

/// A named, ordered collection of rows from one data source.
///
/// `columns` is the declared schema in header order; individual rows may
/// leave any column missing (decoded as absent, compared as blank).
#[derive(Debug, Clone)]
pub struct RecordSet {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RecordSet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pair matching
// ---------------------------------------------------------------------------

/// Two rows joined by an equal match-key value. Transient: produced by the
/// matcher, consumed by the validators within one run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub key: String,
    pub left: Row,
    pub right: Row,
}

#[derive(Debug)]
pub struct MatchOutput {
    pub pairs: Vec<MatchedPair>,
    pub left_orphans: Vec<Row>,
    pub right_orphans: Vec<Row>,
}

// ---------------------------------------------------------------------------
// Validation outcomes
// ---------------------------------------------------------------------------

/// Caller-defined mismatch classification. `Error` and `Warning` are the
/// conventional tags; anything else round-trips as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Error,
    Warning,
    Custom(String),
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Error" | "error" => Self::Error,
            "Warning" | "warning" => Self::Warning,
            _ => Self::Custom(s),
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "Error"),
            Self::Warning => write!(f, "Warning"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    /// Exact rule: values differ after canonicalization.
    ValueMismatch,
    /// Tolerance rule: relative difference exceeds the configured fraction.
    ToleranceExceeded,
    /// Tolerance rule: a value is present but does not parse as a number.
    /// Data-quality flag, not a configuration error; the run continues.
    InvalidNumeric,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueMismatch => write!(f, "value_mismatch"),
            Self::ToleranceExceeded => write!(f, "tolerance_exceeded"),
            Self::InvalidNumeric => write!(f, "invalid_numeric"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailDetail {
    pub left_column: String,
    pub right_column: String,
    pub left_value: String,
    pub right_value: String,
    /// Signed difference (right − left), present for numeric comparisons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    pub reason: FailReason,
}

/// One field mismatch in severity mode, carrying row identity and the
/// configured tag instead of a pass/fail boolean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistency {
    pub key: String,
    pub field: String,
    pub left_value: String,
    pub right_value: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pass,
    Fail(FailDetail),
    Inconsistency(Inconsistency),
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Verdict for one matched pair in pass/fail mode. `valid` is true only
/// when every configured rule passed.
#[derive(Debug, Clone, Serialize)]
pub struct PairVerdict {
    pub key: String,
    pub left: Row,
    pub right: Row,
    pub valid: bool,
    pub failures: Vec<FailDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub name: String,
    pub mode: crate::params::Mode,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub pairs: usize,
    pub valid: usize,
    pub invalid: usize,
    pub left_orphans: usize,
    pub right_orphans: usize,
    pub inconsistencies: usize,
    pub severity_counts: HashMap<String, usize>,
}

/// Terminal output of a run. Pass/fail mode fills `matched` and the orphan
/// lists; severity mode fills `inconsistencies` (orphans are carried so the
/// router can honor the `unmatched = "report"` policy).
#[derive(Debug, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub matched: Vec<PairVerdict>,
    pub left_orphans: Vec<Row>,
    pub right_orphans: Vec<Row>,
    pub inconsistencies: Vec<Inconsistency>,
}
