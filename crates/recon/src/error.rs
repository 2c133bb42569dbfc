use std::fmt;

/// Fatal configuration errors. Every variant here aborts the run before any
/// output is produced; per-row data-quality problems are reported as flagged
/// outcomes instead (see `model::FailReason::InvalidNumeric`).
#[derive(Debug)]
pub enum ReconError {
    /// TOML / JSON parse or deserialization error in the parameter object.
    ParamParse(String),
    /// Parameter object parsed but is not a runnable configuration
    /// (empty rule list, tolerance out of range, mode/rule mismatch, ...).
    ParamValidation(String),
    /// A configured match key or comparison column is absent from a
    /// record set's schema.
    MissingColumn { record_set: String, column: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParamParse(msg) => write!(f, "parameter parse error: {msg}"),
            Self::ParamValidation(msg) => write!(f, "parameter validation error: {msg}"),
            Self::MissingColumn { record_set, column } => {
                write!(f, "record set '{record_set}': missing column '{column}'")
            }
        }
    }
}

impl std::error::Error for ReconError {}
