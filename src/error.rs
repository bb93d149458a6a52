use thiserror::Error;

/// Hard failures surfaced to the caller. Data-shape conditions (empty or
/// degenerate populations) are not errors; detectors report those through
/// `Outcome::Undetermined`.
#[derive(Debug, Error)]
pub enum SurveilError {
    #[error("schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl SurveilError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SurveilError::InvalidParameter(msg.into())
    }
}
