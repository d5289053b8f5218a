use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

/// Why a raw record was dropped during normalization.
///
/// Never surfaced as a failure of the run; only counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no recognizable post fields")]
    Unrecognized,
}
