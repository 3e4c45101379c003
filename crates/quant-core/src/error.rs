use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuantError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No overlapping dates: {0}")]
    NoOverlap(String),

    #[error("Optimization failed: {0}")]
    OptimizationFailed(String),

    #[error("Session limit reached ({0} analyses)")]
    SessionLimit(usize),

    #[error("Duplicate analysis: {0}")]
    DuplicateAnalysis(String),
}
