use std::fmt;

/// Fatal optimizer errors. Recoverable conditions (resource exhaustion,
/// malformed input records, a missing depot tier) never surface here; they
/// are handled locally and reflected in the result metrics instead.
#[derive(Debug)]
pub enum OptimizeError {
    InvalidConfig(String),
    /// A numeric contract between scorer and allocator was broken, e.g. a
    /// non-finite cost reached the budget accumulator. Any partial result
    /// would be untrustworthy, so this propagates immediately.
    InvariantViolation(String),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            OptimizeError::InvariantViolation(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for OptimizeError {}
