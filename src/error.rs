//! Error types.
use thiserror::Error;

/// Ways a sample set can fail to support a tetrahedralization.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DegenerateInput {
    #[error("at least 4 samples are required, got {0}")]
    TooFewSamples(usize),

    #[error("sample {0} has a non-finite coordinate")]
    NonFinite(usize),

    #[error("samples {0} and {1} have coincident coordinates")]
    Duplicate(usize, usize),

    #[error("all samples are coplanar")]
    Coplanar,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// The samples cannot be tetrahedralized. Only returned at construction.
    #[error("degenerate input: {0}")]
    DegenerateInput(#[from] DegenerateInput),

    /// Input sequences have mismatched or empty lengths.
    #[error("dimension mismatch")]
    DimensionMismatch,

    /// The tetrahedralization is corrupt. Not recoverable.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}
