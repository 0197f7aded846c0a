//! Construction- and sample-time error kinds.
//!
//! Per the error-handling design: invalid input and construction
//! inconsistencies are raised locally and abort construction; precision
//! exhaustion is the only sample-time failure, and it is fatal only for the
//! caller's current sample (the sampler itself remains usable).

use thiserror::Error;

/// Errors produced while constructing or sampling from a discrete sampler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The probability vector was empty.
    #[error("probability vector must have at least one outcome")]
    EmptyDistribution,

    /// A probability was negative.
    #[error("probability at index {index} is negative")]
    NegativeProbability { index: usize },

    /// The probabilities did not sum to one.
    #[error("probabilities must sum to 1, got numerator {numerator} over denominator {denominator}")]
    NotNormalized {
        numerator: String,
        denominator: String,
    },

    /// `reduce_fractions` or a caller violated the invariant that the
    /// numerators sum to `Zkl(k, l)`.
    #[error("numerators {0:?} do not sum to Zkl({1}, {2})")]
    SumInvariantViolated(Vec<String>, u32, u32),

    /// The alias preprocessing loop found `greater` empty while `smaller`
    /// was still non-empty (cannot happen for a valid normalized
    /// distribution, but guarded against malformed input).
    #[error("alias preprocessing ran out of `greater` entries with `smaller` non-empty")]
    AliasPreprocessInconsistent,

    /// A bounded-precision sampler (interval) consumed its full bit budget
    /// without locating an outcome.
    #[error("interval sampler exhausted its {0}-bit precision budget without converging")]
    PrecisionExhausted(u32),

    /// Construction requires at least two non-zero weights. Returned by
    /// `rejection::Generator::try_new`; `Generator::new` panics on this same
    /// condition instead, for continuity with the teacher's own
    /// `Generator::new` precondition.
    #[error("the distribution must have at least two non-zero weights")]
    TooFewNonZeroWeights,

    /// A serialized text form was malformed or internally inconsistent.
    #[error("malformed serialized form: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
