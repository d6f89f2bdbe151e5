use thiserror::Error;

/// Invalid session parameters. Surfaced before any trial runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid ISI range: low {low} s, high {high} s")]
    InvalidRange { low: f64, high: f64 },

    #[error("ISI lower bound must be positive, got {0} s")]
    NonPositiveLow(f64),

    #[error("ISI step must be positive, got {0} s")]
    NonPositiveStep(f64),

    #[error("ISI repeat count must be at least 1")]
    ZeroRepeats,

    #[error("ISI schedule of {len} trials exceeds the maximum of {max}")]
    ScheduleTooLarge { len: usize, max: usize },

    #[error("Stimulus scale must be positive and finite, got {0}")]
    InvalidStimulusScale(f64),

    #[error("Response timeout must be positive, got {0} s")]
    NonPositiveTimeout(f64),
}

/// Running median queried before any reaction time was recorded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Running median queried before any response was recorded")]
pub struct PrematureQueryError;
