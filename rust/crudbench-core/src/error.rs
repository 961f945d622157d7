use thiserror::Error;

/// Fatal configuration problems, detected before any worker starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("wrong workload configuration: sum of percentages is {0}, expected 100")]
    MixSum(u32),

    #[error("at least one worker is required")]
    NoWorkers,

    #[error("neither an operation budget nor a run time is configured")]
    NoBudget,

    #[error("too many indexable fields: {requested} requested, at most {max} supported")]
    TooManyIndexableFields { requested: usize, max: usize },

    #[error("query operations need at least one indexable field")]
    QueryWithoutIndexableFields,

    #[error("target throughput must be greater than zero")]
    ZeroThroughput,

    #[error("hotspot workload requires hot_spot parameters")]
    MissingHotSpot,

    #[error("{name} must be within 0..=100, got {value}")]
    PercentageOutOfRange { name: &'static str, value: u64 },

    #[error("minimal value size is {min}, got {got}")]
    ValueTooSmall { min: usize, got: usize },
}
