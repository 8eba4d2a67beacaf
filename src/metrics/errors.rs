use thiserror::Error;

/// Malformed calculator input. These are caller bugs and abort the single
/// calculation they occur in.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("weights length {weights} does not match history length {history}")]
    WeightLengthMismatch { weights: usize, history: usize },

    #[error("weights must sum to 1.0 (±0.001), got {sum}")]
    WeightSum { sum: f64 },

    #[error("weight at index {index} is negative or not finite: {value}")]
    InvalidWeight { index: usize, value: f64 },

    #[error("history value at index {index} is negative or not finite: {value}")]
    InvalidHistoryValue { index: usize, value: f64 },

    #[error("forecast must be greater than zero, got {value}")]
    NonPositiveForecast { value: f64 },

    #[error("current value must be finite, got {value}")]
    NonFiniteCurrent { value: f64 },

    #[error("range percent must be within [0, 1], got {value}")]
    RangePercentOutOfBounds { value: f64 },

    #[error("threshold must be a non-negative finite number, got {value}")]
    InvalidThreshold { value: f64 },

    #[error("unknown metric direction '{tag}' (expected higherBetter or lowerBetter)")]
    UnknownMetricDirection { tag: String },

    #[error("unknown metric '{name}'")]
    UnknownMetric { name: String },

    #[error("invalid ISO week label '{label}' (expected YYYY-Www)")]
    InvalidWeekLabel { label: String },
}
