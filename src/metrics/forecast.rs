//! Weighted multi-week forecasting.
//!
//! Four weeks of history use fixed recency weights `[0.1, 0.2, 0.3, 0.4]`
//! (oldest to newest); two or three weeks use equal weights. Fewer than
//! `min_weeks` values is not an error: the forecast is simply absent.
//! Zero values are legitimate (holiday weeks) and are never filtered here.

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::stats::round_to;

pub const DEFAULT_WEIGHTS: [f64; 4] = [0.1, 0.2, 0.3, 0.4];
pub const DEFAULT_MIN_WEEKS: usize = 2;
pub const FORECAST_DECIMALS: u32 = 2;
const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Insufficient,
    Building,
    Established,
}

impl Confidence {
    pub fn for_weeks(weeks: usize, min_weeks: usize) -> Self {
        if weeks < min_weeks {
            Confidence::Insufficient
        } else if weeks < DEFAULT_WEIGHTS.len() {
            Confidence::Building
        } else {
            Confidence::Established
        }
    }
}

/// Acceptable band around a bidirectional metric's forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRange {
    pub lower: f64,
    pub upper: f64,
}

impl ForecastRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ForecastRange>,
    /// History actually used, oldest first
    pub historical_values: Vec<f64>,
    pub weights: Vec<f64>,
    pub weeks_available: usize,
    pub confidence: Confidence,
}

impl Forecast {
    pub fn with_range(mut self, range: ForecastRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// Weighted forecast over `history` (oldest first).
///
/// Without explicit weights, at most the four most recent values are used.
/// Explicit weights must match the history length and sum to 1.0.
pub fn forecast(
    history: &[f64],
    weights: Option<&[f64]>,
    min_weeks: usize,
) -> Result<Option<Forecast>, ValidationError> {
    for (index, value) in history.iter().enumerate() {
        if !value.is_finite() || *value < 0.0 {
            return Err(ValidationError::InvalidHistoryValue { index, value: *value });
        }
    }

    if history.len() < min_weeks.max(1) {
        return Ok(None);
    }

    let (values, weights): (Vec<f64>, Vec<f64>) = match weights {
        Some(weights) => {
            validate_weights(weights, history.len())?;
            (history.to_vec(), weights.to_vec())
        }
        None => {
            let start = history.len().saturating_sub(DEFAULT_WEIGHTS.len());
            let recent = &history[start..];
            let weights = if recent.len() == DEFAULT_WEIGHTS.len() {
                DEFAULT_WEIGHTS.to_vec()
            } else {
                vec![1.0 / recent.len() as f64; recent.len()]
            };
            (recent.to_vec(), weights)
        }
    };

    // The default window never holds more than four weeks
    if values.len() < min_weeks {
        return Ok(None);
    }

    let weighted: f64 = values.iter().zip(&weights).map(|(v, w)| v * w).sum();

    Ok(Some(Forecast {
        value: round_to(weighted, FORECAST_DECIMALS),
        range: None,
        weeks_available: values.len(),
        confidence: Confidence::for_weeks(values.len(), min_weeks),
        historical_values: values,
        weights,
    }))
}

fn validate_weights(weights: &[f64], history_len: usize) -> Result<(), ValidationError> {
    if weights.len() != history_len {
        return Err(ValidationError::WeightLengthMismatch {
            weights: weights.len(),
            history: history_len,
        });
    }
    for (index, weight) in weights.iter().enumerate() {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(ValidationError::InvalidWeight { index, value: *weight });
        }
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ValidationError::WeightSum { sum });
    }
    Ok(())
}

/// Band of ±`range_percent` around a Flow Load forecast, lower bound clamped at zero.
pub fn flow_load_range(forecast_value: f64, range_percent: f64) -> Result<ForecastRange, ValidationError> {
    if !forecast_value.is_finite() || forecast_value <= 0.0 {
        return Err(ValidationError::NonPositiveForecast { value: forecast_value });
    }
    if !(0.0..=1.0).contains(&range_percent) {
        return Err(ValidationError::RangePercentOutOfBounds { value: range_percent });
    }
    Ok(ForecastRange {
        lower: round_to((forecast_value * (1.0 - range_percent)).max(0.0), FORECAST_DECIMALS),
        upper: round_to(forecast_value * (1.0 + range_percent), FORECAST_DECIMALS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_weeks_use_recency_weights() {
        let result = forecast(&[10.0, 12.0, 11.0, 13.0], None, DEFAULT_MIN_WEEKS)
            .unwrap()
            .unwrap();
        assert_eq!(result.value, 11.9);
        assert_eq!(result.weights, DEFAULT_WEIGHTS.to_vec());
        assert_eq!(result.weeks_available, 4);
        assert_eq!(result.confidence, Confidence::Established);
    }

    #[test]
    fn test_two_and_three_weeks_use_equal_weights() {
        let two = forecast(&[10.0, 12.0], None, DEFAULT_MIN_WEEKS).unwrap().unwrap();
        assert_eq!(two.value, 11.0);
        assert_eq!(two.weights, vec![0.5, 0.5]);
        assert_eq!(two.confidence, Confidence::Building);

        let three = forecast(&[9.0, 12.0, 15.0], None, DEFAULT_MIN_WEEKS).unwrap().unwrap();
        assert_eq!(three.value, 12.0);
        assert_eq!(three.confidence, Confidence::Building);
    }

    #[test]
    fn test_single_week_is_insufficient() {
        assert_eq!(forecast(&[10.0], None, DEFAULT_MIN_WEEKS).unwrap(), None);
        assert_eq!(forecast(&[], None, DEFAULT_MIN_WEEKS).unwrap(), None);
    }

    #[test]
    fn test_longer_history_uses_latest_four_weeks() {
        let result = forecast(&[100.0, 10.0, 12.0, 11.0, 13.0], None, DEFAULT_MIN_WEEKS)
            .unwrap()
            .unwrap();
        assert_eq!(result.value, 11.9);
        assert_eq!(result.historical_values, vec![10.0, 12.0, 11.0, 13.0]);
    }

    #[test]
    fn test_minimum_above_default_window_needs_explicit_weights() {
        let history = [10.0, 12.0, 11.0, 13.0, 14.0, 9.0];
        assert!(forecast(&history, None, 5).unwrap().is_none());

        let weights = [0.1, 0.1, 0.1, 0.2, 0.2, 0.3];
        let explicit = forecast(&history, Some(&weights), 5).unwrap().unwrap();
        assert_eq!(explicit.weeks_available, 6);
        assert_ne!(explicit.confidence, Confidence::Insufficient);
    }

    #[test]
    fn test_zero_weeks_are_kept() {
        let result = forecast(&[0.0, 10.0], None, DEFAULT_MIN_WEEKS).unwrap().unwrap();
        assert_eq!(result.value, 5.0);
    }

    #[test]
    fn test_negative_history_is_rejected() {
        assert_eq!(
            forecast(&[10.0, -1.0], None, DEFAULT_MIN_WEEKS),
            Err(ValidationError::InvalidHistoryValue { index: 1, value: -1.0 })
        );
    }

    #[test]
    fn test_custom_weights_are_validated() {
        let history = [10.0, 20.0];
        assert!(matches!(
            forecast(&history, Some(&[1.0]), DEFAULT_MIN_WEEKS),
            Err(ValidationError::WeightLengthMismatch { weights: 1, history: 2 })
        ));
        assert!(matches!(
            forecast(&history, Some(&[0.5, 0.6]), DEFAULT_MIN_WEEKS),
            Err(ValidationError::WeightSum { .. })
        ));

        let within_tolerance = forecast(&history, Some(&[0.2, 0.8005]), DEFAULT_MIN_WEEKS)
            .unwrap()
            .unwrap();
        assert_eq!(within_tolerance.value, 18.01);

        let custom = forecast(&history, Some(&[0.25, 0.75]), DEFAULT_MIN_WEEKS).unwrap().unwrap();
        assert_eq!(custom.value, 17.5);
    }

    #[test]
    fn test_flow_load_range() {
        let range = flow_load_range(15.0, 0.20).unwrap();
        assert_eq!(range, ForecastRange { lower: 12.0, upper: 18.0 });
        assert!(range.contains(14.0));
        assert!(!range.contains(24.0));
        assert!(!range.contains(9.0));

        let full = flow_load_range(5.0, 1.0).unwrap();
        assert_eq!(full.lower, 0.0);
        assert_eq!(full.upper, 10.0);
    }

    #[test]
    fn test_flow_load_range_validation() {
        assert!(matches!(
            flow_load_range(0.0, 0.2),
            Err(ValidationError::NonPositiveForecast { .. })
        ));
        assert!(matches!(
            flow_load_range(-3.0, 0.2),
            Err(ValidationError::NonPositiveForecast { .. })
        ));
        assert!(matches!(
            flow_load_range(10.0, 1.5),
            Err(ValidationError::RangePercentOutOfBounds { .. })
        ));
        assert!(matches!(
            flow_load_range(10.0, -0.1),
            Err(ValidationError::RangePercentOutOfBounds { .. })
        ));
    }
}
