//! Trend of a current value against its forecast.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::ValidationError;
use super::forecast::ForecastRange;
use super::stats::round_to;
use super::types::Polarity;

pub const DEFAULT_TREND_THRESHOLD: f64 = 0.10;
// Absorbs float noise so a deviation of exactly the threshold stays on track
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Direction tag accepted by single-point trend comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricDirection {
    HigherBetter,
    LowerBetter,
}

impl FromStr for MetricDirection {
    type Err = ValidationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim() {
            "higherBetter" | "higher-better" | "higher_better" => Ok(MetricDirection::HigherBetter),
            "lowerBetter" | "lower-better" | "lower_better" => Ok(MetricDirection::LowerBetter),
            other => Err(ValidationError::UnknownMetricDirection {
                tag: other.to_string(),
            }),
        }
    }
}

impl TryFrom<Polarity> for MetricDirection {
    type Error = ValidationError;

    fn try_from(polarity: Polarity) -> Result<Self, Self::Error> {
        match polarity {
            Polarity::HigherBetter => Ok(MetricDirection::HigherBetter),
            Polarity::LowerBetter => Ok(MetricDirection::LowerBetter),
            Polarity::WithinRange => Err(ValidationError::UnknownMetricDirection {
                tag: "withinRange".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Above,
    Below,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClassification {
    Favorable,
    Unfavorable,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendIndicator {
    pub direction: TrendDirection,
    /// Signed deviation from forecast in percent
    pub deviation_percent: f64,
    pub status: String,
    pub classification: TrendClassification,
    /// Zero reading at the start of a period rather than a real drop
    #[serde(default)]
    pub week_starting: bool,
}

pub const STATUS_ON_TRACK: &str = "on track";
pub const STATUS_WEEK_STARTING: &str = "week starting";
pub const STATUS_WITHIN_RANGE: &str = "within range";
pub const STATUS_BOTTLENECK: &str = "above range (bottleneck risk)";
pub const STATUS_UNDERUTILIZED: &str = "below range (underutilization)";

fn deviation_percent(current: f64, forecast: f64) -> Result<f64, ValidationError> {
    if !forecast.is_finite() || forecast <= 0.0 {
        return Err(ValidationError::NonPositiveForecast { value: forecast });
    }
    if !current.is_finite() {
        return Err(ValidationError::NonFiniteCurrent { value: current });
    }
    Ok((current - forecast) / forecast * 100.0)
}

/// Compare `current` with a single-point forecast.
///
/// Deviations within `threshold` (a fraction, 0.10 = 10%) are on track.
/// A zero reading that is exactly 100% below forecast is reported as the
/// start of a week instead of an alarming drop.
pub fn trend_vs_forecast(
    current: f64,
    forecast: f64,
    direction: MetricDirection,
    threshold: f64,
) -> Result<TrendIndicator, ValidationError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ValidationError::InvalidThreshold { value: threshold });
    }
    let deviation = deviation_percent(current, forecast)?;

    if current == 0.0 && deviation == -100.0 {
        return Ok(TrendIndicator {
            direction: TrendDirection::Neutral,
            deviation_percent: 0.0,
            status: STATUS_WEEK_STARTING.to_string(),
            classification: TrendClassification::Neutral,
            week_starting: true,
        });
    }

    let deviation_percent = round_to(deviation, 1);
    if deviation.abs() <= threshold * 100.0 + THRESHOLD_EPSILON {
        return Ok(TrendIndicator {
            direction: TrendDirection::Neutral,
            deviation_percent,
            status: STATUS_ON_TRACK.to_string(),
            classification: TrendClassification::Favorable,
            week_starting: false,
        });
    }

    let above = deviation > 0.0;
    let favorable = match direction {
        MetricDirection::HigherBetter => above,
        MetricDirection::LowerBetter => !above,
    };
    let magnitude = deviation.abs();

    Ok(TrendIndicator {
        direction: if above { TrendDirection::Above } else { TrendDirection::Below },
        deviation_percent,
        status: if above {
            format!("{magnitude:.1}% above forecast")
        } else {
            format!("{magnitude:.1}% below forecast")
        },
        classification: if favorable {
            TrendClassification::Favorable
        } else {
            TrendClassification::Unfavorable
        },
        week_starting: false,
    })
}

/// Compare a bidirectional metric with its acceptable range.
///
/// Above the range signals a bottleneck, below it signals underutilization;
/// both are unfavorable. The deviation is still reported against `forecast`.
pub fn trend_vs_range(current: f64, forecast: f64, range: ForecastRange) -> Result<TrendIndicator, ValidationError> {
    let deviation_percent = round_to(deviation_percent(current, forecast)?, 1);

    let (direction, status, classification) = if current > range.upper {
        (TrendDirection::Above, STATUS_BOTTLENECK, TrendClassification::Unfavorable)
    } else if current < range.lower {
        (TrendDirection::Below, STATUS_UNDERUTILIZED, TrendClassification::Unfavorable)
    } else {
        (TrendDirection::Neutral, STATUS_WITHIN_RANGE, TrendClassification::Favorable)
    };

    Ok(TrendIndicator {
        direction,
        deviation_percent,
        status: status.to_string(),
        classification,
        week_starting: false,
    })
}
