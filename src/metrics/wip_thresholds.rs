//! Dynamic WIP health thresholds derived with Little's Law.
//!
//! Each historical week contributes `optimal = velocity * (cycle_days / 7)`.
//! The 25th/50th/75th percentiles of those values, plus a stability buffer,
//! become the Healthy/Warning/High boundaries; the 90th percentile is the
//! Critical boundary, unbuffered. Short histories fall back to fixed defaults.

use serde::{Deserialize, Serialize};

use super::stats::{percentile, round_to};
use crate::config::WipThresholdConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Dynamic,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WipThresholds {
    pub healthy: f64,
    pub warning: f64,
    pub high: f64,
    pub critical: f64,
    pub source: ThresholdSource,
    /// Historical weeks behind a dynamic derivation
    pub weeks_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipHealth {
    Healthy,
    Warning,
    High,
    Critical,
}

/// Health zone of one WIP reading together with the boundaries used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WipAssessment {
    pub health: WipHealth,
    pub thresholds: WipThresholds,
}

/// One historical week's throughput and cycle time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSample {
    pub velocity: f64,
    pub cycle_time_days: f64,
}

impl WipThresholds {
    pub fn defaults(config: &WipThresholdConfig) -> Self {
        Self {
            healthy: config.default_healthy,
            warning: config.default_warning,
            high: config.default_high,
            critical: config.default_critical,
            source: ThresholdSource::Default,
            weeks_used: 0,
        }
    }

    /// Derive thresholds from history; weeks without throughput or cycle
    /// time carry no Little's Law signal and are skipped.
    pub fn derive(history: &[FlowSample], config: &WipThresholdConfig) -> Self {
        let optimal: Vec<f64> = history
            .iter()
            .filter(|s| s.velocity > 0.0 && s.cycle_time_days > 0.0)
            .map(|s| s.velocity * (s.cycle_time_days / 7.0))
            .collect();

        if optimal.len() < config.min_history_weeks.max(1) {
            tracing::debug!(
                weeks = optimal.len(),
                required = config.min_history_weeks,
                "Too little flow history for dynamic WIP thresholds, using defaults"
            );
            return Self::defaults(config);
        }

        let buffered = |pct: f64| {
            let value = percentile(&optimal, pct).unwrap_or_default();
            round_to(value * (1.0 + config.stability_buffer), 2)
        };

        Self {
            healthy: buffered(25.0),
            warning: buffered(50.0),
            high: buffered(75.0),
            critical: round_to(percentile(&optimal, 90.0).unwrap_or_default(), 2),
            source: ThresholdSource::Dynamic,
            weeks_used: optimal.len(),
        }
    }

    /// Zone for `wip`. The unbuffered critical boundary can sit below the
    /// buffered high boundary; a reading is only critical past both.
    pub fn assess(&self, wip: f64) -> WipHealth {
        if wip < self.healthy {
            WipHealth::Healthy
        } else if wip < self.warning {
            WipHealth::Warning
        } else if wip < self.high.max(self.critical) {
            WipHealth::High
        } else {
            WipHealth::Critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(velocity: f64, cycle_time_days: f64) -> FlowSample {
        FlowSample {
            velocity,
            cycle_time_days,
        }
    }

    #[test]
    fn test_short_history_uses_defaults() {
        let config = WipThresholdConfig::default();
        let thresholds = WipThresholds::derive(&[sample(7.0, 7.0), sample(14.0, 3.5)], &config);
        assert_eq!(thresholds.source, ThresholdSource::Default);
        assert_eq!(thresholds.healthy, 10.0);
        assert_eq!(thresholds.critical, 40.0);
    }

    #[test]
    fn test_dynamic_thresholds_apply_buffer_except_critical() {
        let config = WipThresholdConfig::default();
        // Optimal WIP per week: 10, 20, 30, 40, 50
        let history = [
            sample(10.0, 7.0),
            sample(20.0, 7.0),
            sample(15.0, 14.0),
            sample(40.0, 7.0),
            sample(25.0, 14.0),
        ];
        let thresholds = WipThresholds::derive(&history, &config);
        assert_eq!(thresholds.source, ThresholdSource::Dynamic);
        assert_eq!(thresholds.weeks_used, 5);
        assert_eq!(thresholds.healthy, 24.0);
        assert_eq!(thresholds.warning, 36.0);
        assert_eq!(thresholds.high, 48.0);
        assert_eq!(thresholds.critical, 46.0);
    }

    #[test]
    fn test_weeks_without_signal_do_not_count() {
        let config = WipThresholdConfig::default();
        let history = [
            sample(0.0, 7.0),
            sample(10.0, 0.0),
            sample(10.0, 7.0),
            sample(10.0, 7.0),
            sample(10.0, 7.0),
        ];
        assert_eq!(WipThresholds::derive(&history, &config).source, ThresholdSource::Default);
    }

    #[test]
    fn test_assess_zones() {
        let thresholds = WipThresholds::defaults(&WipThresholdConfig::default());
        assert_eq!(thresholds.assess(5.0), WipHealth::Healthy);
        assert_eq!(thresholds.assess(10.0), WipHealth::Warning);
        assert_eq!(thresholds.assess(25.0), WipHealth::High);
        assert_eq!(thresholds.assess(35.0), WipHealth::High);
        assert_eq!(thresholds.assess(40.0), WipHealth::Critical);
    }
}
