//! Window aggregates across several weekly results.
//!
//! Each metric pools differently: counts and point-in-time readings take
//! the latest or average week, durations average weekly medians, and
//! ratios are recomputed from summed numerators and denominators. Duration
//! metrics also report p95 and mean over the pooled raw samples.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dora::pooled_failure_rate;
use super::flow::{pooled_distribution, pooled_efficiency};
use super::stats::{mean, percentile, round_to};
use super::types::{MetricId, WeeklyMetricResult};
use super::week::IsoWeek;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: MetricId,
    /// Absent when no week in the window had data
    pub value: Option<f64>,
    pub weeks: usize,
    pub weeks_with_data: usize,
    /// 95th percentile of every raw duration in the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    /// Mean of every raw duration in the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub first_week: IsoWeek,
    pub last_week: IsoWeek,
    pub metrics: BTreeMap<MetricId, MetricSummary>,
}

/// Aggregate one metric's weekly results, ordered oldest first.
pub fn summarize_metric(metric: MetricId, results: &[WeeklyMetricResult]) -> MetricSummary {
    let results: Vec<WeeklyMetricResult> = results.iter().filter(|r| r.metric == metric).cloned().collect();
    let with_data: Vec<f64> = results.iter().filter(|r| r.has_data()).map(|r| r.value).collect();
    let mut breakdown = BTreeMap::new();

    let value = match metric {
        // Zero-deployment weeks count; duration weeks without samples do not
        MetricId::DeploymentFrequency
        | MetricId::LeadTime
        | MetricId::MeanTimeToRecovery
        | MetricId::FlowTime => mean(&with_data).map(|v| round_to(v, 2)),
        MetricId::ChangeFailureRate => pooled_failure_rate(&results),
        MetricId::FlowEfficiency => pooled_efficiency(&results),
        MetricId::FlowVelocity | MetricId::FlowLoad => {
            if let Some(latest) = results.last() {
                breakdown = latest.breakdown.clone();
            }
            results.last().map(|r| r.value)
        }
        MetricId::FlowDistribution => pooled_distribution(&results).map(|pooled| {
            let feature = pooled.get("feature").copied().unwrap_or(0.0);
            breakdown = pooled;
            feature
        }),
    };

    let pooled: Vec<f64> = results.iter().flat_map(|r| r.durations.iter().copied()).collect();

    MetricSummary {
        metric,
        value,
        weeks: results.len(),
        weeks_with_data: with_data.len(),
        p95: percentile(&pooled, 95.0).map(|v| round_to(v, 2)),
        mean: mean(&pooled).map(|v| round_to(v, 2)),
        breakdown,
    }
}

/// Summary of every metric over the weeks present in `results`.
pub fn summarize_window(results: &[WeeklyMetricResult]) -> Option<WindowSummary> {
    let first_week = results.iter().map(|r| r.week).min()?;
    let last_week = results.iter().map(|r| r.week).max()?;

    let mut ordered = results.to_vec();
    ordered.sort_by_key(|r| r.week);

    let metrics = MetricId::ALL
        .into_iter()
        .map(|metric| (metric, summarize_metric(metric, &ordered)))
        .collect();

    Some(WindowSummary {
        first_week,
        last_week,
        metrics,
    })
}
