use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::errors::ValidationError;
use super::stats::{mean, median, percentile, round_to};
use super::week::IsoWeek;
use super::wip_thresholds::WipAssessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    DeploymentFrequency,
    LeadTime,
    ChangeFailureRate,
    MeanTimeToRecovery,
    FlowVelocity,
    FlowTime,
    FlowEfficiency,
    FlowLoad,
    FlowDistribution,
}

impl MetricId {
    pub const ALL: [MetricId; 9] = [
        MetricId::DeploymentFrequency,
        MetricId::LeadTime,
        MetricId::ChangeFailureRate,
        MetricId::MeanTimeToRecovery,
        MetricId::FlowVelocity,
        MetricId::FlowTime,
        MetricId::FlowEfficiency,
        MetricId::FlowLoad,
        MetricId::FlowDistribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::DeploymentFrequency => "deployment_frequency",
            MetricId::LeadTime => "lead_time",
            MetricId::ChangeFailureRate => "change_failure_rate",
            MetricId::MeanTimeToRecovery => "mean_time_to_recovery",
            MetricId::FlowVelocity => "flow_velocity",
            MetricId::FlowTime => "flow_time",
            MetricId::FlowEfficiency => "flow_efficiency",
            MetricId::FlowLoad => "flow_load",
            MetricId::FlowDistribution => "flow_distribution",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricId::DeploymentFrequency => "Deployment Frequency",
            MetricId::LeadTime => "Lead Time for Changes",
            MetricId::ChangeFailureRate => "Change Failure Rate",
            MetricId::MeanTimeToRecovery => "Mean Time to Recovery",
            MetricId::FlowVelocity => "Flow Velocity",
            MetricId::FlowTime => "Flow Time",
            MetricId::FlowEfficiency => "Flow Efficiency",
            MetricId::FlowLoad => "Flow Load (WIP)",
            MetricId::FlowDistribution => "Flow Distribution (feature share)",
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            MetricId::DeploymentFrequency => MetricUnit::Deployments,
            MetricId::LeadTime | MetricId::MeanTimeToRecovery => MetricUnit::Hours,
            MetricId::ChangeFailureRate | MetricId::FlowEfficiency | MetricId::FlowDistribution => {
                MetricUnit::Percent
            }
            MetricId::FlowVelocity | MetricId::FlowLoad => MetricUnit::Items,
            MetricId::FlowTime => MetricUnit::Days,
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            MetricId::DeploymentFrequency
            | MetricId::FlowVelocity
            | MetricId::FlowEfficiency
            | MetricId::FlowDistribution => Polarity::HigherBetter,
            MetricId::LeadTime
            | MetricId::ChangeFailureRate
            | MetricId::MeanTimeToRecovery
            | MetricId::FlowTime => Polarity::LowerBetter,
            MetricId::FlowLoad => Polarity::WithinRange,
        }
    }

    /// Sample-based metrics have no meaningful value in a week without
    /// samples; those weeks are left out of forecast history.
    pub fn is_sample_based(&self) -> bool {
        !matches!(
            self,
            MetricId::DeploymentFrequency | MetricId::FlowVelocity | MetricId::FlowLoad
        )
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = ValidationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        MetricId::ALL
            .into_iter()
            .find(|id| id.as_str() == name.trim())
            .ok_or_else(|| ValidationError::UnknownMetric {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Deployments,
    Hours,
    Days,
    Percent,
    Items,
}

impl MetricUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            MetricUnit::Deployments => " deploys",
            MetricUnit::Hours => "h",
            MetricUnit::Days => "d",
            MetricUnit::Percent => "%",
            MetricUnit::Items => " items",
        }
    }
}

/// Which way a metric should move to be healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherBetter,
    LowerBetter,
    /// Too high and too low are both unhealthy
    WithinRange,
}

/// Why a work item was left out of (or approximated in) a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Release timestamp is after "now"
    FutureRelease,
    /// Deployment has no release timestamp at all
    NoReleaseDate,
    /// No release shares an identifier; completion time used instead
    NoMatchingRelease,
    /// No transition into a start status
    NoStartTransition,
    /// No transition into any WIP status
    NoWipTransition,
    /// Never spent time in a WIP status before completing
    NoWipTime,
    /// No status log; item cannot be timed
    NoChangelog,
    /// No status log; current status assumed for the whole window
    AssumedCurrentStatus,
    /// Environment tag is not production
    NotProduction,
    /// Environment tag matched production only when ignoring case
    EnvironmentCaseMismatch,
    /// End timestamp precedes start timestamp
    NegativeDuration,
}

impl ExclusionReason {
    /// Fallbacks and approximations keep the item in the aggregate.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            ExclusionReason::NoMatchingRelease
                | ExclusionReason::AssumedCurrentStatus
                | ExclusionReason::EnvironmentCaseMismatch
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ExclusionReason::FutureRelease => "release dated in the future",
            ExclusionReason::NoReleaseDate => "no release date",
            ExclusionReason::NoMatchingRelease => "no matching release (completion time used)",
            ExclusionReason::NoStartTransition => "no start transition",
            ExclusionReason::NoWipTransition => "no WIP transition",
            ExclusionReason::NoWipTime => "no time in progress",
            ExclusionReason::NoChangelog => "no changelog",
            ExclusionReason::AssumedCurrentStatus => "no changelog (current status assumed)",
            ExclusionReason::NotProduction => "not tagged production",
            ExclusionReason::EnvironmentCaseMismatch => "production tag matched ignoring case",
            ExclusionReason::NegativeDuration => "ends before it starts",
        }
    }
}

/// Per-reason counts of items a metric could not attribute cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Exclusions(BTreeMap<ExclusionReason, u64>);

impl Exclusions {
    pub fn record(&mut self, reason: ExclusionReason) {
        *self.0.entry(reason).or_insert(0) += 1;
    }

    pub fn count(&self, reason: ExclusionReason) -> u64 {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    /// Items dropped from the aggregate (fallbacks not included).
    pub fn excluded(&self) -> u64 {
        self.0
            .iter()
            .filter(|(reason, _)| !reason.is_fallback())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExclusionReason, u64)> + '_ {
        self.0.iter().map(|(reason, count)| (*reason, *count))
    }
}

/// Supporting statistics shown alongside a metric's headline value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_releases: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress_hours: Option<f64>,
}

/// One metric computed for one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMetricResult {
    pub metric: MetricId,
    pub week: IsoWeek,
    pub value: f64,
    pub unit: MetricUnit,
    /// Items that contributed to `value`
    #[serde(default)]
    pub sample_size: u64,
    #[serde(default)]
    pub secondary: SecondaryStats,
    /// Per-category counts or percentages for velocity and distribution
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdown: BTreeMap<String, f64>,
    #[serde(default)]
    pub exclusions: Exclusions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_health: Option<WipAssessment>,
    /// Raw durations behind a median, sorted ascending
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub durations: Vec<f64>,
}

impl WeeklyMetricResult {
    pub fn new(metric: MetricId, week: IsoWeek, value: f64) -> Self {
        Self {
            metric,
            week,
            value,
            unit: metric.unit(),
            sample_size: 0,
            secondary: SecondaryStats::default(),
            breakdown: BTreeMap::new(),
            exclusions: Exclusions::default(),
            wip_health: None,
            durations: Vec::new(),
        }
    }

    /// Median of `samples` as the headline, p95 and mean alongside.
    /// Without samples the value stays 0 and `has_data` is false.
    pub fn summarize_durations(&mut self, samples: &[f64]) {
        self.sample_size = samples.len() as u64;
        self.value = median(samples).map(|v| round_to(v, 2)).unwrap_or(0.0);
        self.secondary.p95 = percentile(samples, 95.0).map(|v| round_to(v, 2));
        self.secondary.mean = mean(samples).map(|v| round_to(v, 2));

        let mut durations: Vec<f64> = samples.iter().map(|v| round_to(*v, 4)).collect();
        durations.sort_by(f64::total_cmp);
        self.durations = durations;
    }

    /// Whether this week's value belongs in a forecast history.
    pub fn has_data(&self) -> bool {
        !self.metric.is_sample_based() || self.sample_size > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_id_round_trips_through_name() {
        for id in MetricId::ALL {
            assert_eq!(id.as_str().parse::<MetricId>().unwrap(), id);
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", id.as_str()));
        }
        assert!(matches!(
            "velocity".parse::<MetricId>(),
            Err(ValidationError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn test_flow_load_is_the_only_bidirectional_metric() {
        let ranged: Vec<MetricId> = MetricId::ALL
            .into_iter()
            .filter(|id| id.polarity() == Polarity::WithinRange)
            .collect();
        assert_eq!(ranged, vec![MetricId::FlowLoad]);
    }

    #[test]
    fn test_exclusions_separate_fallbacks_from_drops() {
        let mut exclusions = Exclusions::default();
        exclusions.record(ExclusionReason::NotProduction);
        exclusions.record(ExclusionReason::NotProduction);
        exclusions.record(ExclusionReason::NoMatchingRelease);

        assert_eq!(exclusions.count(ExclusionReason::NotProduction), 2);
        assert_eq!(exclusions.excluded(), 2);

        let json = serde_json::to_string(&exclusions).unwrap();
        assert_eq!(json, r#"{"no_matching_release":1,"not_production":2}"#);
    }

    #[test]
    fn test_sample_based_week_without_samples_has_no_data() {
        let week: IsoWeek = "2024-W02".parse().unwrap();
        assert!(!WeeklyMetricResult::new(MetricId::LeadTime, week, 0.0).has_data());
        assert!(WeeklyMetricResult::new(MetricId::FlowVelocity, week, 0.0).has_data());
    }
}
