use std::collections::BTreeSet;

use super::deployments_in_week;
use crate::metrics::context::CalculationContext;
use crate::metrics::types::{MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::WorkItem;

/// Deployments released in `week`, counted once per deployment item.
///
/// `secondary.distinct_releases` reports how many distinct release
/// identifiers those deployments shipped, so several deployment tickets
/// for the same release can be told apart from separate releases.
pub fn calculate_deployment_frequency(
    items: &[WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyMetricResult {
    let weekly = deployments_in_week(items, week, ctx);

    let releases: BTreeSet<&str> = weekly
        .deployments
        .iter()
        .flat_map(|(item, _)| item.releases.iter())
        .filter(|release| {
            release
                .released_at
                .or_else(|| ctx.releases.released_at(&release.id))
                .is_some_and(|at| week.contains(at) && at <= ctx.now)
        })
        .map(|release| release.id.as_str())
        .collect();

    let count = weekly.deployments.len() as u64;
    let mut result = WeeklyMetricResult::new(MetricId::DeploymentFrequency, *week, count as f64);
    result.sample_size = count;
    result.secondary.distinct_releases = Some(releases.len() as u64);
    result.exclusions = weekly.exclusions;

    tracing::debug!(
        week = %week,
        deployments = count,
        distinct_releases = releases.len(),
        excluded = result.exclusions.excluded(),
        "Calculated deployment frequency"
    );
    result
}
