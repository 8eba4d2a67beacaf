use super::deployments_in_week;
use crate::metrics::context::CalculationContext;
use crate::metrics::stats::round_to;
use crate::metrics::types::{MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::WorkItem;

/// Percentage of the week's deployments flagged as failed.
///
/// Uses the same deployment attribution as deployment frequency. Failure
/// and total counts are kept in `secondary` so weeks can be pooled.
pub fn calculate_change_failure_rate(
    items: &[WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyMetricResult {
    let weekly = deployments_in_week(items, week, ctx);
    let failure_value = &ctx.config.delivery.failure_value;

    let total = weekly.deployments.len() as u64;
    let failures = weekly
        .deployments
        .iter()
        .filter(|(item, _)| item.is_failure(failure_value))
        .count() as u64;

    let mut result = WeeklyMetricResult::new(MetricId::ChangeFailureRate, *week, rate(failures, total));
    result.sample_size = total;
    result.secondary.failures = Some(failures);
    result.secondary.total = Some(total);
    result.exclusions = weekly.exclusions;

    tracing::debug!(week = %week, failures, total, rate = result.value, "Calculated change failure rate");
    result
}

/// Failure rate across several weeks: total failures over total
/// deployments. Averaging per-week rates would overweight quiet weeks.
pub fn pooled_failure_rate(weeks: &[WeeklyMetricResult]) -> Option<f64> {
    let (failures, total) = weeks
        .iter()
        .filter(|result| result.metric == MetricId::ChangeFailureRate)
        .fold((0u64, 0u64), |(failures, total), result| {
            (
                failures + result.secondary.failures.unwrap_or(0),
                total + result.secondary.total.unwrap_or(result.sample_size),
            )
        });
    (total > 0).then(|| rate(failures, total))
}

fn rate(failures: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(failures as f64 / total as f64 * 100.0, 2)
}
