use crate::metrics::context::{days_between, CalculationContext};
use crate::metrics::types::{ExclusionReason, MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::{StatusHistory, WorkItem};

/// Days from first entering work in progress to completion, for items
/// completed in `week`. Reported as the median with p95 and mean.
pub fn calculate_flow_time(items: &[WorkItem], week: &IsoWeek, ctx: &CalculationContext<'_>) -> WeeklyMetricResult {
    let mut result = WeeklyMetricResult::new(MetricId::FlowTime, *week, 0.0);
    let mut samples = Vec::new();

    for (item, resolved) in ctx.completed_work_in(items, week) {
        let history = StatusHistory::of(item);
        if !history.has_changelog() {
            result.exclusions.record(ExclusionReason::NoChangelog);
            continue;
        }
        let Some(started) = history.first_entry_into(&ctx.config.statuses.wip) else {
            result.exclusions.record(ExclusionReason::NoWipTransition);
            continue;
        };
        if resolved < started {
            result.exclusions.record(ExclusionReason::NegativeDuration);
            continue;
        }
        samples.push(days_between(started, resolved));
    }

    result.summarize_durations(&samples);
    tracing::debug!(week = %week, samples = samples.len(), median_days = result.value, "Calculated flow time");
    result
}
