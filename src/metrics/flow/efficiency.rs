use crate::metrics::context::CalculationContext;
use crate::metrics::stats::round_to;
use crate::metrics::types::{ExclusionReason, MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::{StatusHistory, WorkItem};

/// Share of in-progress time spent in active statuses, for items
/// completed in `week`. Time is measured over each item's lifetime
/// `[created, resolved]` and summed across items before dividing.
pub fn calculate_flow_efficiency(
    items: &[WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyMetricResult {
    let statuses = &ctx.config.statuses;
    let mut active_seconds = 0i64;
    let mut in_progress_seconds = 0i64;
    let mut contributing = 0u64;
    let mut result = WeeklyMetricResult::new(MetricId::FlowEfficiency, *week, 0.0);

    for (item, resolved) in ctx.completed_work_in(items, week) {
        let history = StatusHistory::of(item);
        if !history.has_changelog() {
            result.exclusions.record(ExclusionReason::AssumedCurrentStatus);
        }
        let in_progress = history.time_in_statuses(&statuses.wip, item.created, resolved);
        if in_progress.num_seconds() <= 0 {
            result.exclusions.record(ExclusionReason::NoWipTime);
            continue;
        }
        let active = history.time_in_statuses(&statuses.active, item.created, resolved);

        in_progress_seconds += in_progress.num_seconds();
        active_seconds += active.num_seconds();
        contributing += 1;
    }

    result.value = efficiency(active_seconds, in_progress_seconds);
    result.sample_size = contributing;
    result.secondary.active_hours = Some(round_to(active_seconds as f64 / 3600.0, 2));
    result.secondary.in_progress_hours = Some(round_to(in_progress_seconds as f64 / 3600.0, 2));

    tracing::debug!(
        week = %week,
        items = contributing,
        efficiency = result.value,
        "Calculated flow efficiency"
    );
    result
}

/// Efficiency across several weeks from summed active and in-progress hours.
pub fn pooled_efficiency(weeks: &[WeeklyMetricResult]) -> Option<f64> {
    let (active, in_progress) = weeks
        .iter()
        .filter(|result| result.metric == MetricId::FlowEfficiency)
        .fold((0.0, 0.0), |(active, in_progress), result| {
            (
                active + result.secondary.active_hours.unwrap_or(0.0),
                in_progress + result.secondary.in_progress_hours.unwrap_or(0.0),
            )
        });
    (in_progress > 0.0).then(|| round_to(active / in_progress * 100.0, 2))
}

fn efficiency(active_seconds: i64, in_progress_seconds: i64) -> f64 {
    if in_progress_seconds <= 0 {
        return 0.0;
    }
    round_to(active_seconds as f64 / in_progress_seconds as f64 * 100.0, 2)
}
