use chrono::{DateTime, Utc};

use crate::metrics::context::CalculationContext;
use crate::metrics::types::{ExclusionReason, MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::{Reconstruction, StatusHistory, WorkItem};

/// Work in progress at the end of `week`.
///
/// Past weeks are evaluated at their last instant by replaying each item's
/// status log. The week containing "now" reads live statuses instead. WIP
/// health is assessed by the engine, which owns the threshold history.
pub fn calculate_flow_load(items: &[WorkItem], week: &IsoWeek, ctx: &CalculationContext<'_>) -> WeeklyMetricResult {
    let wip = &ctx.config.statuses.wip;
    let mut result = WeeklyMetricResult::new(MetricId::FlowLoad, *week, 0.0);

    let count = if week.contains(ctx.now) {
        items
            .iter()
            .filter(|item| !ctx.is_deployment(item))
            .filter(|item| item.resolved.is_none() && item.created <= ctx.now)
            .filter(|item| wip.contains(&item.status))
            .count()
    } else {
        let instant = evaluation_instant(week, ctx.now);
        let mut count = 0;
        for item in items.iter().filter(|item| !ctx.is_deployment(item)) {
            if item.created > instant || item.is_resolved_by(instant) {
                continue;
            }
            let (status, source) = StatusHistory::of(item).status_at_with_source(instant);
            if source == Reconstruction::NoChangelog {
                result.exclusions.record(ExclusionReason::AssumedCurrentStatus);
            }
            if wip.contains(status) {
                count += 1;
            }
        }
        count
    };

    result.value = count as f64;
    result.sample_size = count as u64;
    tracing::debug!(week = %week, wip = count, "Calculated flow load");
    result
}

fn evaluation_instant(week: &IsoWeek, now: DateTime<Utc>) -> DateTime<Utc> {
    week.last_instant().min(now)
}
