use std::collections::BTreeMap;

use crate::metrics::context::CalculationContext;
use crate::metrics::stats::round_to;
use crate::metrics::types::{MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::{WorkCategory, WorkClassifier, WorkItem};

/// Category mix of work completed in `week`.
///
/// The breakdown carries all four category percentages; the headline value
/// is the feature share. `secondary.total` keeps the item count for pooling.
pub fn calculate_flow_distribution(
    items: &[WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyMetricResult {
    let classifier = WorkClassifier::new(&ctx.config.classification);
    let mut counts: BTreeMap<WorkCategory, u64> = WorkCategory::ALL.into_iter().map(|c| (c, 0)).collect();
    let completed = ctx.completed_work_in(items, week);
    for (item, _) in &completed {
        *counts.entry(classifier.classify(item)).or_insert(0) += 1;
    }

    let total = completed.len() as u64;
    let mut result = WeeklyMetricResult::new(MetricId::FlowDistribution, *week, 0.0);
    result.sample_size = total;
    result.secondary.total = Some(total);
    result.breakdown = percentages(&counts, total);
    result.value = result
        .breakdown
        .get(WorkCategory::Feature.as_str())
        .copied()
        .unwrap_or(0.0);

    tracing::debug!(week = %week, items = total, feature_share = result.value, "Calculated flow distribution");
    result
}

/// Category mix across several weeks, recovered from each week's
/// percentages and item count. Returns the pooled breakdown.
pub fn pooled_distribution(weeks: &[WeeklyMetricResult]) -> Option<BTreeMap<String, f64>> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;
    for result in weeks.iter().filter(|r| r.metric == MetricId::FlowDistribution) {
        let week_total = result.secondary.total.unwrap_or(result.sample_size) as f64;
        total += week_total;
        for (category, percent) in &result.breakdown {
            *counts.entry(category.clone()).or_insert(0.0) += percent / 100.0 * week_total;
        }
    }
    if total <= 0.0 {
        return None;
    }
    Some(
        counts
            .into_iter()
            .map(|(category, count)| (category, round_to(count / total * 100.0, 1)))
            .collect(),
    )
}

fn percentages(counts: &BTreeMap<WorkCategory, u64>, total: u64) -> BTreeMap<String, f64> {
    counts
        .iter()
        .map(|(category, count)| {
            let share = if total == 0 {
                0.0
            } else {
                round_to(*count as f64 / total as f64 * 100.0, 1)
            };
            (category.as_str().to_string(), share)
        })
        .collect()
}
