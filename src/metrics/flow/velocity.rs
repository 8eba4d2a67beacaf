use crate::metrics::context::CalculationContext;
use crate::metrics::types::{MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::{WorkCategory, WorkClassifier, WorkItem};

/// Items completed in `week`, with a per-category count breakdown.
pub fn calculate_flow_velocity(items: &[WorkItem], week: &IsoWeek, ctx: &CalculationContext<'_>) -> WeeklyMetricResult {
    let classifier = WorkClassifier::new(&ctx.config.classification);
    let completed = ctx.completed_work_in(items, week);

    let mut result = WeeklyMetricResult::new(MetricId::FlowVelocity, *week, completed.len() as f64);
    result.sample_size = completed.len() as u64;
    for category in WorkCategory::ALL {
        result.breakdown.insert(category.as_str().to_string(), 0.0);
    }
    for (item, _) in &completed {
        *result
            .breakdown
            .entry(classifier.classify(item).as_str().to_string())
            .or_insert(0.0) += 1.0;
    }

    tracing::debug!(week = %week, completed = completed.len(), "Calculated flow velocity");
    result
}
