use crate::metrics::context::{hours_between, CalculationContext};
use crate::metrics::types::{ExclusionReason, MetricId, WeeklyMetricResult};
use crate::metrics::week::IsoWeek;
use crate::work_items::WorkItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvironmentMatch {
    Exact,
    IgnoringCase,
    Other,
}

fn match_environment(item: &WorkItem, production: &str) -> EnvironmentMatch {
    match item.environment.as_deref().map(str::trim) {
        Some(env) if env == production => EnvironmentMatch::Exact,
        Some(env) if env.eq_ignore_ascii_case(production) => EnvironmentMatch::IgnoringCase,
        _ => EnvironmentMatch::Other,
    }
}

/// Hours from a production incident being raised to its fix shipping.
///
/// Only items tagged with the production environment count. An incident is
/// recovered once its fix release ships, even if the ticket is still open.
/// A tag that differs from the configured value only by case is accepted
/// with a warning and recorded, so data-entry drift is visible instead of
/// silently shrinking the incident population.
pub fn calculate_recovery_time(
    items: &[WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyMetricResult {
    let production = ctx.config.delivery.production_environment.as_str();
    let mut result = WeeklyMetricResult::new(MetricId::MeanTimeToRecovery, *week, 0.0);
    let mut samples = Vec::new();

    for item in items.iter().filter(|item| !ctx.is_deployment(item)) {
        let Some((end, _)) = ctx.delivery_end(item) else {
            continue;
        };
        if !week.contains(end) || end > ctx.now {
            continue;
        }

        match match_environment(item, production) {
            EnvironmentMatch::Exact => {}
            EnvironmentMatch::IgnoringCase => {
                tracing::warn!(
                    key = %item.key,
                    environment = item.environment.as_deref().unwrap_or_default(),
                    expected = production,
                    "Environment matches production only when ignoring case"
                );
                result.exclusions.record(ExclusionReason::EnvironmentCaseMismatch);
            }
            EnvironmentMatch::Other => {
                result.exclusions.record(ExclusionReason::NotProduction);
                continue;
            }
        }

        if end < item.created {
            result.exclusions.record(ExclusionReason::NegativeDuration);
            continue;
        }
        samples.push(hours_between(item.created, end));
    }

    result.summarize_durations(&samples);
    tracing::debug!(
        week = %week,
        incidents = samples.len(),
        median_hours = result.value,
        "Calculated time to recovery"
    );
    result
}
