//! DORA delivery metrics: deployment frequency, lead time for changes,
//! change failure rate and mean time to recovery.

pub mod change_failure_rate;
pub mod deployment_frequency;
pub mod lead_time;
pub mod recovery_time;

pub use change_failure_rate::{calculate_change_failure_rate, pooled_failure_rate};
pub use deployment_frequency::calculate_deployment_frequency;
pub use lead_time::calculate_lead_time;
pub use recovery_time::calculate_recovery_time;

use chrono::{DateTime, Utc};

use super::context::CalculationContext;
use super::types::{ExclusionReason, Exclusions};
use super::week::IsoWeek;
use crate::work_items::WorkItem;

/// When a completed deployment item went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeploymentDate {
    Released(DateTime<Utc>),
    Scheduled(DateTime<Utc>),
    Missing,
}

fn deployment_date(item: &WorkItem, ctx: &CalculationContext<'_>) -> DeploymentDate {
    // A release without its own timestamp may be dated on another item.
    let dates: Vec<DateTime<Utc>> = item
        .releases
        .iter()
        .filter_map(|release| release.released_at.or_else(|| ctx.releases.released_at(&release.id)))
        .collect();

    match dates.iter().filter(|at| **at <= ctx.now).min() {
        Some(released) => DeploymentDate::Released(*released),
        None => match dates.into_iter().min() {
            Some(scheduled) => DeploymentDate::Scheduled(scheduled),
            None => DeploymentDate::Missing,
        },
    }
}

/// Deployments released in one week, as seen by DF and CFR.
pub(crate) struct WeeklyDeployments<'i> {
    pub deployments: Vec<(&'i WorkItem, DateTime<Utc>)>,
    pub exclusions: Exclusions,
}

/// Completed deployment-type items whose earliest release falls in `week`.
///
/// Releases dated after "now" are not yet deployments. Items without any
/// release date are counted as excluded in the week they were resolved.
pub(crate) fn deployments_in_week<'i>(
    items: &'i [WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyDeployments<'i> {
    let mut deployments = Vec::new();
    let mut exclusions = Exclusions::default();

    for item in items
        .iter()
        .filter(|item| ctx.is_deployment(item) && ctx.is_completed(item))
    {
        match deployment_date(item, ctx) {
            DeploymentDate::Released(at) if week.contains(at) => deployments.push((item, at)),
            DeploymentDate::Scheduled(at) if week.contains(at) => {
                exclusions.record(ExclusionReason::FutureRelease)
            }
            DeploymentDate::Missing if ctx.resolved_in(item, week).is_some() => {
                exclusions.record(ExclusionReason::NoReleaseDate)
            }
            _ => {}
        }
    }

    WeeklyDeployments {
        deployments,
        exclusions,
    }
}
