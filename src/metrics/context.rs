use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use super::week::IsoWeek;
use crate::config::MetricsConfig;
use crate::work_items::WorkItem;

/// Release identifier -> earliest known release timestamp at or before "now".
///
/// Built from every release attached to every item so a work item can be
/// matched to a release recorded on a different item (e.g. the deployment
/// ticket carries the date, the story only the version name).
#[derive(Debug, Clone, Default)]
pub struct ReleaseCatalog {
    released: HashMap<String, DateTime<Utc>>,
}

impl ReleaseCatalog {
    pub fn from_items(items: &[WorkItem], now: DateTime<Utc>) -> Self {
        let mut released: HashMap<String, DateTime<Utc>> = HashMap::new();
        for release in items.iter().flat_map(|item| &item.releases) {
            let Some(at) = release.released_at else {
                continue;
            };
            if at > now {
                continue;
            }
            released
                .entry(release.id.clone())
                .and_modify(|existing| *existing = (*existing).min(at))
                .or_insert(at);
        }
        Self { released }
    }

    pub fn released_at(&self, release_id: &str) -> Option<DateTime<Utc>> {
        self.released.get(release_id).copied()
    }

    /// Earliest released timestamp among releases sharing an id with `item`.
    pub fn earliest_match(&self, item: &WorkItem) -> Option<DateTime<Utc>> {
        item.releases
            .iter()
            .filter_map(|release| self.released_at(&release.id))
            .min()
    }

    pub fn len(&self) -> usize {
        self.released.len()
    }

    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }
}

/// Inputs shared by every calculator in one pass. "now" is explicit so
/// recomputing a week from the same inputs is deterministic.
#[derive(Debug, Clone)]
pub struct CalculationContext<'a> {
    pub config: &'a MetricsConfig,
    pub now: DateTime<Utc>,
    pub releases: Arc<ReleaseCatalog>,
}

impl<'a> CalculationContext<'a> {
    pub fn new(config: &'a MetricsConfig, items: &[WorkItem], now: DateTime<Utc>) -> Self {
        Self {
            config,
            now,
            releases: Arc::new(ReleaseCatalog::from_items(items, now)),
        }
    }

    /// Context sharing a catalog already built for the same items and "now".
    pub fn with_releases(config: &'a MetricsConfig, releases: Arc<ReleaseCatalog>, now: DateTime<Utc>) -> Self {
        Self { config, now, releases }
    }

    pub fn is_deployment(&self, item: &WorkItem) -> bool {
        item.has_type_in(&self.config.delivery.deployment_types)
    }

    pub fn is_completed(&self, item: &WorkItem) -> bool {
        item.resolved.is_some() || self.config.statuses.done.contains(&item.status)
    }

    /// Resolved inside `week` and not after "now".
    pub fn resolved_in(&self, item: &WorkItem, week: &IsoWeek) -> Option<DateTime<Utc>> {
        item.resolved
            .filter(|resolved| week.contains(*resolved) && *resolved <= self.now)
    }

    /// Non-deployment items resolved in `week`; the population for flow metrics.
    pub fn completed_work_in<'i>(
        &self,
        items: &'i [WorkItem],
        week: &IsoWeek,
    ) -> Vec<(&'i WorkItem, DateTime<Utc>)> {
        items
            .iter()
            .filter(|item| !self.is_deployment(item))
            .filter_map(|item| self.resolved_in(item, week).map(|resolved| (item, resolved)))
            .collect()
    }

    /// End of a delivered change: earliest matching release, falling back
    /// to the item's own completion time. The flag is true on fallback.
    pub fn delivery_end(&self, item: &WorkItem) -> Option<(DateTime<Utc>, bool)> {
        match self.releases.earliest_match(item) {
            Some(released) => Some((released, false)),
            None => item.resolved.map(|resolved| (resolved, true)),
        }
    }
}

/// Hours between two instants as a float.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

/// Days between two instants as a float.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work_items::Release;
    use chrono::TimeZone;

    fn item(key: &str, releases: Vec<Release>) -> WorkItem {
        WorkItem {
            key: key.to_string(),
            item_type: "Story".to_string(),
            effort_category: None,
            status: "Done".to_string(),
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            resolved: Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()),
            story_points: None,
            releases,
            failure_indicator: None,
            environment: None,
            transitions: vec![],
        }
    }

    fn release(id: &str, day: Option<u32>) -> Release {
        Release {
            id: id.to_string(),
            released_at: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_catalog_matches_across_items_and_ignores_future_releases() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let items = vec![
            item("OPS-1", vec![release("v1.2", Some(5))]),
            item("OPS-2", vec![release("v1.2", Some(4)), release("v1.3", Some(20))]),
            item("APP-1", vec![release("v1.2", None), release("v1.3", None)]),
        ];
        let catalog = ReleaseCatalog::from_items(&items, now);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.earliest_match(&items[2]), Some(Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap()));
        assert_eq!(catalog.released_at("v1.3"), None);
    }

    #[test]
    fn test_delivery_end_falls_back_to_resolution() {
        let config = MetricsConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let items = vec![item("APP-2", vec![release("v9", None)])];
        let ctx = CalculationContext::new(&config, &items, now);

        let (end, fallback) = ctx.delivery_end(&items[0]).unwrap();
        assert!(fallback);
        assert_eq!(end, items[0].resolved.unwrap());
    }

    #[test]
    fn test_contexts_share_one_catalog() {
        let config = MetricsConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let items = vec![item("OPS-3", vec![release("v2.0", Some(6))])];
        let catalog = Arc::new(ReleaseCatalog::from_items(&items, now));

        let first = CalculationContext::with_releases(&config, Arc::clone(&catalog), now);
        let second = CalculationContext::with_releases(&config, Arc::clone(&catalog), now);

        assert!(Arc::ptr_eq(&first.releases, &second.releases));
        assert_eq!(Arc::strong_count(&catalog), 3);
        assert_eq!(second.releases.released_at("v2.0"), Some(Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_duration_helpers() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        assert_eq!(hours_between(start, end), 36.0);
        assert_eq!(days_between(start, end), 1.5);
    }
}
