//! Shared builders for calculator unit tests.

use chrono::{DateTime, TimeZone, Utc};

use super::week::IsoWeek;
use crate::work_items::{Release, StatusTransition, WorkItem};

/// 2024-01-`day` at `hour`:00 UTC. January 2024 week 2 runs Mon 8th to Sun 14th.
pub fn jan(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn week2() -> IsoWeek {
    IsoWeek::new(2024, 2).unwrap()
}

pub fn now() -> DateTime<Utc> {
    jan(20, 12)
}

pub struct ItemBuilder(WorkItem);

impl ItemBuilder {
    pub fn new(key: &str, item_type: &str) -> Self {
        Self(WorkItem {
            key: key.to_string(),
            item_type: item_type.to_string(),
            effort_category: None,
            status: "To Do".to_string(),
            created: jan(1, 9),
            resolved: None,
            story_points: None,
            releases: vec![],
            failure_indicator: None,
            environment: None,
            transitions: vec![],
        })
    }

    pub fn status(mut self, status: &str) -> Self {
        self.0.status = status.to_string();
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.0.created = at;
        self
    }

    pub fn resolved(mut self, at: DateTime<Utc>) -> Self {
        self.0.resolved = Some(at);
        self.0.status = "Done".to_string();
        self
    }

    pub fn release(mut self, id: &str, at: Option<DateTime<Utc>>) -> Self {
        self.0.releases.push(Release {
            id: id.to_string(),
            released_at: at,
        });
        self
    }

    pub fn failed(mut self) -> Self {
        self.0.failure_indicator = Some("true".to_string());
        self
    }

    pub fn environment(mut self, environment: &str) -> Self {
        self.0.environment = Some(environment.to_string());
        self
    }

    pub fn effort(mut self, category: &str) -> Self {
        self.0.effort_category = Some(category.to_string());
        self
    }

    pub fn moved(mut self, from: &str, to: &str, at: DateTime<Utc>) -> Self {
        self.0.transitions.push(StatusTransition {
            from: Some(from.to_string()),
            to: to.to_string(),
            at,
        });
        self
    }

    pub fn build(self) -> WorkItem {
        self.0
    }
}

pub fn deployment(key: &str, released: Option<DateTime<Utc>>) -> ItemBuilder {
    let builder = ItemBuilder::new(key, "Deployment").resolved(released.unwrap_or_else(|| jan(10, 9)));
    match released {
        Some(at) => builder.release(&format!("rel-{key}"), Some(at)),
        None => builder,
    }
}
