#![allow(dead_code)]
//! Work item fixtures shared by the integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use flowpulse::work_items::{Release, StatusTransition, WorkItem};
use flowpulse::IsoWeek;

/// 2024-01-`day` `hour`:00 UTC
pub fn jan(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn week(n: u32) -> IsoWeek {
    IsoWeek::new(2024, n).unwrap()
}

pub struct WorkItemBuilder {
    item: WorkItem,
}

impl WorkItemBuilder {
    pub fn new(key: impl Into<String>, item_type: &str) -> Self {
        Self {
            item: WorkItem {
                key: key.into(),
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
            },
        }
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.item.created = at;
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.item.status = status.to_string();
        self
    }

    pub fn resolved(mut self, at: DateTime<Utc>) -> Self {
        self.item.resolved = Some(at);
        self.item.status = "Done".to_string();
        self
    }

    pub fn release(mut self, id: &str, at: Option<DateTime<Utc>>) -> Self {
        self.item.releases.push(Release {
            id: id.to_string(),
            released_at: at,
        });
        self
    }

    pub fn failure(mut self, indicator: &str) -> Self {
        self.item.failure_indicator = Some(indicator.to_string());
        self
    }

    pub fn environment(mut self, environment: &str) -> Self {
        self.item.environment = Some(environment.to_string());
        self
    }

    pub fn effort(mut self, category: &str) -> Self {
        self.item.effort_category = Some(category.to_string());
        self
    }

    pub fn transition(mut self, from: &str, to: &str, at: DateTime<Utc>) -> Self {
        self.item.transitions.push(StatusTransition {
            from: Some(from.to_string()),
            to: to.to_string(),
            at,
        });
        self
    }

    pub fn build(self) -> WorkItem {
        self.item
    }
}

/// `count` deployments released on `day`, the first `failures` of them failed.
pub fn deployments(prefix: &str, day: u32, count: usize, failures: usize) -> Vec<WorkItem> {
    (0..count)
        .map(|n| {
            let at = jan(day, 10) + Duration::minutes(n as i64);
            let builder = WorkItemBuilder::new(format!("{prefix}-{n}"), "Deployment")
                .resolved(at)
                .release(&format!("{prefix}-rel-{n}"), Some(at));
            if n < failures {
                builder.failure("true").build()
            } else {
                builder.failure("false").build()
            }
        })
        .collect()
}

/// A story that moves through the board and ships in `release`.
pub fn shipped_story(key: &str, start_day: u32, done_day: u32, release: &str) -> WorkItem {
    WorkItemBuilder::new(key, "Story")
        .created(jan(start_day, 0))
        .transition("To Do", "In Progress", jan(start_day, 9))
        .transition("In Progress", "Code Review", jan(start_day, 17))
        .transition("Code Review", "Ready for Deploy", jan(done_day, 9))
        .transition("Ready for Deploy", "Done", jan(done_day, 12))
        .resolved(jan(done_day, 12))
        .release(release, None)
        .build()
}
