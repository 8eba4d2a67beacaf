use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of trackable work as exported from the issue tracker.
///
/// The engine treats a `WorkItem` as immutable input for one calculation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub key: String,
    /// Primary type, e.g. "Story", "Task", "Bug"
    pub item_type: String,
    /// Secondary effort attribute used by the classifier override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_category: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Raw failure indicator field. Only the configured literal counts as a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_indicator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub transitions: Vec<StatusTransition>,
}

/// A release (fix version) the work item shipped in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

/// One entry of a work item's append-only status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    pub at: DateTime<Utc>,
}

/// Work-type categories used by Flow Velocity and Flow Distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    Feature,
    Defect,
    TechnicalDebt,
    Risk,
}

impl WorkCategory {
    pub const ALL: [WorkCategory; 4] = [
        WorkCategory::Feature,
        WorkCategory::Defect,
        WorkCategory::TechnicalDebt,
        WorkCategory::Risk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkCategory::Feature => "feature",
            WorkCategory::Defect => "defect",
            WorkCategory::TechnicalDebt => "technical_debt",
            WorkCategory::Risk => "risk",
        }
    }
}

impl std::fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WorkItem {
    /// True when the item's type is one of `types`, ignoring case.
    pub fn has_type_in(&self, types: &[String]) -> bool {
        types
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(self.item_type.trim()))
    }

    /// Earliest release timestamp recorded directly on the item.
    pub fn earliest_release_at(&self) -> Option<DateTime<Utc>> {
        self.releases.iter().filter_map(|r| r.released_at).min()
    }

    pub fn is_resolved_by(&self, instant: DateTime<Utc>) -> bool {
        self.resolved.is_some_and(|resolved| resolved <= instant)
    }

    /// True only when the failure indicator equals `failure_value` exactly.
    pub fn is_failure(&self, failure_value: &str) -> bool {
        self.failure_indicator.as_deref() == Some(failure_value)
    }
}
