//! State history reconstruction.
//!
//! Replays a work item's append-only status log to answer what status it
//! was in at a past instant, and how long it spent in a set of statuses
//! inside a time window. Both are pure functions over per-item data.
//!
//! Missing history degrades to documented approximations instead of
//! failing:
//! - no log at all: the item sat in its current status the whole time
//! - query before the first entry: the item sat in its initial logged
//!   status (the first entry's `from`, or its `to` when `from` is absent)

use chrono::{DateTime, Duration, Utc};

use super::types::{StatusTransition, WorkItem};
use crate::config::StatusSet;

/// How a reconstructed answer was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconstruction {
    /// Answer came from a log entry at or before the query time
    Logged,
    /// Query time precedes the first log entry
    BeforeFirstEntry,
    /// Item has no log; current status assumed
    NoChangelog,
}

/// A per-item view over its status log, sorted by timestamp.
///
/// Transitions for one item are expected to be non-decreasing in time, but
/// the log is stably sorted on construction so out-of-order input cannot
/// corrupt a replay. Nothing is assumed about ordering across items.
#[derive(Debug, Clone)]
pub struct StatusHistory<'a> {
    item: &'a WorkItem,
    transitions: Vec<&'a StatusTransition>,
}

impl<'a> StatusHistory<'a> {
    pub fn new(item: &'a WorkItem, transitions: &'a [StatusTransition]) -> Self {
        let mut transitions: Vec<&StatusTransition> = transitions.iter().collect();
        transitions.sort_by_key(|t| t.at);
        Self { item, transitions }
    }

    /// History built from the log embedded in the item itself.
    pub fn of(item: &'a WorkItem) -> Self {
        Self::new(item, &item.transitions)
    }

    pub fn has_changelog(&self) -> bool {
        !self.transitions.is_empty()
    }

    /// Status before any logged transition.
    pub fn initial_status(&self) -> &'a str {
        match self.transitions.first().copied() {
            Some(first) => first.from.as_deref().unwrap_or(&first.to),
            None => &self.item.status,
        }
    }

    /// Status in effect at `at`, with how it was derived.
    pub fn status_at_with_source(&self, at: DateTime<Utc>) -> (&'a str, Reconstruction) {
        if self.transitions.is_empty() {
            return (&self.item.status, Reconstruction::NoChangelog);
        }

        // Latest entry with timestamp <= at. Entries are sorted, so this is
        // the last one before the partition point.
        let idx = self.transitions.partition_point(|t| t.at <= at);
        if idx == 0 {
            (self.initial_status(), Reconstruction::BeforeFirstEntry)
        } else {
            let latest: &'a StatusTransition = self.transitions[idx - 1];
            (&latest.to, Reconstruction::Logged)
        }
    }

    pub fn status_at(&self, at: DateTime<Utc>) -> &'a str {
        self.status_at_with_source(at).0
    }

    /// Earliest logged transition into any status in `statuses`.
    pub fn first_entry_into(&self, statuses: &StatusSet) -> Option<DateTime<Utc>> {
        self.transitions
            .iter()
            .find(|t| statuses.contains(&t.to))
            .map(|t| t.at)
    }

    /// Total time spent in `statuses` within `[from, to]`.
    ///
    /// Walks consecutive log entries as half-open segments and clips each
    /// to the window. The open segment before the first entry uses the
    /// initial status; the one after the last entry runs to `to`.
    pub fn time_in_statuses(&self, statuses: &StatusSet, from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
        if to <= from {
            return Duration::zero();
        }

        if self.transitions.is_empty() {
            return if statuses.contains(&self.item.status) {
                to - from
            } else {
                Duration::zero()
            };
        }

        let mut total = Duration::zero();
        let mut segment_start = from;
        let mut segment_status = self.initial_status();

        for transition in &self.transitions {
            total += clipped_if_member(statuses, segment_status, segment_start, transition.at, from, to);
            segment_start = transition.at.max(from);
            segment_status = &transition.to;
        }
        total += clipped_if_member(statuses, segment_status, segment_start, to, from, to);

        total
    }
}

fn clipped_if_member(
    statuses: &StatusSet,
    status: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Duration {
    if !statuses.contains(status) {
        return Duration::zero();
    }
    let start = start.max(window_start);
    let end = end.min(window_end);
    if end > start {
        end - start
    } else {
        Duration::zero()
    }
}

/// Status of `item` at `at`, replaying `transitions`.
pub fn status_at<'a>(item: &'a WorkItem, transitions: &'a [StatusTransition], at: DateTime<Utc>) -> &'a str {
    StatusHistory::new(item, transitions).status_at(at)
}

/// Time `item` spent in any of `statuses` within `[from, to]`.
pub fn time_in_statuses(
    item: &WorkItem,
    transitions: &[StatusTransition],
    statuses: &StatusSet,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Duration {
    StatusHistory::new(item, transitions).time_in_statuses(statuses, from, to)
}
