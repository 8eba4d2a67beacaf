//! Snapshot persistence keyed by ISO week.
//!
//! One snapshot per week holds, for every metric, the weekly result plus
//! the forecast and trend computed alongside it. Records written before
//! forecasts existed still load; their forecast and trend read as absent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::forecast::Forecast;
use super::trend::TrendIndicator;
use super::types::{MetricId, WeeklyMetricResult};
use super::week::IsoWeek;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 2;

fn legacy_schema_version() -> u32 {
    1
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record for {found_metric} in {found_week} cannot be saved under {metric} in {week}")]
    KeyMismatch {
        week: IsoWeek,
        metric: MetricId,
        found_week: IsoWeek,
        found_metric: MetricId,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One metric's stored result with its optional forecast and trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub result: WeeklyMetricResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendIndicator>,
}

impl MetricSnapshot {
    pub fn new(result: WeeklyMetricResult) -> Self {
        Self {
            result,
            forecast: None,
            trend: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSnapshot {
    pub week: IsoWeek,
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    /// Keyed by metric name; unknown names from other versions are kept
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricSnapshot>,
}

impl WeekSnapshot {
    pub fn empty(week: IsoWeek) -> Self {
        Self {
            week,
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            metrics: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: MetricId) -> Option<&MetricSnapshot> {
        self.metrics.get(metric.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    fn insert(&mut self, metric: MetricId, record: MetricSnapshot) {
        self.metrics.insert(metric.as_str().to_string(), record);
        self.schema_version = SNAPSHOT_SCHEMA_VERSION;
    }
}

// Shape accepted on read. The oldest files stored the bare weekly result
// per metric, without the result/forecast/trend envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Current(MetricSnapshot),
    Bare(WeeklyMetricResult),
}

#[derive(Deserialize)]
struct StoredWeek {
    #[serde(default = "legacy_schema_version")]
    schema_version: u32,
    #[serde(default)]
    metrics: BTreeMap<String, serde_json::Value>,
}

/// Decode a stored week. A malformed metric record is skipped with a
/// warning so one bad entry does not hide the rest of the week.
pub fn decode_week_snapshot(week: IsoWeek, contents: &str) -> Result<WeekSnapshot, StorageError> {
    let stored: StoredWeek = serde_json::from_str(contents)?;
    let mut metrics = BTreeMap::new();

    for (name, raw) in stored.metrics {
        match serde_json::from_value::<StoredRecord>(raw) {
            Ok(StoredRecord::Current(record)) => {
                metrics.insert(name, record);
            }
            Ok(StoredRecord::Bare(result)) => {
                metrics.insert(name, MetricSnapshot::new(result));
            }
            Err(e) => {
                warn!(week = %week, metric = %name, error = %e, "Skipping unreadable snapshot record");
            }
        }
    }

    Ok(WeekSnapshot {
        week,
        schema_version: stored.schema_version,
        metrics,
    })
}

fn check_key(week: IsoWeek, metric: MetricId, record: &MetricSnapshot) -> Result<(), StorageError> {
    if record.result.week != week || record.result.metric != metric {
        return Err(StorageError::KeyMismatch {
            week,
            metric,
            found_week: record.result.week,
            found_metric: record.result.metric,
        });
    }
    Ok(())
}

fn series_from(snapshots: &[WeekSnapshot], metric: MetricId) -> Vec<f64> {
    snapshots
        .iter()
        .filter_map(|snapshot| snapshot.get(metric))
        .filter(|record| record.result.has_data())
        .map(|record| record.result.value)
        .collect()
}

/// Storage for weekly snapshots.
///
/// Saving the same (week, metric) twice overwrites; writes to one key are
/// serialized by the implementation.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, week: IsoWeek, metric: MetricId, record: MetricSnapshot) -> Result<(), StorageError>;

    /// Snapshot for `week`; empty when nothing was stored.
    async fn load(&self, week: IsoWeek) -> Result<WeekSnapshot, StorageError>;

    /// Stored values of `metric` for `weeks`, in the given order. Weeks
    /// without a record, or without samples, are skipped.
    async fn get_series(&self, metric: MetricId, weeks: &[IsoWeek]) -> Result<Vec<f64>, StorageError> {
        let mut snapshots = Vec::with_capacity(weeks.len());
        for week in weeks {
            snapshots.push(self.load(*week).await?);
        }
        Ok(series_from(&snapshots, metric))
    }

    async fn save_week(&self, snapshot: &WeekSnapshot) -> Result<(), StorageError> {
        for (name, record) in &snapshot.metrics {
            match name.parse::<MetricId>() {
                Ok(metric) => self.save(snapshot.week, metric, record.clone()).await?,
                Err(_) => debug!(week = %snapshot.week, metric = %name, "Not saving unknown metric"),
            }
        }
        Ok(())
    }
}

/// One pretty-printed JSON file per week under a snapshot directory.
#[derive(Debug)]
pub struct FileSnapshotStore {
    directory: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn week_path(&self, week: IsoWeek) -> PathBuf {
        self.directory.join(format!("{}.json", week.label()))
    }

    async fn read_week(&self, week: IsoWeek) -> Result<WeekSnapshot, StorageError> {
        let path = self.week_path(week);
        match fs::read_to_string(&path).await {
            Ok(contents) => decode_week_snapshot(week, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WeekSnapshot::empty(week)),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn write_week(&self, snapshot: &WeekSnapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| StorageError::io(&self.directory, e))?;

        let path = self.week_path(snapshot.week);
        let serialized = serde_json::to_string_pretty(snapshot)?;

        // Write to a temporary file first, then rename over the target
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serialized)
            .await
            .map_err(|e| StorageError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, week: IsoWeek, metric: MetricId, record: MetricSnapshot) -> Result<(), StorageError> {
        check_key(week, metric, &record)?;
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.read_week(week).await?;
        snapshot.insert(metric, record);
        self.write_week(&snapshot).await?;

        debug!(week = %week, metric = %metric, file = ?self.week_path(week), "Saved metric snapshot");
        Ok(())
    }

    async fn load(&self, week: IsoWeek) -> Result<WeekSnapshot, StorageError> {
        self.read_week(week).await
    }

    async fn save_week(&self, snapshot: &WeekSnapshot) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self.read_week(snapshot.week).await?;
        let mut saved = 0usize;
        for (name, record) in &snapshot.metrics {
            let Ok(metric) = name.parse::<MetricId>() else {
                debug!(week = %snapshot.week, metric = %name, "Not saving unknown metric");
                continue;
            };
            check_key(snapshot.week, metric, record)?;
            stored.insert(metric, record.clone());
            saved += 1;
        }
        self.write_week(&stored).await?;

        info!(week = %snapshot.week, metrics = saved, file = ?self.week_path(snapshot.week), "Saved week snapshot");
        Ok(())
    }
}

/// Process-local store, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    weeks: RwLock<BTreeMap<IsoWeek, WeekSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn week_count(&self) -> usize {
        self.weeks.read().await.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, week: IsoWeek, metric: MetricId, record: MetricSnapshot) -> Result<(), StorageError> {
        check_key(week, metric, &record)?;
        self.weeks
            .write()
            .await
            .entry(week)
            .or_insert_with(|| WeekSnapshot::empty(week))
            .insert(metric, record);
        Ok(())
    }

    async fn load(&self, week: IsoWeek) -> Result<WeekSnapshot, StorageError> {
        Ok(self
            .weeks
            .read()
            .await
            .get(&week)
            .cloned()
            .unwrap_or_else(|| WeekSnapshot::empty(week)))
    }
}
