// FlowPulse Library - weekly DORA and flow metrics from work item history
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod metrics;
pub mod observability;
pub mod telemetry;
pub mod work_items;

// Re-export key types for easy access
pub use config::{FlowPulseConfig, MetricsConfig, StatusSet};
pub use metrics::{
    EngineError, FileSnapshotStore, Forecast, InMemorySnapshotStore, IsoWeek, MetricId, MetricSnapshot,
    MetricsEngine, PassReport, SnapshotStore, StorageError, TrendIndicator, ValidationError, WeekSnapshot,
    WeeklyMetricResult,
};
pub use observability::{pass_metrics, OperationTimer, PassMetrics};
pub use telemetry::{create_calculation_span, generate_correlation_id, init_telemetry};
pub use work_items::{classify, status_at, time_in_statuses, WorkCategory, WorkItem};
