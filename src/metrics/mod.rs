// Delivery and flow metrics: weekly calculators, forecasting, trend
// classification and snapshot persistence

pub mod context;
pub mod dora;
pub mod engine;
pub mod errors;
pub mod flow;
pub mod forecast;
pub mod reports;
pub mod stats;
pub mod storage;
pub mod summary;
pub mod trend;
pub mod types;
pub mod week;
pub mod wip_thresholds;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{CalculationContext, ReleaseCatalog};
pub use engine::{calculate_metric, calculate_week, EngineError, MetricsEngine, PassReport};
pub use errors::ValidationError;
pub use forecast::{flow_load_range, forecast, Confidence, Forecast, ForecastRange};
pub use reports::MetricsReporter;
pub use storage::{
    FileSnapshotStore, InMemorySnapshotStore, MetricSnapshot, SnapshotStore, StorageError, WeekSnapshot,
};
pub use summary::{summarize_metric, summarize_window, MetricSummary, WindowSummary};
pub use trend::{
    trend_vs_forecast, trend_vs_range, MetricDirection, TrendClassification, TrendDirection, TrendIndicator,
};
pub use types::*;
pub use week::IsoWeek;
pub use wip_thresholds::{WipAssessment, WipHealth, WipThresholds};
