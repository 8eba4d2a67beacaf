//! Calculation pass orchestration.
//!
//! A pass computes all nine metrics for each requested week, plus the
//! weeks before it that feed forecasts and WIP thresholds. Weeks are
//! independent, so `run_pass` spreads them over blocking tasks; `calculate`
//! does the same work on the calling thread. Both produce identical output
//! for identical inputs and "now".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, Instrument};

use super::context::{CalculationContext, ReleaseCatalog};
use super::dora::{
    calculate_change_failure_rate, calculate_deployment_frequency, calculate_lead_time, calculate_recovery_time,
};
use super::errors::ValidationError;
use super::flow::{
    calculate_flow_distribution, calculate_flow_efficiency, calculate_flow_load, calculate_flow_time,
    calculate_flow_velocity,
};
use super::forecast::{flow_load_range, forecast, Forecast};
use super::storage::{MetricSnapshot, SnapshotStore, StorageError, WeekSnapshot};
use super::summary::{summarize_window, WindowSummary};
use super::trend::{trend_vs_forecast, trend_vs_range, MetricDirection, TrendIndicator};
use super::types::{MetricId, Polarity, WeeklyMetricResult};
use super::week::IsoWeek;
use super::wip_thresholds::{FlowSample, WipAssessment, WipThresholds};
use crate::config::MetricsConfig;
use crate::observability::{pass_metrics, OperationTimer};
use crate::telemetry::{create_calculation_span, generate_correlation_id};
use crate::work_items::WorkItem;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Calculation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything one pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub now: DateTime<Utc>,
    /// Requested weeks, oldest first
    pub weeks: Vec<WeekSnapshot>,
    /// Cross-window aggregates over the requested weeks
    pub summary: Option<WindowSummary>,
}

impl PassReport {
    pub fn week(&self, week: IsoWeek) -> Option<&WeekSnapshot> {
        self.weeks.iter().find(|snapshot| snapshot.week == week)
    }

    pub fn excluded_items(&self) -> u64 {
        self.weeks
            .iter()
            .flat_map(|snapshot| snapshot.metrics.values())
            .map(|record| record.result.exclusions.excluded())
            .sum()
    }
}

type WeekResults = BTreeMap<MetricId, WeeklyMetricResult>;

/// Compute one metric for one week.
pub fn calculate_metric(
    metric: MetricId,
    items: &[WorkItem],
    week: &IsoWeek,
    ctx: &CalculationContext<'_>,
) -> WeeklyMetricResult {
    match metric {
        MetricId::DeploymentFrequency => calculate_deployment_frequency(items, week, ctx),
        MetricId::LeadTime => calculate_lead_time(items, week, ctx),
        MetricId::ChangeFailureRate => calculate_change_failure_rate(items, week, ctx),
        MetricId::MeanTimeToRecovery => calculate_recovery_time(items, week, ctx),
        MetricId::FlowVelocity => calculate_flow_velocity(items, week, ctx),
        MetricId::FlowTime => calculate_flow_time(items, week, ctx),
        MetricId::FlowEfficiency => calculate_flow_efficiency(items, week, ctx),
        MetricId::FlowLoad => calculate_flow_load(items, week, ctx),
        MetricId::FlowDistribution => calculate_flow_distribution(items, week, ctx),
    }
}

/// All nine raw weekly results, before forecasting.
pub fn calculate_week(items: &[WorkItem], week: &IsoWeek, ctx: &CalculationContext<'_>) -> WeekResults {
    MetricId::ALL
        .into_iter()
        .map(|metric| (metric, calculate_metric(metric, items, week, ctx)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct MetricsEngine {
    config: Arc<MetricsConfig>,
}

impl MetricsEngine {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Requested weeks plus every earlier week needed for history.
    fn required_weeks(&self, weeks: &[IsoWeek]) -> BTreeSet<IsoWeek> {
        let lookback = self
            .config
            .forecast
            .window_weeks
            .max(self.config.wip_thresholds.history_weeks);
        weeks
            .iter()
            .flat_map(|week| week.preceding(lookback).into_iter().chain(std::iter::once(*week)))
            .collect()
    }

    /// Run a pass on the calling thread.
    pub fn calculate(
        &self,
        items: &[WorkItem],
        weeks: &[IsoWeek],
        now: DateTime<Utc>,
    ) -> Result<PassReport, ValidationError> {
        let correlation_id = generate_correlation_id();
        let span = create_calculation_span(&correlation_id, weeks.len(), items.len());
        let _entered = span.enter();
        let timer = OperationTimer::new("calculation_pass");

        let ctx = CalculationContext::new(&self.config, items, now);
        let raw: BTreeMap<IsoWeek, WeekResults> = self
            .required_weeks(weeks)
            .into_iter()
            .map(|week| (week, calculate_week(items, &week, &ctx)))
            .collect();

        let report = self.assemble(&raw, weeks, now);
        timer.finish();
        self.record(report)
    }

    /// Run a pass with each week computed on the blocking thread pool.
    pub async fn run_pass(
        &self,
        items: Arc<Vec<WorkItem>>,
        weeks: &[IsoWeek],
        now: DateTime<Utc>,
    ) -> Result<PassReport, EngineError> {
        let correlation_id = generate_correlation_id();
        let span = create_calculation_span(&correlation_id, weeks.len(), items.len());

        async {
            let timer = OperationTimer::new("calculation_pass");
            let catalog = Arc::new(ReleaseCatalog::from_items(&items, now));
            let mut tasks = JoinSet::new();

            for week in self.required_weeks(weeks) {
                let items = Arc::clone(&items);
                let config = Arc::clone(&self.config);
                let catalog = Arc::clone(&catalog);
                tasks.spawn_blocking(move || {
                    let ctx = CalculationContext::with_releases(&config, catalog, now);
                    (week, calculate_week(&items, &week, &ctx))
                });
            }

            let mut raw = BTreeMap::new();
            while let Some(joined) = tasks.join_next().await {
                let (week, results) = joined?;
                raw.insert(week, results);
            }

            let report = self.assemble(&raw, weeks, now);
            timer.finish();
            Ok::<_, EngineError>(self.record(report)?)
        }
        .instrument(span)
        .await
    }

    fn record(&self, report: Result<PassReport, ValidationError>) -> Result<PassReport, ValidationError> {
        match report {
            Ok(report) => {
                let results = report.weeks.iter().map(|w| w.metrics.len() as u64).sum();
                pass_metrics().record_pass(report.weeks.len() as u64, results, report.excluded_items());
                info!(
                    weeks = report.weeks.len(),
                    results,
                    excluded = report.excluded_items(),
                    "Calculation pass complete"
                );
                Ok(report)
            }
            Err(e) => {
                pass_metrics().record_validation_failure();
                Err(e)
            }
        }
    }

    fn assemble(
        &self,
        raw: &BTreeMap<IsoWeek, WeekResults>,
        weeks: &[IsoWeek],
        now: DateTime<Utc>,
    ) -> Result<PassReport, ValidationError> {
        let mut requested: Vec<IsoWeek> = weeks.to_vec();
        requested.sort();
        requested.dedup();

        let mut snapshots = Vec::with_capacity(requested.len());
        let mut window_results = Vec::new();

        for week in &requested {
            let Some(results) = raw.get(week) else {
                continue;
            };
            let mut snapshot = WeekSnapshot::empty(*week);

            for (metric, result) in results {
                let mut result = result.clone();
                if *metric == MetricId::FlowLoad {
                    result.wip_health = Some(self.assess_wip(raw, week, result.value));
                }

                let history = self.history_values(raw, week, *metric);
                let record = self.enrich(result, &history)?;
                window_results.push(record.result.clone());
                snapshot.metrics.insert(metric.as_str().to_string(), record);
            }

            debug!(week = %week, metrics = snapshot.metrics.len(), "Assembled week snapshot");
            snapshots.push(snapshot);
        }

        Ok(PassReport {
            now,
            summary: summarize_window(&window_results),
            weeks: snapshots,
        })
    }

    /// Values of `metric` over the forecast window before `week`, oldest
    /// first. Sample-based weeks without samples are left out.
    fn history_values(&self, raw: &BTreeMap<IsoWeek, WeekResults>, week: &IsoWeek, metric: MetricId) -> Vec<f64> {
        week.preceding(self.config.forecast.window_weeks)
            .iter()
            .filter_map(|prior| raw.get(prior)?.get(&metric))
            .filter(|result| result.has_data())
            .map(|result| result.value)
            .collect()
    }

    fn assess_wip(&self, raw: &BTreeMap<IsoWeek, WeekResults>, week: &IsoWeek, wip: f64) -> WipAssessment {
        let samples: Vec<FlowSample> = week
            .preceding(self.config.wip_thresholds.history_weeks)
            .iter()
            .filter_map(|prior| {
                let results = raw.get(prior)?;
                Some(FlowSample {
                    velocity: results.get(&MetricId::FlowVelocity)?.value,
                    cycle_time_days: results.get(&MetricId::FlowTime)?.value,
                })
            })
            .collect();

        let thresholds = WipThresholds::derive(&samples, &self.config.wip_thresholds);
        WipAssessment {
            health: thresholds.assess(wip),
            thresholds,
        }
    }

    /// Attach forecast and trend to a weekly result.
    pub fn enrich(&self, result: WeeklyMetricResult, history: &[f64]) -> Result<MetricSnapshot, ValidationError> {
        let settings = &self.config.forecast;
        let Some(mut prediction) = forecast(history, None, settings.min_weeks)? else {
            return Ok(MetricSnapshot::new(result));
        };

        let trend = if prediction.value <= 0.0 || !result.has_data() {
            None
        } else if result.metric.polarity() == Polarity::WithinRange {
            let range = flow_load_range(prediction.value, settings.load_range_percent)?;
            prediction = prediction.with_range(range);
            Some(trend_vs_range(result.value, prediction.value, range)?)
        } else {
            let direction = MetricDirection::try_from(result.metric.polarity())?;
            Some(trend_vs_forecast(
                result.value,
                prediction.value,
                direction,
                settings.trend_threshold,
            )?)
        };

        Ok(MetricSnapshot {
            result,
            forecast: Some(prediction),
            trend,
        })
    }

    /// Persist every week of a report.
    pub async fn persist(&self, report: &PassReport, store: &dyn SnapshotStore) -> Result<(), StorageError> {
        for snapshot in &report.weeks {
            store.save_week(snapshot).await?;
        }
        info!(weeks = report.weeks.len(), "Persisted calculation pass");
        Ok(())
    }

    /// Forecast `metric` for `week` from previously stored weeks.
    pub async fn forecast_from_store(
        &self,
        store: &dyn SnapshotStore,
        metric: MetricId,
        week: IsoWeek,
    ) -> Result<Option<Forecast>, EngineError> {
        let prior = week.preceding(self.config.forecast.window_weeks);
        let series = store.get_series(metric, &prior).await?;
        let prediction = forecast(&series, None, self.config.forecast.min_weeks)?;

        if metric.polarity() == Polarity::WithinRange {
            if let Some(prediction) = prediction {
                if prediction.value > 0.0 {
                    let range = flow_load_range(prediction.value, self.config.forecast.load_range_percent)?;
                    return Ok(Some(prediction.with_range(range)));
                }
                return Ok(Some(prediction));
            }
        }
        Ok(prediction)
    }

    /// Trend of a stored week's value against its stored forecast.
    pub fn trend_for(&self, record: &MetricSnapshot) -> Result<Option<TrendIndicator>, ValidationError> {
        let Some(prediction) = record.forecast.as_ref() else {
            return Ok(None);
        };
        if prediction.value <= 0.0 {
            return Ok(None);
        }
        match (record.result.metric.polarity(), prediction.range) {
            (Polarity::WithinRange, Some(range)) => {
                trend_vs_range(record.result.value, prediction.value, range).map(Some)
            }
            (Polarity::WithinRange, None) => Ok(None),
            (polarity, _) => trend_vs_forecast(
                record.result.value,
                prediction.value,
                MetricDirection::try_from(polarity)?,
                self.config.forecast.trend_threshold,
            )
            .map(Some),
        }
    }
}
