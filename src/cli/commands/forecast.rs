use anyhow::Result;

use super::Command;
use crate::config::FlowPulseConfig;
use crate::metrics::{
    flow_load_range, forecast, trend_vs_forecast, trend_vs_range, Forecast, MetricDirection, TrendIndicator,
};

pub struct ForecastCommand {
    pub config: FlowPulseConfig,
    pub values: Vec<f64>,
    pub weights: Option<Vec<f64>>,
    pub current: Option<f64>,
    pub direction: String,
    pub range: bool,
}

impl ForecastCommand {
    /// Forecast and, when a current value is given, its trend.
    pub fn evaluate(&self) -> Result<Option<(Forecast, Option<TrendIndicator>)>> {
        let settings = &self.config.metrics.forecast;
        let Some(mut prediction) = forecast(&self.values, self.weights.as_deref(), settings.min_weeks)? else {
            return Ok(None);
        };

        if self.range && prediction.value > 0.0 {
            let range = flow_load_range(prediction.value, settings.load_range_percent)?;
            prediction = prediction.with_range(range);
        }

        let trend = match (self.current, prediction.range) {
            (None, _) => None,
            (Some(current), Some(range)) => Some(trend_vs_range(current, prediction.value, range)?),
            (Some(current), None) => {
                let direction: MetricDirection = self.direction.parse()?;
                Some(trend_vs_forecast(current, prediction.value, direction, settings.trend_threshold)?)
            }
        };
        Ok(Some((prediction, trend)))
    }
}

impl Command for ForecastCommand {
    async fn execute(&self) -> Result<()> {
        let Some((prediction, trend)) = self.evaluate()? else {
            println!(
                "⏳ Insufficient data: {} week(s) given, at least {} needed",
                self.values.len(),
                self.config.metrics.forecast.min_weeks
            );
            return Ok(());
        };

        println!("🔮 Forecast: {}", prediction.value);
        if let Some(range) = prediction.range {
            println!("   Range:      {} - {}", range.lower, range.upper);
        }
        println!("   Weeks used: {} ({:?})", prediction.weeks_available, prediction.confidence);
        println!("   Weights:    {:?}", prediction.weights);

        if let Some(trend) = trend {
            println!();
            println!(
                "📍 Current {}: {} ({:+.1}%, {:?})",
                self.current.unwrap_or_default(),
                trend.status,
                trend.deviation_percent,
                trend.classification
            );
        }
        Ok(())
    }
}
