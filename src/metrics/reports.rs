use std::fmt::Write as _;

use super::engine::PassReport;
use super::forecast::Confidence;
use super::storage::{MetricSnapshot, WeekSnapshot};
use super::summary::WindowSummary;
use super::trend::TrendClassification;
use super::types::{MetricId, MetricUnit};
use super::wip_thresholds::WipHealth;

pub struct MetricsReporter;

impl MetricsReporter {
    pub fn format_week_report(snapshot: &WeekSnapshot, detailed: bool) -> String {
        let mut report = String::new();

        let _ = writeln!(
            report,
            "📈 DELIVERY METRICS: {} ({} to {})",
            snapshot.week,
            snapshot.week.start().format("%Y-%m-%d"),
            (snapshot.week.end() - chrono::Duration::days(1)).format("%Y-%m-%d")
        );
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        if snapshot.is_empty() {
            report.push_str("   No metrics stored for this week\n");
            return report;
        }

        report.push_str("🚀 DORA\n");
        for metric in &MetricId::ALL[..4] {
            Self::push_metric_line(&mut report, snapshot, *metric, detailed);
        }
        report.push('\n');

        report.push_str("🌊 FLOW\n");
        for metric in &MetricId::ALL[4..] {
            Self::push_metric_line(&mut report, snapshot, *metric, detailed);
        }

        if let Some(assessment) = snapshot
            .get(MetricId::FlowLoad)
            .and_then(|record| record.result.wip_health.as_ref())
        {
            let icon = match assessment.health {
                WipHealth::Healthy => "🟢",
                WipHealth::Warning => "🟡",
                WipHealth::High => "🟠",
                WipHealth::Critical => "🔴",
            };
            let t = &assessment.thresholds;
            let _ = writeln!(
                report,
                "\n🎯 WIP HEALTH: {} {:?} (healthy <{}, warning <{}, high <{}, critical {})",
                icon, assessment.health, t.healthy, t.warning, t.high, t.critical
            );
        }

        report
    }

    fn push_metric_line(report: &mut String, snapshot: &WeekSnapshot, metric: MetricId, detailed: bool) {
        let Some(record) = snapshot.get(metric) else {
            let _ = writeln!(report, "   {:<34} -", metric.display_name());
            return;
        };

        let value = if record.result.has_data() {
            format_value(record.result.value, record.result.unit)
        } else {
            "insufficient data".to_string()
        };
        let _ = write!(report, "   {:<34} {:>14}", metric.display_name(), value);
        let _ = write!(report, "  {}", Self::forecast_text(record));
        report.push('\n');

        if detailed {
            let secondary = &record.result.secondary;
            if let (Some(p95), Some(mean)) = (secondary.p95, secondary.mean) {
                let _ = writeln!(
                    report,
                    "      p95 {}, mean {}, {} samples",
                    format_value(p95, record.result.unit),
                    format_value(mean, record.result.unit),
                    record.result.sample_size
                );
            }
            if let (Some(failures), Some(total)) = (secondary.failures, secondary.total) {
                let _ = writeln!(report, "      {failures} failed of {total} deployments");
            }
            if let Some(releases) = secondary.distinct_releases {
                let _ = writeln!(report, "      {releases} distinct releases");
            }
            if !record.result.breakdown.is_empty() {
                let parts: Vec<String> = record
                    .result
                    .breakdown
                    .iter()
                    .map(|(category, value)| format!("{category} {value}"))
                    .collect();
                let _ = writeln!(report, "      {}", parts.join(", "));
            }
        }

        for (reason, count) in record.result.exclusions.iter() {
            let _ = writeln!(report, "      ⚠️  {count} items: {}", reason.describe());
        }
    }

    fn forecast_text(record: &MetricSnapshot) -> String {
        let Some(forecast) = &record.forecast else {
            return "forecast: insufficient history".to_string();
        };
        let mut text = match forecast.range {
            Some(range) => format!("forecast {} ({}-{})", forecast.value, range.lower, range.upper),
            None => format!("forecast {}", forecast.value),
        };
        if forecast.confidence == Confidence::Building {
            text.push_str(" [building]");
        }
        if let Some(trend) = &record.trend {
            let icon = match trend.classification {
                TrendClassification::Favorable => "✅",
                TrendClassification::Unfavorable => "❌",
                TrendClassification::Neutral => "⏳",
            };
            let _ = write!(text, " {icon} {}", trend.status);
        }
        text
    }

    pub fn format_summary(summary: &WindowSummary) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "📊 WINDOW SUMMARY: {} to {}", summary.first_week, summary.last_week);
        for (metric, metric_summary) in &summary.metrics {
            let value = match metric_summary.value {
                Some(value) => format_value(value, metric.unit()),
                None => "insufficient data".to_string(),
            };
            let _ = writeln!(
                report,
                "   {:<34} {:>14}  ({}/{} weeks with data)",
                metric.display_name(),
                value,
                metric_summary.weeks_with_data,
                metric_summary.weeks
            );
            if let (Some(p95), Some(mean)) = (metric_summary.p95, metric_summary.mean) {
                let _ = writeln!(
                    report,
                    "   {:<34} p95 {}, mean {}",
                    "",
                    format_value(p95, metric.unit()),
                    format_value(mean, metric.unit())
                );
            }
        }
        report
    }

    pub fn format_pass_report(pass: &PassReport, detailed: bool) -> String {
        let mut report = String::new();
        for snapshot in &pass.weeks {
            report.push_str(&Self::format_week_report(snapshot, detailed));
            report.push('\n');
        }
        if let Some(summary) = &pass.summary {
            report.push_str(&Self::format_summary(summary));
        }
        report
    }

    pub fn export_week_json(snapshot: &WeekSnapshot) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(snapshot)
    }

    pub fn export_pass_json(pass: &PassReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(pass)
    }
}

fn format_value(value: f64, unit: MetricUnit) -> String {
    match unit {
        MetricUnit::Deployments | MetricUnit::Items => format!("{value}{}", unit.suffix()),
        _ => format!("{value:.1}{}", unit.suffix()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::{ExclusionReason, WeeklyMetricResult};
    use crate::metrics::week::IsoWeek;

    fn snapshot() -> WeekSnapshot {
        let week = IsoWeek::new(2024, 2).unwrap();
        let mut snapshot = WeekSnapshot::empty(week);

        let mut lead = WeeklyMetricResult::new(MetricId::LeadTime, week, 36.0);
        lead.sample_size = 2;
        lead.secondary.p95 = Some(46.8);
        lead.secondary.mean = Some(36.0);
        lead.exclusions.record(ExclusionReason::NoMatchingRelease);
        snapshot
            .metrics
            .insert(MetricId::LeadTime.as_str().to_string(), MetricSnapshot::new(lead));

        let flow = WeeklyMetricResult::new(MetricId::FlowTime, week, 0.0);
        snapshot
            .metrics
            .insert(MetricId::FlowTime.as_str().to_string(), MetricSnapshot::new(flow));
        snapshot
    }

    #[test]
    fn test_week_report_shows_values_and_exclusions() {
        let report = MetricsReporter::format_week_report(&snapshot(), true);
        assert!(report.contains("2024-W02 (2024-01-08 to 2024-01-14)"));
        assert!(report.contains("36.0h"));
        assert!(report.contains("p95 46.8h"));
        assert!(report.contains("no matching release"));
        assert!(report.contains("forecast: insufficient history"));
    }

    #[test]
    fn test_metric_without_samples_reads_insufficient_data() {
        let report = MetricsReporter::format_week_report(&snapshot(), false);
        let flow_line = report
            .lines()
            .find(|line| line.contains("Flow Time"))
            .unwrap();
        assert!(flow_line.contains("insufficient data"));
    }

    #[test]
    fn test_window_summary_shows_pooled_duration_stats() {
        let mut first = WeeklyMetricResult::new(MetricId::LeadTime, IsoWeek::new(2024, 1).unwrap(), 0.0);
        first.summarize_durations(&[2.0, 4.0]);
        let mut second = WeeklyMetricResult::new(MetricId::LeadTime, IsoWeek::new(2024, 2).unwrap(), 0.0);
        second.summarize_durations(&[10.0]);
        let summary = crate::metrics::summary::summarize_window(&[first, second]).unwrap();

        let report = MetricsReporter::format_summary(&summary);
        assert!(report.contains("2024-W01 to 2024-W02"));
        assert!(report.contains("p95 9.4h, mean 5.3h"));
    }

    #[test]
    fn test_json_export_round_trips() {
        let original = snapshot();
        let json = MetricsReporter::export_week_json(&original).unwrap();
        let decoded: WeekSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }
}
