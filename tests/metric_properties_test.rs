mod fixtures;

use fixtures::{deployments, jan, week, WorkItemBuilder};
use flowpulse::metrics::trend::{trend_vs_forecast, trend_vs_range, MetricDirection, DEFAULT_TREND_THRESHOLD};
use flowpulse::metrics::{
    calculate_metric, flow_load_range, forecast, CalculationContext, MetricId, TrendClassification, TrendDirection,
};
use flowpulse::work_items::{classify, status_at, time_in_statuses, WorkCategory};
use flowpulse::{MetricsConfig, StatusSet};

#[test]
fn test_replay_returns_latest_logged_status() {
    let item = WorkItemBuilder::new("APP-1", "Story")
        .status("Done")
        .transition("To Do", "In Progress", jan(2, 9))
        .transition("In Progress", "Blocked", jan(3, 9))
        .transition("Blocked", "In Progress", jan(4, 9))
        .transition("In Progress", "Done", jan(5, 9))
        .build();
    let log = &item.transitions;

    let cases = [
        (jan(1, 0), "To Do"),
        (jan(2, 9), "In Progress"),
        (jan(3, 8), "In Progress"),
        (jan(3, 9), "Blocked"),
        (jan(4, 12), "In Progress"),
        (jan(5, 9), "Done"),
        (jan(20, 0), "Done"),
    ];
    for (at, expected) in cases {
        assert_eq!(status_at(&item, log, at), expected, "status at {at}");
    }
}

#[test]
fn test_time_in_statuses_splits_the_interval() {
    let item = WorkItemBuilder::new("APP-2", "Story")
        .transition("To Do", "In Progress", jan(2, 0))
        .transition("In Progress", "Blocked", jan(2, 6))
        .transition("Blocked", "In Progress", jan(2, 10))
        .transition("In Progress", "Done", jan(2, 16))
        .build();
    let working = StatusSet::new(["in progress"]);
    let blocked = StatusSet::new(["Blocked"]);
    let everything_else = StatusSet::new(["To Do", "Done"]);

    let from = jan(1, 0);
    let to = jan(3, 0);
    let hours = |set: &StatusSet| time_in_statuses(&item, &item.transitions, set, from, to).num_hours();

    assert_eq!(hours(&working), 12);
    assert_eq!(hours(&blocked), 4);
    assert_eq!(hours(&working) + hours(&blocked) + hours(&everything_else), 48);
}

#[test]
fn test_defect_type_wins_over_any_effort_value() {
    let config = MetricsConfig::default();
    for effort in [None, Some("Tech Debt"), Some("Security"), Some("Feature work")] {
        let mut builder = WorkItemBuilder::new("BUG-1", "Bug");
        if let Some(effort) = effort {
            builder = builder.effort(effort);
        }
        assert_eq!(classify(&builder.build(), &config.classification), WorkCategory::Defect);
    }

    let debt = WorkItemBuilder::new("APP-3", "Story").effort("tech debt").build();
    assert_eq!(classify(&debt, &config.classification), WorkCategory::TechnicalDebt);
    let plain = WorkItemBuilder::new("APP-4", "Story").build();
    assert_eq!(classify(&plain, &config.classification), WorkCategory::Feature);
}

#[test]
fn test_failure_rate_is_failures_over_deployments() {
    let config = MetricsConfig::default();
    let cases = [(0, 5, 0.0), (1, 3, 33.33), (2, 8, 25.0), (5, 5, 100.0), (0, 0, 0.0)];

    for (failures, total, expected) in cases {
        let items = deployments("D", 10, total, failures);
        let ctx = CalculationContext::new(&config, &items, jan(22, 0));
        let result = calculate_metric(MetricId::ChangeFailureRate, &items, &week(2), &ctx);

        assert_eq!(result.value, expected, "{failures}/{total}");
        assert_eq!(result.sample_size, total as u64);
        assert_eq!(result.secondary.failures, Some(failures as u64));
        assert!(result.value >= 0.0 && result.value <= 100.0);
    }
}

#[test]
fn test_forecast_weighting() {
    let established = forecast(&[10.0, 12.0, 11.0, 13.0], None, 2).unwrap().unwrap();
    assert_eq!(established.value, 11.9);

    let building = forecast(&[10.0, 12.0], None, 2).unwrap().unwrap();
    assert_eq!(building.value, 11.0);

    assert!(forecast(&[10.0], None, 2).unwrap().is_none());
    assert!(forecast(&[], None, 2).unwrap().is_none());

    // Only the four most recent weeks count
    let long = forecast(&[100.0, 10.0, 12.0, 11.0, 13.0], None, 2).unwrap().unwrap();
    assert_eq!(long.value, 11.9);

    let explicit = forecast(&[10.0, 20.0], Some(&[0.25, 0.75]), 2).unwrap().unwrap();
    assert_eq!(explicit.value, 17.5);
    assert!(forecast(&[10.0, 20.0], Some(&[0.5, 0.6]), 2).is_err());
    assert!(forecast(&[10.0, 20.0], Some(&[1.0]), 2).is_err());
}

#[test]
fn test_trend_threshold_boundaries() {
    let trend = |current: f64| {
        trend_vs_forecast(current, 13.0, MetricDirection::HigherBetter, DEFAULT_TREND_THRESHOLD).unwrap()
    };

    let on_track = trend(14.0);
    assert_eq!(on_track.direction, TrendDirection::Neutral);
    assert_eq!(on_track.classification, TrendClassification::Favorable);

    let above = trend(15.0);
    assert_eq!(above.direction, TrendDirection::Above);
    assert_eq!(above.deviation_percent, 15.4);
    assert_eq!(above.classification, TrendClassification::Favorable);

    let below = trend(5.0);
    assert_eq!(below.direction, TrendDirection::Below);
    assert_eq!(below.deviation_percent, -61.5);
    assert_eq!(below.classification, TrendClassification::Unfavorable);

    let lower_better =
        trend_vs_forecast(15.0, 13.0, MetricDirection::LowerBetter, DEFAULT_TREND_THRESHOLD).unwrap();
    assert_eq!(lower_better.classification, TrendClassification::Unfavorable);
}

#[test]
fn test_zero_on_monday_is_week_starting() {
    let trend = trend_vs_forecast(0.0, 12.0, MetricDirection::HigherBetter, DEFAULT_TREND_THRESHOLD).unwrap();
    assert!(trend.week_starting);
    assert_eq!(trend.direction, TrendDirection::Neutral);
    assert_eq!(trend.classification, TrendClassification::Neutral);
    assert_eq!(trend.deviation_percent, 0.0);

    assert!(trend_vs_forecast(5.0, 0.0, MetricDirection::HigherBetter, DEFAULT_TREND_THRESHOLD).is_err());
}

#[test]
fn test_flow_load_range_bounds() {
    let range = flow_load_range(15.0, 0.2).unwrap();
    assert_eq!(range.lower, 12.0);
    assert_eq!(range.upper, 18.0);

    let bottleneck = trend_vs_range(24.0, 15.0, range).unwrap();
    assert_eq!(bottleneck.direction, TrendDirection::Above);
    assert_eq!(bottleneck.classification, TrendClassification::Unfavorable);
    assert_eq!(bottleneck.deviation_percent, 60.0);

    let within = trend_vs_range(14.0, 15.0, range).unwrap();
    assert_eq!(within.direction, TrendDirection::Neutral);
    assert_eq!(within.classification, TrendClassification::Favorable);

    let idle = trend_vs_range(9.0, 15.0, range).unwrap();
    assert_eq!(idle.direction, TrendDirection::Below);
    assert_eq!(idle.classification, TrendClassification::Unfavorable);

    assert!(flow_load_range(0.0, 0.2).is_err());
}
