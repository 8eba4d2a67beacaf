use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Counters across calculation passes in this process
#[derive(Debug, Default)]
pub struct PassMetrics {
    pub passes: AtomicU64,
    pub weeks_calculated: AtomicU64,
    pub results_produced: AtomicU64,
    pub items_excluded: AtomicU64,
    pub validation_failures: AtomicU64,
}

impl PassMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self, weeks: u64, results: u64, excluded: u64) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.weeks_calculated.fetch_add(weeks, Ordering::Relaxed);
        self.results_produced.fetch_add(results, Ordering::Relaxed);
        self.items_excluded.fetch_add(excluded, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> PassStats {
        PassStats {
            passes: self.passes.load(Ordering::Relaxed),
            weeks_calculated: self.weeks_calculated.load(Ordering::Relaxed),
            results_produced: self.results_produced.load(Ordering::Relaxed),
            items_excluded: self.items_excluded.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            passes = stats.passes,
            weeks = stats.weeks_calculated,
            results = stats.results_produced,
            excluded = stats.items_excluded,
            validation_failures = stats.validation_failures,
            "Calculation metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub passes: u64,
    pub weeks_calculated: u64,
    pub results_produced: u64,
    pub items_excluded: u64,
    pub validation_failures: u64,
}

static PASS_METRICS: std::sync::LazyLock<PassMetrics> = std::sync::LazyLock::new(PassMetrics::new);

pub fn pass_metrics() -> &'static PassMetrics {
    &PASS_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_metrics_accumulate() {
        let metrics = PassMetrics::new();
        metrics.record_pass(3, 27, 4);
        metrics.record_pass(1, 9, 0);
        metrics.record_validation_failure();

        let stats = metrics.get_stats();
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.weeks_calculated, 4);
        assert_eq!(stats.results_produced, 36);
        assert_eq!(stats.items_excluded, 4);
        assert_eq!(stats.validation_failures, 1);
    }
}
