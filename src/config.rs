use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for FlowPulse
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowPulseConfig {
    /// Everything the calculators need; passed explicitly into every pass
    pub metrics: MetricsConfig,
    /// Snapshot persistence settings
    pub storage: StorageConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

/// Calculator configuration. Cloned into each pass, never read from a global.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub statuses: StatusConfig,
    pub classification: ClassificationConfig,
    pub delivery: DeliveryConfig,
    pub forecast: ForecastConfig,
    pub wip_thresholds: WipThresholdConfig,
}

/// A set of tracker status names. Membership ignores case and surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StatusSet(Vec<String>);

impl StatusSet {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(statuses.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, status: &str) -> bool {
        let status = status.trim();
        self.0.iter().any(|s| s.trim().eq_ignore_ascii_case(status))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Statuses counted as work in progress (Flow Load, Flow Time start)
    pub wip: StatusSet,
    /// Subset of WIP where work is actively happening (Flow Efficiency numerator)
    pub active: StatusSet,
    /// Completion statuses (Lead Time fallback start)
    pub done: StatusSet,
    /// Statuses meaning "being deployed" (Lead Time start)
    pub in_deployment: StatusSet,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            wip: StatusSet::new(["In Progress", "In Review", "Code Review", "Blocked", "Testing", "Ready for Deploy"]),
            active: StatusSet::new(["In Progress", "Code Review", "Testing"]),
            done: StatusSet::new(["Done", "Closed", "Resolved"]),
            in_deployment: StatusSet::new(["Ready for Deploy", "Deploying", "In Deployment"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Primary types that always classify as Defect
    pub defect_types: Vec<String>,
    /// Effort value meaning technical debt
    pub tech_debt_value: String,
    /// Effort values meaning security/compliance/regulatory/maintenance work
    pub risk_values: Vec<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            defect_types: vec!["Bug".to_string(), "Defect".to_string()],
            tech_debt_value: "Tech Debt".to_string(),
            risk_values: vec![
                "Security".to_string(),
                "Compliance".to_string(),
                "Regulatory".to_string(),
                "Maintenance".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Item types that represent one deployment
    pub deployment_types: Vec<String>,
    /// Environment tag identifying production incidents
    pub production_environment: String,
    /// Literal failure indicator value; compared case-sensitively
    pub failure_value: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            deployment_types: vec!["Deployment".to_string()],
            production_environment: "Production".to_string(),
            failure_value: "true".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of prior weeks fed into each forecast
    pub window_weeks: u32,
    /// Minimum weeks before a forecast is produced
    pub min_weeks: usize,
    /// Relative deviation treated as "on track"
    pub trend_threshold: f64,
    /// Acceptable band around the Flow Load forecast
    pub load_range_percent: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_weeks: 4,
            min_weeks: 2,
            trend_threshold: 0.10,
            load_range_percent: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WipThresholdConfig {
    /// Historical weeks required before thresholds are derived from data
    pub min_history_weeks: usize,
    /// Prior weeks sampled for velocity and flow time
    pub history_weeks: u32,
    /// Multiplier headroom applied to the 25th/50th/75th percentiles
    pub stability_buffer: f64,
    pub default_healthy: f64,
    pub default_warning: f64,
    pub default_high: f64,
    pub default_critical: f64,
}

impl Default for WipThresholdConfig {
    fn default() -> Self {
        Self {
            min_history_weeks: 4,
            history_weeks: 12,
            stability_buffer: 0.20,
            default_healthy: 10.0,
            default_warning: 20.0,
            default_high: 30.0,
            default_critical: 40.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON snapshot per ISO week
    pub snapshot_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: ".flowpulse/snapshots".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log directive when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl FlowPulseConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`flowpulse.toml`, or `explicit_path` when given)
    /// 3. Environment variables (prefixed with FLOWPULSE__, nested with `__`)
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&FlowPulseConfig::default())?);

        match explicit_path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new("flowpulse.toml").exists() {
                    builder = builder.add_source(File::with_name("flowpulse"));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FLOWPULSE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_status_set_membership_ignores_case() {
        let set = StatusSet::new(["In Progress", "Code Review"]);
        assert!(set.contains("in progress"));
        assert!(set.contains(" CODE REVIEW "));
        assert!(!set.contains("Done"));
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = MetricsConfig::default();
        assert_eq!(config.forecast.window_weeks, 4);
        assert_eq!(config.forecast.min_weeks, 2);
        assert!((config.forecast.trend_threshold - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.delivery.failure_value, "true");
        assert_eq!(config.wip_thresholds.default_critical, 40.0);
    }

    #[test]
    fn test_partial_file_overrides_keep_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[metrics.delivery]\nproduction_environment = \"prod\"\n\n[storage]\nsnapshot_dir = \"/tmp/snaps\"\n",
        )
        .unwrap();

        let config = FlowPulseConfig::load(Some(&path)).unwrap();
        assert_eq!(config.metrics.delivery.production_environment, "prod");
        assert_eq!(config.storage.snapshot_dir, "/tmp/snaps");
        assert_eq!(config.metrics.delivery.failure_value, "true");
        assert!(config.metrics.statuses.wip.contains("In Progress"));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = FlowPulseConfig::default();
        config.metrics.forecast.trend_threshold = 0.15;
        config.save_to_file(&path).unwrap();

        let reloaded = FlowPulseConfig::load(Some(&path)).unwrap();
        assert_eq!(reloaded.metrics, config.metrics);
    }
}
