use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use super::Command;
use crate::config::FlowPulseConfig;
use crate::metrics::{FileSnapshotStore, IsoWeek, MetricsEngine, MetricsReporter};
use crate::work_items::load_work_items;

pub struct CalculateCommand {
    pub config: FlowPulseConfig,
    pub input: PathBuf,
    pub weeks: Vec<String>,
    pub last: u32,
    pub now: Option<String>,
    pub save: bool,
    pub json: bool,
    pub detailed: bool,
}

impl CalculateCommand {
    fn evaluation_instant(&self) -> Result<DateTime<Utc>> {
        match &self.now {
            Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now value '{raw}'"))?
                .with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }

    fn target_weeks(&self, now: DateTime<Utc>) -> Result<Vec<IsoWeek>> {
        if self.weeks.is_empty() {
            let current = IsoWeek::containing(now);
            let mut weeks = current.preceding(self.last.saturating_sub(1));
            weeks.push(current);
            return Ok(weeks);
        }
        self.weeks
            .iter()
            .map(|label| label.parse::<IsoWeek>().map_err(Into::into))
            .collect()
    }
}

impl Command for CalculateCommand {
    async fn execute(&self) -> Result<()> {
        let now = self.evaluation_instant()?;
        let weeks = self.target_weeks(now)?;
        let items = load_work_items(&self.input)
            .await
            .with_context(|| format!("Failed to load work items from {}", self.input.display()))?;

        tracing::info!(items = items.len(), weeks = weeks.len(), now = %now, "Starting calculation");

        let engine = MetricsEngine::new(self.config.metrics.clone());
        let report = engine.run_pass(Arc::new(items), &weeks, now).await?;

        if self.save {
            let store = FileSnapshotStore::new(&self.config.storage.snapshot_dir);
            engine.persist(&report, &store).await?;
            if !self.json {
                println!("💾 Saved {} week(s) to {}", report.weeks.len(), store.directory().display());
                println!();
            }
        }

        if self.json {
            println!("{}", MetricsReporter::export_pass_json(&report)?);
        } else {
            print!("{}", MetricsReporter::format_pass_report(&report, self.detailed));
        }
        Ok(())
    }
}
