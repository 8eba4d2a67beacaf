use anyhow::Result;

use super::Command;
use crate::config::FlowPulseConfig;
use crate::metrics::{FileSnapshotStore, IsoWeek, MetricsReporter, SnapshotStore};

pub struct ShowCommand {
    pub config: FlowPulseConfig,
    pub week: String,
    pub json: bool,
    pub detailed: bool,
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        let week: IsoWeek = self.week.parse()?;
        let store = FileSnapshotStore::new(&self.config.storage.snapshot_dir);
        let snapshot = store.load(week).await?;

        if snapshot.is_empty() && !self.json {
            println!("📭 No snapshot stored for {week} in {}", store.directory().display());
            println!("   Run 'flowpulse calculate <export> --week {week}' first");
            return Ok(());
        }

        if self.json {
            println!("{}", MetricsReporter::export_week_json(&snapshot)?);
        } else {
            print!("{}", MetricsReporter::format_week_report(&snapshot, self.detailed));
        }
        Ok(())
    }
}
