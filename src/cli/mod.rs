use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "flowpulse")]
#[command(about = "Weekly DORA and flow delivery metrics from issue tracker exports")]
#[command(long_about = "FlowPulse replays work item status history to compute the four DORA metrics and \
                       five flow metrics per ISO week, forecasts each from recent weeks, and keeps weekly \
                       snapshots. Start with 'flowpulse calculate export.json'.")]
pub struct Cli {
    /// Configuration file (defaults to ./flowpulse.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute metrics for one or more ISO weeks and store the snapshots
    Calculate {
        /// Work item export (JSON array, or an object with an "items" array)
        input: PathBuf,
        /// ISO week to compute, e.g. 2024-W07 (repeatable)
        #[arg(long = "week", help = "ISO week label YYYY-Www; repeat for several weeks")]
        weeks: Vec<String>,
        /// Number of weeks ending with the current week, when no --week is given
        #[arg(long, default_value = "1")]
        last: u32,
        /// Evaluation instant (RFC 3339); defaults to the current time
        #[arg(long, help = "Pin \"now\" for reproducible recalculation")]
        now: Option<String>,
        /// Print results without writing snapshots
        #[arg(long)]
        no_save: bool,
        /// Print the pass as JSON
        #[arg(long)]
        json: bool,
        /// Include secondary statistics and breakdowns
        #[arg(long, short = 'v')]
        detailed: bool,
    },
    /// Show a stored weekly snapshot
    Show {
        /// ISO week label, e.g. 2024-W07
        week: String,
        /// Print the stored snapshot as JSON
        #[arg(long)]
        json: bool,
        /// Include secondary statistics and breakdowns
        #[arg(long, short = 'v')]
        detailed: bool,
    },
    /// Forecast the next value of a series and compare a current value against it
    Forecast {
        /// Historical weekly values, oldest first
        #[arg(required = true)]
        values: Vec<f64>,
        /// Explicit weights, comma separated, one per value
        #[arg(long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,
        /// Current value to classify against the forecast
        #[arg(long)]
        current: Option<f64>,
        /// higherBetter or lowerBetter
        #[arg(long, default_value = "higherBetter")]
        direction: String,
        /// Treat the series as flow load and classify against a range
        #[arg(long)]
        range: bool,
    },
}
