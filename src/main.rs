use anyhow::Result;
use clap::Parser;

use flowpulse::cli::commands::{
    calculate::CalculateCommand, forecast::ForecastCommand, show::ShowCommand, Command,
};
use flowpulse::cli::{Cli, Commands};
use flowpulse::config::FlowPulseConfig;
use flowpulse::observability::pass_metrics;
use flowpulse::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    FlowPulseConfig::load_env_file()?;
    let config = FlowPulseConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let result = match cli.command {
        Commands::Calculate {
            input,
            weeks,
            last,
            now,
            no_save,
            json,
            detailed,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            CalculateCommand {
                config,
                input,
                weeks,
                last,
                now,
                save: !no_save,
                json,
                detailed,
            }
            .execute()
            .await
        }),
        Commands::Show { week, json, detailed } => tokio::runtime::Runtime::new()?.block_on(async {
            ShowCommand {
                config,
                week,
                json,
                detailed,
            }
            .execute()
            .await
        }),
        Commands::Forecast {
            values,
            weights,
            current,
            direction,
            range,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            ForecastCommand {
                config,
                values,
                weights,
                current,
                direction,
                range,
            }
            .execute()
            .await
        }),
    };

    pass_metrics().log_stats();
    result
}
