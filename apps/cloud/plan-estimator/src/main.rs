//! Plan Estimator
//!
//! Estimates the recurring cost of the Azure virtual machines in a
//! Terraform plan (`terraform show -json <planfile>`). Runs as an HTTP API
//! or prices a single plan file from the command line.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_estimator::{AzureRetailCatalog, BillingScheme, EstimateOptions, EstimatorService};
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

mod config;
mod reporter;
mod server;

use config::Config;
use reporter::MetricsReporter;

#[derive(Parser)]
#[command(name = "plan-estimator")]
#[command(about = "Estimate Azure VM costs for a Terraform plan")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the estimate API over HTTP
    Serve,

    /// Price a plan file and print the estimate as JSON
    Estimate {
        /// Output of `terraform show -json`, or `-` for stdin
        #[arg(short, long)]
        plan: PathBuf,

        /// consumption, devtestconsumption, reservation1yr or reservation3yr
        #[arg(short = 's', long, default_value_t = BillingScheme::OnDemand)]
        pricing_scheme: BillingScheme,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let catalog = AzureRetailCatalog::new(config.catalog.clone())?;

    match cli.command {
        Commands::Serve => {
            observability::init_metrics()?;

            let service = EstimatorService::new(catalog.clone())
                .with_settings(config.estimator)
                .with_reporter(Arc::new(MetricsReporter::default()));

            info!(
                catalog = %config.catalog.base_url,
                concurrency = config.estimator.concurrency,
                deadline_secs = config.estimator.deadline.as_secs(),
                "Starting plan estimator"
            );
            let router = server::router(&config, service, catalog);
            server::serve(router, &config.server).await?;
        }

        Commands::Estimate {
            plan,
            pricing_scheme,
            pretty,
        } => {
            let body = read_plan(&plan).await?;
            let service = EstimatorService::new(catalog).with_settings(config.estimator);

            let result = service
                .estimate_json(&body, &EstimateOptions::with_scheme(pricing_scheme))
                .await?;

            let output = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{output}");
        }
    }

    Ok(())
}

async fn read_plan(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut body = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut body)
            .await
            .wrap_err("Failed to read plan from stdin")?;
        return Ok(body);
    }

    tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("Failed to read plan file {}", path.display()))
}
