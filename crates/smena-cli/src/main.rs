use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smena_sync::SyncConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "smena-cli")]
#[command(about = "Smena content sync command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print the full run report as JSON instead of the one-line summary.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one full reconciliation pass against the configured spreadsheet.
    Sync,
    /// Apply pending database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let report = smena_sync::run_sync_once_from_env().await?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("serializing report")?
                );
            } else {
                println!(
                    "sync {}: run_id={} staff +{}/~{}/-{} menu {} training {} tests {} checklists {} motivation {}",
                    if report.success { "ok" } else { "FAILED" },
                    report.run_id,
                    report.employees.created,
                    report.employees.updated,
                    report.employees.deactivated,
                    report.menu.inserted,
                    report.training.inserted,
                    report.assessments.tests,
                    report.checklists.inserted,
                    report.motivation.inserted,
                );
                if let Some(error) = &report.connect_error {
                    eprintln!("connect error: {error}");
                }
                for (domain, error) in report.domain_errors() {
                    eprintln!("{domain}: {error}");
                }
            }
            if !report.success {
                std::process::exit(1);
            }
        }
        Commands::Migrate => {
            let config = SyncConfig::from_env();
            let pool = smena_storage::connect(&config.database_url).await?;
            smena_storage::db::migrate(&pool).await?;
            println!("migrations applied to {}", config.database_url);
        }
    }

    Ok(())
}
