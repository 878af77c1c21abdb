use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use hr_dashboard_metrics::config::{DashboardConfig, RuntimeArgs};
use hr_dashboard_metrics::db::{self, ImportKind, PgRecordSource, PgSlotStore};
use hr_dashboard_metrics::engine::DashboardEngine;
use hr_dashboard_metrics::scheduler::RefreshScheduler;
use hr_dashboard_metrics::{logging, report};

#[derive(Parser)]
#[command(name = "hr-dashboard")]
#[command(about = "Metrics aggregation for the HR operations dashboard", long_about = None)]
struct Cli {
    #[command(flatten)]
    runtime: RuntimeArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo candidates, interviews and mentors
    Seed,
    /// Import records from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: ImportKind,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Run one aggregation pass and print the headline numbers
    Overview {
        /// Show the last persisted results instead of running a pass
        #[arg(long)]
        cached: bool,
    },
    /// Run one aggregation pass and write a markdown report
    Report {
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
    /// Keep the overview fresh; press Enter to refresh manually, Ctrl-C to stop
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = DashboardConfig::from_args(&cli.runtime)?;
    logging::init(&config)?;

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let source = Arc::new(PgRecordSource::new(pool.clone()));
    let store = Arc::new(PgSlotStore::new(pool.clone()));
    let engine = Arc::new(DashboardEngine::new(source, store));

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let inserted = db::import_csv(&pool, kind, &csv).await?;
            println!("Inserted {inserted} records from {}.", csv.display());
        }
        Commands::Overview { cached: true } => match engine.cached_results().await {
            Some((aggregation, performance)) => {
                print!("{}", report::build_cached_report(&aggregation, &performance));
            }
            None => println!("No persisted results yet. Run `overview` first."),
        },
        Commands::Overview { cached: false } => {
            let overview = engine
                .run_pass(&Local::now())
                .await
                .context("aggregation pass failed")?;
            print!("{}", report::summary(&overview));
        }
        Commands::Report { out } => {
            let overview = engine
                .run_pass(&Local::now())
                .await
                .context("aggregation pass failed")?;
            std::fs::write(&out, report::build_report(&overview))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Watch => watch(engine, &config).await?,
    }

    Ok(())
}

async fn watch(
    engine: Arc<DashboardEngine<PgRecordSource, PgSlotStore>>,
    config: &DashboardConfig,
) -> anyhow::Result<()> {
    let handle = RefreshScheduler::new(engine, config.scheduler()).spawn();
    let mut overviews = handle.subscribe_overview();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                info!("interrupt received, stopping refresh scheduler");
                break;
            }
            changed = overviews.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = overviews.borrow_and_update().clone();
                if let Some(overview) = latest {
                    println!("{}", report::summary(&overview));
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => handle.request_refresh()?,
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!(error = %err, "stdin closed, manual refresh disabled");
                    stdin_open = false;
                }
            },
        }
    }

    let stats = handle.shutdown().await;
    println!(
        "Stopped after {} passes ({} abandoned).",
        stats.total_passes, stats.abandoned_passes
    );
    Ok(())
}
