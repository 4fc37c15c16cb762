//! Links purchase orders to `vendors` rows derived from their legacy vendor
//! columns. Safe to run repeatedly.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tracing::info;

use budget_admin_api::{
    config, db,
    events::{self, EventSender},
    notifications::NotificationHub,
    services::vendor_backfill::VendorBackfillService,
};

#[derive(Parser)]
#[command(
    name = "vendor-backfill",
    about = "Create vendors from legacy purchase order columns and link the orders",
    version
)]
struct Cli {
    #[arg(long, action = ArgAction::SetTrue, help = "Report what would change, then roll back")]
    dry_run: bool,
    #[arg(long, help = "Database URL; defaults to the configured database_url")]
    database_url: Option<String>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Apply pending migrations before running"
    )]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cli.migrate || cfg.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("failed running migrations")?;
    }
    let pool = Arc::new(pool);

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let processor = tokio::spawn(events::process_events(
        event_rx,
        Arc::new(NotificationHub::new(1)),
    ));

    let service = VendorBackfillService::new(pool.clone(), Arc::new(EventSender::new(event_tx)));
    let report = service
        .run(cli.dry_run)
        .await
        .context("vendor backfill failed")?;

    // Closing the channel lets the processor drain and exit
    drop(service);
    processor.await.context("event processor panicked")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.dry_run {
        info!("Dry run: no changes were committed");
    }

    if let Ok(pool) = Arc::try_unwrap(pool) {
        db::close_pool(pool).await?;
    }
    Ok(())
}
