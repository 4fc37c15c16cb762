//! Follows the `/ws` notification channel and logs which cached collections
//! went stale.

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use budget_admin_api::{
    config,
    notifications::client::{
        CacheInvalidator, ClientExit, EntityCollection, NotificationClient, ReconnectPolicy,
        ViewCache,
    },
};

#[derive(Parser)]
#[command(
    name = "notify-watch",
    about = "Watch budget admin status notifications",
    version
)]
struct Cli {
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws", help = "WebSocket endpoint")]
    url: String,
    #[arg(long, default_value_t = 5, help = "Consecutive failed reconnects before giving up")]
    max_retries: u32,
    #[arg(long, default_value_t = 3, help = "Seconds between reconnect attempts")]
    retry_delay_secs: u64,
    #[arg(long, default_value = "info", help = "Log level")]
    log_level: String,
}

/// Logs each invalidation, then marks the collection fresh as if it had
/// been refetched.
struct LoggingCache {
    cache: ViewCache,
}

impl CacheInvalidator for LoggingCache {
    fn invalidate(&self, collection: EntityCollection) {
        self.cache.invalidate(collection);
        info!(
            %collection,
            pending = self.cache.pending(collection),
            "Collection stale; refetch required"
        );
        self.cache.mark_fresh(collection);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_tracing(&cli.log_level, false);

    let policy = ReconnectPolicy {
        max_retries: cli.max_retries,
        delay: Duration::from_secs(cli.retry_delay_secs),
    };
    let sink = Arc::new(LoggingCache {
        cache: ViewCache::new(),
    });
    let (client, shutdown) = NotificationClient::new(cli.url, policy, sink);

    let mut task = tokio::spawn(client.run());
    let exit = tokio::select! {
        exit = &mut task => exit?,
        _ = signal::ctrl_c() => {
            shutdown.shutdown();
            task.await?
        }
    };

    match exit {
        ClientExit::Shutdown => {
            info!("Stopped");
            Ok(())
        }
        ClientExit::GaveUp {
            retries,
            connect_attempts,
        } => bail!(
            "gave up after {} reconnects ({} connection attempts)",
            retries,
            connect_attempts
        ),
    }
}
