use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use estuary::app::AppContext;
use estuary::cli::{commands, Cli, Commands, DaemonAction};
use estuary::config::Config;
use estuary::daemon::{self, Daemon, DaemonConfig};
use estuary::news::NewsFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Daemon control never needs the store.
    if let Commands::Daemon { action } = &cli.command {
        match action {
            DaemonAction::Stop => {
                daemon::stop_daemon().map_err(anyhow::Error::msg)?;
                println!("Daemon stopped");
                return Ok(());
            }
            DaemonAction::Status => {
                println!("{}", daemon::daemon_status());
                return Ok(());
            }
            DaemonAction::Start { foreground: false, .. } => {
                let args: Vec<String> = std::env::args().skip(1).collect();
                let pid = daemon::spawn_detached(&args).map_err(anyhow::Error::msg)?;
                println!("Daemon started (PID: {})", pid);
                return Ok(());
            }
            DaemonAction::Start { .. } => {}
        }
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config).context("Failed to open store")?;

    match cli.command {
        Commands::Scrape { url, dry_run } => {
            commands::scrape(&ctx, url.as_deref(), dry_run).await?;
        }
        Commands::News => {
            commands::update_news(&ctx).await?;
        }
        Commands::Show {
            target,
            company,
            category,
            search,
        } => {
            let filter = NewsFilter {
                company,
                category,
                search,
            };
            commands::show(&ctx, target, &filter)?;
        }
        Commands::Companies => {
            commands::list_companies(&ctx);
        }
        Commands::Health => {
            commands::health(&ctx)?;
        }
        Commands::Daemon {
            action:
                DaemonAction::Start {
                    interval,
                    no_initial_update,
                    with_products,
                    log,
                    ..
                },
        } => {
            let config = DaemonConfig {
                update_interval_secs: DaemonConfig::parse_interval(&interval)
                    .map_err(anyhow::Error::msg)?,
                update_on_start: !no_initial_update,
                with_products,
                log_file: log,
            };
            Daemon::new(Arc::new(ctx), config).run().await?;
        }
        Commands::Daemon {
            action: DaemonAction::Stop | DaemonAction::Status,
        } => {}
    }

    Ok(())
}
