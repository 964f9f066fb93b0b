pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "estuary")]
#[command(about = "Product scraper and pharma news aggregator", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/estuary/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape the product listing page once and store the results
    Scrape {
        /// Page to scrape instead of the configured one
        #[arg(long)]
        url: Option<String>,

        /// Print the results instead of storing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Poll every company news feed once and store the merged list
    News,
    /// Print stored data as JSON
    Show {
        #[arg(value_enum)]
        target: ShowTarget,

        /// Only news for this company ("All" for every company)
        #[arg(long)]
        company: Option<String>,

        /// Only news in this category ("All" for every category)
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text to look for in titles and summaries
        #[arg(long)]
        search: Option<String>,
    },
    /// List the companies whose news is polled
    Companies,
    /// Check that the store is reachable
    Health,
    /// Background daemon for automatic updates
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowTarget {
    Products,
    Fragments,
    News,
}

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Start the background daemon
    Start {
        /// Update interval (e.g., "1h", "30m", "6h", "1d")
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Skip initial update on start
        #[arg(long)]
        no_initial_update: bool,

        /// Also run the product scraper on every cycle
        #[arg(long)]
        with_products: bool,

        /// Log file path (default: stdout)
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Run in foreground (don't detach)
        #[arg(short, long)]
        foreground: bool,
    },
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
}
