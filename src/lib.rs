//! # Estuary
//!
//! Two small data pipelines that share one key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Products: Renderer → LazyLoadDefeater → HTML → ListingExtractor/FragmentExtractor → Store
//! News:     Company feeds → Fetcher → Normalizer → merge → Store
//! ```
//!
//! - [`scraper`]: headless Chrome driven until a lazily-loading product page settles
//! - [`news`]: per-company search feeds merged into one categorised list
//! - [`store`]: SQLite (or Redis) string store the read side consumes
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape the product page once
//! estuary scrape
//!
//! # Poll company news once
//! estuary news
//!
//! # Read what was stored
//! estuary show news --company Pfizer --search fda
//!
//! # Keep news fresh in the background
//! estuary daemon start --interval 1h
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// the store and the HTTP fetcher.
pub mod app;

/// Configuration management.
///
/// Loads from `~/.config/estuary/config.toml` with `[store]`, `[scraper]`
/// and `[news]` sections.
pub mod config;

/// Background daemon for periodic updates.
///
/// - `estuary daemon start` - Start the background updater
/// - `estuary daemon stop` - Stop the daemon
/// - `estuary daemon status` - Check if daemon is running
pub mod daemon;

/// Command-line interface using clap.
pub mod cli;

/// Core domain models.
///
/// - [`ListingRecord`](domain::ListingRecord): one scraped product card
/// - [`PageFragments`](domain::PageFragments): `<head>` and site header markup
/// - [`NewsArticle`](domain::NewsArticle): one aggregated news story
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for fetching raw bodies
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// News aggregation across company search feeds.
pub mod news;

/// Feed parsing.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0 into
/// [`FeedEntry`](normalizer::FeedEntry) values.
pub mod normalizer;

/// Headless-browser product scraping.
///
/// - [`ChromeRenderer`](scraper::ChromeRenderer): chromiumoxide-backed renderer
/// - [`LazyLoadDefeater`](scraper::LazyLoadDefeater): scroll, hover and trigger passes
/// - [`ListingExtractor`](scraper::ListingExtractor): HTML to listing records
/// - [`ScrapeOrchestrator`](scraper::ScrapeOrchestrator): one contained scrape run
pub mod scraper;

/// Key-value persistence.
///
/// - [`KvStore`](store::KvStore): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
