//! News aggregation: one search feed per company, merged into a single
//! deduplicated, categorised, newest-first list.
//!
//! ```text
//! Company → feed URL → Fetcher → Normalizer → merge → Store
//! ```

mod aggregator;
mod categorize;
mod config;
mod filter;

pub use aggregator::{merge, NewsAggregator};
pub use categorize::{categorize, CATEGORY_KEYWORDS, GENERAL};
pub use config::{Company, NewsConfig, DEFAULT_COMPANY_COLOR};
pub use filter::{load_digest, NewsDigest, NewsFilter, ALL};

use chrono::Local;
use tracing::{info, warn};

use crate::app::Result;
use crate::store::{put_json, KvStore, NEWS_KEY, NEWS_UPDATED_KEY};

/// Run one aggregation pass and store the result.
///
/// Nothing is written when no articles were collected, so a failed poll
/// never replaces good data with an empty list. Returns the article count.
pub async fn refresh_news<S: KvStore + ?Sized>(
    aggregator: &NewsAggregator,
    store: &S,
) -> Result<usize> {
    let articles = aggregator.collect().await;

    if articles.is_empty() {
        warn!("No news data scraped.");
        return Ok(0);
    }

    put_json(store, NEWS_KEY, &articles)?;
    let updated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    store.set(NEWS_UPDATED_KEY, &updated)?;
    info!("Stored {} articles under '{}'", articles.len(), NEWS_KEY);

    Ok(articles.len())
}
