use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::news::NewsAggregator;
use crate::scraper::{ChromeRenderer, ScrapeOrchestrator};
use crate::store::{open_store, KvStore, SqliteStore};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn KvStore + Send + Sync>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppContext {
    /// Connect to the configured store. Fails with `StoreUnavailable` when
    /// the backend does not answer.
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn KvStore + Send + Sync> = Arc::from(open_store(&config.store)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);

        Ok(Self {
            config,
            store,
            fetcher,
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store: Arc<dyn KvStore + Send + Sync> = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);

        Ok(Self {
            config,
            store,
            fetcher,
        })
    }

    pub fn news_aggregator(&self) -> NewsAggregator {
        NewsAggregator::new(self.config.news.clone(), self.fetcher.clone())
    }

    pub fn scrape_orchestrator(&self) -> Result<ScrapeOrchestrator<ChromeRenderer>> {
        let renderer = ChromeRenderer::new(self.config.scraper.clone());
        ScrapeOrchestrator::new(renderer, &self.config.scraper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{get_json, Lookup, NEWS_KEY};

    #[test]
    fn test_in_memory_context_starts_empty() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let news: Lookup<Vec<crate::domain::NewsArticle>> = get_json(&*ctx.store, NEWS_KEY).unwrap();
        assert_eq!(news, Lookup::Missing);
    }

    #[test]
    fn test_new_uses_configured_sqlite_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.path = Some(dir.path().join("estuary.db"));

        let ctx = AppContext::new(config).unwrap();
        ctx.store.set("k", "v").unwrap();
        assert!(dir.path().join("estuary.db").exists());
    }
}
