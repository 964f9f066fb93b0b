use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use url::Url;

use crate::app::Result;
use crate::domain::NewsArticle;
use crate::fetcher::{Fetcher, ParallelFetcher};
use crate::news::categorize::categorize;
use crate::news::config::{Company, NewsConfig};
use crate::normalizer::{FeedEntry, Normalizer};

const UNTITLED: &str = "No title";
const PUBLISHED_FORMAT: &str = "%b %d, %Y %I:%M %p";

/// Polls one search feed per company and merges the results.
pub struct NewsAggregator {
    config: NewsConfig,
    fetcher: ParallelFetcher,
    normalizer: Normalizer,
}

impl NewsAggregator {
    pub fn new(config: NewsConfig, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        let fetcher = ParallelFetcher::with_workers(fetcher, config.workers);
        Self {
            config,
            fetcher,
            normalizer: Normalizer::new(),
        }
    }

    /// Search feed URL for a company.
    pub fn feed_url(&self, company: &Company) -> Result<Url> {
        let query = format!("{} {}", company.name, self.config.query_suffix);
        let params = std::iter::once(("q", query.as_str())).chain(
            self.config
                .locale_params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        Ok(Url::parse_with_params(&self.config.feed_base_url, params)?)
    }

    /// Fetch every company feed and return the merged, newest-first list.
    ///
    /// A company whose feed cannot be fetched or parsed is skipped.
    pub async fn collect(&self) -> Vec<NewsArticle> {
        let mut pending = Vec::with_capacity(self.config.companies.len());
        for company in &self.config.companies {
            match self.feed_url(company) {
                Ok(url) => pending.push((company, url.to_string())),
                Err(e) => error!("Invalid feed URL for {}: {}", company.name, e),
            }
        }

        info!("Polling {} company feeds", pending.len());
        let urls = pending.iter().map(|(_, url)| url.clone()).collect();
        let bodies = self.fetcher.fetch_all(urls).await;

        let mut batches = Vec::with_capacity(bodies.len());
        for (url, body) in bodies {
            let Some(company) = pending
                .iter()
                .find(|(_, feed_url)| *feed_url == url)
                .map(|(company, _)| *company)
            else {
                continue;
            };
            let entries = body.and_then(|bytes| self.normalizer.normalize(&bytes));
            match entries {
                Ok(entries) => batches.push((company.clone(), entries)),
                Err(e) => error!("Error scraping {} ({}): {}", company.name, url, e),
            }
        }

        let articles = merge(&self.config, batches, Utc::now());
        info!("Total articles scraped: {}", articles.len());
        articles
    }
}

/// Deduplicate, cap, categorise and sort company batches.
///
/// Batches are processed in order, so a link shared by two companies is
/// credited to the first. `now` stands in for entries without a date.
pub fn merge(
    config: &NewsConfig,
    batches: Vec<(Company, Vec<FeedEntry>)>,
    now: DateTime<Utc>,
) -> Vec<NewsArticle> {
    let mut seen_links = HashSet::new();
    let mut articles = Vec::new();

    for (company, entries) in batches {
        let mut count = 0;

        for entry in entries {
            if count >= config.max_per_company {
                break;
            }

            let link = entry.link.clone().unwrap_or_default();
            if !seen_links.insert(link.clone()) {
                continue;
            }

            articles.push(build_article(config, &company, count, link, entry, now));
            count += 1;
        }

        if count == 0 {
            warn!("No articles found for {}", company.name);
        } else {
            info!("  → {} articles found for {}", count, company.name);
        }
    }

    // Stable sort keeps feed order among equal timestamps.
    articles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    articles
}

fn build_article(
    config: &NewsConfig,
    company: &Company,
    index: usize,
    link: String,
    entry: FeedEntry,
    now: DateTime<Utc>,
) -> NewsArticle {
    let raw_title = entry.title.unwrap_or_else(|| UNTITLED.to_string());
    let (title, source) = split_source(&raw_title);
    let summary = entry.summary.unwrap_or_default();

    let (published, timestamp) = match entry.published {
        Some(dt) => (dt.format(PUBLISHED_FORMAT).to_string(), dt.timestamp()),
        None => (String::new(), now.timestamp()),
    };

    let category = categorize(title, &summary);

    NewsArticle {
        id: format!("{}_{}_{}", company.name, index, timestamp),
        company: company.name.clone(),
        company_color: company.color().to_string(),
        title: title.trim().to_string(),
        summary: truncate(&summary, config.summary_limit),
        link,
        published,
        timestamp,
        source: source.to_string(),
        category: category.to_string(),
    }
}

/// Search feeds append the publisher as ` - Source`; peel it off the title.
fn split_source(title: &str) -> (&str, &str) {
    match title.rsplit_once(" - ") {
        Some((headline, source)) => (headline, source),
        None => (title, ""),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
