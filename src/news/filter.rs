use serde::Serialize;

use crate::app::Result;
use crate::domain::NewsArticle;
use crate::store::{get_json, KvStore, Lookup, NEWS_KEY, NEWS_UPDATED_KEY};

/// Wildcard accepted for the company and category filters.
pub const ALL: &str = "All";

/// Optional narrowing applied when reading stored news.
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub company: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl NewsFilter {
    pub fn apply(&self, news: Vec<NewsArticle>) -> Vec<NewsArticle> {
        let company = active(&self.company);
        let category = active(&self.category);
        let search = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        news.into_iter()
            .filter(|n| company.is_none_or(|c| n.company == c))
            .filter(|n| category.is_none_or(|c| n.category == c))
            .filter(|n| search.as_deref().is_none_or(|s| n.mentions(s)))
            .collect()
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
}

/// Filtered view of the stored news.
#[derive(Debug, Clone, Serialize)]
pub struct NewsDigest {
    pub news: Vec<NewsArticle>,
    pub count: usize,
    pub last_updated: String,
}

/// Read stored news through `filter`.
pub fn load_digest<S: KvStore + ?Sized>(store: &S, filter: &NewsFilter) -> Result<Lookup<NewsDigest>> {
    let news: Vec<NewsArticle> = match get_json(store, NEWS_KEY)? {
        Lookup::Found(news) => news,
        Lookup::Missing => return Ok(Lookup::Missing),
    };

    let news = filter.apply(news);
    let last_updated = store
        .get(NEWS_UPDATED_KEY)?
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Lookup::Found(NewsDigest {
        count: news.len(),
        news,
        last_updated,
    }))
}
