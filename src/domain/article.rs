use serde::{Deserialize, Serialize};

/// A categorised news article collected for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub company: String,
    pub company_color: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Human readable publication time, e.g. `Jan 01, 2024 09:30 AM`.
    pub published: String,
    /// Unix seconds; the sort key for the aggregated list.
    pub timestamp: i64,
    pub source: String,
    pub category: String,
}

impl NewsArticle {
    /// Case-insensitive match against title or summary.
    ///
    /// `needle` must already be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.summary.to_lowercase().contains(needle)
    }
}
