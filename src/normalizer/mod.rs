use chrono::{DateTime, Utc};
use feed_rs::parser;
use html_escape::decode_html_entities;
use scraper::Html;

use crate::app::{EstuaryError, Result};

/// A feed entry reduced to the fields the aggregator consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Plain text; markup from the feed has been stripped.
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS/Atom/JSON feed body into entries, in feed order.
    pub fn normalize(&self, body: &[u8]) -> Result<Vec<FeedEntry>> {
        let feed = parser::parse(body).map_err(|e| EstuaryError::FeedParse(e.to_string()))?;

        let entries = feed
            .entries
            .into_iter()
            .map(|entry| FeedEntry {
                title: entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string()),
                link: entry.links.first().map(|l| l.href.clone()),
                summary: entry.summary.map(|s| strip_markup(&s.content)),
                published: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc)),
            })
            .collect();

        Ok(entries)
    }
}

/// Reduce an HTML snippet to its trimmed text content.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"Pfizer pharmaceutical drug" - Google News</title>
    <item>
      <title>Pfizer wins FDA approval for new drug - Reuters</title>
      <link>https://news.example.com/pfizer-approval</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 09:30:00 GMT</pubDate>
      <description>&lt;a href="https://news.example.com/pfizer-approval"&gt;Pfizer wins FDA approval&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;Reuters&lt;/font&gt;</description>
    </item>
    <item>
      <title>Pfizer &amp; partners expand study</title>
      <link>https://news.example.com/pfizer-study</link>
      <guid>item-2</guid>
    </item>
  </channel>
</rss>"##;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let entries = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].title.as_deref(),
            Some("Pfizer wins FDA approval for new drug - Reuters")
        );
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://news.example.com/pfizer-approval")
        );
        assert_eq!(
            entries[0].published.map(|d| d.timestamp()),
            Some(1_704_101_400)
        );
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn test_summary_markup_is_stripped() {
        let entries = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();
        let summary = entries[0].summary.as_deref().unwrap();

        assert!(!summary.contains('<'));
        assert!(summary.starts_with("Pfizer wins FDA approval"));
        assert!(summary.ends_with("Reuters"));
        assert_eq!(entries[1].summary, None);
    }

    #[test]
    fn test_title_entities_decoded() {
        let entries = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            entries[1].title.as_deref(),
            Some("Pfizer & partners expand study")
        );
    }

    #[test]
    fn test_parse_atom_uses_updated_when_unpublished() {
        let entries = Normalizer::new().normalize(ATOM_SAMPLE.as_bytes()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Atom Entry 1"));
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/atom1"));
        assert_eq!(entries[0].summary.as_deref(), Some("This is Atom entry 1"));
        assert!(entries[0].published.is_some());
    }

    #[test]
    fn test_garbage_is_feed_parse_error() {
        let result = Normalizer::new().normalize(b"definitely not a feed");
        assert!(matches!(result, Err(EstuaryError::FeedParse(_))));
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("  <b>Bold</b> text  "), "Bold text");
        assert_eq!(strip_markup("plain"), "plain");
        assert_eq!(strip_markup(""), "");
    }
}
