use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::PageFragments;
use crate::scraper::extractor::parse_selector;

const HEAD_SELECTOR: &str = "head";
const HEADER_SELECTOR: &str = "header#header";

/// Pulls the `<head>` and the site header out of a page snapshot.
pub struct FragmentExtractor {
    head: Selector,
    header: Selector,
}

impl FragmentExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            head: parse_selector(HEAD_SELECTOR)?,
            header: parse_selector(HEADER_SELECTOR)?,
        })
    }

    /// Outer HTML of each anchor, or `None` when the page lacks it.
    ///
    /// HTML parsing always synthesizes a `<head>`, so one with no children
    /// is treated as missing.
    pub fn extract_fragments(&self, html: &str) -> PageFragments {
        let document = Html::parse_document(html);

        let head = document
            .select(&self.head)
            .next()
            .filter(|el| el.has_children())
            .map(|el| el.html());
        let header = document.select(&self.header).next().map(|el| el.html());

        if head.is_none() {
            warn!("Page has no <head> content");
        }
        if header.is_none() {
            warn!("Page has no {} element", HEADER_SELECTOR);
        }
        info!(
            "Extracted page fragments (head: {}, header: {})",
            head.is_some(),
            header.is_some()
        );

        PageFragments { head, header }
    }
}
