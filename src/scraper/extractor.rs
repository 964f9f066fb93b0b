use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::app::{EstuaryError, Result};
use crate::domain::{ListingRecord, NOT_AVAILABLE, NO_IMAGE_URL};
use crate::scraper::ScraperConfig;

/// Source-bearing image attributes, highest priority first.
pub const IMAGE_ATTRIBUTES: [&str; 5] = ["src", "data-src", "data-lazy-src", "data-original", "data-srcset"];

/// Second-tier image selectors tried when no `<img>` in the card resolves.
pub const FALLBACK_IMAGE_SELECTORS: [&str; 6] = [
    "img.product-img",
    ".product-image img",
    "figure img",
    "a img",
    ".product-img-wrapper img",
    ".image-container img",
];

/// Anything that can answer attribute lookups by name.
pub trait AttributeSource {
    fn get_attribute(&self, name: &str) -> Option<&str>;
}

impl AttributeSource for ElementRef<'_> {
    fn get_attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }
}

/// Whether `value` can be used as an image URL: non-empty, not the
/// placeholder, and absolute or protocol-relative.
pub fn is_usable_source(value: &str, placeholder: &str) -> bool {
    !value.is_empty()
        && !value.ends_with(placeholder)
        && (value.starts_with("http") || value.starts_with("//"))
}

/// First usable value across [`IMAGE_ATTRIBUTES`], in priority order.
pub fn first_usable_source<'a, E: AttributeSource + ?Sized>(
    element: &'a E,
    placeholder: &str,
) -> Option<&'a str> {
    IMAGE_ATTRIBUTES
        .iter()
        .filter_map(|attr| element.get_attribute(attr))
        .find(|value| is_usable_source(value, placeholder))
}

/// Parses settled category-page HTML into listing records.
///
/// Extraction is a pure function of the HTML; it never touches the browser.
pub struct ListingExtractor {
    listing: Selector,
    title: Selector,
    price: Selector,
    image: Selector,
    fallbacks: Vec<Selector>,
    placeholder: String,
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| EstuaryError::Config(format!("Invalid selector '{}': {}", selector, e)))
}

impl ListingExtractor {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            listing: parse_selector(&config.listing_selector)?,
            title: parse_selector(&config.title_selector)?,
            price: parse_selector(&config.price_selector)?,
            image: parse_selector("img")?,
            fallbacks: FALLBACK_IMAGE_SELECTORS
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_>>()?,
            placeholder: config.placeholder_image.clone(),
        })
    }

    /// Records for every listing element, in document order.
    pub fn extract(&self, html: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&self.listing).collect();

        if items.is_empty() {
            warn!("No product items found.");
            return Vec::new();
        }
        info!("Found {} product items for scraping.", items.len());

        let mut records = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let record = self.extract_one(item);
            if !record.has_image() {
                warn!("No valid image found for product {}: {}", i + 1, record.title);
            }
            records.push(record);

            if (i + 1) % 5 == 0 {
                info!("Scraped {}/{} products", i + 1, items.len());
            }
        }

        let with_images = records.iter().filter(|r| r.has_image()).count();
        info!(
            "Scraping completed: {} products, {} with valid images",
            records.len(),
            with_images
        );

        records
    }

    fn extract_one(&self, item: &ElementRef<'_>) -> ListingRecord {
        let title = item
            .select(&self.title)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let prices: Vec<String> = item.select(&self.price).map(|el| text_of(&el)).collect();
        let (sale_price, price) = match prices.as_slice() {
            [] => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
            [only] => (only.clone(), String::new()),
            [first, second, ..] => (first.clone(), second.clone()),
        };

        let image_url = self
            .resolve_image(item)
            .filter(|url| !url.ends_with(self.placeholder.as_str()))
            .unwrap_or_else(|| NO_IMAGE_URL.to_string());

        ListingRecord {
            title,
            sale_price,
            price,
            image_url,
        }
    }

    /// Two-tier lookup: every `<img>` in the card, then the fallback
    /// selectors (first match each), both against [`IMAGE_ATTRIBUTES`].
    fn resolve_image(&self, item: &ElementRef<'_>) -> Option<String> {
        let placeholder = self.placeholder.as_str();

        item.select(&self.image)
            .find_map(|img| first_usable_source(&img, placeholder).map(str::to_string))
            .or_else(|| {
                self.fallbacks.iter().find_map(|selector| {
                    item.select(selector)
                        .next()
                        .and_then(|img| first_usable_source(&img, placeholder).map(str::to_string))
                })
            })
    }
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
