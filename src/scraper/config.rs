use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the product scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Category page to scrape
    pub url: String,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Viewport width in pixels (default: 1920)
    pub window_width: u32,

    /// Viewport height in pixels (default: 1080)
    pub window_height: u32,

    /// User agent string presented to the site
    pub user_agent: String,

    /// Additional Chrome arguments
    pub chrome_args: Vec<String>,

    /// CSS selector for one listing card (default: "li.product-item")
    pub listing_selector: String,

    /// CSS selector for the title inside a card (default: "h3.product-title")
    pub title_selector: String,

    /// CSS selector for price amounts inside a card (default: "span.amount")
    pub price_selector: String,

    /// Filename of the image the site shows while a real one loads
    pub placeholder_image: String,

    /// Seconds to wait for the first listing to appear (default: 30)
    pub initial_wait_secs: u64,

    /// Pause after the first listing appears in milliseconds (default: 3000)
    pub post_load_pause_ms: u64,

    /// Pixels per step of the coarse scroll sweep (default: 300)
    pub scroll_increment: u64,

    /// Pause after each sweep step in milliseconds (default: 500)
    pub scroll_pause_ms: u64,

    /// Upper bound on sweep steps, for pages that keep growing (default: 500)
    pub max_scroll_steps: usize,

    /// Pause after centring a listing in milliseconds (default: 800)
    pub focus_pause_ms: u64,

    /// Pause after hovering a listing in milliseconds (default: 300)
    pub hover_pause_ms: u64,

    /// Pause after the forced trigger pass in milliseconds (default: 5000)
    pub trigger_pause_ms: u64,

    /// Pause after returning to the top in milliseconds (default: 1000)
    pub top_pause_ms: u64,

    /// Pause after jumping to the bottom in milliseconds (default: 3000)
    pub bottom_pause_ms: u64,

    /// Seconds to wait for placeholder images to clear (default: 10)
    pub settle_timeout_secs: u64,

    /// Poll interval while waiting for placeholders in milliseconds (default: 250)
    pub settle_poll_ms: u64,

    /// The page counts as settled once fewer placeholders remain (default: 5)
    pub placeholder_threshold: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: "https://www.croma.com/televisions-accessories/c/997".to_string(),
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
                .to_string(),
            chrome_args: Vec::new(),
            listing_selector: "li.product-item".to_string(),
            title_selector: "h3.product-title".to_string(),
            price_selector: "span.amount".to_string(),
            placeholder_image: "lazyLoading.gif".to_string(),
            initial_wait_secs: 30,
            post_load_pause_ms: 3000,
            scroll_increment: 300,
            scroll_pause_ms: 500,
            max_scroll_steps: 500,
            focus_pause_ms: 800,
            hover_pause_ms: 300,
            trigger_pause_ms: 5000,
            top_pause_ms: 1000,
            bottom_pause_ms: 3000,
            settle_timeout_secs: 10,
            settle_poll_ms: 250,
            placeholder_threshold: 5,
        }
    }
}

impl ScraperConfig {
    /// Get the initial listing wait as a Duration
    pub fn initial_wait(&self) -> Duration {
        Duration::from_secs(self.initial_wait_secs)
    }

    pub fn post_load_pause(&self) -> Duration {
        Duration::from_millis(self.post_load_pause_ms)
    }

    /// Get the final placeholder wait as a Duration
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    /// Create a config with every pause zeroed, for driving a page that
    /// needs no settling time (local fixtures, tests)
    pub fn instant() -> Self {
        Self {
            post_load_pause_ms: 0,
            scroll_pause_ms: 0,
            focus_pause_ms: 0,
            hover_pause_ms: 0,
            trigger_pause_ms: 0,
            top_pause_ms: 0,
            bottom_pause_ms: 0,
            settle_timeout_secs: 1,
            settle_poll_ms: 1,
            ..Default::default()
        }
    }
}
