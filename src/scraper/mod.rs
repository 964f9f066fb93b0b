//! Headless-browser product scraping.
//!
//! # Architecture
//!
//! ```text
//! Renderer → RenderedPage → LazyLoadDefeater → HTML snapshot → release
//!                                                   ↓
//!                           ListingExtractor + FragmentExtractor → Store
//! ```
//!
//! Everything that touches the browser goes through [`PageDriver`], so the
//! settle and orchestration logic can be driven by in-process fakes. The
//! extractors work on the HTML snapshot alone.
//!
//! # Usage
//!
//! ```rust,ignore
//! use estuary::scraper::{ChromeRenderer, ScrapeOrchestrator, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let orchestrator = ScrapeOrchestrator::new(ChromeRenderer::new(config.clone()), &config)?;
//!
//! let outcome = orchestrator.run(&config.url).await;
//! println!("{} listings", outcome.listings.len());
//! ```

mod chrome;
mod config;
mod defeater;
pub mod driver;
mod extractor;
mod fragments;
mod orchestrator;

pub use chrome::{ChromeRenderer, ChromeSession};
pub use config::ScraperConfig;
pub use defeater::{LazyLoadDefeater, RenderState, SettleReport, SettleStep, StepOutcome, StepStatus};
pub use driver::PageDriver;
pub use extractor::{
    first_usable_source, is_usable_source, AttributeSource, ListingExtractor,
    FALLBACK_IMAGE_SELECTORS, IMAGE_ATTRIBUTES,
};
pub use fragments::FragmentExtractor;
pub use orchestrator::{PersistSummary, ScrapeOrchestrator, ScrapeOutcome, Stage, StageReport};

use crate::app::Result;
use async_trait::async_trait;

/// A page that is loaded and holds a browser process.
#[async_trait]
pub trait RenderedPage: PageDriver {
    /// Shut the browser down and reap its process. Safe to call twice.
    async fn release(&mut self);
}

/// Produces rendered pages.
#[async_trait]
pub trait Renderer: Send + Sync {
    type Page: RenderedPage;

    /// Launch a browser, navigate to `url` and wait for the first listing.
    ///
    /// On error no browser process is left running.
    async fn render(&self, url: &str) -> Result<Self::Page>;
}
