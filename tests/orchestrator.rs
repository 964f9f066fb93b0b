//! Drives a full scrape through the public traits with an in-process page
//! that answers the same scripts a browser would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use estuary::app::{EstuaryError, Result};
use estuary::scraper::driver::scripts;
use estuary::scraper::{
    PageDriver, RenderedPage, Renderer, ScrapeOrchestrator, ScraperConfig, SettleStep, Stage,
    StepStatus,
};
use estuary::store::{get_json, KvStore, Lookup, SqliteStore, PAGE_FRAGMENTS_KEY, PRODUCTS_KEY};

const PAGE: &str = r#"<html><head><title>TVs</title></head><body>
<header id="header">Croma</header>
<ul>
  <li class="product-item"><h3 class="product-title">A</h3><span class="amount">₹1</span><span class="amount">₹2</span><img data-src="https://cdn/a.png"></li>
  <li class="product-item"><h3 class="product-title">B</h3><span class="amount">₹3</span></li>
  <li class="product-item"><h3 class="product-title">C</h3><img src="https://cdn/c.png"></li>
</ul></body></html>"#;

#[derive(Default)]
struct Browser {
    alive: AtomicUsize,
    scripts: Mutex<Vec<String>>,
}

struct ScriptedPage {
    browser: Arc<Browser>,
    listings: usize,
    released: bool,
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn execute_script(&self, script: &str) -> Result<Value> {
        self.browser.scripts.lock().unwrap().push(script.to_string());
        let config = ScraperConfig::default();

        let value = if script == scripts::SCROLL_HEIGHT {
            json!(700)
        } else if script == scripts::count(&config.listing_selector) {
            json!(self.listings)
        } else if script == scripts::count(&scripts::placeholder_selector(&config.placeholder_image)) {
            json!(0)
        } else if script.contains("scrollIntoView({behavior: 'smooth'") {
            json!(true)
        } else if script.contains("dispatchEvent") {
            json!(2)
        } else {
            json!(true)
        };
        Ok(value)
    }

    async fn current_html(&self) -> Result<String> {
        Ok(PAGE.to_string())
    }

    async fn hover(&self, _selector: &str, _index: usize) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl RenderedPage for ScriptedPage {
    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.browser.alive.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

struct ScriptedRenderer {
    browser: Arc<Browser>,
    time_out: bool,
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    type Page = ScriptedPage;

    async fn render(&self, _url: &str) -> Result<ScriptedPage> {
        self.browser.alive.fetch_add(1, Ordering::SeqCst);
        if self.time_out {
            self.browser.alive.fetch_sub(1, Ordering::SeqCst);
            return Err(EstuaryError::RenderTimeout(Duration::from_secs(30)));
        }
        Ok(ScriptedPage {
            browser: self.browser.clone(),
            listings: 3,
            released: false,
        })
    }
}

fn orchestrator(time_out: bool) -> (ScrapeOrchestrator<ScriptedRenderer>, Arc<Browser>) {
    let browser = Arc::new(Browser::default());
    let renderer = ScriptedRenderer {
        browser: browser.clone(),
        time_out,
    };
    let orchestrator = ScrapeOrchestrator::new(renderer, &ScraperConfig::instant()).unwrap();
    (orchestrator, browser)
}

#[tokio::test]
async fn full_run_settles_extracts_and_releases() {
    let (orchestrator, browser) = orchestrator(false);

    let outcome = orchestrator.run("https://shop.test/tvs").await;

    assert_eq!(browser.alive.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.listings.len(), 3);
    assert_eq!(outcome.listings[0].image_url, "https://cdn/a.png");
    assert_eq!(outcome.listings[1].price, "");
    assert_eq!(outcome.listings[2].sale_price, "N/A");
    assert!(!outcome.fragments.is_empty());

    let settle = outcome.settle.as_ref().unwrap();
    assert!(settle.is_clean(), "{:?}", settle.steps);
    assert_eq!(settle.status_of(SettleStep::FinalSettle), Some(&StepStatus::Completed));
    assert_eq!(settle.state.total_height, 700);

    // Sweep steps 0, 300, 600, then one centre per listing.
    let scripts = browser.scripts.lock().unwrap();
    assert!(scripts.contains(&scripts::scroll_to(600)));
    assert!(!scripts.contains(&scripts::scroll_to(900)));
    for index in 0..3 {
        assert!(scripts.contains(&scripts::center("li.product-item", index)));
    }
    assert!(scripts.contains(&scripts::force_lazy_images("lazyLoading.gif")));
}

#[tokio::test]
async fn render_timeout_is_contained() {
    let (orchestrator, browser) = orchestrator(true);

    let outcome = orchestrator.run("https://shop.test/tvs").await;

    assert_eq!(browser.alive.load(Ordering::SeqCst), 0);
    let (listings, fragments) = outcome.clone().into_parts();
    assert!(listings.is_empty());
    assert!(fragments.head.is_none());
    assert!(fragments.header.is_none());
    assert!(matches!(outcome.status_of(Stage::Render), Some(StepStatus::Failed(_))));
}

#[tokio::test]
async fn persisted_results_round_trip_through_store() {
    let (orchestrator, _) = orchestrator(false);
    let store = SqliteStore::in_memory().unwrap();

    let outcome = orchestrator.run("https://shop.test/tvs").await;
    let summary = tokio_test::assert_ok!(outcome.persist(&store));
    assert_eq!(summary.listings_stored, 3);

    let products: Lookup<Vec<estuary::domain::ListingRecord>> = get_json(&store, PRODUCTS_KEY).unwrap();
    assert_eq!(products.found().unwrap(), outcome.listings);

    let fragments: Lookup<estuary::domain::PageFragments> =
        get_json(&store, PAGE_FRAGMENTS_KEY).unwrap();
    assert_eq!(fragments.found().unwrap(), outcome.fragments);
}

#[tokio::test]
async fn timed_out_run_leaves_store_untouched() {
    let (orchestrator, _) = orchestrator(true);
    let store = SqliteStore::in_memory().unwrap();

    let outcome = orchestrator.run("https://shop.test/tvs").await;
    tokio_test::assert_ok!(outcome.persist(&store));

    assert_eq!(store.get(PRODUCTS_KEY).unwrap(), None);
    assert_eq!(store.get(PAGE_FRAGMENTS_KEY).unwrap(), None);
}
