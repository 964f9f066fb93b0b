use std::fmt;

use tracing::{error, info, warn};

use crate::app::Result;
use crate::domain::{ListingRecord, PageFragments};
use crate::scraper::{
    FragmentExtractor, LazyLoadDefeater, ListingExtractor, PageDriver, RenderedPage, Renderer,
    ScraperConfig, SettleReport, StepStatus,
};
use crate::store::{put_json, KvStore, PAGE_FRAGMENTS_KEY, PRODUCTS_KEY};

/// Phases of one scrape run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    Settle,
    Snapshot,
    Release,
    Extract,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Render => "render",
            Stage::Settle => "settle",
            Stage::Snapshot => "snapshot",
            Stage::Release => "release",
            Stage::Extract => "extract",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StepStatus,
}

/// Everything a run produced, plus how each stage went.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub listings: Vec<ListingRecord>,
    pub fragments: PageFragments,
    pub settle: Option<SettleReport>,
    pub stages: Vec<StageReport>,
}

/// What [`ScrapeOutcome::persist`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub listings_stored: usize,
    pub fragments_stored: bool,
}

impl ScrapeOutcome {
    /// True when the run produced nothing worth storing.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty() && self.fragments.is_empty()
    }

    pub fn status_of(&self, stage: Stage) -> Option<&StepStatus> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| &r.status)
    }

    pub fn into_parts(self) -> (Vec<ListingRecord>, PageFragments) {
        (self.listings, self.fragments)
    }

    /// Overwrite the product and fragment keys with this run's results.
    ///
    /// Empty parts are skipped so a failed run never clobbers the last good
    /// data. Store errors are returned; `self` is left untouched.
    pub fn persist<S: KvStore + ?Sized>(&self, store: &S) -> Result<PersistSummary> {
        let mut summary = PersistSummary::default();

        if self.listings.is_empty() {
            warn!("No products scraped, nothing to store");
        } else {
            put_json(store, PRODUCTS_KEY, &self.listings)?;
            summary.listings_stored = self.listings.len();
        }

        if self.fragments.is_empty() {
            warn!("No page fragments extracted, nothing to store");
        } else {
            put_json(store, PAGE_FRAGMENTS_KEY, &self.fragments)?;
            summary.fragments_stored = true;
        }

        Ok(summary)
    }

    fn push(&mut self, stage: Stage, status: StepStatus) {
        match &status {
            StepStatus::Completed => {}
            StepStatus::Degraded(reason) => warn!("Stage {} degraded: {}", stage, reason),
            StepStatus::Failed(reason) => error!("Stage {} failed: {}", stage, reason),
        }
        self.stages.push(StageReport { stage, status });
    }
}

/// Runs render, settle, snapshot, release and extract for one URL.
///
/// Failures before the snapshot yield an empty outcome instead of an error.
/// The rendered page is released on every path once rendering succeeded.
pub struct ScrapeOrchestrator<R: Renderer> {
    renderer: R,
    defeater: LazyLoadDefeater,
    listings: ListingExtractor,
    fragments: FragmentExtractor,
}

impl<R: Renderer> ScrapeOrchestrator<R> {
    pub fn new(renderer: R, config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            renderer,
            defeater: LazyLoadDefeater::new(config),
            listings: ListingExtractor::new(config)?,
            fragments: FragmentExtractor::new()?,
        })
    }

    pub async fn run(&self, url: &str) -> ScrapeOutcome {
        let mut outcome = ScrapeOutcome::default();

        info!("Starting scrape of {}", url);
        let mut page = match self.renderer.render(url).await {
            Ok(page) => {
                outcome.push(Stage::Render, StepStatus::Completed);
                page
            }
            Err(e) => {
                outcome.push(Stage::Render, StepStatus::Failed(e.to_string()));
                return outcome;
            }
        };

        let snapshot = self.settle_and_snapshot(&page, &mut outcome).await;

        page.release().await;
        outcome.push(Stage::Release, StepStatus::Completed);

        let html = match snapshot {
            Ok(html) => {
                outcome.push(Stage::Snapshot, StepStatus::Completed);
                html
            }
            Err(e) => {
                outcome.push(Stage::Snapshot, StepStatus::Failed(e.to_string()));
                return outcome;
            }
        };

        outcome.listings = self.listings.extract(&html);
        outcome.fragments = self.fragments.extract_fragments(&html);
        let status = if outcome.listings.is_empty() {
            StepStatus::Degraded("no listings in snapshot".to_string())
        } else {
            StepStatus::Completed
        };
        outcome.push(Stage::Extract, status);

        info!(
            "Scrape finished: {} listings, fragments {}",
            outcome.listings.len(),
            if outcome.fragments.is_empty() { "missing" } else { "present" }
        );
        outcome
    }

    async fn settle_and_snapshot(
        &self,
        page: &R::Page,
        outcome: &mut ScrapeOutcome,
    ) -> Result<String> {
        let report = self.defeater.settle(page).await;
        let status = if report.is_clean() {
            StepStatus::Completed
        } else {
            let troubled: Vec<String> = report
                .steps
                .iter()
                .filter(|s| !s.status.is_completed())
                .map(|s| s.step.to_string())
                .collect();
            StepStatus::Degraded(format!("incomplete steps: {}", troubled.join(", ")))
        };
        outcome.push(Stage::Settle, status);
        outcome.settle = Some(report);

        page.current_html().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::app::EstuaryError;
    use crate::store::{get_json, Lookup, SqliteStore};

    const HTML: &str = r#"<html><head><title>TVs</title></head><body>
        <header id="header">Croma</header>
        <ul>
          <li class="product-item"><h3 class="product-title">TV A</h3><span class="amount">₹1</span><img data-src="https://cdn/a.png"></li>
          <li class="product-item"><h3 class="product-title">TV B</h3></li>
        </ul></body></html>"#;

    /// Counts live "browser processes" so tests can assert release.
    #[derive(Clone, Default)]
    struct Processes(Arc<AtomicUsize>);

    impl Processes {
        fn active(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct FakePage {
        html: Option<&'static str>,
        processes: Processes,
        released: bool,
    }

    #[async_trait]
    impl PageDriver for FakePage {
        async fn execute_script(&self, _script: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn current_html(&self) -> Result<String> {
            self.html
                .map(str::to_string)
                .ok_or_else(|| EstuaryError::Browser("target closed".into()))
        }

        async fn hover(&self, _selector: &str, _index: usize) -> Result<()> {
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64> {
            Ok(600)
        }

        async fn count(&self, _selector: &str) -> Result<usize> {
            Ok(2)
        }

        async fn center(&self, _selector: &str, _index: usize) -> Result<()> {
            Ok(())
        }

        async fn force_lazy_images(&self, _placeholder: &str) -> Result<usize> {
            Ok(0)
        }

        async fn placeholder_count(&self, _placeholder: &str) -> Result<usize> {
            Ok(0)
        }
    }

    #[async_trait]
    impl RenderedPage for FakePage {
        async fn release(&mut self) {
            if !self.released {
                self.released = true;
                self.processes.0.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    enum Behaviour {
        Render(Option<&'static str>),
        TimeOut,
    }

    struct FakeRenderer {
        behaviour: Behaviour,
        processes: Processes,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        type Page = FakePage;

        async fn render(&self, _url: &str) -> Result<FakePage> {
            // The process exists from launch; a timeout kills it before returning.
            self.processes.0.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Render(html) => Ok(FakePage {
                    html,
                    processes: self.processes.clone(),
                    released: false,
                }),
                Behaviour::TimeOut => {
                    self.processes.0.fetch_sub(1, Ordering::SeqCst);
                    Err(EstuaryError::RenderTimeout(Duration::from_secs(30)))
                }
            }
        }
    }

    fn orchestrator(behaviour: Behaviour) -> (ScrapeOrchestrator<FakeRenderer>, Processes) {
        let processes = Processes::default();
        let renderer = FakeRenderer {
            behaviour,
            processes: processes.clone(),
        };
        let orchestrator = ScrapeOrchestrator::new(renderer, &ScraperConfig::instant()).unwrap();
        (orchestrator, processes)
    }

    #[tokio::test]
    async fn test_render_timeout_yields_empty_outcome() {
        let (orchestrator, processes) = orchestrator(Behaviour::TimeOut);

        let outcome = orchestrator.run("https://shop.test/tvs").await;

        assert!(outcome.is_empty());
        assert!(outcome.settle.is_none());
        assert!(matches!(
            outcome.status_of(Stage::Render),
            Some(StepStatus::Failed(m)) if m.contains("Timed out")
        ));
        assert_eq!(processes.active(), 0);

        let (listings, fragments) = outcome.into_parts();
        assert!(listings.is_empty());
        assert_eq!(fragments, PageFragments::default());
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (orchestrator, processes) = orchestrator(Behaviour::Render(Some(HTML)));

        let outcome = orchestrator.run("https://shop.test/tvs").await;

        assert_eq!(processes.active(), 0);
        assert_eq!(outcome.listings.len(), 2);
        assert_eq!(outcome.listings[0].image_url, "https://cdn/a.png");
        assert_eq!(outcome.listings[1].sale_price, "N/A");
        assert!(outcome.fragments.head.is_some());
        assert!(outcome.fragments.header.is_some());
        assert!(outcome.settle.as_ref().unwrap().is_clean());

        let stages: Vec<Stage> = outcome.stages.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![Stage::Render, Stage::Settle, Stage::Release, Stage::Snapshot, Stage::Extract]
        );
    }

    #[tokio::test]
    async fn test_snapshot_failure_still_releases() {
        let (orchestrator, processes) = orchestrator(Behaviour::Render(None));

        let outcome = orchestrator.run("https://shop.test/tvs").await;

        assert!(outcome.is_empty());
        assert_eq!(processes.active(), 0);
        assert_eq!(outcome.status_of(Stage::Release), Some(&StepStatus::Completed));
        assert!(matches!(outcome.status_of(Stage::Snapshot), Some(StepStatus::Failed(_))));
        assert_eq!(outcome.status_of(Stage::Extract), None);
    }

    #[tokio::test]
    async fn test_persist_writes_both_keys() {
        let (orchestrator, _) = orchestrator(Behaviour::Render(Some(HTML)));
        let store = SqliteStore::in_memory().unwrap();

        let outcome = orchestrator.run("https://shop.test/tvs").await;
        let summary = outcome.persist(&store).unwrap();

        assert_eq!(summary.listings_stored, 2);
        assert!(summary.fragments_stored);
        let stored: Lookup<Vec<ListingRecord>> = get_json(&store, PRODUCTS_KEY).unwrap();
        assert_eq!(stored, Lookup::Found(outcome.listings.clone()));
    }

    #[tokio::test]
    async fn test_empty_outcome_keeps_previous_data() {
        let store = SqliteStore::in_memory().unwrap();
        store.set(PRODUCTS_KEY, "[\"previous\"]").unwrap();

        let (orchestrator, _) = orchestrator(Behaviour::TimeOut);
        let summary = orchestrator.run("https://shop.test/tvs").await.persist(&store).unwrap();

        assert_eq!(summary, PersistSummary::default());
        assert_eq!(store.get(PRODUCTS_KEY).unwrap().as_deref(), Some("[\"previous\"]"));
        assert_eq!(store.get(PAGE_FRAGMENTS_KEY).unwrap(), None);
    }

    struct DownStore;

    impl KvStore for DownStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(EstuaryError::StoreUnavailable("connection refused".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(EstuaryError::StoreUnavailable("connection refused".into()))
        }
        fn ping(&self) -> Result<()> {
            Err(EstuaryError::StoreUnavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_unavailable_surfaces_and_keeps_results() {
        let (orchestrator, _) = orchestrator(Behaviour::Render(Some(HTML)));

        let outcome = orchestrator.run("https://shop.test/tvs").await;
        let result = outcome.persist(&DownStore);

        assert!(matches!(result, Err(EstuaryError::StoreUnavailable(_))));
        assert_eq!(outcome.listings.len(), 2);
    }
}
