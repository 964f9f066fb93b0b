use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::scraper::{PageDriver, ScraperConfig};

/// Scroll position and load progress observed while settling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    pub scroll_offset: u64,
    /// Largest document height measured so far.
    pub total_height: u64,
    /// Images still showing the placeholder at the last check, if one ran.
    pub pending_placeholders: Option<usize>,
}

/// The ordered passes of [`LazyLoadDefeater::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStep {
    ScrollSweep,
    ListingFocus,
    ForcedTrigger,
    FinalSettle,
}

impl fmt::Display for SettleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettleStep::ScrollSweep => "scroll sweep",
            SettleStep::ListingFocus => "listing focus",
            SettleStep::ForcedTrigger => "forced trigger",
            SettleStep::FinalSettle => "final settle",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    /// Ran to the end but could not do everything it set out to.
    Degraded(String),
    /// Aborted by an error; later steps still run.
    Failed(String),
}

impl StepStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepStatus::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: SettleStep,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleReport {
    pub steps: Vec<StepOutcome>,
    pub state: RenderState,
}

impl SettleReport {
    /// True when every step completed without degradation.
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_completed())
    }

    pub fn status_of(&self, step: SettleStep) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.status)
    }
}

/// Drives a lazily-loading page until its listings and images have
/// materialized, or until every bounded wait has run out.
///
/// No pass is fatal. A pass that errors is recorded as
/// [`StepStatus::Failed`] and the next pass runs anyway.
pub struct LazyLoadDefeater {
    listing_selector: String,
    placeholder: String,
    scroll_increment: u64,
    max_scroll_steps: usize,
    scroll_pause: Duration,
    focus_pause: Duration,
    hover_pause: Duration,
    trigger_pause: Duration,
    top_pause: Duration,
    bottom_pause: Duration,
    settle_timeout: Duration,
    settle_poll: Duration,
    placeholder_threshold: usize,
}

impl LazyLoadDefeater {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            listing_selector: config.listing_selector.clone(),
            placeholder: config.placeholder_image.clone(),
            scroll_increment: config.scroll_increment.max(1),
            max_scroll_steps: config.max_scroll_steps,
            scroll_pause: Duration::from_millis(config.scroll_pause_ms),
            focus_pause: Duration::from_millis(config.focus_pause_ms),
            hover_pause: Duration::from_millis(config.hover_pause_ms),
            trigger_pause: Duration::from_millis(config.trigger_pause_ms),
            top_pause: Duration::from_millis(config.top_pause_ms),
            bottom_pause: Duration::from_millis(config.bottom_pause_ms),
            settle_timeout: config.settle_timeout(),
            settle_poll: Duration::from_millis(config.settle_poll_ms.max(1)),
            placeholder_threshold: config.placeholder_threshold,
        }
    }

    /// Run all four passes in order against `page`.
    pub async fn settle<D: PageDriver + ?Sized>(&self, page: &D) -> SettleReport {
        let mut state = RenderState::default();
        let mut steps = Vec::with_capacity(4);

        info!("Scrolling to trigger lazy loading...");
        let result = self.scroll_sweep(page, &mut state).await;
        steps.push(record(SettleStep::ScrollSweep, result));

        info!("Scrolling through individual products...");
        let result = self.focus_listings(page).await;
        steps.push(record(SettleStep::ListingFocus, result));

        info!("Forcing image loading with JavaScript...");
        let result = self.force_trigger(page).await;
        steps.push(record(SettleStep::ForcedTrigger, result));

        info!("Final scroll to load remaining images...");
        let result = self.final_settle(page, &mut state).await;
        steps.push(record(SettleStep::FinalSettle, result));

        SettleReport { steps, state }
    }

    /// Step down the page in fixed increments starting at the top. The
    /// height is re-measured after every step, so content appended
    /// mid-sweep extends the sweep.
    async fn scroll_sweep<D: PageDriver + ?Sized>(
        &self,
        page: &D,
        state: &mut RenderState,
    ) -> Result<StepStatus> {
        state.total_height = page.scroll_height().await?;
        let mut taken = 0;

        while state.scroll_offset < state.total_height {
            if taken >= self.max_scroll_steps {
                return Ok(StepStatus::Degraded(format!(
                    "stopped after {} steps at {}/{}",
                    taken, state.scroll_offset, state.total_height
                )));
            }

            page.scroll_to(state.scroll_offset).await?;
            tokio::time::sleep(self.scroll_pause).await;
            state.scroll_offset += self.scroll_increment;

            let height = page.scroll_height().await?;
            if height > state.total_height {
                debug!("Page grew from {} to {}", state.total_height, height);
                state.total_height = height;
            }
            taken += 1;
        }

        debug!("Sweep finished after {} steps at height {}", taken, state.total_height);
        Ok(StepStatus::Completed)
    }

    async fn focus_listings<D: PageDriver + ?Sized>(&self, page: &D) -> Result<StepStatus> {
        let selector = self.listing_selector.as_str();
        let total = page.count(selector).await?;
        if total == 0 {
            return Ok(StepStatus::Degraded("no listings on page".to_string()));
        }

        let mut failed = 0;
        for index in 0..total {
            let focused: Result<()> = async {
                page.center(selector, index).await?;
                tokio::time::sleep(self.focus_pause).await;
                page.hover(selector, index).await?;
                tokio::time::sleep(self.hover_pause).await;
                Ok(())
            }
            .await;

            if let Err(e) = focused {
                debug!("Could not focus listing {}: {}", index, e);
                failed += 1;
            }

            if (index + 1) % 5 == 0 {
                info!("Processed {}/{} products", index + 1, total);
            }
        }

        Ok(match failed {
            0 => StepStatus::Completed,
            n if n == total => StepStatus::Failed(format!("none of {} listings could be focused", total)),
            n => StepStatus::Degraded(format!("{} of {} listings could not be focused", n, total)),
        })
    }

    async fn force_trigger<D: PageDriver + ?Sized>(&self, page: &D) -> Result<StepStatus> {
        let touched = page.force_lazy_images(&self.placeholder).await?;
        info!("Triggered {} pending images", touched);
        tokio::time::sleep(self.trigger_pause).await;
        Ok(StepStatus::Completed)
    }

    /// Top, bottom, then wait for placeholders to drop below the threshold.
    async fn final_settle<D: PageDriver + ?Sized>(
        &self,
        page: &D,
        state: &mut RenderState,
    ) -> Result<StepStatus> {
        page.scroll_to(0).await?;
        state.scroll_offset = 0;
        tokio::time::sleep(self.top_pause).await;

        page.scroll_to_bottom().await?;
        state.scroll_offset = state.total_height;
        tokio::time::sleep(self.bottom_pause).await;

        let mut remaining = None;
        let waited = tokio::time::timeout(self.settle_timeout, async {
            loop {
                match page.placeholder_count(&self.placeholder).await {
                    Ok(n) => {
                        remaining = Some(n);
                        if n < self.placeholder_threshold {
                            return;
                        }
                    }
                    Err(e) => debug!("Placeholder count failed: {}", e),
                }
                tokio::time::sleep(self.settle_poll).await;
            }
        })
        .await;
        state.pending_placeholders = remaining;

        match waited {
            Ok(()) => {
                info!("All images appear to be loaded");
                Ok(StepStatus::Completed)
            }
            Err(_) => {
                warn!("Timeout waiting for all images to load, proceeding anyway");
                Ok(StepStatus::Degraded(match remaining {
                    Some(n) => format!("{} placeholder images after {:?}", n, self.settle_timeout),
                    None => format!("placeholder count unavailable after {:?}", self.settle_timeout),
                }))
            }
        }
    }
}

fn record(step: SettleStep, result: Result<StepStatus>) -> StepOutcome {
    let status = match result {
        Ok(StepStatus::Degraded(reason)) => {
            warn!("{} degraded: {}", step, reason);
            StepStatus::Degraded(reason)
        }
        Ok(status) => status,
        Err(e) => {
            warn!("Error during {}: {}", step, e);
            StepStatus::Failed(e.to_string())
        }
    };
    StepOutcome { step, status }
}
