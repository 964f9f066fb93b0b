use async_trait::async_trait;
use serde_json::Value;

use crate::app::{EstuaryError, Result};

/// Capability to act on one rendered page.
///
/// Implementors only need script execution, an HTML snapshot and pointer
/// hover; everything else is built on [`execute_script`](Self::execute_script)
/// and can be overridden by fakes.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Evaluate `script` in the page and return its JSON result
    /// (`Null` when the script yields nothing).
    async fn execute_script(&self, script: &str) -> Result<Value>;

    /// Serialized HTML of the current DOM.
    async fn current_html(&self) -> Result<String>;

    /// Move the pointer over the `index`-th element matching `selector`.
    async fn hover(&self, selector: &str, index: usize) -> Result<()>;

    async fn scroll_height(&self) -> Result<u64> {
        let value = self.execute_script(scripts::SCROLL_HEIGHT).await?;
        as_count(&value).ok_or_else(|| {
            EstuaryError::step("scroll_height", format!("unexpected result {}", value))
        })
    }

    async fn scroll_to(&self, offset: u64) -> Result<()> {
        self.execute_script(&scripts::scroll_to(offset)).await?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute_script(scripts::SCROLL_TO_BOTTOM).await?;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let value = self.execute_script(&scripts::count(selector)).await?;
        as_count(&value)
            .map(|n| n as usize)
            .ok_or_else(|| EstuaryError::step("count", format!("unexpected result {}", value)))
    }

    /// Smoothly scroll the `index`-th match to the centre of the viewport.
    async fn center(&self, selector: &str, index: usize) -> Result<()> {
        let value = self.execute_script(&scripts::center(selector, index)).await?;
        if value == Value::Bool(true) {
            Ok(())
        } else {
            Err(EstuaryError::step(
                "center",
                format!("no element {} for {}", index, selector),
            ))
        }
    }

    /// Fire lazy-load triggers on pending images; returns how many were touched.
    async fn force_lazy_images(&self, placeholder: &str) -> Result<usize> {
        let value = self
            .execute_script(&scripts::force_lazy_images(placeholder))
            .await?;
        Ok(as_count(&value).unwrap_or(0) as usize)
    }

    /// Number of images whose live source is still the placeholder.
    async fn placeholder_count(&self, placeholder: &str) -> Result<usize> {
        self.count(&scripts::placeholder_selector(placeholder)).await
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

/// JavaScript snippets run against the page.
pub mod scripts {
    /// Hides the automation flag before any page script runs.
    pub const HIDE_WEBDRIVER: &str =
        "Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });";

    pub const SCROLL_HEIGHT: &str = "document.body.scrollHeight";

    pub const SCROLL_TO_BOTTOM: &str =
        "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

    /// Events some lazy loaders listen for instead of intersection.
    pub const TRIGGER_EVENTS: [&str; 5] =
        ["scroll", "resize", "orientationchange", "touchstart", "touchmove"];

    /// Attributes that mark an image as still waiting for its real source.
    pub const PENDING_IMAGE_SELECTOR: &str =
        "img[data-src], img[loading=\"lazy\"], img[data-lazy-src]";

    fn quote(s: &str) -> String {
        // JSON string literals are valid JavaScript string literals.
        serde_json::Value::String(s.to_string()).to_string()
    }

    pub fn scroll_to(offset: u64) -> String {
        format!("(() => {{ window.scrollTo(0, {}); return true; }})()", offset)
    }

    pub fn count(selector: &str) -> String {
        format!("document.querySelectorAll({}).length", quote(selector))
    }

    pub fn center(selector: &str, index: usize) -> String {
        format!(
            r#"(() => {{
                const el = document.querySelectorAll({})[{}];
                if (!el) return false;
                el.scrollIntoView({{behavior: 'smooth', block: 'center'}});
                return true;
            }})()"#,
            quote(selector),
            index
        )
    }

    pub fn placeholder_selector(placeholder: &str) -> String {
        format!("img[src*={}]", quote(placeholder))
    }

    pub fn force_lazy_images(placeholder: &str) -> String {
        let events = TRIGGER_EVENTS
            .iter()
            .map(|e| quote(e))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"(() => {{
                const placeholder = {placeholder};
                const events = [{events}];
                const images = document.querySelectorAll({pending});
                let touched = 0;
                images.forEach((img) => {{
                    const live = img.getAttribute('src') || '';
                    if (live.includes(placeholder)) return;
                    img.scrollIntoView({{behavior: 'auto', block: 'center'}});
                    events.forEach((type) => window.dispatchEvent(new Event(type)));
                    const deferred = img.dataset.lazySrc || img.dataset.src;
                    if (deferred) img.src = deferred;
                    touched += 1;
                }});
                return touched;
            }})()"#,
            placeholder = quote(placeholder),
            events = events,
            pending = quote(PENDING_IMAGE_SELECTOR),
        )
    }
}
