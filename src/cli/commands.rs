use serde_json::{json, Value};

use crate::app::{AppContext, Result};
use crate::cli::ShowTarget;
use crate::news::{self, load_digest, NewsFilter};
use crate::scraper::StepStatus;
use crate::store::{get_json, KvStore, Lookup, PAGE_FRAGMENTS_KEY, PRODUCTS_KEY};

const NO_PRODUCTS: &str = "No product data found. Please run the scraper first.";
const NO_FRAGMENTS: &str = "No page element data found. Please run the scraper first.";
const NO_NEWS: &str = "No news found. Run `estuary news` first.";

pub async fn scrape(ctx: &AppContext, url: Option<&str>, dry_run: bool) -> Result<()> {
    let url = url.unwrap_or(ctx.config.scraper.url.as_str());
    let orchestrator = ctx.scrape_orchestrator()?;

    println!("Scraping {}...", url);
    let outcome = orchestrator.run(url).await;

    for report in &outcome.stages {
        match &report.status {
            StepStatus::Completed => println!("  {:<9} ok", report.stage),
            StepStatus::Degraded(reason) => println!("  {:<9} degraded: {}", report.stage, reason),
            StepStatus::Failed(reason) => println!("  {:<9} failed: {}", report.stage, reason),
        }
    }

    if dry_run {
        let preview = json!({
            "products": outcome.listings,
            "page_elements": outcome.fragments,
        });
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let summary = outcome.persist(&*ctx.store)?;
    println!(
        "Stored {} products, page fragments {}",
        summary.listings_stored,
        if summary.fragments_stored { "stored" } else { "not stored" }
    );
    Ok(())
}

pub async fn update_news(ctx: &AppContext) -> Result<()> {
    let aggregator = ctx.news_aggregator();
    println!("Polling {} companies...", ctx.config.news.companies.len());

    let count = news::refresh_news(&aggregator, &*ctx.store).await?;
    if count == 0 {
        println!("No articles collected; stored news left unchanged");
    } else {
        println!("Stored {} articles", count);
    }
    Ok(())
}

/// Products exactly as stored.
pub fn products_view<S: KvStore + ?Sized>(store: &S) -> Result<Lookup<Value>> {
    get_json(store, PRODUCTS_KEY)
}

/// Stored page fragments wrapped as `{success, data}`.
pub fn fragments_view<S: KvStore + ?Sized>(store: &S) -> Result<Lookup<Value>> {
    Ok(match get_json::<_, Value>(store, PAGE_FRAGMENTS_KEY)? {
        Lookup::Found(data) => Lookup::Found(json!({ "success": true, "data": data })),
        Lookup::Missing => Lookup::Missing,
    })
}

pub fn show(ctx: &AppContext, target: ShowTarget, filter: &NewsFilter) -> Result<()> {
    let store = &*ctx.store;
    let (view, missing) = match target {
        ShowTarget::Products => (products_view(store)?, NO_PRODUCTS),
        ShowTarget::Fragments => (fragments_view(store)?, NO_FRAGMENTS),
        ShowTarget::News => {
            let digest = match load_digest(store, filter)? {
                Lookup::Found(digest) => Lookup::Found(serde_json::to_value(digest)?),
                Lookup::Missing => Lookup::Missing,
            };
            (digest, NO_NEWS)
        }
    };

    let value = match view {
        Lookup::Found(value) => value,
        Lookup::Missing => json!({ "message": missing }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn list_companies(ctx: &AppContext) {
    for company in &ctx.config.news.companies {
        println!("{:<24} {}", company.name, company.color());
    }
}

pub fn health(ctx: &AppContext) -> Result<()> {
    ctx.store.ping()?;
    let backend = format!("{:?}", ctx.config.store.backend).to_lowercase();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "status": "healthy", "store": backend }))?
    );
    Ok(())
}
