pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;
pub use parallel::{ParallelFetcher, DEFAULT_WORKERS};

#[async_trait]
pub trait Fetcher {
    /// Fetch the raw body of `url`, failing on non-success status codes.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
