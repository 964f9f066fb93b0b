use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::app::{EstuaryError, Result};
use crate::fetcher::Fetcher;

pub const DEFAULT_WORKERS: usize = 4;

/// Fetches many URLs with bounded concurrency.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Fetch every URL; results come back in input order.
    pub async fn fetch_all(&self, urls: Vec<String>) -> Vec<(String, Result<Vec<u8>>)> {
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => fetcher.fetch(&url).await,
                    Err(e) => Err(EstuaryError::Other(format!("Semaphore error: {}", e))),
                };
                (url, result)
            });

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}
