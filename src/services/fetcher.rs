// src/services/fetcher.rs

//! Page fetching with timeout backoff.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, FetchedPage};
use crate::utils::http::{attempt_timeout, create_async_client};

/// Retrieves a page over the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`. Anything but a `200 OK` is an error.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// reqwest-backed fetcher.
///
/// A timed-out attempt is retried with its timeout multiplied by
/// `backoff_factor`, at most `max_retries` times. Other failures are
/// returned immediately.
pub struct HttpFetcher {
    client: Client,
    config: CrawlerConfig,
}

impl HttpFetcher {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let client = create_async_client(&config)?;
        Ok(Self { client, config })
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: Client, config: CrawlerConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt = 0;
        let (response, elapsed) = loop {
            let timeout = attempt_timeout(&self.config, attempt);
            let started = Instant::now();

            match self.client.get(url).timeout(timeout).send().await {
                Ok(response) => break (response, started.elapsed()),
                Err(e) if e.is_timeout() && attempt < self.config.max_retries => {
                    log::debug!("Timeout after {:?} fetching {}; retrying", timeout, url);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::crawl(url, format!("unexpected status {status}")));
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            body,
            elapsed,
            fetched_at: Utc::now(),
        })
    }
}
