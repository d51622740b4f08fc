// src/models/page.rs

//! Fetched pages and crawl reporting types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity of a crawl worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedPage {
    /// URL taken from the frontier
    pub url: String,

    /// URL after redirects; links are resolved against it
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    #[serde(skip)]
    pub body: String,

    /// Time until response headers arrived
    pub elapsed: Duration,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

/// What one worker did over its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub worker: WorkerId,
    pub pages_crawled: usize,
    pub frontier_left: usize,
    pub hosts_contacted: usize,
}

/// Statistics of a finished crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub unique_urls_seen: usize,
    pub hosts_owned: usize,
    pub workers: Vec<WorkerReport>,
}

impl CrawlSummary {
    pub fn pages_crawled(&self) -> usize {
        self.workers.iter().map(|w| w.pages_crawled).sum()
    }

    pub fn frontier_left(&self) -> usize {
        self.workers.iter().map(|w| w.frontier_left).sum()
    }

    pub fn hosts_contacted(&self) -> usize {
        self.workers.iter().map(|w| w.hosts_contacted).sum()
    }
}
