// src/models/mod.rs

//! Domain models for the crawler.
//!
//! Plain data shared by the frontier, the coordination services, and the
//! crawl pipeline.

mod config;
mod crawl_url;
mod fetch_times;
mod page;

// Re-export all public types
pub use config::{
    Config, CrawlConfig, CrawlerConfig, FrontierConfig, LoggingConfig, MAX_FRONT_QUEUES,
    PrioritizerKind,
};
pub use crawl_url::CrawlUrl;
pub use fetch_times::FetchTimes;
pub use page::{CrawlSummary, FetchedPage, WorkerId, WorkerReport};
