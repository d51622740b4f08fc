//! Pipeline entry points for crawler operations.
//!
//! - `start_crawl` / `run_crawler`: Run a multi-worker crawl from seed URLs
//! - `run_validate`: Check a configuration file

pub mod crawl;
pub mod validate;

pub use crawl::{CrawlHandle, run_crawler, start_crawl};
pub use validate::run_validate;
