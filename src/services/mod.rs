//! Service layer for the crawler.
//!
//! This module contains coordination and the pluggable collaborators:
//! - Crawl-wide dedup and host ownership (`GlobalRegistry`)
//! - Per-worker shared frontier state (`Lane`)
//! - The worker run loop (`Worker`)
//! - Fetching, robots.txt, link extraction, and scoring traits

pub mod extractor;
pub mod fetcher;
pub mod lane;
pub mod prioritizer;
pub mod registry;
pub mod robots;
pub mod worker;

pub use extractor::{HtmlLinkExtractor, LinkExtractor};
pub use fetcher::{Fetcher, HttpFetcher};
pub use lane::{Lane, LaneState};
pub use prioritizer::{DepthPrioritizer, Prioritizer, RandomPrioritizer};
pub use registry::{DispatchOutcome, GlobalRegistry, PageSink, ScoredUrl};
pub use robots::{AllowAll, RobotsChecker, RobotsRules, RobotsTxtChecker, RobotsVerdict};
pub use worker::{Collaborators, Worker, WorkerSettings};
