// src/models/config.rs

//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CrawlUrl;

/// Upper bound on priority buckets; bucket weights are powers of two.
pub const MAX_FRONT_QUEUES: usize = 32;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and fetching behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Frontier sizing and politeness settings
    #[serde(default)]
    pub frontier: FrontierConfig,

    /// Workers, quota, and seeds
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.request_timeout_ms == 0 {
            return Err(AppError::validation(
                "crawler.request_timeout_ms must be > 0",
            ));
        }
        if !(self.crawler.backoff_factor.is_finite() && self.crawler.backoff_factor >= 1.0) {
            return Err(AppError::validation("crawler.backoff_factor must be >= 1"));
        }
        if self.frontier.front_queues == 0 || self.frontier.front_queues > MAX_FRONT_QUEUES {
            return Err(AppError::validation(format!(
                "frontier.front_queues must be between 1 and {MAX_FRONT_QUEUES}"
            )));
        }
        if !(self.frontier.politeness_factor.is_finite() && self.frontier.politeness_factor >= 0.0)
        {
            return Err(AppError::validation(
                "frontier.politeness_factor must be a non-negative number",
            ));
        }
        if self.crawl.workers == 0 {
            return Err(AppError::validation("crawl.workers must be > 0"));
        }
        if self.crawl.max_pages < self.crawl.workers {
            return Err(AppError::validation(format!(
                "crawl.max_pages ({}) is below crawl.workers ({}); every worker would get a quota of 0",
                self.crawl.max_pages, self.crawl.workers
            )));
        }
        if self.crawl.seeds.len() != self.crawl.workers {
            return Err(AppError::validation(format!(
                "crawl.seeds has {} entries but crawl.workers is {}; each worker needs one seed",
                self.crawl.seeds.len(),
                self.crawl.workers
            )));
        }

        let mut unique = HashSet::new();
        for seed in &self.crawl.seeds {
            CrawlUrl::parse(seed)?;
            if !unique.insert(seed.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate seed {seed}: it would leave a worker with an empty frontier"
                )));
            }
        }

        if PrioritizerKind::parse(&self.crawl.prioritizer).is_none() {
            return Err(AppError::validation(format!(
                "unknown crawl.prioritizer '{}'",
                self.crawl.prioritizer
            )));
        }
        Ok(())
    }
}

/// HTTP client and fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests and robots.txt matching
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Timeout of the first attempt in milliseconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_ms: u64,

    /// Retries after a timed-out attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Timeout multiplier applied on every retry
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: f64,

    /// Check robots.txt before every fetch
    #[serde(default = "defaults::respect_robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            request_timeout_ms: defaults::request_timeout(),
            max_retries: defaults::max_retries(),
            backoff_factor: defaults::backoff_factor(),
            respect_robots: defaults::respect_robots(),
        }
    }
}

/// Frontier sizing and politeness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierConfig {
    /// Number of priority buckets
    #[serde(default = "defaults::front_queues")]
    pub front_queues: usize,

    /// Host slots per worker; 0 means three per worker
    #[serde(default)]
    pub back_queues: usize,

    /// Multiplier applied to a host's last fetch time between contacts
    #[serde(default = "defaults::politeness_factor")]
    pub politeness_factor: f64,
}

impl FrontierConfig {
    /// Host slots per frontier for a crawl with `workers` workers.
    pub fn effective_back_queues(&self, workers: usize) -> usize {
        if self.back_queues > 0 {
            self.back_queues
        } else {
            (workers * 3).max(1)
        }
    }
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            front_queues: defaults::front_queues(),
            back_queues: 0,
            politeness_factor: defaults::politeness_factor(),
        }
    }
}

/// Worker, quota, and seed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Number of concurrent workers
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Total pages to fetch, split evenly across workers
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// One entry URL per worker
    #[serde(default = "defaults::seeds")]
    pub seeds: Vec<String>,

    /// Scoring strategy for discovered URLs
    #[serde(default = "defaults::prioritizer")]
    pub prioritizer: String,

    /// Seconds between progress reports; 0 disables them
    #[serde(default = "defaults::stats_interval")]
    pub stats_interval_secs: u64,

    /// Wait before re-polling an empty frontier
    #[serde(default = "defaults::idle_poll")]
    pub idle_poll_ms: u64,

    /// Consecutive empty polls before a worker gives up
    #[serde(default = "defaults::max_idle_polls")]
    pub max_idle_polls: u32,
}

impl CrawlConfig {
    /// Page quota of a single worker.
    pub fn pages_per_worker(&self) -> usize {
        self.max_pages / self.workers.max(1)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            max_pages: defaults::max_pages(),
            seeds: defaults::seeds(),
            prioritizer: defaults::prioritizer(),
            stats_interval_secs: defaults::stats_interval(),
            idle_poll_ms: defaults::idle_poll(),
            max_idle_polls: defaults::max_idle_polls(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Built-in URL scoring strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrioritizerKind {
    /// Uniformly random score
    Random,
    /// Shallow paths score higher
    Depth,
}

impl PrioritizerKind {
    /// Parse a configuration name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "random" => Some(Self::Random),
            "depth" => Some(Self::Depth),
            _ => None,
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "polite-crawler/0.1 (+https://example.invalid/bot)".into()
    }
    pub fn request_timeout() -> u64 {
        1000
    }
    pub fn max_retries() -> u32 {
        4
    }
    pub fn backoff_factor() -> f64 {
        3.0
    }
    pub fn respect_robots() -> bool {
        true
    }

    // Frontier defaults
    pub fn front_queues() -> usize {
        5
    }
    pub fn politeness_factor() -> f64 {
        10.0
    }

    // Crawl defaults
    pub fn workers() -> usize {
        1
    }
    pub fn max_pages() -> usize {
        100
    }
    pub fn seeds() -> Vec<String> {
        vec!["https://en.wikipedia.org/wiki/Main_Page".into()]
    }
    pub fn prioritizer() -> String {
        "random".into()
    }
    pub fn stats_interval() -> u64 {
        30
    }
    pub fn idle_poll() -> u64 {
        500
    }
    pub fn max_idle_polls() -> u32 {
        10
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_seed_worker_mismatch() {
        let mut config = Config::default();
        config.crawl.workers = 2;
        assert!(config.validate().is_err());

        config.crawl.seeds.push("https://it.wikipedia.org/wiki/Pagina_principale".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_seeds() {
        let mut config = Config::default();
        config.crawl.workers = 2;
        config.crawl.seeds = vec!["https://a.com/".into(), "https://a.com/".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_quota_smaller_than_worker_count() {
        let mut config = Config::default();
        config.crawl.workers = 2;
        config.crawl.seeds = vec!["https://a.com/".into(), "https://b.com/".into()];
        config.crawl.max_pages = 1;
        assert!(config.validate().is_err());

        config.crawl.max_pages = 0;
        assert!(config.validate().is_err());

        config.crawl.max_pages = 2;
        assert!(config.validate().is_ok());
        assert_eq!(config.crawl.pages_per_worker(), 1);
    }

    #[test]
    fn validate_rejects_bad_front_queues() {
        let mut config = Config::default();
        config.frontier.front_queues = 0;
        assert!(config.validate().is_err());
        config.frontier.front_queues = MAX_FRONT_QUEUES + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_prioritizer() {
        let mut config = Config::default();
        config.crawl.prioritizer = "pagerank".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_back_queues_defaults_to_three_per_worker() {
        let frontier = FrontierConfig::default();
        assert_eq!(frontier.effective_back_queues(2), 6);

        let explicit = FrontierConfig {
            back_queues: 4,
            ..FrontierConfig::default()
        };
        assert_eq!(explicit.effective_back_queues(2), 4);
    }

    #[test]
    fn load_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[frontier]
front_queues = 3

[crawl]
workers = 2
seeds = ["https://a.com/", "https://b.com/"]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.frontier.front_queues, 3);
        assert_eq!(config.frontier.politeness_factor, 10.0);
        assert_eq!(config.crawl.workers, 2);
        assert_eq!(config.crawl.pages_per_worker(), 50);
        assert_eq!(config.crawler.max_retries, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.crawl.workers, 1);
    }
}
