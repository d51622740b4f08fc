// src/services/worker.rs

//! Crawl worker run loop.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlConfig, CrawlUrl, PrioritizerKind, WorkerReport};
use crate::services::extractor::{HtmlLinkExtractor, LinkExtractor};
use crate::services::fetcher::{Fetcher, HttpFetcher};
use crate::services::lane::Lane;
use crate::services::prioritizer::{self, Prioritizer};
use crate::services::registry::{GlobalRegistry, ScoredUrl};
use crate::services::robots::{AllowAll, RobotsChecker, RobotsTxtChecker};
use crate::utils::http::create_async_client;

/// The pluggable pieces a worker drives.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub robots: Arc<dyn RobotsChecker>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub prioritizer: Arc<dyn Prioritizer>,
}

impl Collaborators {
    /// HTTP fetcher, robots.txt checker, HTML extractor, and the configured
    /// prioritizer, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.crawler)?;
        let kind = PrioritizerKind::parse(&config.crawl.prioritizer).ok_or_else(|| {
            AppError::config(format!("unknown prioritizer '{}'", config.crawl.prioritizer))
        })?;

        let robots: Arc<dyn RobotsChecker> = if config.crawler.respect_robots {
            Arc::new(RobotsTxtChecker::with_client(
                client.clone(),
                &config.crawler.user_agent,
            ))
        } else {
            Arc::new(AllowAll)
        };

        Ok(Self {
            fetcher: Arc::new(HttpFetcher::with_client(client, config.crawler.clone())),
            robots,
            extractor: Arc::new(HtmlLinkExtractor::new()?),
            prioritizer: prioritizer::from_kind(kind),
        })
    }
}

/// Per-worker limits.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub quota: usize,
    pub idle_poll: Duration,
    pub max_idle_polls: u32,
}

impl WorkerSettings {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            quota: config.pages_per_worker(),
            idle_poll: Duration::from_millis(config.idle_poll_ms),
            max_idle_polls: config.max_idle_polls,
        }
    }
}

/// One crawl worker: dequeues from its own lane, fetches, and hands
/// discovered links to the registry.
pub struct Worker {
    lane: Arc<Lane>,
    registry: Arc<GlobalRegistry>,
    collaborators: Collaborators,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        lane: Arc<Lane>,
        registry: Arc<GlobalRegistry>,
        collaborators: Collaborators,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            lane,
            registry,
            collaborators,
            settings,
        }
    }

    /// Crawl until the quota is reached or the frontier stays empty.
    pub async fn run(self) -> Result<WorkerReport> {
        let id = self.lane.id();
        let mut idle_polls = 0;
        log::info!("{} starting with a quota of {} pages", id, self.settings.quota);

        while self.lane.crawled() < self.settings.quota {
            let next = match self.lane.dequeue().await {
                Ok(next) => {
                    idle_polls = 0;
                    next
                }
                Err(e) if e.is_empty_frontier() => {
                    if idle_polls >= self.settings.max_idle_polls {
                        log::info!("{} frontier stayed empty; stopping", id);
                        break;
                    }
                    idle_polls += 1;
                    tokio::time::sleep(self.settings.idle_poll).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            tokio::time::sleep_until(tokio::time::Instant::from_std(next.not_before)).await;
            self.crawl_one(next.url).await;
        }

        let report = self.lane.report().await;
        log::info!(
            "{} finished: {} pages, {} left in frontier",
            id,
            report.pages_crawled,
            report.frontier_left
        );
        Ok(report)
    }

    async fn crawl_one(&self, url: CrawlUrl) {
        let id = self.lane.id();

        let verdict = self.collaborators.robots.check(url.as_str()).await;
        if !verdict.allowed {
            log::debug!("{} robots.txt disallows {}", id, url);
            return;
        }

        let page = match self.collaborators.fetcher.fetch(url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("{} skipping {}: {}", id, url, e);
                return;
            }
        };

        self.lane
            .record_fetch(url.host(), verdict.delay.unwrap_or(page.elapsed))
            .await;

        let links = self.collaborators.extractor.extract(&page).unwrap_or_else(|e| {
            log::warn!("{} could not extract links from {}: {}", id, url, e);
            Vec::new()
        });
        let batch = links
            .into_iter()
            .map(|link| {
                let priority = clamp_priority(self.collaborators.prioritizer.score(&link));
                ScoredUrl::new(link, priority)
            })
            .collect();

        let outcome = self.registry.dispatch(batch, id).await;
        let crawled = self.lane.mark_crawled();
        log::debug!(
            "{} crawled {} ({}/{}): {} new links, {} forwarded, {} duplicates",
            id,
            url,
            crawled,
            self.settings.quota,
            outcome.accepted,
            outcome.forwarded,
            outcome.duplicates
        );

        self.registry.record_output(page);
    }
}

fn clamp_priority(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
