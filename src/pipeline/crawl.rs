// src/pipeline/crawl.rs

//! Multi-worker crawl driver.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::frontier::Frontier;
use crate::models::{Config, CrawlSummary, CrawlUrl, FetchTimes, FetchedPage, WorkerId, WorkerReport};
use crate::services::{Collaborators, GlobalRegistry, Lane, Worker, WorkerSettings};

/// A running crawl.
///
/// Pages stream out in completion order; the stream ends once every worker
/// has stopped.
pub struct CrawlHandle {
    pages: mpsc::UnboundedReceiver<FetchedPage>,
    driver: JoinHandle<Result<CrawlSummary>>,
}

impl CrawlHandle {
    /// Next fetched page, or `None` once the crawl is over.
    pub async fn next_page(&mut self) -> Option<FetchedPage> {
        self.pages.recv().await
    }

    /// Wait for all workers and return the crawl statistics.
    ///
    /// Pages not yet taken with [`next_page`](Self::next_page) are dropped.
    pub async fn finish(self) -> Result<CrawlSummary> {
        let CrawlHandle { pages, driver } = self;
        drop(pages);
        driver.await?
    }
}

/// Validate `config`, seed one worker per seed URL, and start crawling.
pub async fn start_crawl(config: &Config, collaborators: Collaborators) -> Result<CrawlHandle> {
    config.validate()?;
    let start_time = Utc::now();
    let workers = config.crawl.workers;

    let seeds = config
        .crawl
        .seeds
        .iter()
        .map(|seed| CrawlUrl::parse(seed))
        .collect::<Result<Vec<_>>>()?;

    let lanes: Vec<Arc<Lane>> = seeds
        .iter()
        .enumerate()
        .map(|(i, seed)| {
            Arc::new(Lane::new(
                WorkerId(i),
                Frontier::from_config(&config.frontier, workers),
                FetchTimes::with_seed_host(seed.host()),
            ))
        })
        .collect();

    let (tx, rx) = mpsc::unbounded_channel();
    let registry = Arc::new(GlobalRegistry::new(lanes.clone(), tx));

    for (lane, seed) in lanes.iter().zip(seeds) {
        let owner = registry.claim_seed(&seed, lane.id()).await;
        if owner != lane.id() {
            log::warn!(
                "Seed {} shares host {} with {}; {} starts empty",
                seed,
                seed.host(),
                owner,
                lane.id()
            );
        }
        if let Some(owner_lane) = registry.lane(owner) {
            owner_lane.enqueue(seed, 1.0).await;
        }
    }

    log::info!(
        "Starting crawl: {} workers, {} pages max, {} host slots per worker",
        workers,
        config.crawl.max_pages,
        config.frontier.effective_back_queues(workers)
    );

    let settings = WorkerSettings::from_config(&config.crawl);
    let handles = lanes
        .into_iter()
        .map(|lane| {
            let worker = Worker::new(lane, Arc::clone(&registry), collaborators.clone(), settings);
            tokio::spawn(worker.run())
        })
        .collect();

    let stats_interval = Duration::from_secs(config.crawl.stats_interval_secs);
    let driver = tokio::spawn(drive(registry, handles, stats_interval, start_time));

    Ok(CrawlHandle { pages: rx, driver })
}

/// Crawl with collaborators built from `config`, handing each page to
/// `on_page` as it arrives.
///
/// An error from `on_page` stops consuming pages; the crawl still runs to
/// completion before the error is returned.
pub async fn run_crawler<F>(config: &Config, mut on_page: F) -> Result<CrawlSummary>
where
    F: FnMut(FetchedPage) -> Result<()>,
{
    let collaborators = Collaborators::from_config(config)?;
    let mut handle = start_crawl(config, collaborators).await?;

    let mut failure = None;
    while let Some(page) = handle.next_page().await {
        if let Err(e) = on_page(page) {
            failure = Some(e);
            break;
        }
    }

    let summary = handle.finish().await?;
    match failure {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

async fn drive(
    registry: Arc<GlobalRegistry>,
    handles: Vec<JoinHandle<Result<WorkerReport>>>,
    stats_interval: Duration,
    start_time: DateTime<Utc>,
) -> Result<CrawlSummary> {
    let mut pending: FuturesUnordered<_> = handles.into_iter().collect();
    let mut reports = Vec::with_capacity(pending.len());

    let report_progress = !stats_interval.is_zero();
    let mut ticker = tokio::time::interval(stats_interval.max(Duration::from_secs(1)));
    ticker.tick().await;

    loop {
        tokio::select! {
            joined = pending.next() => match joined {
                Some(result) => reports.push(result??),
                None => break,
            },
            _ = ticker.tick(), if report_progress => {
                log_progress(&registry, pending.len()).await;
            }
        }
    }

    reports.sort_by_key(|r: &WorkerReport| r.worker);
    let summary = CrawlSummary {
        start_time,
        end_time: Utc::now(),
        unique_urls_seen: registry.seen_count().await,
        hosts_owned: registry.hosts_owned().await,
        workers: reports,
    };

    log::info!(
        "Crawl complete: {} pages, {} unique URLs seen, {} left in frontiers, {:.1}s",
        summary.pages_crawled(),
        summary.unique_urls_seen,
        summary.frontier_left(),
        (summary.end_time - summary.start_time).num_milliseconds() as f64 / 1000.0
    );
    Ok(summary)
}

async fn log_progress(registry: &GlobalRegistry, active: usize) {
    let mut crawled = 0;
    let mut frontier = 0;
    let mut hosts = 0;
    for lane in registry.lanes() {
        crawled += lane.crawled();
        frontier += lane.frontier_len().await;
        hosts += lane.hosts_contacted().await;
    }
    log::info!(
        "Progress: {} workers active, {} pages crawled, {} URLs in frontiers, {} hosts contacted",
        active,
        crawled,
        frontier,
        hosts
    );
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::AppError;
    use crate::models::{CrawlConfig, CrawlerConfig};

    async fn two_page_site() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/next">n</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/next"))
            .respond_with(ResponseTemplate::new(200).set_body_string("end"))
            .mount(&server)
            .await;
        server
    }

    fn site_config(server: &MockServer) -> Config {
        Config {
            crawler: CrawlerConfig {
                respect_robots: false,
                ..CrawlerConfig::default()
            },
            crawl: CrawlConfig {
                seeds: vec![format!("{}/", server.uri())],
                max_pages: 10,
                stats_interval_secs: 0,
                idle_poll_ms: 10,
                max_idle_polls: 2,
                ..CrawlConfig::default()
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_run_crawler_hands_every_page_to_callback() {
        let server = two_page_site().await;
        let config = site_config(&server);

        let mut seen = Vec::new();
        let summary = run_crawler(&config, |page| {
            seen.push(page.url);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(
            seen,
            vec![format!("{}/", server.uri()), format!("{}/next", server.uri())]
        );
        assert_eq!(summary.pages_crawled(), 2);
    }

    #[tokio::test]
    async fn test_run_crawler_returns_callback_error() {
        let server = two_page_site().await;
        let config = site_config(&server);

        let result = run_crawler(&config, |_| Err(AppError::crawl("sink", "closed"))).await;
        assert!(matches!(result, Err(AppError::Crawl { .. })));
    }

    #[tokio::test]
    async fn test_start_crawl_rejects_invalid_config() {
        let config = Config {
            crawl: CrawlConfig {
                workers: 2,
                seeds: vec!["https://a.com/".into()],
                ..CrawlConfig::default()
            },
            ..Config::default()
        };
        let collaborators = Collaborators::from_config(&Config::default()).unwrap();
        assert!(start_crawl(&config, collaborators).await.is_err());
    }
}
