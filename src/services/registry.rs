// src/services/registry.rs

//! Crawl-wide URL deduplication and host ownership.
//!
//! One registry is shared by every worker. Deduplication, ownership
//! resolution, and enqueueing into the owner's frontier for one batch all
//! happen under a single lock, so two workers can never both claim a new
//! host or both accept the same URL.
//!
//! Lock order is registry, then lane. Lane holders never take the registry
//! lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::models::{CrawlUrl, FetchedPage, WorkerId};
use crate::services::lane::Lane;

/// Append-only sink of fetched pages.
pub type PageSink = mpsc::UnboundedSender<FetchedPage>;

/// A discovered URL with its priority score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUrl {
    pub url: String,
    pub priority: f64,
}

impl ScoredUrl {
    pub fn new(url: impl Into<String>, priority: f64) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }
}

/// What happened to a dispatched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// New URLs enqueued somewhere
    pub accepted: usize,
    /// Of those, URLs enqueued into a sibling's frontier
    pub forwarded: usize,
    /// URLs seen before
    pub duplicates: usize,
    /// URLs that could not be scheduled (no host, unknown owner)
    pub dropped: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    seen: HashSet<String>,
    owners: HashMap<String, WorkerId>,
}

impl RegistryState {
    /// Keep only unseen URLs and mark the whole input as seen.
    fn check_and_claim<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        urls.into_iter()
            .filter(|url| self.seen.insert((*url).to_string()))
            .collect()
    }

    /// First claimant of a host owns it for the rest of the crawl.
    fn resolve_owner(&mut self, host: &str, claimant: WorkerId) -> WorkerId {
        *self.owners.entry(host.to_string()).or_insert(claimant)
    }
}

/// Shared dedup set, host ownership map, worker lanes, and output sink.
#[derive(Debug)]
pub struct GlobalRegistry {
    state: Mutex<RegistryState>,
    lanes: Vec<Arc<Lane>>,
    output: PageSink,
}

impl GlobalRegistry {
    /// Create a registry over `lanes`, indexed by worker id.
    pub fn new(lanes: Vec<Arc<Lane>>, output: PageSink) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            lanes,
            output,
        }
    }

    pub fn lanes(&self) -> &[Arc<Lane>] {
        &self.lanes
    }

    pub fn lane(&self, worker: WorkerId) -> Option<&Arc<Lane>> {
        self.lanes.get(worker.0)
    }

    /// Return the URLs never seen before, then mark all of `urls` as seen.
    pub async fn check_and_claim(&self, urls: &[String]) -> Vec<String> {
        let mut state = self.state.lock().await;
        state
            .check_and_claim(urls.iter().map(String::as_str))
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Owner of `host`, assigning `claimant` if nobody owns it yet.
    pub async fn resolve_owner(&self, host: &str, claimant: WorkerId) -> WorkerId {
        self.state.lock().await.resolve_owner(host, claimant)
    }

    pub async fn owner_of(&self, host: &str) -> Option<WorkerId> {
        self.state.lock().await.owners.get(host).copied()
    }

    /// Mark a seed as seen and give its host to the seeding worker.
    pub async fn claim_seed(&self, seed: &CrawlUrl, worker: WorkerId) -> WorkerId {
        let mut state = self.state.lock().await;
        state.seen.insert(seed.as_str().to_string());
        state.resolve_owner(seed.host(), worker)
    }

    /// Deduplicate a discovered batch and enqueue each new URL into the
    /// frontier of its host's owner.
    pub async fn dispatch(&self, batch: Vec<ScoredUrl>, claimant: WorkerId) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let mut state = self.state.lock().await;

        let fresh: HashSet<&str> = state
            .check_and_claim(batch.iter().map(|s| s.url.as_str()))
            .into_iter()
            .collect();

        for scored in &batch {
            if !fresh.contains(scored.url.as_str()) {
                outcome.duplicates += 1;
                continue;
            }

            let url = match CrawlUrl::parse(&scored.url) {
                Ok(url) => url,
                Err(e) => {
                    log::debug!("Dropping {}: {}", scored.url, e);
                    outcome.dropped += 1;
                    continue;
                }
            };

            let owner = state.resolve_owner(url.host(), claimant);
            let Some(lane) = self.lane(owner) else {
                log::warn!("No lane for {owner}; dropping {url}");
                outcome.dropped += 1;
                continue;
            };

            lane.enqueue(url, scored.priority).await;
            outcome.accepted += 1;
            if owner != claimant {
                outcome.forwarded += 1;
            }
        }

        outcome
    }

    /// Append a fetched page to the output sink.
    ///
    /// Returns `false` once nobody is listening any more.
    pub fn record_output(&self, page: FetchedPage) -> bool {
        match self.output.send(page) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Output receiver gone; dropping page {}", e.0.url);
                false
            }
        }
    }

    pub async fn seen_count(&self) -> usize {
        self.state.lock().await.seen.len()
    }

    pub async fn hosts_owned(&self) -> usize {
        self.state.lock().await.owners.len()
    }
}
