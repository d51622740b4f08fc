// src/frontier/scheduler.rs

//! Politeness scheduler ("back queues").
//!
//! A bounded set of per-host FIFO slots plus a readiness queue that keeps
//! every host at least `politeness_factor × last fetch time` apart. When a
//! slot runs dry it is refilled from the priority buckets, favouring the
//! higher-priority ones.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::buckets::{BiasWeights, PriorityBucketSet};
use super::ready::ReadyQueue;
use crate::error::{AppError, Result};
use crate::models::{CrawlUrl, FetchTimes};

/// Default multiplier between a host's fetch time and its revisit delay.
pub const DEFAULT_POLITENESS_FACTOR: f64 = 10.0;

/// A URL handed out by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dequeued {
    pub url: CrawlUrl,

    /// The host must not be contacted before this instant.
    pub not_before: Instant,
}

impl Dequeued {
    /// Politeness wait left at `now`.
    pub fn wait(&self, now: Instant) -> Duration {
        self.not_before.saturating_duration_since(now)
    }
}

/// Per-host slots and the readiness queue that throttles them.
#[derive(Debug)]
pub struct PolitenessScheduler {
    capacity: usize,
    slots: HashMap<String, VecDeque<CrawlUrl>>,
    ready: ReadyQueue,
    queued: usize,
    weights: BiasWeights,
    politeness_factor: f64,
    rng: StdRng,
}

impl PolitenessScheduler {
    /// Create a scheduler with `capacity` slots drawing from
    /// `front_queues` buckets.
    pub fn new(capacity: usize, front_queues: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: HashMap::new(),
            ready: ReadyQueue::new(),
            queued: 0,
            weights: BiasWeights::exponential(front_queues.max(1)),
            politeness_factor: DEFAULT_POLITENESS_FACTOR,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_politeness_factor(mut self, factor: f64) -> Self {
        self.politeness_factor = factor.max(0.0);
        self
    }

    /// Use a fixed seed for refill sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Whether a host without a slot could still get one directly.
    pub fn has_capacity(&self) -> bool {
        self.slots.len() < self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// URLs held in host slots.
    pub fn queued(&self) -> usize {
        self.queued
    }

    /// Hosts currently owning a slot.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// URLs waiting in one host's slot.
    pub fn slot_len(&self, host: &str) -> usize {
        self.slots.get(host).map_or(0, VecDeque::len)
    }

    pub fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    /// Revisit delay for a host.
    fn politeness_interval(&self, host: &str, fetch_times: &FetchTimes) -> Duration {
        let base = fetch_times.delay_for(host).as_secs_f64();
        Duration::try_from_secs_f64(base * self.politeness_factor).unwrap_or(Duration::MAX)
    }

    fn schedule(&mut self, host: &str, from: Instant, fetch_times: &FetchTimes) {
        let interval = self.politeness_interval(host, fetch_times);
        let at = from.checked_add(interval).unwrap_or(from);
        self.ready.schedule(host, at);
    }

    /// Give the URL's host a slot (or reuse its slot) and reset its timer.
    ///
    /// Meant for use while [`has_capacity`](Self::has_capacity) holds.
    pub fn assign_direct(&mut self, url: CrawlUrl, fetch_times: &FetchTimes, now: Instant) {
        let host = url.host().to_string();
        self.slots.entry(host.clone()).or_default().push_back(url);
        self.queued += 1;
        self.schedule(&host, now, fetch_times);
    }

    /// Take the next URL whose host is earliest in the readiness queue.
    ///
    /// Refills the host's slot from `buckets` when it runs dry and
    /// reschedules the (possibly new) host at
    /// `max(now, not_before) + factor × delay`. Fails with
    /// [`AppError::EmptyFrontier`] when neither slots nor buckets hold a URL.
    pub fn dequeue(
        &mut self,
        buckets: &mut PriorityBucketSet,
        fetch_times: &FetchTimes,
        now: Instant,
    ) -> Result<Dequeued> {
        if self.queued + buckets.len() == 0 {
            return Err(AppError::EmptyFrontier);
        }

        let (not_before, host) = self.ready.pop().ok_or(AppError::EmptyFrontier)?;
        let slot = self
            .slots
            .get_mut(&host)
            .ok_or_else(|| AppError::scheduler(format!("ready host {host} has no slot")))?;
        let url = slot
            .pop_front()
            .ok_or_else(|| AppError::scheduler(format!("slot for {host} is empty")))?;
        let drained = slot.is_empty();
        self.queued -= 1;

        let next_host = if drained {
            self.refill(&host, buckets)
        } else {
            Some(host)
        };

        if let Some(next_host) = next_host {
            self.schedule(&next_host, not_before.max(now), fetch_times);
        }

        Ok(Dequeued { url, not_before })
    }

    /// Promote URLs from the buckets into the drained slot of `host`.
    ///
    /// Returns the host now owning the slot, or `None` when the buckets ran
    /// out first; the slot is then released.
    fn refill(&mut self, host: &str, buckets: &mut PriorityBucketSet) -> Option<String> {
        while let Some(candidate) = buckets.sample_biased(&self.weights, &mut self.rng) {
            let candidate_host = candidate.host().to_string();

            if candidate_host == host {
                self.slots.entry(candidate_host).or_default().push_back(candidate);
                self.queued += 1;
                return Some(host.to_string());
            }

            if let Some(other) = self.slots.get_mut(&candidate_host) {
                other.push_back(candidate);
                self.queued += 1;
                continue;
            }

            let mut slot = self.slots.remove(host).unwrap_or_default();
            slot.push_back(candidate);
            self.slots.insert(candidate_host.clone(), slot);
            self.queued += 1;
            log::debug!("Slot of {host} handed over to {candidate_host}");
            return Some(candidate_host);
        }

        self.slots.remove(host);
        log::debug!("Slot of {host} released: priority buckets exhausted");
        None
    }
}
