// src/frontier/mod.rs

//! Per-worker crawl frontier.
//!
//! Two levels of queues, after the Mercator design:
//!
//! - **Front**: [`PriorityBucketSet`] holds URLs by priority until a host
//!   slot opens up for them.
//! - **Back**: [`PolitenessScheduler`] serves one FIFO per host, ordered by
//!   the earliest time each host may be contacted again.
//!
//! A `Frontier` is not synchronized; it belongs to one worker and is only
//! mutated through that worker's lane.

mod buckets;
mod ready;
mod scheduler;

use std::time::Instant;

pub use buckets::{BiasWeights, PriorityBucketSet};
pub use ready::ReadyQueue;
pub use scheduler::{DEFAULT_POLITENESS_FACTOR, Dequeued, PolitenessScheduler};

use crate::error::Result;
use crate::models::{CrawlUrl, FetchTimes, FrontierConfig};

/// Priority buckets feeding politeness-throttled host slots.
#[derive(Debug)]
pub struct Frontier {
    buckets: PriorityBucketSet,
    scheduler: PolitenessScheduler,
    size: usize,
}

impl Frontier {
    /// Create a frontier with `back_queues` host slots and `front_queues`
    /// priority buckets.
    pub fn new(back_queues: usize, front_queues: usize) -> Self {
        Self {
            buckets: PriorityBucketSet::new(front_queues),
            scheduler: PolitenessScheduler::new(back_queues, front_queues),
            size: 0,
        }
    }

    /// Create a frontier sized for a crawl with `workers` workers.
    pub fn from_config(config: &FrontierConfig, workers: usize) -> Self {
        let mut frontier = Self::new(config.effective_back_queues(workers), config.front_queues);
        frontier.scheduler = frontier
            .scheduler
            .with_politeness_factor(config.politeness_factor);
        frontier
    }

    /// Use a fixed seed for refill sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scheduler = self.scheduler.with_seed(seed);
        self
    }

    pub fn with_politeness_factor(mut self, factor: f64) -> Self {
        self.scheduler = self.scheduler.with_politeness_factor(factor);
        self
    }

    /// Add a URL.
    ///
    /// While host slots are free the URL goes straight into its host's
    /// slot; afterwards it waits in the priority buckets.
    pub fn enqueue(&mut self, url: CrawlUrl, priority: f64, fetch_times: &FetchTimes) {
        self.enqueue_at(url, priority, fetch_times, Instant::now());
    }

    pub fn enqueue_at(
        &mut self,
        url: CrawlUrl,
        priority: f64,
        fetch_times: &FetchTimes,
        now: Instant,
    ) {
        if self.scheduler.has_capacity() {
            self.scheduler.assign_direct(url, fetch_times, now);
        } else {
            self.buckets.route(url, priority);
        }
        self.size += 1;
    }

    /// Take the next URL to fetch.
    ///
    /// The caller must not contact the URL's host before
    /// [`Dequeued::not_before`].
    pub fn dequeue(&mut self, fetch_times: &FetchTimes) -> Result<Dequeued> {
        self.dequeue_at(fetch_times, Instant::now())
    }

    pub fn dequeue_at(&mut self, fetch_times: &FetchTimes, now: Instant) -> Result<Dequeued> {
        let next = self
            .scheduler
            .dequeue(&mut self.buckets, fetch_times, now)?;
        self.size -= 1;
        Ok(next)
    }

    /// URLs enqueued and not yet dequeued.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn buckets(&self) -> &PriorityBucketSet {
        &self.buckets
    }

    pub fn scheduler(&self) -> &PolitenessScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn url(s: &str) -> CrawlUrl {
        CrawlUrl::parse(s).unwrap()
    }

    #[test]
    fn test_two_host_handover_scenario() {
        let now = Instant::now();
        let times = FetchTimes::with_seed_host("a.com");
        let mut frontier = Frontier::new(1, 2).with_seed(17);

        frontier.enqueue_at(url("https://a.com/1"), 0.9, &times, now);
        frontier.enqueue_at(url("https://b.com/1"), 0.2, &times, now);
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.scheduler().slot_len("a.com"), 1);
        assert_eq!(frontier.buckets().bucket_len(0), 1);

        let first = frontier.dequeue_at(&times, now).unwrap();
        assert_eq!(first.url.as_str(), "https://a.com/1");
        assert_eq!(frontier.scheduler().slot_len("b.com"), 1);

        let second = frontier.dequeue_at(&times, now).unwrap();
        assert_eq!(second.url.as_str(), "https://b.com/1");

        assert!(frontier.dequeue_at(&times, now).unwrap_err().is_empty_frontier());
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_dequeue_on_new_frontier_fails() {
        let mut frontier = Frontier::new(3, 5);
        let err = frontier.dequeue(&FetchTimes::new()).unwrap_err();
        assert!(err.is_empty_frontier());
        assert_eq!(frontier.len(), 0);
    }

    #[test]
    fn test_direct_slots_until_capacity() {
        let now = Instant::now();
        let times = FetchTimes::new();
        let mut frontier = Frontier::new(2, 2).with_seed(2);

        frontier.enqueue_at(url("https://a.com/1"), 0.1, &times, now);
        frontier.enqueue_at(url("https://a.com/2"), 0.1, &times, now);
        frontier.enqueue_at(url("https://a.com/3"), 0.1, &times, now);
        assert_eq!(frontier.scheduler().slot_len("a.com"), 3);
        assert!(frontier.buckets().is_exhausted());

        frontier.enqueue_at(url("https://b.com/1"), 0.1, &times, now);
        frontier.enqueue_at(url("https://a.com/4"), 0.1, &times, now);
        assert_eq!(frontier.scheduler().slot_len("a.com"), 3);
        assert_eq!(frontier.buckets().len(), 1);
    }

    #[test]
    fn test_priority_one_lands_in_top_bucket() {
        let now = Instant::now();
        let times = FetchTimes::new();
        let mut frontier = Frontier::new(1, 4).with_seed(2);

        frontier.enqueue_at(url("https://a.com/"), 1.0, &times, now);
        frontier.enqueue_at(url("https://b.com/"), 1.0, &times, now);
        assert_eq!(frontier.buckets().bucket_len(3), 1);
    }

    #[test]
    fn test_size_tracks_enqueues_minus_dequeues() {
        let now = Instant::now();
        let times = FetchTimes::with_seed_host("h0.com");
        let mut frontier = Frontier::new(3, 4).with_seed(99);
        let mut enqueued = 0usize;
        let mut dequeued = 0usize;

        for round in 0..20 {
            for i in 0..3 {
                let host = (round * 3 + i) % 7;
                frontier.enqueue_at(
                    url(&format!("https://h{host}.com/{round}/{i}")),
                    (i as f64) / 3.0,
                    &times,
                    now,
                );
                enqueued += 1;
            }
            for _ in 0..2 {
                frontier.dequeue_at(&times, now).unwrap();
                dequeued += 1;
            }
            assert_eq!(frontier.len(), enqueued - dequeued);
        }

        while frontier.dequeue_at(&times, now).is_ok() {
            dequeued += 1;
            assert_eq!(frontier.len(), enqueued - dequeued);
        }
        assert_eq!(enqueued, dequeued);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_readiness_orders_hosts() {
        let now = Instant::now();
        let mut times = FetchTimes::new();
        times.record("slow.com", Duration::from_secs(1));
        times.record("fast.com", Duration::from_millis(10));
        let mut frontier = Frontier::new(2, 1).with_seed(4);

        frontier.enqueue_at(url("https://slow.com/1"), 0.5, &times, now);
        frontier.enqueue_at(url("https://fast.com/1"), 0.5, &times, now);

        let first = frontier.dequeue_at(&times, now).unwrap();
        assert_eq!(first.url.host(), "fast.com");
        assert_eq!(first.wait(now), Duration::from_millis(100));
    }
}
