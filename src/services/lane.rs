// src/services/lane.rs

//! Per-worker state reachable from other workers.
//!
//! A lane wraps one worker's frontier and fetch times behind an async
//! mutex. The owning worker dequeues through it; the registry enqueues
//! through it when a sibling discovers a URL on a host this worker owns.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::frontier::{Dequeued, Frontier};
use crate::models::{CrawlUrl, FetchTimes, WorkerId, WorkerReport};

/// Frontier and fetch times of one worker.
#[derive(Debug)]
pub struct LaneState {
    pub frontier: Frontier,
    pub fetch_times: FetchTimes,
}

/// Shared handle to one worker's state.
#[derive(Debug)]
pub struct Lane {
    id: WorkerId,
    state: Mutex<LaneState>,
    crawled: AtomicUsize,
}

impl Lane {
    pub fn new(id: WorkerId, frontier: Frontier, fetch_times: FetchTimes) -> Self {
        Self {
            id,
            state: Mutex::new(LaneState {
                frontier,
                fetch_times,
            }),
            crawled: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Enqueue into this lane's frontier using its own fetch times.
    pub async fn enqueue(&self, url: CrawlUrl, priority: f64) {
        let mut state = self.state.lock().await;
        let LaneState {
            frontier,
            fetch_times,
        } = &mut *state;
        frontier.enqueue(url, priority, fetch_times);
    }

    /// Dequeue the next URL; the lock is released before the caller waits.
    pub async fn dequeue(&self) -> Result<Dequeued> {
        let mut state = self.state.lock().await;
        let LaneState {
            frontier,
            fetch_times,
        } = &mut *state;
        frontier.dequeue(fetch_times)
    }

    /// Record the politeness base observed for a host.
    pub async fn record_fetch(&self, host: &str, delay: Duration) {
        self.state.lock().await.fetch_times.record(host, delay);
    }

    pub async fn frontier_len(&self) -> usize {
        self.state.lock().await.frontier.len()
    }

    pub async fn hosts_contacted(&self) -> usize {
        self.state.lock().await.fetch_times.len()
    }

    pub fn mark_crawled(&self) -> usize {
        self.crawled.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn crawled(&self) -> usize {
        self.crawled.load(Ordering::Acquire)
    }

    pub async fn report(&self) -> WorkerReport {
        let state = self.state.lock().await;
        WorkerReport {
            worker: self.id,
            pages_crawled: self.crawled(),
            frontier_left: state.frontier.len(),
            hosts_contacted: state.fetch_times.len(),
        }
    }
}
