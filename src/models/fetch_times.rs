// src/models/fetch_times.rs

//! Last observed fetch duration per host.

use std::collections::HashMap;
use std::time::Duration;

/// Host → last observed fetch duration, owned by a single worker.
///
/// Doubles as the politeness base: a host is recontacted no sooner than a
/// multiple of its recorded value, and unseen hosts borrow the mean.
#[derive(Debug, Clone, Default)]
pub struct FetchTimes {
    times: HashMap<String, Duration>,
}

impl FetchTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a seed host assumed to answer instantly.
    pub fn with_seed_host(host: impl Into<String>) -> Self {
        let mut times = Self::new();
        times.record(host, Duration::ZERO);
        times
    }

    /// Record the latest fetch duration (or declared crawl delay) of a host.
    pub fn record(&mut self, host: impl Into<String>, elapsed: Duration) {
        self.times.insert(host.into(), elapsed);
    }

    pub fn get(&self, host: &str) -> Option<Duration> {
        self.times.get(host).copied()
    }

    /// Arithmetic mean of all recorded durations; zero when nothing is
    /// recorded yet.
    pub fn mean(&self) -> Duration {
        if self.times.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.times.values().sum();
        total / self.times.len() as u32
    }

    /// Politeness base for a host: its own value, else the mean.
    pub fn delay_for(&self, host: &str) -> Duration {
        self.get(host).unwrap_or_else(|| self.mean())
    }

    /// Number of hosts with a recorded fetch.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
