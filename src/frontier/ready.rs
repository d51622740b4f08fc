// src/frontier/ready.rs

//! Readiness queue: which host may be contacted next, and when.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

/// Min-ordered `(next contact time, host)` entries, at most one per host.
///
/// Scheduling a host that already has an entry replaces it, so a host never
/// carries two timers.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    order: BTreeSet<(Instant, String)>,
    index: HashMap<String, Instant>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `host`.
    pub fn schedule(&mut self, host: &str, at: Instant) {
        if let Some(previous) = self.index.insert(host.to_string(), at) {
            self.order.remove(&(previous, host.to_string()));
        }
        self.order.insert((at, host.to_string()));
    }

    /// Remove and return the earliest entry.
    pub fn pop(&mut self) -> Option<(Instant, String)> {
        let (at, host) = self.order.pop_first()?;
        self.index.remove(&host);
        Some((at, host))
    }

    /// Drop the entry for `host`, if any.
    pub fn remove(&mut self, host: &str) -> Option<Instant> {
        let at = self.index.remove(host)?;
        self.order.remove(&(at, host.to_string()));
        Some(at)
    }

    /// Earliest entry without removing it.
    pub fn peek(&self) -> Option<(Instant, &str)> {
        self.order.first().map(|(at, host)| (*at, host.as_str()))
    }

    /// Scheduled time of a host.
    pub fn scheduled_at(&self, host: &str) -> Option<Instant> {
        self.index.get(host).copied()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.index.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
