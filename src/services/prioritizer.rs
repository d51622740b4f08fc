// src/services/prioritizer.rs

//! URL scoring strategies.
//!
//! A prioritizer maps a discovered URL to a score in `[0, 1]`; higher
//! scores land in higher priority buckets.

use std::sync::Arc;

use url::Url;

use crate::models::PrioritizerKind;

/// Scores discovered URLs.
pub trait Prioritizer: Send + Sync {
    fn score(&self, url: &str) -> f64;
}

impl<F> Prioritizer for F
where
    F: Fn(&str) -> f64 + Send + Sync,
{
    fn score(&self, url: &str) -> f64 {
        self(url)
    }
}

/// Uniformly random score.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPrioritizer;

impl Prioritizer for RandomPrioritizer {
    fn score(&self, _url: &str) -> f64 {
        rand::random::<f64>()
    }
}

/// `1 / (1 + depth)`, where depth counts non-empty path segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthPrioritizer;

impl Prioritizer for DepthPrioritizer {
    fn score(&self, url: &str) -> f64 {
        let depth = Url::parse(url)
            .ok()
            .and_then(|u| u.path_segments().map(|s| s.filter(|p| !p.is_empty()).count()))
            .unwrap_or(0);
        1.0 / (1.0 + depth as f64)
    }
}

/// Build the prioritizer named in the configuration.
pub fn from_kind(kind: PrioritizerKind) -> Arc<dyn Prioritizer> {
    match kind {
        PrioritizerKind::Random => Arc::new(RandomPrioritizer),
        PrioritizerKind::Depth => Arc::new(DepthPrioritizer),
    }
}
