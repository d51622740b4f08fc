// src/frontier/buckets.rs

//! Priority buckets ("front queues").
//!
//! The priority domain `[0, 1]` is split into equal-width buckets, ordered
//! by ascending upper bound. Each bucket is an unbounded FIFO.

use std::collections::VecDeque;

use rand::Rng;

use crate::models::CrawlUrl;

/// Per-bucket sampling weights used when refilling a host slot.
///
/// Index `i` holds the weight of bucket `i`; higher buckets hold higher
/// priorities and must never weigh less than lower ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiasWeights(Vec<u64>);

impl BiasWeights {
    /// Bucket `i` weighs `2^i`: each bucket is twice as likely to be drawn
    /// as the one below it.
    pub fn exponential(buckets: usize) -> Self {
        Self((0..buckets).map(|i| 1u64 << i.min(62)).collect())
    }

    /// Weight of a bucket; missing or zero entries count as one.
    pub fn weight(&self, bucket: usize) -> u64 {
        self.0.get(bucket).copied().unwrap_or(1).max(1)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

/// Fixed-width priority buckets holding URLs without a host slot.
#[derive(Debug)]
pub struct PriorityBucketSet {
    buckets: Vec<VecDeque<CrawlUrl>>,
    len: usize,
}

impl PriorityBucketSet {
    /// Create `count` buckets (at least one).
    pub fn new(count: usize) -> Self {
        Self {
            buckets: (0..count.max(1)).map(|_| VecDeque::new()).collect(),
            len: 0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket a priority falls into.
    ///
    /// `floor(priority / width)`, clamped into range so that a priority of
    /// exactly 1.0 lands in the top bucket. NaN lands in bucket 0.
    pub fn bucket_index(&self, priority: f64) -> usize {
        let count = self.buckets.len();
        let raw = (priority * count as f64).floor();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else {
            (raw as usize).min(count - 1)
        }
    }

    /// Push a URL onto the tail of its priority bucket.
    pub fn route(&mut self, url: CrawlUrl, priority: f64) {
        let index = self.bucket_index(priority);
        self.buckets[index].push_back(url);
        self.len += 1;
    }

    /// Pop the head of one bucket drawn at random, biased by `weights`.
    ///
    /// Only non-empty buckets take part in the draw. Returns `None` once
    /// every bucket is empty.
    pub fn sample_biased<R: Rng>(
        &mut self,
        weights: &BiasWeights,
        rng: &mut R,
    ) -> Option<CrawlUrl> {
        let mut cumulative = Vec::with_capacity(self.buckets.len());
        let mut total = 0u64;
        for (index, bucket) in self.buckets.iter().enumerate() {
            if !bucket.is_empty() {
                total = total.saturating_add(weights.weight(index));
            }
            cumulative.push(total);
        }
        if total == 0 {
            return None;
        }

        let draw = rng.random_range(0..total);
        let chosen = cumulative.partition_point(|&bound| bound <= draw);
        let url = self.buckets.get_mut(chosen)?.pop_front()?;
        self.len -= 1;
        Some(url)
    }

    /// True iff every bucket is empty.
    pub fn is_exhausted(&self) -> bool {
        self.len == 0
    }

    /// URLs across all buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// URLs waiting in one bucket.
    pub fn bucket_len(&self, index: usize) -> usize {
        self.buckets.get(index).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn url(s: &str) -> CrawlUrl {
        CrawlUrl::parse(s).unwrap()
    }

    #[test]
    fn test_exponential_weights_are_monotonic() {
        let weights = BiasWeights::exponential(5);
        assert_eq!(weights.as_slice(), &[1, 2, 4, 8, 16]);
        assert!(weights.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bucket_index_boundaries() {
        let buckets = PriorityBucketSet::new(2);
        assert_eq!(buckets.bucket_index(0.0), 0);
        assert_eq!(buckets.bucket_index(0.2), 0);
        assert_eq!(buckets.bucket_index(0.5), 1);
        assert_eq!(buckets.bucket_index(0.9), 1);
        // 1.0 would compute one past the end
        assert_eq!(buckets.bucket_index(1.0), 1);
    }

    #[test]
    fn test_bucket_index_out_of_range_is_clamped() {
        let buckets = PriorityBucketSet::new(4);
        assert_eq!(buckets.bucket_index(-0.5), 0);
        assert_eq!(buckets.bucket_index(7.0), 3);
        assert_eq!(buckets.bucket_index(f64::NAN), 0);
    }

    #[test]
    fn test_route_is_fifo_per_bucket() {
        let mut buckets = PriorityBucketSet::new(1);
        buckets.route(url("https://a.com/1"), 0.3);
        buckets.route(url("https://a.com/2"), 0.7);

        let weights = BiasWeights::exponential(1);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            buckets.sample_biased(&weights, &mut rng).unwrap().as_str(),
            "https://a.com/1"
        );
        assert_eq!(
            buckets.sample_biased(&weights, &mut rng).unwrap().as_str(),
            "https://a.com/2"
        );
        assert!(buckets.sample_biased(&weights, &mut rng).is_none());
        assert!(buckets.is_exhausted());
    }

    #[test]
    fn test_sample_skips_empty_buckets() {
        let mut buckets = PriorityBucketSet::new(5);
        buckets.route(url("https://low.com/"), 0.05);

        let weights = BiasWeights::exponential(5);
        let mut rng = StdRng::seed_from_u64(42);
        let picked = buckets.sample_biased(&weights, &mut rng).unwrap();
        assert_eq!(picked.host(), "low.com");
        assert_eq!(buckets.len(), 0);
    }

    #[test]
    fn test_sample_favours_high_priority_buckets() {
        let weights = BiasWeights::exponential(2);
        let mut rng = StdRng::seed_from_u64(1234);
        let mut high_first = 0;

        for _ in 0..1000 {
            let mut buckets = PriorityBucketSet::new(2);
            buckets.route(url("https://low.com/"), 0.1);
            buckets.route(url("https://high.com/"), 0.9);
            if buckets.sample_biased(&weights, &mut rng).unwrap().host() == "high.com" {
                high_first += 1;
            }
        }

        // Expected two thirds
        assert!(high_first > 550, "high bucket drawn {high_first} times");
        assert!(high_first < 780, "high bucket drawn {high_first} times");
    }
}
