// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
///
/// Request timeouts are applied per attempt by the callers, which grow
/// them on retry.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}

/// Timeout for the `attempt`-th try (zero based) under exponential backoff.
pub fn attempt_timeout(config: &CrawlerConfig, attempt: u32) -> Duration {
    let base = Duration::from_millis(config.request_timeout_ms);
    let factor = config.backoff_factor.max(1.0).powi(attempt as i32);
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_async_client_with_defaults() {
        assert!(create_async_client(&CrawlerConfig::default()).is_ok());
    }

    #[test]
    fn test_attempt_timeout_grows_by_backoff_factor() {
        let config = CrawlerConfig {
            request_timeout_ms: 1000,
            backoff_factor: 3.0,
            ..CrawlerConfig::default()
        };
        assert_eq!(attempt_timeout(&config, 0), Duration::from_secs(1));
        assert_eq!(attempt_timeout(&config, 1), Duration::from_secs(3));
        assert_eq!(attempt_timeout(&config, 2), Duration::from_secs(9));
    }
}
