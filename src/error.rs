// src/error.rs

//! Unified error handling for the crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Dequeue was called on a frontier holding no URLs
    #[error("Frontier is empty")]
    EmptyFrontier,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Scheduler bookkeeping went out of sync
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a scheduler invariant error.
    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler(message.into())
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this is the "nothing left to dequeue" signal.
    pub fn is_empty_frontier(&self) -> bool {
        matches!(self, Self::EmptyFrontier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frontier_is_recognised() {
        assert!(AppError::EmptyFrontier.is_empty_frontier());
        assert!(!AppError::config("x").is_empty_frontier());
    }

    #[test]
    fn test_crawl_error_message() {
        let err = AppError::crawl("https://a.com/", "unexpected status 404");
        assert_eq!(
            err.to_string(),
            "Crawl error for https://a.com/: unexpected status 404"
        );
    }
}
