// src/models/crawl_url.rs

//! A URL paired with the host key it is scheduled under.

use std::fmt;

use url::Url;

use crate::error::{AppError, Result};
use crate::utils::url::host_key;

/// A URL waiting in a frontier.
///
/// Identity is exact string equality on the URL; the host is resolved once
/// at parse time so the scheduler never re-parses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlUrl {
    url: String,
    host: String,
}

impl CrawlUrl {
    /// Parse a URL string and resolve its host key.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;
        let host = host_key(&parsed)
            .ok_or_else(|| AppError::validation(format!("URL has no host: {url}")))?;
        Ok(Self {
            url: url.to_string(),
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for CrawlUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
