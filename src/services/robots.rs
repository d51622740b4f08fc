// src/services/robots.rs

//! robots.txt checking.
//!
//! Rules are fetched once per origin and cached for the rest of the crawl.
//! A missing robots.txt (4xx other than 401/403) allows everything; a
//! forbidden or unreachable one, or a server error, disallows everything
//! for that origin.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use robotxt::Robots;
use tokio::sync::Mutex;
use url::Url;

use crate::error::Result;
use crate::models::CrawlerConfig;
use crate::utils::http::create_async_client;

/// Whether a URL may be fetched, plus the host's requested crawl delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotsVerdict {
    pub allowed: bool,
    pub delay: Option<Duration>,
}

impl RobotsVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            delay: None,
        }
    }
}

/// Decides whether a URL may be fetched.
#[async_trait]
pub trait RobotsChecker: Send + Sync {
    async fn check(&self, url: &str) -> RobotsVerdict;
}

/// Checker that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl RobotsChecker for AllowAll {
    async fn check(&self, _url: &str) -> RobotsVerdict {
        RobotsVerdict::allow()
    }
}

/// Parsed robots.txt rules of one origin, for our user agent.
pub struct RobotsRules {
    robots: Robots,
}

impl RobotsRules {
    /// Parse robots.txt content for the robots token `agent`.
    pub fn parse(content: &[u8], agent: &str) -> Self {
        Self {
            robots: Robots::from_bytes(content, agent),
        }
    }

    pub fn allow_all(agent: &str) -> Self {
        Self {
            robots: Robots::from_always(true, agent),
        }
    }

    pub fn deny_all(agent: &str) -> Self {
        Self {
            robots: Robots::from_always(false, agent),
        }
    }

    pub fn is_allowed(&self, url: &Url) -> bool {
        self.robots.is_absolute_allowed(url)
    }

    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots.crawl_delay()
    }
}

/// Fetches and caches robots.txt per origin.
pub struct RobotsTxtChecker {
    client: Client,
    agent: String,
    cache: Mutex<HashMap<String, Arc<RobotsRules>>>,
}

impl RobotsTxtChecker {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(
            create_async_client(config)?,
            &config.user_agent,
        ))
    }

    /// `user_agent` is the full header value; groups are matched against
    /// its product token (`polite-crawler/0.1 (...)` -> `polite-crawler`).
    pub fn with_client(client: Client, user_agent: &str) -> Self {
        let agent = user_agent
            .split(['/', ' '])
            .next()
            .unwrap_or(user_agent)
            .to_string();
        Self {
            client,
            agent,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Rules for the origin of `url`, fetching them on first use.
    pub async fn rules_for(&self, url: &Url) -> Arc<RobotsRules> {
        let origin = url.origin().ascii_serialization();
        if let Some(rules) = self.cache.lock().await.get(&origin) {
            return Arc::clone(rules);
        }

        let rules = Arc::new(self.fetch_rules(&origin).await);
        self.cache
            .lock()
            .await
            .entry(origin)
            .or_insert(rules)
            .clone()
    }

    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{origin}/robots.txt");
        let response = match self.client.get(&robots_url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("robots.txt unreachable at {}: {}", robots_url, e);
                return RobotsRules::deny_all(&self.agent);
            }
        };

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            log::debug!("robots.txt at {} is {}; disallowing origin", robots_url, status);
            return RobotsRules::deny_all(&self.agent);
        }
        if status.is_client_error() {
            return RobotsRules::allow_all(&self.agent);
        }
        if !status.is_success() {
            log::debug!("robots.txt at {} returned {}", robots_url, status);
            return RobotsRules::deny_all(&self.agent);
        }

        match response.bytes().await {
            Ok(content) => RobotsRules::parse(&content, &self.agent),
            Err(e) => {
                log::debug!("robots.txt body unreadable at {}: {}", robots_url, e);
                RobotsRules::deny_all(&self.agent)
            }
        }
    }
}

#[async_trait]
impl RobotsChecker for RobotsTxtChecker {
    async fn check(&self, url: &str) -> RobotsVerdict {
        let Ok(parsed) = Url::parse(url) else {
            return RobotsVerdict {
                allowed: false,
                delay: None,
            };
        };

        let rules = self.rules_for(&parsed).await;
        RobotsVerdict {
            allowed: rules.is_allowed(&parsed),
            delay: rules.crawl_delay(),
        }
    }
}
