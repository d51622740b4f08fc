// src/services/extractor.rs

//! Outgoing link extraction.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::FetchedPage;
use crate::utils::normalize_link;

/// Pulls crawlable links out of a fetched page.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, page: &FetchedPage) -> Result<Vec<String>>;
}

/// Extracts every `a[href]`, resolved against the page's final URL.
///
/// Links are normalized and trap-filtered, and each appears at most once
/// in document order.
pub struct HtmlLinkExtractor {
    anchor: Selector,
}

impl HtmlLinkExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchor: parse_selector("a[href]")?,
        })
    }

    /// Extract links from raw HTML.
    pub fn extract_from(&self, base: &Url, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();

        document
            .select(&self.anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| normalize_link(base, href))
            .filter(|link| seen.insert(link.clone()))
            .collect()
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, page: &FetchedPage) -> Result<Vec<String>> {
        let base = Url::parse(&page.final_url)?;
        Ok(self.extract_from(&base, &page.body))
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
