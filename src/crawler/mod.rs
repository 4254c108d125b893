//! Crawler module for page fetching and content extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with linear-backoff retry
//! - Main-content extraction and sanitization
//! - The bounded worker pool that drives a crawl over the sidebar entries

mod fetcher;
mod parser;
mod scheduler;

pub use fetcher::{build_http_client, Fetcher};
pub use parser::{extract_title, Sanitizer};
pub use scheduler::{CancelFlag, CrawlOutcome, Scheduler};

pub use crate::discover::LinkEntry;

use crate::PageError;
use async_trait::async_trait;
use url::Url;

/// Title given to pages that could not be fetched or sanitized
pub const FAILED_PAGE_TITLE: &str = "Fetch failed";

/// One crawled page, ready for assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Chapter title
    pub title: String,

    /// The page's address, without fragment
    pub url: Url,

    /// Sanitized main-content markup
    pub html: String,

    /// Stylesheets referenced by the page, deduplicated, in document order
    pub stylesheets: Vec<Url>,

    /// Whether this is a placeholder standing in for a failed page
    pub failed: bool,
}

impl PageResult {
    /// Builds the placeholder for a page that failed to retrieve or sanitize
    ///
    /// The placeholder carries a visible error marker embedding the URL and
    /// never contributes stylesheets.
    pub fn placeholder(url: &Url) -> Self {
        let html = format!(
            r#"<div class="docuprint-error">[Error: failed to fetch this page - {}]</div>"#,
            html_escape::encode_text(url.as_str())
        );

        Self {
            title: FAILED_PAGE_TITLE.to_string(),
            url: url.clone(),
            html,
            stylesheets: Vec::new(),
            failed: true,
        }
    }
}

/// Something that turns a URL into a sanitized page
///
/// The scheduler only talks to this seam; [`HttpPageSource`] is the real
/// implementation.
#[async_trait(?Send)]
pub trait PageSource {
    async fn fetch_page(&self, url: &Url) -> Result<PageResult, PageError>;
}

/// Fetches pages over HTTP and sanitizes them with the site's selectors
pub struct HttpPageSource {
    fetcher: Fetcher,
    sanitizer: Sanitizer,
}

impl HttpPageSource {
    pub fn new(fetcher: Fetcher, sanitizer: Sanitizer) -> Self {
        Self { fetcher, sanitizer }
    }
}

#[async_trait(?Send)]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &Url) -> Result<PageResult, PageError> {
        let body = self.fetcher.fetch_html(url).await?;
        let page = self.sanitizer.extract(&body, url)?;
        Ok(page)
    }
}
