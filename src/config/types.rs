use crate::url::{extract_domain, matches_host};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for DocuPrint
///
/// Every table is optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    /// The crawl configuration used for hosts without a site entry
    #[serde(default)]
    pub default: CrawlConfig,

    /// Site table, searched in order; the first matching host wins
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

impl Config {
    /// Resolves the crawl configuration for a host
    ///
    /// The first site entry whose pattern matches `host` is layered over the
    /// default configuration. Hosts without an entry get the default as-is.
    pub fn for_host(&self, host: &str) -> CrawlConfig {
        match self.sites.iter().find(|site| matches_host(&site.host, host)) {
            Some(site) => {
                tracing::debug!("Using site configuration '{}' for {}", site.host, host);
                self.default.with_overrides(site)
            }
            None => self.default.clone(),
        }
    }

    /// Resolves the crawl configuration for the site hosting `url`
    pub fn for_url(&self, url: &Url) -> CrawlConfig {
        match extract_domain(url) {
            Some(host) => self.for_host(&host),
            None => self.default.clone(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Cookie header sent with every request, for sites behind a login
    pub cookie: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("DocuPrint/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            cookie: None,
        }
    }
}

/// Per-site crawl configuration
///
/// Constructed before a crawl starts and read-only for its whole duration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Selectors for sidebar navigation anchors, matched as one group
    #[serde(rename = "sidebar-selectors")]
    pub sidebar_selectors: Vec<String>,

    /// Content root selectors, tried in order; the first match wins
    #[serde(rename = "content-selectors")]
    pub content_selectors: Vec<String>,

    /// Elements removed from the extracted content
    #[serde(rename = "exclude-selectors")]
    pub exclude_selectors: Vec<String>,

    /// Number of concurrent fetch workers
    pub concurrency: usize,

    /// Pause each worker takes between two claims (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Maximum number of sidebar entries kept
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Total attempts per page before it is given up
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Backoff unit; attempt `n` waits `n` units before retrying
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// How long discovery waits for sidebar anchors to appear
    #[serde(rename = "mutation-timeout-ms")]
    pub mutation_timeout_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            sidebar_selectors: vec!["aside a".to_string()],
            content_selectors: vec![
                "main".to_string(),
                "article".to_string(),
                ".content".to_string(),
            ],
            exclude_selectors: vec![
                ".ad".to_string(),
                ".ads".to_string(),
                ".advertisement".to_string(),
                ".comments".to_string(),
                ".comment".to_string(),
                ".breadcrumb".to_string(),
            ],
            concurrency: 5,
            delay_ms: 0,
            max_pages: 200,
            retry_attempts: 3,
            retry_backoff_ms: 400,
            mutation_timeout_ms: 5000,
        }
    }
}

impl CrawlConfig {
    /// Returns a copy with every override present in `site` applied
    pub fn with_overrides(&self, site: &SiteEntry) -> Self {
        let mut merged = self.clone();
        if let Some(selectors) = &site.sidebar_selectors {
            merged.sidebar_selectors = selectors.clone();
        }
        if let Some(selectors) = &site.content_selectors {
            merged.content_selectors = selectors.clone();
        }
        if let Some(selectors) = &site.exclude_selectors {
            merged.exclude_selectors = selectors.clone();
        }
        if let Some(concurrency) = site.concurrency {
            merged.concurrency = concurrency;
        }
        if let Some(delay_ms) = site.delay_ms {
            merged.delay_ms = delay_ms;
        }
        merged
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_millis(self.mutation_timeout_ms)
    }
}

/// One row of the site table
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Host pattern (e.g., "docs.example.com" or "*.gitbook.io")
    pub host: String,

    #[serde(default, rename = "sidebar-selectors")]
    pub sidebar_selectors: Option<Vec<String>>,

    #[serde(default, rename = "content-selectors")]
    pub content_selectors: Option<Vec<String>>,

    #[serde(default, rename = "exclude-selectors")]
    pub exclude_selectors: Option<Vec<String>>,

    #[serde(default)]
    pub concurrency: Option<usize>,

    #[serde(default, rename = "delay-ms")]
    pub delay_ms: Option<u64>,
}
