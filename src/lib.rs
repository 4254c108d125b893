//! DocuPrint: a documentation site, printed as one book
//!
//! This crate walks a documentation site's sidebar navigation, fetches every
//! linked page, extracts and sanitizes the main content of each, and assembles
//! a single printable HTML document with a nested table of contents.

pub mod assemble;
pub mod config;
pub mod crawler;
pub mod delivery;
pub mod discover;
pub mod host;
pub mod protocol;
pub mod session;
pub mod url;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DocuPrint operations
#[derive(Debug, Error)]
pub enum DocuError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Crawl failed: {0}")]
    Crawl(#[from] CrawlFailure),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,
}

/// Retrieval failure, reported once every attempt has been spent
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url} after {attempts} attempt(s)")]
    Status {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("Network error for {url} after {attempts} attempt(s): {source}")]
    Network {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },
}

/// Content extraction failure for a page that was retrieved fine
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("No content selector matched on {url}")]
    NoContent { url: String },
}

/// Everything that can go wrong for a single crawled page
///
/// The scheduler turns any of these into a placeholder page; none of them
/// aborts a crawl.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Retrieval(#[from] FetchError),

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

/// The printable document could not be handed over
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Could not open {target}: {reason}")]
    Blocked { target: String, reason: String },
}

/// Crawl-level terminal failures, as reported to the host
///
/// Serializes to the wire reason strings (`busy`, `no-links`, ...).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlFailure {
    #[error("A crawl is already running")]
    Busy,

    #[error("No crawlable links were found on this page")]
    NoLinks,

    #[error("The crawl was cancelled")]
    Cancelled,

    #[error("The print document could not be opened; allow pop-ups or pick a writable output and try again")]
    DeliveryBlocked,
}

/// Result type alias for DocuPrint operations
pub type Result<T> = std::result::Result<T, DocuError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlConfig};
pub use crawler::{LinkEntry, PageResult};
pub use session::{Controller, SessionState};
pub use url::{extract_domain, parse_page_url, resolve_href, strip_fragment};
