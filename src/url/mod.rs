//! URL handling module for DocuPrint
//!
//! This module provides href resolution, fragment stripping, host extraction
//! and wildcard host matching for the site configuration table.

mod domain;
mod matcher;
mod resolve;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_host;
pub use resolve::{resolve_href, resolve_page_link, strip_fragment};

/// Parses a user-supplied page URL into the identity used for a crawl
///
/// Only HTTP and HTTPS URLs with a host are accepted. The fragment is
/// removed, since a crawl's identity for a page never includes it.
///
/// # Examples
///
/// ```
/// use docuprint::url::parse_page_url;
///
/// let url = parse_page_url("https://docs.example.com/guide/intro#setup").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/guide/intro");
/// ```
pub fn parse_page_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(strip_fragment(&url))
}
