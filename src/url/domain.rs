use url::Url;

/// Extracts the lowercase host of a URL, as used for site configuration lookup
///
/// Ports are not part of the result: `docs.example.com:8443` resolves the same
/// site entry as `docs.example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docuprint::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com:8443/guide").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
