use url::Url;

/// Resolves an `href`/`src` value against a base URL
///
/// Returns `None` for missing, blank or unresolvable values. Any scheme the
/// URL parser accepts is kept, so `mailto:` or `data:` values survive
/// rewriting untouched.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docuprint::url::resolve_href;
///
/// let base = Url::parse("https://docs.example.com/guide/intro").unwrap();
/// let url = resolve_href(Some("../api/"), &base).unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/api/");
/// ```
pub fn resolve_href(href: Option<&str>, base: &Url) -> Option<Url> {
    let href = href?.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok()
}

/// Resolves a navigation link to a crawlable page URL
///
/// Like [`resolve_href`], but only HTTP(S) targets qualify and the fragment
/// is stripped, giving the identity used to deduplicate sidebar entries.
pub fn resolve_page_link(href: Option<&str>, base: &Url) -> Option<Url> {
    let url = resolve_href(href, base)?;
    match url.scheme() {
        "http" | "https" => Some(strip_fragment(&url)),
        _ => None,
    }
}

/// Returns a copy of `url` without its fragment
pub fn strip_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}
