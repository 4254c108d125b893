/// Checks whether a site table host pattern applies to a host
///
/// Two pattern forms are supported:
/// 1. Exact host: `"docs.rs"` matches only `docs.rs`
/// 2. Wildcard: `"*.readthedocs.io"` matches `readthedocs.io` and any host
///    below it (`foo.readthedocs.io`, `en.foo.readthedocs.io`)
///
/// Comparison ignores ASCII case on both sides.
///
/// # Examples
///
/// ```
/// use docuprint::url::matches_host;
///
/// assert!(matches_host("docs.rs", "docs.rs"));
/// assert!(matches_host("*.readthedocs.io", "pip.readthedocs.io"));
/// assert!(!matches_host("*.readthedocs.io", "readthedocs.org"));
/// ```
pub fn matches_host(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => host == pattern,
    }
}
