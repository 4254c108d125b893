use crate::config::types::{ClientConfig, Config, CrawlConfig, SiteEntry};
use crate::ConfigError;
use scraper::Selector;

/// Upper bound on fetch workers per crawl
const MAX_CONCURRENCY: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_crawl_config(&config.default)?;
    for site in &config.sites {
        validate_site_entry(site)?;
    }
    Ok(())
}

/// Compiles a selector list, one `Selector` per entry, preserving order
///
/// Fails on the first entry that is not a valid CSS selector.
pub fn compile_selector_list(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw).map_err(|e| ConfigError::InvalidSelector {
                selector: raw.clone(),
                message: format!("{:?}", e),
            })
        })
        .collect()
}

fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_selector_list("sidebar-selectors", &config.sidebar_selectors)?;
    validate_selector_list("content-selectors", &config.content_selectors)?;
    // An empty exclude list is fine: nothing beyond scripts and styles is removed
    compile_selector_list(&config.exclude_selectors)?;
    validate_concurrency(config.concurrency)?;

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(
            "retry-attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_site_entry(site: &SiteEntry) -> Result<(), ConfigError> {
    validate_host_pattern(&site.host)?;

    if let Some(selectors) = &site.sidebar_selectors {
        validate_selector_list("sidebar-selectors", selectors)?;
    }
    if let Some(selectors) = &site.content_selectors {
        validate_selector_list("content-selectors", selectors)?;
    }
    if let Some(selectors) = &site.exclude_selectors {
        compile_selector_list(selectors)?;
    }
    if let Some(concurrency) = site.concurrency {
        validate_concurrency(concurrency)?;
    }

    Ok(())
}

fn validate_selector_list(name: &str, selectors: &[String]) -> Result<(), ConfigError> {
    if selectors.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    compile_selector_list(selectors)?;
    Ok(())
}

fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if concurrency < 1 || concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, concurrency
        )));
    }
    Ok(())
}

/// Validates a host pattern (supports a leading `*.` wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);

    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Host pattern '{}' has no host after the wildcard",
            pattern
        )));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.')
        || host.ends_with('.')
        || host.starts_with('-')
        || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
