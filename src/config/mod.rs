//! Configuration module for DocuPrint
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and resolving the per-site crawl configuration from the site table.
//!
//! # Example
//!
//! ```no_run
//! use docuprint::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docuprint.toml")).unwrap();
//! let site = config.for_host("docs.example.com");
//! println!("Crawling with {} workers", site.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, CrawlConfig, SiteEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{compile_selector_list, validate};
