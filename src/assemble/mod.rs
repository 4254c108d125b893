//! Document assembly
//!
//! This module turns the crawled pages into the printable document:
//! - Unique chapter anchors derived from page titles
//! - A nested table of contents mirroring the sidebar levels
//! - The document shell with cover, stylesheets, print styling and the
//!   post-load print script

mod document;
mod slug;
mod toc;

pub use document::{Document, FALLBACK_SITE_TITLE};
pub use slug::{slugify, AnchorRegistry};
pub use toc::{build_toc, build_toc_list, TOC_HEADING};

use crate::crawler::{LinkEntry, PageResult};

/// A crawled page with its chapter anchor and TOC level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPage {
    pub page: PageResult,
    pub anchor_id: String,
    pub level: u32,
}

impl PreparedPage {
    /// Title shown in the TOC and chapter heading; the URL if the title is blank
    pub fn display_title(&self) -> &str {
        if self.page.title.trim().is_empty() {
            self.page.url.as_str()
        } else {
            &self.page.title
        }
    }
}

/// Assigns anchors and levels to crawled pages, in crawl order
///
/// `entries` is the sidebar list the pages were crawled from; page `i`
/// takes the level of entry `i` (1 if there is no such entry).
pub fn prepare_pages(pages: Vec<PageResult>, entries: &[LinkEntry]) -> Vec<PreparedPage> {
    let mut anchors = AnchorRegistry::new();

    pages
        .into_iter()
        .enumerate()
        .map(|(index, page)| {
            let anchor_id = anchors.assign(&page.title, index);
            let level = entries.get(index).map_or(1, |entry| entry.level.max(1));
            PreparedPage {
                page,
                anchor_id,
                level,
            }
        })
        .collect()
}
