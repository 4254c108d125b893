//! Sidebar link discovery
//!
//! Turns the navigation tree of the current page into the ordered, leveled
//! and deduplicated list of pages a crawl visits:
//!
//! 1. Scroll virtualized sidebars so every item renders
//! 2. Expand collapsed tree nodes
//! 3. Collect sidebar anchors, waiting for them to appear if needed
//! 4. Resolve, deduplicate and level them, rooted at the current page

mod page;

pub use page::{ElementHandle, NavAnchor, PageModel, ScrollMetrics, StaticPage, ToggleError};

use crate::config::{compile_selector_list, CrawlConfig};
use crate::url::{resolve_page_link, strip_fragment};
use crate::ConfigResult;
use scraper::Selector;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Title of the current page's entry when the document has none
pub const SELF_FALLBACK_TITLE: &str = "Current page";

/// Smallest scroll increment (pixels)
const MIN_SCROLL_STEP: u32 = 200;

/// Pause after each scroll increment so virtualized lists can render
const SCROLL_SETTLE: Duration = Duration::from_millis(50);

/// One page of the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Absolute URL without fragment, unique within a crawl
    pub url: Url,

    pub title: String,

    /// Nesting level, 1 for the outermost entries
    pub level: u32,
}

/// Finds the pages of a crawl in the current page's sidebar
#[derive(Debug)]
pub struct Discoverer {
    sidebar: Vec<Selector>,
    max_pages: usize,
    mutation_timeout: Duration,
}

impl Discoverer {
    pub fn new(config: &CrawlConfig) -> ConfigResult<Self> {
        Ok(Self {
            sidebar: compile_selector_list(&config.sidebar_selectors)?,
            max_pages: config.max_pages,
            mutation_timeout: config.mutation_timeout(),
        })
    }

    /// Runs a full discovery pass over `page`
    ///
    /// Always yields at least the current page itself, at level 1 when the
    /// sidebar does not list it.
    pub async fn discover<P: PageModel>(&self, page: &mut P) -> Vec<LinkEntry> {
        reveal_virtualized_items(page).await;
        expand_collapsed_nodes(page).await;

        let anchors = self.collect_anchors(page).await;
        let mut entries = build_link_entries(
            &anchors,
            &page.base_url(),
            &page.location(),
            page.document_title(),
        );

        if entries.len() > self.max_pages {
            tracing::info!(
                "Sidebar lists {} pages, keeping the first {}",
                entries.len(),
                self.max_pages
            );
            entries.truncate(self.max_pages);
        }

        tracing::info!("Discovered {} pages", entries.len());
        entries
    }

    /// Collects sidebar anchors, waiting for the first to show up if none
    /// are present yet
    async fn collect_anchors<P: PageModel>(&self, page: &mut P) -> Vec<NavAnchor> {
        let anchors = page.anchors(&self.sidebar);
        if !anchors.is_empty() {
            return anchors;
        }

        tracing::debug!(
            "No sidebar anchors yet, watching for up to {:?}",
            self.mutation_timeout
        );

        let sidebar = &self.sidebar;
        let watch = async {
            while page.changed().await {
                let anchors = page.anchors(sidebar);
                if !anchors.is_empty() {
                    return anchors;
                }
            }
            Vec::new()
        };

        match tokio::time::timeout(self.mutation_timeout, watch).await {
            Ok(anchors) => anchors,
            Err(_) => page.anchors(&self.sidebar),
        }
    }
}

/// Scrolls every scrollable sidebar from top to bottom, then back to the top
async fn reveal_virtualized_items<P: PageModel>(page: &mut P) {
    for container in page.scroll_containers() {
        let metrics = match page.scroll_metrics(container) {
            Some(metrics) => metrics,
            None => continue,
        };
        let step = (metrics.client_height / 2).max(MIN_SCROLL_STEP);

        let mut top = 0;
        while top < metrics.scroll_height {
            tracing::trace!("Scrolling container {:?} to {}", container, top);
            page.scroll_to(container, top).await;
            tokio::time::sleep(SCROLL_SETTLE).await;
            top = top.saturating_add(step);
        }
        page.scroll_to(container, 0).await;
    }
}

/// Activates every collapsed toggle; failures are logged and skipped
async fn expand_collapsed_nodes<P: PageModel>(page: &mut P) {
    for toggle in page.collapsed_toggles() {
        if let Err(e) = page.activate_toggle(toggle).await {
            tracing::warn!("Skipping toggle {:?}: {}", toggle, e);
        }
    }
}

/// Builds the crawl's entry list from raw sidebar anchors
///
/// Anchors without a resolvable HTTP(S) `href` are skipped, as are repeats
/// of an already-seen URL (fragments ignored). The current page is
/// prepended when the sidebar does not list it.
pub fn build_link_entries(
    anchors: &[NavAnchor],
    base: &Url,
    location: &Url,
    document_title: Option<String>,
) -> Vec<LinkEntry> {
    let mut seen = HashSet::new();
    let mut found: Vec<(Url, String, u32)> = Vec::new();

    for anchor in anchors {
        let url = match resolve_page_link(anchor.href.as_deref(), base) {
            Some(url) => url,
            None => continue,
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        let title = if anchor.text.trim().is_empty() {
            url.to_string()
        } else {
            anchor.text.trim().to_string()
        };
        found.push((url, title, anchor.depth));
    }

    let current = strip_fragment(location);
    if !seen.contains(&current) {
        let title = document_title.unwrap_or_else(|| SELF_FALLBACK_TITLE.to_string());
        found.insert(0, (current, title, 0));
    }

    let depths: Vec<u32> = found.iter().map(|(_, _, depth)| *depth).collect();
    found
        .into_iter()
        .zip(rebase_levels(&depths))
        .map(|((url, title, _), level)| LinkEntry { url, title, level })
        .collect()
}

/// Maps sidebar depths to levels
///
/// Depth 0 (the current page when the sidebar does not list it) is level 1
/// and every other entry keeps its distance from it, so depths `{0, 2, 3}`
/// become levels `{1, 3, 4}`.
pub fn rebase_levels(depths: &[u32]) -> Vec<u32> {
    depths
        .iter()
        .map(|depth| depth.saturating_add(1))
        .collect()
}
