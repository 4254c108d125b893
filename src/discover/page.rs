//! The page model discovery runs against
//!
//! Discovery needs a handful of capabilities from the page it inspects:
//! selector queries over navigation anchors, scrolling of virtualized
//! sidebars, activation of collapsed tree nodes and a way to wait for the
//! document to change. [`PageModel`] scopes exactly those; [`StaticPage`]
//! implements it over a parsed HTML document.

use crate::url::resolve_href;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Container elements that add one level of sidebar nesting
const NESTING_ELEMENTS: &[&str] = &["ul", "ol", "nav"];

/// Collapsed tree nodes inside navigation containers
const COLLAPSED_TOGGLES: &str = r#"aside button[aria-expanded="false"], nav button[aria-expanded="false"], [role="navigation"] button[aria-expanded="false"], aside details:not([open]) > summary, nav details:not([open]) > summary, [role="navigation"] details:not([open]) > summary"#;

/// Opaque reference to an element of a page model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub usize);

/// Scroll extent of a container, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_height: u32,
    pub client_height: u32,
}

/// A navigation anchor as found in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavAnchor {
    /// Raw `href` attribute, unresolved
    pub href: Option<String>,

    /// Whitespace-collapsed text content
    pub text: String,

    /// Number of list/nav ancestors between the anchor and `<body>`
    pub depth: u32,
}

#[derive(Debug, Error)]
#[error("Could not activate toggle: {0}")]
pub struct ToggleError(pub String);

/// Capabilities discovery needs from the current page
#[async_trait(?Send)]
pub trait PageModel {
    /// Address of the page
    fn location(&self) -> Url;

    /// Base URL relative hrefs resolve against
    fn base_url(&self) -> Url;

    /// Non-blank document title
    fn document_title(&self) -> Option<String>;

    /// Scrollable navigation-like containers
    fn scroll_containers(&self) -> Vec<ElementHandle>;

    fn scroll_metrics(&self, container: ElementHandle) -> Option<ScrollMetrics>;

    async fn scroll_to(&mut self, container: ElementHandle, top: u32);

    /// Collapsed toggle controls inside navigation containers
    fn collapsed_toggles(&self) -> Vec<ElementHandle>;

    async fn activate_toggle(&mut self, toggle: ElementHandle) -> Result<(), ToggleError>;

    /// Anchors matching any of `selectors`, in document order
    fn anchors(&self, selectors: &[Selector]) -> Vec<NavAnchor>;

    /// Waits for the next document change
    ///
    /// Returns `false` when the document can never change again.
    async fn changed(&mut self) -> bool;
}

/// A page model over static markup
///
/// Static markup holds every sidebar item already: there is nothing to
/// scroll into view, toggles only need reporting, and the document never
/// changes.
#[derive(Debug, Clone)]
pub struct StaticPage {
    location: Url,
    document: Html,
}

impl StaticPage {
    /// Parses a page body fetched from `location`
    pub fn parse(location: Url, body: &str) -> Self {
        Self {
            location,
            document: Html::parse_document(body),
        }
    }

    fn select_all(&self, raw: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(raw) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait(?Send)]
impl PageModel for StaticPage {
    fn location(&self) -> Url {
        self.location.clone()
    }

    fn base_url(&self) -> Url {
        self.select_all("base[href]")
            .first()
            .and_then(|base| resolve_href(base.value().attr("href"), &self.location))
            .unwrap_or_else(|| self.location.clone())
    }

    fn document_title(&self) -> Option<String> {
        self.select_all("title")
            .first()
            .map(|title| collapse_whitespace(title.text()))
            .filter(|title| !title.is_empty())
    }

    fn scroll_containers(&self) -> Vec<ElementHandle> {
        Vec::new()
    }

    fn scroll_metrics(&self, _container: ElementHandle) -> Option<ScrollMetrics> {
        None
    }

    async fn scroll_to(&mut self, _container: ElementHandle, _top: u32) {}

    fn collapsed_toggles(&self) -> Vec<ElementHandle> {
        (0..self.select_all(COLLAPSED_TOGGLES).len())
            .map(ElementHandle)
            .collect()
    }

    async fn activate_toggle(&mut self, toggle: ElementHandle) -> Result<(), ToggleError> {
        // Collapsed children are part of the markup already
        if toggle.0 < self.select_all(COLLAPSED_TOGGLES).len() {
            Ok(())
        } else {
            Err(ToggleError(format!("no toggle #{}", toggle.0)))
        }
    }

    fn anchors(&self, selectors: &[Selector]) -> Vec<NavAnchor> {
        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| selectors.iter().any(|selector| selector.matches(element)))
            .map(|anchor| NavAnchor {
                href: anchor.value().attr("href").map(str::to_string),
                text: collapse_whitespace(anchor.text()),
                depth: nesting_depth(anchor),
            })
            .collect()
    }

    async fn changed(&mut self) -> bool {
        false
    }
}

/// Counts list/nav ancestors up to (not including) `<body>`
fn nesting_depth(element: ElementRef) -> u32 {
    let mut depth = 0;
    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        let name = ancestor.value().name();
        if name == "body" {
            break;
        }
        if NESTING_ELEMENTS.contains(&name) {
            depth += 1;
        }
    }
    depth
}

fn collapse_whitespace<'a>(text: impl Iterator<Item = &'a str>) -> String {
    text.flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
