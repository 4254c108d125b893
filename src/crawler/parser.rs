//! Main-content extraction and sanitization
//!
//! Fetched pages are parsed as static HTML (nothing is executed). The first
//! configured content selector that matches picks the content root, which is
//! then re-serialized with scripts, styles and excluded elements left out and
//! every link and image rewritten to an absolute URL.

use crate::config::{compile_selector_list, CrawlConfig};
use crate::crawler::PageResult;
use crate::url::resolve_href;
use crate::{ConfigError, SanitizeError};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Attribute holding the real image URL on lazy-loaded images
const LAZY_SRC_ATTR: &str = "data-src";

/// Extracts and cleans the main content of fetched pages
#[derive(Debug)]
pub struct Sanitizer {
    content: Vec<Selector>,
    exclude: Vec<Selector>,
    stripped: Selector,
    heading: Selector,
    title: Selector,
    stylesheet: Selector,
}

impl Sanitizer {
    /// Compiles the content and exclude selectors of a crawl configuration
    pub fn new(config: &CrawlConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            content: compile_selector_list(&config.content_selectors)?,
            exclude: compile_selector_list(&config.exclude_selectors)?,
            stripped: fixed_selector("script, style")?,
            heading: fixed_selector("h1")?,
            title: fixed_selector("title")?,
            stylesheet: fixed_selector(r#"link[rel~="stylesheet"][href]"#)?,
        })
    }

    /// Turns a fetched body into a page
    ///
    /// # Returns
    ///
    /// * `Ok(PageResult)` - Title, sanitized content and stylesheets
    /// * `Err(SanitizeError::NoContent)` - No content selector matched
    pub fn extract(&self, body: &str, url: &Url) -> Result<PageResult, SanitizeError> {
        let document = Html::parse_document(body);

        let root = self
            .content
            .iter()
            .find_map(|selector| document.select(selector).next())
            .ok_or_else(|| SanitizeError::NoContent {
                url: url.to_string(),
            })?;

        let removed = self.removed_nodes(root);
        let mut html = String::new();
        write_element(&mut html, root, &removed, url);

        Ok(PageResult {
            title: self.page_title(&document, url),
            url: url.clone(),
            html,
            stylesheets: self.stylesheets(&document, url),
            failed: false,
        })
    }

    /// First `<h1>` text, else the document title, else the URL
    fn page_title(&self, document: &Html, url: &Url) -> String {
        document
            .select(&self.heading)
            .next()
            .and_then(element_text)
            .or_else(|| extract_title(document, &self.title))
            .unwrap_or_else(|| url.to_string())
    }

    /// Nodes under `root` (never `root` itself) that are dropped from the output
    fn removed_nodes(&self, root: ElementRef) -> HashSet<NodeId> {
        std::iter::once(&self.stripped)
            .chain(self.exclude.iter())
            .flat_map(|selector| root.select(selector))
            .map(|element| element.id())
            .filter(|id| *id != root.id())
            .collect()
    }

    /// Stylesheet links of the whole document, resolved and deduplicated
    fn stylesheets(&self, document: &Html, url: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        document
            .select(&self.stylesheet)
            .filter_map(|link| resolve_href(link.value().attr("href"), url))
            .filter(|href| seen.insert(href.clone()))
            .collect()
    }
}

/// Extracts the `<title>` of a document, if it has a non-blank one
pub fn extract_title(document: &Html, title: &Selector) -> Option<String> {
    document.select(title).next().and_then(element_text)
}

/// Whitespace-collapsed text content, `None` when blank
fn element_text(element: ElementRef) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn fixed_selector(raw: &str) -> Result<Selector, ConfigError> {
    compile_selector_list(&[raw.to_string()]).map(|mut list| list.remove(0))
}

fn write_element(out: &mut String, element: ElementRef, removed: &HashSet<NodeId>, page_url: &Url) {
    let name = element.value().name();

    out.push('<');
    out.push_str(name);
    for (attr, value) in rewritten_attributes(element, page_url) {
        out.push(' ');
        out.push_str(&attr);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
            Node::Element(_) if !removed.contains(&child.id()) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(out, child, removed, page_url);
                }
            }
            // Comments, excluded elements and doctype-like nodes are dropped
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Attributes of `element` with links and images made absolute
///
/// Attributes are sorted by name so the same page always serializes the
/// same way.
fn rewritten_attributes(element: ElementRef, page_url: &Url) -> Vec<(String, String)> {
    let value = element.value();
    let mut attrs: Vec<(String, String)> = value
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    match value.name() {
        "img" => {
            let source = value
                .attr(LAZY_SRC_ATTR)
                .filter(|lazy| !lazy.trim().is_empty())
                .or_else(|| value.attr("src"));
            if let Some(absolute) = resolve_href(source, page_url) {
                attrs.retain(|(name, _)| name != "src");
                attrs.push(("src".to_string(), absolute.to_string()));
            }
            attrs.retain(|(name, _)| name != "loading");
        }
        "a" => {
            if let Some(absolute) = resolve_href(value.attr("href"), page_url) {
                for (name, href) in attrs.iter_mut() {
                    if name == "href" {
                        *href = absolute.to_string();
                    }
                }
            }
        }
        _ => {}
    }

    attrs.sort();
    attrs
}
