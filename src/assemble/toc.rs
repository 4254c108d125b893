//! Nested table of contents

use crate::assemble::PreparedPage;

/// Heading of the table of contents section
pub const TOC_HEADING: &str = "Contents";

/// Builds the nested TOC list
///
/// A level cursor starts at 1. Before each entry, nested lists are opened
/// up to the entry's level or closed down to it; everything still open is
/// closed at the end. Levels below 1 are treated as 1.
pub fn build_toc_list(pages: &[PreparedPage]) -> String {
    let mut current = 1;
    let mut html = String::from(r#"<ul class="toc-list level-1">"#);

    for page in pages {
        let level = page.level.max(1);
        while current < level {
            current += 1;
            html.push_str(&format!(r#"<ul class="level-{}">"#, current));
        }
        while current > level {
            html.push_str("</ul>");
            current -= 1;
        }
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a></li>"##,
            html_escape::encode_double_quoted_attribute(&page.anchor_id),
            html_escape::encode_text(page.display_title())
        ));
    }

    while current > 1 {
        html.push_str("</ul>");
        current -= 1;
    }
    html.push_str("</ul>");
    html
}

/// Wraps the TOC list in its own section
pub fn build_toc(pages: &[PreparedPage]) -> String {
    format!(
        "<section class=\"toc-container\">\n  <h1>{}</h1>\n  {}\n</section>",
        TOC_HEADING,
        build_toc_list(pages)
    )
}
