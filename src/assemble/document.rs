//! Printable document shell

use crate::assemble::toc::build_toc;
use crate::assemble::PreparedPage;
use chrono::NaiveDate;
use url::Url;

/// Cover title used when the site has no title
pub const FALLBACK_SITE_TITLE: &str = "Documentation";

const PRINT_STYLE: &str = r#"  <style>
    body {
      margin: 0 auto;
      padding: 24px;
      max-width: 1080px;
      background: #f9fafb;
      color: #0f172a;
      font-family: "Segoe UI", system-ui, -apple-system, sans-serif;
      line-height: 1.6;
    }
    a { color: #0f172a; }
    h1, h2, h3 { color: #0f172a; }
    .cover { padding: 80px 0 40px; text-align: center; }
    .cover h1 { font-size: 36px; margin: 0 0 12px; }
    .cover p { margin: 0; color: #475569; }
    .toc-container { margin: 40px 0; }
    .toc-container ul { list-style: none; padding-left: 0; margin: 0; }
    .toc-container li { margin: 6px 0; }
    .toc-container ul ul { margin-left: 12px; border-left: 1px solid #e2e8f0; padding-left: 12px; }
    .toc-container a { text-decoration: none; }
    .chapter-wrapper { margin: 60px 0; }
    .chapter-wrapper > h1 { border-bottom: 1px solid #e2e8f0; padding-bottom: 8px; }
    pre, code { font-family: "JetBrains Mono", Monaco, Consolas, monospace; }
    img { max-width: 100%; height: auto; }
    .docuprint-error { padding: 12px; border: 1px solid #fecdd3; background: #fff4f2; color: #9f1239; }
    @media print {
      @page { size: A4; margin: 20mm; }
      body { background: white; color: #000; max-width: none; width: auto; margin: 0 auto; }
      a { text-decoration: none; color: #000; }
      .chapter-wrapper { page-break-after: always; }
      h1, h2, h3 { page-break-after: avoid; }
      pre, img, blockquote { page-break-inside: avoid; }
      .toc-container { page-break-after: always; }
    }
  </style>
"#;

/// Waits for every image to load or fail, then opens the print dialog after
/// a settle delay
const PRINT_SCRIPT: &str = r#"  <script>
    (function () {
      function settled(img) {
        if (img.complete) return Promise.resolve();
        return new Promise(function (resolve) {
          img.addEventListener("load", resolve, { once: true });
          img.addEventListener("error", resolve, { once: true });
        });
      }
      window.addEventListener("load", function () {
        Promise.all(Array.from(document.images).map(settled)).then(function () {
          setTimeout(function () { window.print(); }, 1000);
        });
      });
    })();
  </script>
"#;

/// Everything that goes into one printable document
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub site_title: &'a str,
    pub pages: &'a [PreparedPage],
    pub stylesheets: &'a [Url],
    pub generated_on: NaiveDate,
}

impl Document<'_> {
    /// Renders the self-contained HTML document
    pub fn render(&self) -> String {
        let site_title = if self.site_title.trim().is_empty() {
            FALLBACK_SITE_TITLE
        } else {
            self.site_title.trim()
        };
        let site_title = html_escape::encode_text(site_title);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("  <title>{} - DocuPrint</title>\n", site_title));
        for href in self.stylesheets {
            html.push_str(&format!(
                "  <link rel=\"stylesheet\" href=\"{}\">\n",
                html_escape::encode_double_quoted_attribute(href.as_str())
            ));
        }
        html.push_str(PRINT_STYLE);
        html.push_str("</head>\n<body>\n");

        // Cover
        html.push_str("  <section class=\"cover\">\n");
        html.push_str(&format!("    <h1>{}</h1>\n", site_title));
        html.push_str(&format!(
            "    <p>Generated on {}</p>\n",
            self.generated_on.format("%Y-%m-%d")
        ));
        html.push_str("  </section>\n");

        html.push_str(&build_toc(self.pages));
        html.push('\n');

        html.push_str("<main class=\"chapters\">\n");
        for page in self.pages {
            html.push_str(&render_chapter(page));
            html.push('\n');
        }
        html.push_str("</main>\n");

        html.push_str(PRINT_SCRIPT);
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// One chapter: the anchored section, its heading and the page content as-is
fn render_chapter(page: &PreparedPage) -> String {
    format!(
        "<section id=\"{}\" class=\"chapter-wrapper\">\n  <h1>{}</h1>\n  {}\n</section>",
        html_escape::encode_double_quoted_attribute(&page.anchor_id),
        html_escape::encode_text(page.display_title()),
        page.page.html
    )
}
