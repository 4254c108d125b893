//! Integration tests for the crawl pipeline
//!
//! These tests use wiremock to serve a small documentation site and run
//! discovery, fetching, assembly and delivery end-to-end.

use docuprint::config::{load_config, Config, CrawlConfig};
use docuprint::crawler::{build_http_client, Fetcher, HttpPageSource, Sanitizer};
use docuprint::delivery::{FileDelivery, MemoryDelivery};
use docuprint::discover::{Discoverer, StaticPage};
use docuprint::protocol::{CoreMessage, EventSink, StartStatus};
use docuprint::{Controller, CrawlFailure};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sidebar of the mock site: Intro and API at the top level, Setup nested
/// under Intro
const SIDEBAR: &str = r#"
<aside>
  <a href="/docs/intro">Intro</a>
  <ul><li><a href="/docs/setup#install">Setup</a></li></ul>
  <a href="/docs/api">API Reference</a>
  <a href="/docs/intro#faq">Intro FAQ</a>
</aside>"#;

fn doc_page(title: &str, own_css: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head>
  <title>{title} | Example Docs</title>
  <link rel="stylesheet" href="/css/site.css">
  <link rel="stylesheet" href="{own_css}">
</head><body>
  {SIDEBAR}
  <main>
    <h1>{title}</h1>
    <div class="breadcrumb">Docs / {title}</div>
    {body}
    <script>trackPageView()</script>
  </main>
</body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts the three pages of the mock site
async fn mount_site(server: &MockServer) {
    mount_page(
        server,
        "/docs/intro",
        doc_page(
            "Intro",
            "/css/intro.css",
            r#"<p>Welcome. See <a href="setup">setup</a>.</p><img data-src="/img/arch.png" src="/img/blank.gif" loading="lazy">"#,
        ),
    )
    .await;
    mount_page(
        server,
        "/docs/setup",
        doc_page("Setup", "/css/site.css", "<pre><code>cargo install</code></pre>"),
    )
    .await;
    mount_page(
        server,
        "/docs/api",
        doc_page("API Reference", "https://cdn.example.net/api.css", "<p>Endpoints</p>"),
    )
    .await;
}

fn crawl_config() -> CrawlConfig {
    CrawlConfig {
        retry_backoff_ms: 1,
        ..CrawlConfig::default()
    }
}

/// Fetches the start page and builds the page model for it
async fn start_page(fetcher: &Fetcher, url: &Url) -> StaticPage {
    let body = fetcher.fetch_html(url).await.expect("start page");
    StaticPage::parse(url.clone(), &body)
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<CoreMessage>) -> Vec<CoreMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

#[tokio::test]
async fn test_full_crawl_writes_printable_document() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let config = Config::default();
    let site = crawl_config();
    let client = build_http_client(&config.client).unwrap();
    let fetcher = Fetcher::new(client, &site);
    let start_url = Url::parse(&format!("{}/docs/intro", server.uri())).unwrap();
    let mut page = start_page(&fetcher, &start_url).await;

    let dir = tempdir().unwrap();
    let output = dir.path().join("book.html");
    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site).unwrap());
    let (events, mut rx) = EventSink::channel();
    let controller =
        Controller::new(site, source, FileDelivery::new(output.clone()), events).unwrap();

    let status = controller.start(&mut page).await;
    assert_eq!(status, StartStatus::ok());

    let html = std::fs::read_to_string(&output).unwrap();

    // Three chapters with unique anchors, in sidebar order
    assert_eq!(html.matches("class=\"chapter-wrapper\"").count(), 3);
    let intro = html.find("<section id=\"intro\"").unwrap();
    let setup = html.find("<section id=\"setup\"").unwrap();
    let api = html.find("<section id=\"api-reference\"").unwrap();
    assert!(intro < setup && setup < api);

    // Two-level TOC: Setup nested under Intro
    assert!(html.contains(concat!(
        r##"<ul class="toc-list level-1"><li><a href="#intro">Intro</a></li>"##,
        r##"<ul class="level-2"><li><a href="#setup">Setup</a></li></ul>"##,
        r##"<li><a href="#api-reference">API Reference</a></li></ul>"##
    )));
    assert!(!html.contains("level-3"));

    // Stylesheet union without duplicates
    let site_css = format!(r#"<link rel="stylesheet" href="{}/css/site.css">"#, server.uri());
    let intro_css = format!(r#"<link rel="stylesheet" href="{}/css/intro.css">"#, server.uri());
    assert_eq!(html.matches(&site_css).count(), 1);
    assert_eq!(html.matches(&intro_css).count(), 1);
    assert_eq!(
        html.matches(r#"<link rel="stylesheet" href="https://cdn.example.net/api.css">"#)
            .count(),
        1
    );

    // Sanitized content with absolute links and images
    assert!(!html.contains("trackPageView"));
    assert!(!html.contains("Docs / Intro"));
    assert!(html.contains(&format!(r#"href="{}/docs/setup""#, server.uri())));
    assert!(html.contains(&format!(r#"src="{}/img/arch.png""#, server.uri())));
    assert!(!html.contains("blank.gif"));

    // Cover uses the start page's title
    assert!(html.contains("<h1>Intro | Example Docs</h1>"));

    let messages = drain(&mut rx);
    assert_eq!(messages.last(), Some(&CoreMessage::Ready));
    assert!(messages.contains(&CoreMessage::Progress {
        current: 2,
        total: 3,
        note: "Processing \"Setup\"...".to_string(),
    }));
}

#[tokio::test]
async fn test_failed_page_becomes_placeholder() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/intro",
        doc_page("Intro", "/css/intro.css", "<p>Welcome</p>"),
    )
    .await;
    mount_page(
        &server,
        "/docs/setup",
        doc_page("Setup", "/css/site.css", "<p>Install</p>"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/api"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let site = crawl_config();
    let client = build_http_client(&Config::default().client).unwrap();
    let fetcher = Fetcher::new(client, &site);
    let start_url = Url::parse(&format!("{}/docs/intro", server.uri())).unwrap();
    let mut page = start_page(&fetcher, &start_url).await;

    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site).unwrap());
    let delivery = MemoryDelivery::new();
    let (events, mut rx) = EventSink::channel();
    let controller = Controller::new(site, source, delivery, events).unwrap();

    let status = controller.start(&mut page).await;
    assert_eq!(status, StartStatus::ok());

    let failed_url = format!("{}/docs/api", server.uri());
    let messages = drain(&mut rx);
    assert!(messages.contains(&CoreMessage::Progress {
        current: 3,
        total: 3,
        note: format!("Skipped failed page: {}", failed_url),
    }));
    assert_eq!(messages.last(), Some(&CoreMessage::Ready));
}

#[tokio::test]
async fn test_page_without_content_becomes_placeholder() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/intro",
        doc_page("Intro", "/css/intro.css", "<p>Welcome</p>"),
    )
    .await;
    mount_page(
        &server,
        "/docs/setup",
        format!("<html><body>{}<div id=\"app\"></div></body></html>", SIDEBAR),
    )
    .await;
    mount_page(
        &server,
        "/docs/api",
        doc_page("API Reference", "/css/api.css", "<p>Endpoints</p>"),
    )
    .await;

    let site = crawl_config();
    let client = build_http_client(&Config::default().client).unwrap();
    let fetcher = Fetcher::new(client, &site);
    let start_url = Url::parse(&format!("{}/docs/intro", server.uri())).unwrap();
    let mut page = start_page(&fetcher, &start_url).await;

    let dir = tempdir().unwrap();
    let output = dir.path().join("book.html");
    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site).unwrap());
    let controller = Controller::new(
        site,
        source,
        FileDelivery::new(output.clone()),
        EventSink::detached(),
    )
    .unwrap();

    assert_eq!(controller.start(&mut page).await, StartStatus::ok());

    let html = std::fs::read_to_string(&output).unwrap();
    assert_eq!(html.matches("class=\"chapter-wrapper\"").count(), 3);
    assert!(html.contains(&format!(
        r#"<div class="docuprint-error">[Error: failed to fetch this page - {}/docs/setup]</div>"#,
        server.uri()
    )));
    assert!(html.contains("<h1>Fetch failed</h1>"));
}

#[tokio::test]
async fn test_page_without_sidebar_prints_itself() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/notes",
        r#"<html><head><title>Release Notes</title></head>
           <body><article><h1>Release Notes</h1><p>v1.0</p></article></body></html>"#
            .to_string(),
    )
    .await;

    let site = crawl_config();
    let client = build_http_client(&Config::default().client).unwrap();
    let fetcher = Fetcher::new(client, &site);
    let start_url = Url::parse(&format!("{}/notes#latest", server.uri())).unwrap();
    let mut page = start_page(&fetcher, &start_url).await;

    let entries = Discoverer::new(&site).unwrap().discover(&mut page).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, 1);
    assert_eq!(entries[0].title, "Release Notes");
    assert_eq!(entries[0].url.as_str(), format!("{}/notes", server.uri()));

    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site).unwrap());
    let controller =
        Controller::new(site, source, MemoryDelivery::new(), EventSink::detached()).unwrap();
    assert_eq!(controller.start(&mut page).await, StartStatus::ok());
}

#[tokio::test]
async fn test_blocked_delivery_is_reported() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let site = crawl_config();
    let client = build_http_client(&Config::default().client).unwrap();
    let fetcher = Fetcher::new(client, &site);
    let start_url = Url::parse(&format!("{}/docs/intro", server.uri())).unwrap();
    let mut page = start_page(&fetcher, &start_url).await;

    let dir = tempdir().unwrap();
    let unwritable = dir.path().join("no-such-dir").join("book.html");
    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site).unwrap());
    let (events, mut rx) = EventSink::channel();
    let controller = Controller::new(site, source, FileDelivery::new(unwritable), events).unwrap();

    let status = controller.start(&mut page).await;
    assert_eq!(status, StartStatus::failed(CrawlFailure::DeliveryBlocked));
    assert!(controller.take_undelivered().is_some());
    assert!(drain(&mut rx).contains(&CoreMessage::Error {
        error: CrawlFailure::DeliveryBlocked.to_string()
    }));
}

#[tokio::test]
async fn test_site_table_overrides_selectors() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/handbook",
        r#"<html><head><title>Handbook</title></head><body>
           <div class="toc"><a href="/handbook/one">One</a><a href="/handbook/two">Two</a></div>
           <div class="doc-body"><p>Start</p></div></body></html>"#
            .to_string(),
    )
    .await;
    for (route, text) in [("/handbook/one", "First"), ("/handbook/two", "Second")] {
        mount_page(
            &server,
            route,
            format!(
                r#"<html><body><div class="doc-body"><h1>{text}</h1><span class="edit">Edit</span></div></body></html>"#
            ),
        )
        .await;
    }

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[default]
retry-backoff-ms = 1

[[site]]
host = "127.0.0.1"
sidebar-selectors = [".toc a"]
content-selectors = [".doc-body"]
exclude-selectors = [".edit"]
concurrency = 2
"#,
    )
    .unwrap();
    file.flush().unwrap();
    let config = load_config(file.path()).unwrap();

    let start_url = Url::parse(&format!("{}/handbook", server.uri())).unwrap();
    let site = config.for_url(&start_url);
    assert_eq!(site.concurrency, 2);

    let client = build_http_client(&config.client).unwrap();
    let fetcher = Fetcher::new(client, &site);
    let mut page = start_page(&fetcher, &start_url).await;

    let dir = tempdir().unwrap();
    let output = dir.path().join("handbook.html");
    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site).unwrap());
    let controller = Controller::new(
        site,
        source,
        FileDelivery::new(output.clone()),
        EventSink::detached(),
    )
    .unwrap();

    assert_eq!(controller.start(&mut page).await, StartStatus::ok());

    let html = std::fs::read_to_string(&output).unwrap();
    assert_eq!(html.matches("class=\"chapter-wrapper\"").count(), 3);
    assert!(html.contains("<h1>First</h1>"));
    assert!(html.contains("<h1>Second</h1>"));
    assert!(!html.contains(r#"class="edit""#));
}
