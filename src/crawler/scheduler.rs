//! Bounded worker pool that drives a crawl
//!
//! This module handles:
//! - Running a fixed number of fetch workers over the sidebar entries
//! - Claiming entries through a shared cursor, exactly once each
//! - Substituting placeholders for failed pages
//! - Per-worker pacing between claims
//! - Cooperative cancellation, checked before every claim
//!
//! Workers are futures polled together on the current task, not spawned
//! tasks, so they interleave only at their await points.

use crate::config::CrawlConfig;
use crate::crawler::{LinkEntry, PageResult, PageSource};
use crate::protocol::EventSink;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Shared cancellation request
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks running workers to stop claiming entries
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag before a new crawl
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What a finished (or abandoned) crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// One slot per entry, positionally aligned; `None` only for entries
    /// never claimed because of cancellation
    pub pages: Vec<Option<PageResult>>,

    /// Union of every page's stylesheets, in page order, without duplicates
    pub stylesheets: Vec<Url>,

    /// Whether cancellation was observed
    pub cancelled: bool,
}

impl CrawlOutcome {
    /// Returns the pages of a complete crawl
    ///
    /// A cancelled crawl is void, even when some of its slots are filled.
    pub fn into_pages(self) -> Option<Vec<PageResult>> {
        if self.cancelled {
            return None;
        }
        self.pages.into_iter().collect()
    }
}

/// Runs fetch workers over a list of sidebar entries
pub struct Scheduler<'a, S: PageSource> {
    source: &'a S,
    concurrency: usize,
    delay: Duration,
    cancel: CancelFlag,
    events: EventSink,
}

impl<'a, S: PageSource> Scheduler<'a, S> {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `source` - Fetches and sanitizes single pages
    /// * `config` - Supplies the worker count and per-worker delay
    /// * `cancel` - Checked before every claim
    /// * `events` - Receives a progress event per processed entry
    pub fn new(source: &'a S, config: &CrawlConfig, cancel: CancelFlag, events: EventSink) -> Self {
        Self {
            source,
            concurrency: config.concurrency.max(1),
            delay: config.delay(),
            cancel,
            events,
        }
    }

    /// Crawls every entry and resolves once all workers have exited
    pub async fn run(&self, entries: &[LinkEntry]) -> CrawlOutcome {
        let cursor = AtomicUsize::new(0);
        let workers = self.concurrency.min(entries.len()).max(1);

        tracing::info!(
            "Crawling {} pages with {} workers",
            entries.len(),
            workers
        );

        let finished = join_all((0..workers).map(|id| self.worker(id, entries, &cursor))).await;

        let mut pages: Vec<Option<PageResult>> = vec![None; entries.len()];
        for (index, page) in finished.into_iter().flatten() {
            pages[index] = Some(page);
        }

        let mut seen = HashSet::new();
        let stylesheets = pages
            .iter()
            .flatten()
            .flat_map(|page| page.stylesheets.iter())
            .filter(|href| seen.insert(*href))
            .cloned()
            .collect();

        let cancelled = self.cancel.is_requested();
        if cancelled {
            let claimed = pages.iter().filter(|page| page.is_some()).count();
            tracing::info!(
                "Crawl cancelled after {}/{} pages",
                claimed,
                entries.len()
            );
        }

        CrawlOutcome {
            pages,
            stylesheets,
            cancelled,
        }
    }

    /// One worker: claim, fetch, report, pause, repeat
    async fn worker(
        &self,
        id: usize,
        entries: &[LinkEntry],
        cursor: &AtomicUsize,
    ) -> Vec<(usize, PageResult)> {
        let total = entries.len();
        let mut done = Vec::new();

        loop {
            if self.cancel.is_requested() {
                tracing::debug!("Worker {} saw cancellation", id);
                break;
            }

            // The claim happens before the first await of the iteration
            let index = cursor.fetch_add(1, Ordering::SeqCst);
            let entry = match entries.get(index) {
                Some(entry) => entry,
                None => break,
            };
            tracing::debug!("Worker {} claimed #{} {}", id, index, entry.url);

            let page = match self.source.fetch_page(&entry.url).await {
                Ok(page) => {
                    self.events
                        .progress(index + 1, total, format!("Processing \"{}\"...", page.title));
                    page
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.url, e);
                    self.events.progress(
                        index + 1,
                        total,
                        format!("Skipped failed page: {}", entry.url),
                    );
                    PageResult::placeholder(&entry.url)
                }
            };
            done.push((index, page));

            if !self.delay.is_zero() && cursor.load(Ordering::SeqCst) < total {
                tokio::time::sleep(self.delay).await;
            }
        }

        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CoreMessage;
    use crate::{PageError, SanitizeError};
    use async_trait::async_trait;
    use std::cell::Cell;

    /// Pages whose path starts with `/fail` fail; `/slow` pages take longer
    struct FakeSource {
        in_flight: Cell<usize>,
        peak: Cell<usize>,
        fetched: Cell<usize>,
        cancel_after: Option<(usize, CancelFlag)>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                in_flight: Cell::new(0),
                peak: Cell::new(0),
                fetched: Cell::new(0),
                cancel_after: None,
            }
        }
    }

    #[async_trait(?Send)]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, url: &Url) -> Result<PageResult, PageError> {
            self.in_flight.set(self.in_flight.get() + 1);
            self.peak.set(self.peak.get().max(self.in_flight.get()));

            let latency = if url.path().starts_with("/slow") { 40 } else { 5 };
            tokio::time::sleep(Duration::from_millis(latency)).await;

            self.in_flight.set(self.in_flight.get() - 1);
            self.fetched.set(self.fetched.get() + 1);
            if let Some((limit, flag)) = &self.cancel_after {
                if self.fetched.get() >= *limit {
                    flag.request();
                }
            }

            if url.path().starts_with("/fail") {
                return Err(PageError::Sanitize(SanitizeError::NoContent {
                    url: url.to_string(),
                }));
            }

            let name = url.path().trim_start_matches('/').to_string();
            Ok(PageResult {
                title: name.clone(),
                url: url.clone(),
                html: format!("<main>{}</main>", name),
                stylesheets: vec![
                    Url::parse("https://docs.example.com/site.css").unwrap(),
                    Url::parse(&format!("https://docs.example.com/{}.css", name)).unwrap(),
                ],
                failed: false,
            })
        }
    }

    fn entries(paths: &[&str]) -> Vec<LinkEntry> {
        paths
            .iter()
            .map(|path| LinkEntry {
                url: Url::parse(&format!("https://docs.example.com{}", path)).unwrap(),
                title: path.to_string(),
                level: 1,
            })
            .collect()
    }

    fn config(concurrency: usize) -> CrawlConfig {
        CrawlConfig {
            concurrency,
            ..CrawlConfig::default()
        }
    }

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_requested());
        flag.request();
        assert!(clone.is_requested());
        clone.reset();
        assert!(!flag.is_requested());
    }

    #[tokio::test]
    async fn test_results_are_positional_regardless_of_latency() {
        let source = FakeSource::new();
        let list = entries(&["/slow-a", "/b", "/slow-c", "/d", "/e"]);
        let scheduler = Scheduler::new(&source, &config(3), CancelFlag::new(), EventSink::detached());

        let outcome = scheduler.run(&list).await;
        assert!(!outcome.cancelled);

        let pages = outcome.into_pages().unwrap();
        assert_eq!(pages.len(), 5);
        for (page, entry) in pages.iter().zip(&list) {
            assert_eq!(page.url, entry.url);
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let source = FakeSource::new();
        let list = entries(&["/a", "/b", "/c", "/d", "/e", "/f", "/g"]);
        let scheduler = Scheduler::new(&source, &config(2), CancelFlag::new(), EventSink::detached());

        let outcome = scheduler.run(&list).await;
        assert_eq!(outcome.pages.iter().flatten().count(), 7);
        assert_eq!(source.peak.get(), 2);
        assert_eq!(source.fetched.get(), 7);
    }

    #[tokio::test]
    async fn test_failed_page_becomes_placeholder() {
        let source = FakeSource::new();
        let list = entries(&["/a", "/fail-b", "/c"]);
        let scheduler = Scheduler::new(&source, &config(2), CancelFlag::new(), EventSink::detached());

        let pages = scheduler.run(&list).await.into_pages().unwrap();
        assert!(!pages[0].failed);
        assert!(pages[1].failed);
        assert!(pages[1].html.contains("https://docs.example.com/fail-b"));
        assert!(!pages[2].failed);
    }

    #[tokio::test]
    async fn test_stylesheet_union_has_no_duplicates() {
        let source = FakeSource::new();
        let list = entries(&["/a", "/fail-b", "/c"]);
        let scheduler = Scheduler::new(&source, &config(3), CancelFlag::new(), EventSink::detached());

        let outcome = scheduler.run(&list).await;
        let hrefs: Vec<&str> = outcome.stylesheets.iter().map(Url::as_str).collect();
        assert_eq!(
            hrefs,
            vec![
                "https://docs.example.com/site.css",
                "https://docs.example.com/a.css",
                "https://docs.example.com/c.css",
            ]
        );
    }

    #[tokio::test]
    async fn test_progress_event_per_entry() {
        let source = FakeSource::new();
        let list = entries(&["/a", "/fail-b", "/c"]);
        let (events, mut rx) = EventSink::channel();
        let scheduler = Scheduler::new(&source, &config(2), CancelFlag::new(), events);

        scheduler.run(&list).await;
        drop(scheduler);

        let mut seen = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let CoreMessage::Progress { current, total, note } = message {
                assert_eq!(total, 3);
                seen.push((current, note));
            }
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![
                (1, "Processing \"a\"...".to_string()),
                (
                    2,
                    "Skipped failed page: https://docs.example.com/fail-b".to_string()
                ),
                (3, "Processing \"c\"...".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_claims() {
        let cancel = CancelFlag::new();
        let source = FakeSource {
            cancel_after: Some((2, cancel.clone())),
            ..FakeSource::new()
        };
        let list = entries(&["/a", "/b", "/c", "/d", "/e"]);
        let scheduler = Scheduler::new(&source, &config(1), cancel, EventSink::detached());

        let outcome = scheduler.run(&list).await;
        assert!(outcome.cancelled);
        assert_eq!(source.fetched.get(), 2);
        assert!(outcome.pages[0].is_some());
        assert!(outcome.pages[1].is_some());
        assert!(outcome.pages[2..].iter().all(Option::is_none));
        assert!(outcome.into_pages().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_claims_nothing() {
        let cancel = CancelFlag::new();
        cancel.request();
        let source = FakeSource::new();
        let list = entries(&["/a", "/b"]);
        let scheduler = Scheduler::new(&source, &config(5), cancel, EventSink::detached());

        let outcome = scheduler.run(&list).await;
        assert!(outcome.cancelled);
        assert_eq!(source.fetched.get(), 0);
    }

    #[tokio::test]
    async fn test_empty_entry_list() {
        let source = FakeSource::new();
        let scheduler = Scheduler::new(&source, &config(5), CancelFlag::new(), EventSink::detached());

        let pages = scheduler.run(&[]).await.into_pages().unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_delay_paces_each_worker() {
        let source = FakeSource::new();
        let list = entries(&["/a", "/b", "/c"]);
        let paced = CrawlConfig {
            concurrency: 1,
            delay_ms: 30,
            ..CrawlConfig::default()
        };
        let scheduler = Scheduler::new(&source, &paced, CancelFlag::new(), EventSink::detached());

        let started = std::time::Instant::now();
        scheduler.run(&list).await;
        // Two pauses between three claims, no pause after the last one
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
