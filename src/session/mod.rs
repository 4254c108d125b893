//! Crawl sessions
//!
//! A [`Controller`] owns everything one host needs to run crawls: the site
//! configuration, the page source, the delivery target, the event channel
//! and the session state. Start and Cancel are its only entry points, and
//! they are the only things that move the state.

mod state;

pub use state::SessionState;

use crate::assemble::{prepare_pages, Document};
use crate::config::CrawlConfig;
use crate::crawler::{CancelFlag, PageSource, Scheduler};
use crate::delivery::Delivery;
use crate::discover::{Discoverer, PageModel};
use crate::protocol::{CoreMessage, EventSink, StartStatus};
use crate::{ConfigResult, CrawlFailure};
use std::cell::{Cell, RefCell};

/// Note of the progress event sent when a crawl starts
pub const DISCOVERY_NOTE: &str = "Discovering sidebar links...";

/// Runs crawls for one host, one at a time
pub struct Controller<S: PageSource, D: Delivery> {
    config: CrawlConfig,
    source: S,
    delivery: D,
    events: EventSink,
    discoverer: Discoverer,
    state: Cell<SessionState>,
    cancel: CancelFlag,
    site_title: Option<String>,
    undelivered: RefCell<Option<String>>,
}

impl<S: PageSource, D: Delivery> Controller<S, D> {
    /// Creates an idle controller
    ///
    /// Fails if the sidebar selectors of `config` do not compile.
    pub fn new(config: CrawlConfig, source: S, delivery: D, events: EventSink) -> ConfigResult<Self> {
        let discoverer = Discoverer::new(&config)?;
        Ok(Self {
            config,
            source,
            delivery,
            events,
            discoverer,
            state: Cell::new(SessionState::Idle),
            cancel: CancelFlag::new(),
            site_title: None,
            undelivered: RefCell::new(None),
        })
    }

    /// Uses `title` on the cover instead of the current page's title
    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn is_busy(&self) -> bool {
        self.state.get().is_busy()
    }

    /// The channel this controller reports on
    pub fn events(&self) -> EventSink {
        self.events.clone()
    }

    /// Runs one crawl of the site `page` belongs to
    ///
    /// Rejected right away, with no event and no state change, while another
    /// crawl is running. Otherwise resolves once the crawl has ended: with
    /// `ok` after a Ready event, or with the failure reason after an Error
    /// event.
    pub async fn start<P: PageModel>(&self, page: &mut P) -> StartStatus {
        match self.state.get().on_start() {
            Ok(next) => self.state.set(next),
            Err(reason) => {
                tracing::warn!("Start rejected: {}", reason);
                return StartStatus::failed(reason);
            }
        }
        self.cancel.reset();

        let result = self.crawl(page).await;
        self.state.set(self.state.get().on_complete());

        match result {
            Ok(()) => {
                self.events.emit(CoreMessage::Ready);
                StartStatus::ok()
            }
            Err(reason) => {
                tracing::error!("Crawl failed: {}", reason);
                self.events.emit(CoreMessage::Error {
                    error: reason.to_string(),
                });
                StartStatus::failed(reason)
            }
        }
    }

    /// Requests cancellation of the running crawl
    ///
    /// Always acknowledged; the crawl notices at its next claim.
    pub fn cancel(&self) -> StartStatus {
        if self.state.get() == SessionState::Running {
            tracing::info!("Cancellation requested");
            self.cancel.request();
        }
        self.state.set(self.state.get().on_cancel());
        StartStatus::ok()
    }

    /// Takes the last document that could not be delivered, if any
    pub fn take_undelivered(&self) -> Option<String> {
        self.undelivered.borrow_mut().take()
    }

    async fn crawl<P: PageModel>(&self, page: &mut P) -> Result<(), CrawlFailure> {
        self.events.progress(0, 1, DISCOVERY_NOTE);

        let entries = self.discoverer.discover(page).await;
        if entries.is_empty() {
            return Err(CrawlFailure::NoLinks);
        }
        if self.cancel.is_requested() {
            return Err(CrawlFailure::Cancelled);
        }

        let scheduler = Scheduler::new(
            &self.source,
            &self.config,
            self.cancel.clone(),
            self.events.clone(),
        );
        let outcome = scheduler.run(&entries).await;
        let stylesheets = outcome.stylesheets.clone();
        let pages = outcome.into_pages().ok_or(CrawlFailure::Cancelled)?;

        let failed = pages.iter().filter(|page| page.failed).count();
        if failed > 0 {
            tracing::warn!("{} of {} pages replaced by placeholders", failed, pages.len());
        }

        let site_title = self
            .site_title
            .clone()
            .or_else(|| page.document_title())
            .unwrap_or_default();
        let prepared = prepare_pages(pages, &entries);
        let html = Document {
            site_title: &site_title,
            pages: &prepared,
            stylesheets: &stylesheets,
            generated_on: chrono::Local::now().date_naive(),
        }
        .render();

        if let Err(e) = self.delivery.deliver(&html) {
            tracing::error!("{}", e);
            *self.undelivered.borrow_mut() = Some(html);
            return Err(CrawlFailure::DeliveryBlocked);
        }

        tracing::info!(
            "Delivered {} chapters to {}",
            prepared.len(),
            self.delivery.describe()
        );
        Ok(())
    }
}
