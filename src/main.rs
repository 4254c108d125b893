//! DocuPrint main entry point
//!
//! This is the command-line interface for DocuPrint.

use anyhow::{anyhow, Context};
use clap::Parser;
use docuprint::config::{load_config_with_hash, Config, CrawlConfig};
use docuprint::crawler::{build_http_client, Fetcher, HttpPageSource, Sanitizer};
use docuprint::delivery::FileDelivery;
use docuprint::discover::{Discoverer, StaticPage};
use docuprint::host::serve_stdio;
use docuprint::protocol::{CoreMessage, EventSink};
use docuprint::{parse_page_url, Controller, CrawlFailure};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

/// DocuPrint: a documentation site, printed as one book
///
/// DocuPrint follows the sidebar of a documentation page, fetches every
/// page it links to, keeps the main content of each and writes a single
/// printable HTML document with a table of contents.
#[derive(Parser, Debug)]
#[command(name = "docuprint")]
#[command(version)]
#[command(about = "Print a documentation site as one book", long_about = None)]
struct Cli {
    /// Documentation page whose sidebar lists the pages to print
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the printable document
    #[arg(short, long, value_name = "FILE", default_value = "docuprint.html")]
    output: PathBuf,

    /// Title for the cover (defaults to the start page's title)
    #[arg(long, value_name = "TITLE")]
    site_title: Option<String>,

    /// Print the discovered sidebar links and exit
    #[arg(long, conflicts_with = "stdio")]
    list_links: bool,

    /// Take Start/Cancel commands as JSON lines on stdin, report on stdout
    #[arg(long)]
    stdio: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;
    let start_url = parse_page_url(&cli.url).with_context(|| format!("Invalid URL: {}", cli.url))?;
    let site = config.for_url(&start_url);

    let client = build_http_client(&config.client)?;
    let fetcher = Fetcher::new(client, &site);

    tracing::info!("Fetching start page {}", start_url);
    let body = fetcher
        .fetch_html(&start_url)
        .await
        .with_context(|| format!("Could not fetch the start page {}", start_url))?;
    let mut page = StaticPage::parse(start_url, &body);

    if cli.list_links {
        return handle_list_links(&site, &mut page).await;
    }

    let source = HttpPageSource::new(fetcher, Sanitizer::new(&site)?);
    let (events, outbox) = EventSink::channel();
    let mut controller = Controller::new(site, source, FileDelivery::new(cli.output.clone()), events)?;
    if let Some(title) = cli.site_title {
        controller = controller.with_site_title(title);
    }

    if cli.stdio {
        serve_stdio(controller, page, outbox).await?;
        return Ok(());
    }

    handle_print(controller, &mut page, outbox, &cli.output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries the link list or host messages.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docuprint=info,warn"),
            1 => EnvFilter::new("docuprint=debug,info"),
            2 => EnvFilter::new("docuprint=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the built-in defaults without one
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path,
        None => {
            tracing::debug!("No configuration file given, using built-in defaults");
            return Ok(Config::default());
        }
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles --list-links: runs discovery only and prints the leveled list
async fn handle_list_links(site: &CrawlConfig, page: &mut StaticPage) -> anyhow::Result<()> {
    let discoverer = Discoverer::new(site)?;
    let entries = discoverer.discover(page).await;

    for entry in &entries {
        let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
        println!("{}{} <{}>", indent, entry.title, entry.url);
    }
    println!("\n{} pages", entries.len());

    Ok(())
}

/// Handles the default mode: one crawl, written to the output file
///
/// Ctrl-C requests cancellation; the crawl stops at its next claim.
async fn handle_print(
    controller: Controller<HttpPageSource, FileDelivery>,
    page: &mut StaticPage,
    mut outbox: UnboundedReceiver<CoreMessage>,
    output: &Path,
) -> anyhow::Result<()> {
    let reporter = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            report(&message);
        }
    });

    let status = {
        let crawl = controller.start(page);
        tokio::pin!(crawl);
        loop {
            tokio::select! {
                status = &mut crawl => break status,
                Ok(()) = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted, cancelling the crawl");
                    controller.cancel();
                }
            }
        }
    };

    let undelivered = controller.take_undelivered();
    drop(controller);
    if let Err(e) = reporter.await {
        tracing::warn!("Progress reporter stopped: {}", e);
    }

    match status.reason {
        None => {
            println!("✓ Printable document written to {}", output.display());
            println!("  Open it in a browser to print or save it as PDF");
            Ok(())
        }
        Some(CrawlFailure::DeliveryBlocked) => {
            if let Some(html) = undelivered {
                let fallback = std::env::temp_dir().join("docuprint-undelivered.html");
                std::fs::write(&fallback, html)
                    .with_context(|| format!("Failed to save document to {}", fallback.display()))?;
                tracing::warn!("Document saved to {} instead", fallback.display());
            }
            Err(anyhow!(CrawlFailure::DeliveryBlocked))
        }
        Some(reason) => Err(reason.into()),
    }
}

fn report(message: &CoreMessage) {
    match message {
        CoreMessage::Progress {
            current,
            total,
            note,
        } => tracing::info!("[{}/{}] {}", current, total, note),
        CoreMessage::Ready => tracing::info!("Document ready"),
        CoreMessage::Error { error } => tracing::error!("{}", error),
        CoreMessage::Status { .. } => {}
    }
}
