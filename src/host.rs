//! Line-delimited JSON host loop
//!
//! Reads [`HostCommand`]s, one JSON object per line, and writes every
//! [`CoreMessage`] (events and status replies alike) as one JSON object per
//! line. Crawls run as local tasks so Cancel is answered while a crawl is
//! in flight. At end of input the loop stops reading, lets running crawls
//! finish and flushes what they reported.

use crate::crawler::PageSource;
use crate::delivery::Delivery;
use crate::discover::PageModel;
use crate::protocol::{decode_command, encode_message, CoreMessage, HostCommand};
use crate::session::Controller;
use std::rc::Rc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::{JoinHandle, LocalSet};

/// Serves commands from `input` until it ends
///
/// `outbox` must be the receiving end of the controller's event channel.
/// Every Start runs a crawl of a fresh copy of `page`.
pub async fn serve<R, W, S, D, P>(
    controller: Controller<S, D>,
    page: P,
    mut outbox: UnboundedReceiver<CoreMessage>,
    input: R,
    mut output: W,
) -> crate::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: PageSource + 'static,
    D: Delivery + 'static,
    P: PageModel + Clone + 'static,
{
    let local = LocalSet::new();
    local
        .run_until(async move {
            let controller = Rc::new(controller);
            let replies = controller.events();
            let mut crawls: Vec<JoinHandle<()>> = Vec::new();
            let mut lines = input.lines();

            loop {
                tokio::select! {
                    Some(message) = outbox.recv() => {
                        write_message(&mut output, &message).await?;
                    }
                    line = lines.next_line() => {
                        let line = match line? {
                            Some(line) => line,
                            None => break,
                        };
                        if line.trim().is_empty() {
                            continue;
                        }
                        match decode_command(&line) {
                            Ok(HostCommand::Start) => {
                                crawls.push(spawn_crawl(Rc::clone(&controller), page.clone()));
                            }
                            Ok(HostCommand::Cancel) => {
                                replies.emit(controller.cancel().into());
                            }
                            Err(e) => {
                                tracing::warn!("Ignoring malformed command {:?}: {}", line, e);
                                replies.emit(CoreMessage::Error {
                                    error: format!("Unrecognized command: {}", e),
                                });
                            }
                        }
                    }
                }
            }

            tracing::debug!("Input closed, waiting for {} crawl task(s)", crawls.len());
            for crawl in crawls {
                if let Err(e) = crawl.await {
                    tracing::error!("Crawl task failed: {}", e);
                }
            }
            while let Ok(message) = outbox.try_recv() {
                write_message(&mut output, &message).await?;
            }
            output.flush().await?;

            Ok::<(), crate::DocuError>(())
        })
        .await
}

/// Serves commands from stdin, writing messages to stdout
pub async fn serve_stdio<S, D, P>(
    controller: Controller<S, D>,
    page: P,
    outbox: UnboundedReceiver<CoreMessage>,
) -> crate::Result<()>
where
    S: PageSource + 'static,
    D: Delivery + 'static,
    P: PageModel + Clone + 'static,
{
    serve(
        controller,
        page,
        outbox,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

fn spawn_crawl<S, D, P>(controller: Rc<Controller<S, D>>, mut page: P) -> JoinHandle<()>
where
    S: PageSource + 'static,
    D: Delivery + 'static,
    P: PageModel + 'static,
{
    tokio::task::spawn_local(async move {
        let status = controller.start(&mut page).await;
        controller.events().emit(status.into());
    })
}

async fn write_message<W: AsyncWrite + Unpin>(
    output: &mut W,
    message: &CoreMessage,
) -> crate::Result<()> {
    let mut line = encode_message(message)?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
