//! Host ↔ core messages
//!
//! Commands flow from the host (the UI side) to the core; events and status
//! replies flow back. Every message is one JSON object tagged by an `action`
//! (commands) or `type` (everything else) field.

use crate::CrawlFailure;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// A request from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum HostCommand {
    #[serde(rename = "DOCUPRINT_START")]
    Start,

    #[serde(rename = "DOCUPRINT_CANCEL")]
    Cancel,
}

/// A message from the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoreMessage {
    /// Fire-and-forget progress; may arrive out of numeric order
    #[serde(rename = "DOCUPRINT_PROGRESS")]
    Progress {
        current: usize,
        total: usize,
        note: String,
    },

    /// The printable document was handed over
    #[serde(rename = "DOCUPRINT_READY")]
    Ready,

    /// A crawl ended without a document
    #[serde(rename = "DOCUPRINT_ERROR")]
    Error { error: String },

    /// Reply to a command
    #[serde(rename = "DOCUPRINT_STATUS")]
    Status {
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<CrawlFailure>,
    },
}

/// Final status of a Start or Cancel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartStatus {
    pub ok: bool,
    pub reason: Option<CrawlFailure>,
}

impl StartStatus {
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn failed(reason: CrawlFailure) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

impl From<StartStatus> for CoreMessage {
    fn from(status: StartStatus) -> Self {
        CoreMessage::Status {
            ok: status.ok,
            reason: status.reason,
        }
    }
}

/// Outgoing event channel
///
/// Sending never fails from the caller's point of view: if nobody is
/// listening the event is dropped.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<CoreMessage>>,
}

impl EventSink {
    /// Creates a sink and the receiver that observes it
    pub fn channel() -> (Self, UnboundedReceiver<CoreMessage>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink nobody listens to
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, message: CoreMessage) {
        if let Some(tx) = &self.tx {
            if tx.send(message).is_err() {
                tracing::trace!("Event dropped, host is gone");
            }
        }
    }

    pub fn progress(&self, current: usize, total: usize, note: impl Into<String>) {
        self.emit(CoreMessage::Progress {
            current,
            total,
            note: note.into(),
        });
    }
}

/// Decodes one line of host input
pub fn decode_command(line: &str) -> serde_json::Result<HostCommand> {
    serde_json::from_str(line.trim())
}

/// Encodes a message as a single JSON line, without the trailing newline
pub fn encode_message(message: &CoreMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}
