//! Crawl session state machine

use crate::CrawlFailure;

/// Where the session is in its crawl lifecycle
///
/// | From | Event | To |
/// |------|-------|----|
/// | Idle | Start | Running |
/// | Running / Cancelling | Start | unchanged, rejected as busy |
/// | Running | Cancel | Cancelling |
/// | Idle / Cancelling | Cancel | unchanged |
/// | any | Completion | Idle |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Cancelling,
}

impl SessionState {
    pub fn on_start(self) -> Result<Self, CrawlFailure> {
        match self {
            SessionState::Idle => Ok(SessionState::Running),
            SessionState::Running | SessionState::Cancelling => Err(CrawlFailure::Busy),
        }
    }

    pub fn on_cancel(self) -> Self {
        match self {
            SessionState::Running => SessionState::Cancelling,
            other => other,
        }
    }

    pub fn on_complete(self) -> Self {
        SessionState::Idle
    }

    pub fn is_busy(self) -> bool {
        self != SessionState::Idle
    }
}
