//! Error types for browser sessions.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// Could not reach the WebDriver endpoint or create a session.
    #[error("failed to start a WebDriver session at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The session is gone (browser crashed, driver restarted, endpoint unreachable).
    #[error("browser session lost: {reason}")]
    SessionLost { reason: String },

    /// The driver returned an error response.
    #[error("WebDriver error '{error}': {message}")]
    Driver { error: String, message: String },

    /// Unexpected response shape or transport-level failure.
    #[error("WebDriver protocol error: {detail}")]
    Protocol { detail: String },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// The element was detached from the DOM after it was located.
    #[error("stale element reference")]
    StaleElement,

    #[error("timed out after {duration:?} waiting for {waiting_for}")]
    WaitTimeout {
        waiting_for: String,
        duration: Duration,
    },
}

impl BrowserError {
    /// Errors after which no further query can succeed in this session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BrowserError::ConnectionFailed { .. } | BrowserError::SessionLost { .. }
        )
    }
}
