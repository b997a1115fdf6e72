//! Page interaction for a single lookup.
//!
//! One query walks `Idle -> Loaded -> Submitted -> AwaitingUpdate` and ends
//! in `Ready` (fragments read) or `TimedOut` (nothing rendered in time).
//! A query that fails partway leaves the controller in an intermediate
//! state, and the next query starts from a fresh page load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::wait::{any_visible, element_clickable, staleness_of};
use crate::browser::{BrowserError, ElementRef, Session, Wait};

pub const DASHBOARD_URL: &str =
    "https://lookerstudio.google.com/u/0/reporting/cab51826-f8bb-4aed-874e-6b69e61470df/page/p_l1yqh2seid";
pub const INPUT_SELECTOR: &str = "input[placeholder='Maglagay ng value']";
pub const RESULT_SELECTOR: &str = "span.cell-value";

/// Upper bound on waiting for old results to detach in reuse mode.
pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(2);

/// Whether each query starts from a fresh page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    /// Navigate before every query. Slower, but no state leaks between lookups.
    #[default]
    Reload,
    /// Keep the loaded page and only resubmit the input, watching the old
    /// results go stale to tell when new ones start rendering.
    Reuse,
}

impl std::str::FromStr for PageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reload" => Ok(PageMode::Reload),
            "reuse" => Ok(PageMode::Reuse),
            other => Err(format!("unknown page mode '{other}' (expected reload or reuse)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub input_selector: String,
    pub result_selector: String,
}

impl Default for Target {
    fn default() -> Self {
        Target {
            url: DASHBOARD_URL.to_string(),
            input_selector: INPUT_SELECTOR.to_string(),
            result_selector: RESULT_SELECTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Loaded,
    Submitted,
    AwaitingUpdate,
    Ready,
    TimedOut,
}

/// Raw text read back from the page for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReply {
    pub fragments: Vec<String>,
    pub timed_out: bool,
}

pub struct PageController<S: Session> {
    session: S,
    target: Target,
    mode: PageMode,
    wait: Wait,
    stale_wait: Wait,
    state: QueryState,
}

impl<S: Session> PageController<S> {
    pub fn new(session: S, target: Target, mode: PageMode, wait: Wait) -> Self {
        PageController {
            session,
            target,
            mode,
            wait,
            stale_wait: wait.capped(DEFAULT_STALE_TIMEOUT),
            state: QueryState::Idle,
        }
    }

    /// Bound for the staleness signal in reuse mode. A dashboard that
    /// updates cells in place never detaches them, so this wait always runs
    /// to its limit there.
    pub fn with_stale_wait(mut self, stale_wait: Wait) -> Self {
        self.stale_wait = stale_wait;
        self
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Forget the current page; the next query navigates again.
    pub fn reset(&mut self) {
        self.state = QueryState::Idle;
    }

    fn can_reuse_page(&self) -> bool {
        self.mode == PageMode::Reuse
            && matches!(self.state, QueryState::Ready | QueryState::TimedOut)
    }

    /// Run one full lookup for `id` and return whatever the page displayed.
    ///
    /// A readiness timeout is not an error: it comes back as
    /// `QueryReply { timed_out: true, .. }`. Anything else that goes wrong
    /// while driving the page is returned as an error.
    pub fn query(&mut self, id: u64) -> Result<QueryReply, BrowserError> {
        let reuse = self.can_reuse_page();

        if !reuse {
            self.state = QueryState::Idle;
            self.session.navigate(&self.target.url)?;
        }
        self.state = QueryState::Loaded;

        let input = self.wait.until(
            &mut self.session,
            "search input to become clickable",
            element_clickable::<S>(&self.target.input_selector),
        )?;

        // capture before submitting so a replaced result can be told apart from the old one
        let previous: Vec<ElementRef> = if reuse {
            self.session.find_all(&self.target.result_selector)?
        } else {
            Vec::new()
        };

        self.session.clear(&input)?;
        self.session.send_text(&input, &id.to_string())?;
        self.session.submit(&input)?;
        self.state = QueryState::Submitted;

        if let Some(old) = previous.first() {
            match self
                .stale_wait
                .until(&mut self.session, "previous results to go stale", staleness_of::<S>(old))
            {
                Ok(()) => {}
                Err(BrowserError::WaitTimeout { .. }) => {
                    tracing::debug!(id, "previous results never went stale, relying on readiness wait");
                }
                Err(e) => return Err(e),
            }
        }
        self.state = QueryState::AwaitingUpdate;

        match self.wait.until(
            &mut self.session,
            "a result to become visible",
            any_visible::<S>(&self.target.result_selector),
        ) {
            Ok(_) => {}
            Err(BrowserError::WaitTimeout { duration, .. }) => {
                tracing::debug!(id, ?duration, "no result rendered");
                self.state = QueryState::TimedOut;
                return Ok(QueryReply {
                    fragments: Vec::new(),
                    timed_out: true,
                });
            }
            Err(e) => return Err(e),
        }

        let mut fragments = Vec::new();
        for element in self.session.find_all(&self.target.result_selector)? {
            if self.session.is_displayed(&element)? {
                fragments.push(self.session.text(&element)?);
            }
        }

        self.state = QueryState::Ready;
        Ok(QueryReply {
            fragments,
            timed_out: false,
        })
    }

    pub fn close(&mut self) -> Result<(), BrowserError> {
        self.state = QueryState::Idle;
        self.session.close()
    }
}
