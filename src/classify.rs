//! Result classification.
//!
//! The dashboard renders every value in the same generic `cell-value` span,
//! headers included, so there is nothing in the markup that marks a name as
//! a name. Classification works by exclusion: the first fragment (in
//! document order) that is not known chrome is taken as the name.

use serde::{Deserialize, Serialize};

/// Header and caption labels the dashboard renders alongside results.
pub const DEFAULT_PLACEHOLDERS: &[&str] = &[
    "LAST NAME, FIRST NAME",
    "SUBMITTED (Hard Copy)",
    "SUBMITTED (Soft Copy)",
    "Maglagay ng value",
    "ID NUMBER",
    "DTCF STATUS",
];

/// Text shown when the lookup matched nothing.
pub const NO_DATA_SENTINELS: &[&str] = &["No data", "NO DATA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMatching {
    Sensitive,
    #[default]
    Insensitive,
}

impl CaseMatching {
    fn matches(self, a: &str, b: &str) -> bool {
        match self {
            CaseMatching::Sensitive => a == b,
            CaseMatching::Insensitive => a == b || a.to_lowercase() == b.to_lowercase(),
        }
    }
}

/// The set of strings that are never names.
#[derive(Debug, Clone)]
pub struct Denylist {
    placeholders: Vec<String>,
    sentinels: Vec<String>,
    case: CaseMatching,
}

impl Default for Denylist {
    fn default() -> Self {
        Denylist::new(CaseMatching::default())
    }
}

impl Denylist {
    pub fn new(case: CaseMatching) -> Self {
        Denylist {
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect(),
            sentinels: NO_DATA_SENTINELS.iter().map(|s| s.to_string()).collect(),
            case,
        }
    }

    /// Add labels on top of the defaults (e.g. from config after a dashboard change).
    pub fn with_placeholders<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in extra {
            let label: String = label.into();
            let label = label.trim();
            if !label.is_empty() && !self.placeholders.iter().any(|p| p == label) {
                self.placeholders.push(label.to_string());
            }
        }
        self
    }

    pub fn case(&self) -> CaseMatching {
        self.case
    }

    pub fn is_no_data(&self, text: &str) -> bool {
        let text = text.trim();
        self.sentinels.iter().any(|s| self.case.matches(text, s))
    }

    /// True when `text` is chrome rather than data for a lookup of `query_id`.
    /// The sentinel and the echoed ID count as placeholders too.
    pub fn is_placeholder(&self, text: &str, query_id: u64) -> bool {
        let text = text.trim();
        text == query_id.to_string()
            || self.is_no_data(text)
            || self.placeholders.iter().any(|p| self.case.matches(text, p))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(String),
    NoData,
    Empty,
    Timeout,
    Error(String),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Found(_) => "found",
            Outcome::NoData => "no data",
            Outcome::Empty => "empty",
            Outcome::Timeout => "timeout",
            Outcome::Error(_) => "error",
        }
    }
}

pub fn classify<S: AsRef<str>>(
    fragments: &[S],
    query_id: u64,
    timed_out: bool,
    denylist: &Denylist,
) -> Outcome {
    if timed_out {
        return Outcome::Timeout;
    }

    let mut saw_sentinel = false;

    for fragment in fragments {
        let text = fragment.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        if denylist.is_no_data(text) {
            saw_sentinel = true;
            continue;
        }
        if denylist.is_placeholder(text, query_id) {
            continue;
        }
        return Outcome::Found(text.to_string());
    }

    if saw_sentinel {
        Outcome::NoData
    } else {
        Outcome::Empty
    }
}
