//! In-process stand-in for the dashboard, driven through the `Session` trait.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use idsweep::browser::{BrowserError, ElementRef, Session, Wait, ENTER};
use idsweep::controller::{INPUT_SELECTOR, RESULT_SELECTOR};

const INPUT: &str = "input-0";

/// How the dashboard reacts to a submitted ID.
#[derive(Clone)]
pub enum Reply {
    Cells(Vec<String>),
    /// Nothing ever renders.
    Silent,
    /// The driver rejects the submit keystroke.
    Broken,
    /// The browser goes away.
    Crash,
}

pub fn cells(texts: &[&str]) -> Reply {
    Reply::Cells(texts.iter().map(|s| s.to_string()).collect())
}

pub struct FakeDashboard {
    replies: HashMap<u64, Reply>,
    loaded: bool,
    typed: String,
    rendered: Vec<(ElementRef, String)>,
    generation: usize,
    in_place: bool,
    stop_after: Option<(u64, Arc<AtomicBool>)>,
    pub navigations: usize,
    pub submitted: Vec<u64>,
    pub closed: bool,
}

impl FakeDashboard {
    pub fn new() -> Self {
        FakeDashboard {
            replies: HashMap::new(),
            loaded: false,
            typed: String::new(),
            rendered: Vec::new(),
            generation: 0,
            in_place: false,
            stop_after: None,
            navigations: 0,
            submitted: Vec::new(),
            closed: false,
        }
    }

    pub fn reply(mut self, id: u64, reply: Reply) -> Self {
        self.replies.insert(id, reply);
        self
    }

    /// Rewrite the text of existing result cells instead of replacing them,
    /// so old handles never go stale.
    pub fn update_in_place(mut self) -> Self {
        self.in_place = true;
        self
    }

    /// Raise `flag` once `id` has been submitted, like a Ctrl-C arriving mid-lookup.
    pub fn stop_after(mut self, id: u64, flag: Arc<AtomicBool>) -> Self {
        self.stop_after = Some((id, flag));
        self
    }

    fn lookup(&self, element: &ElementRef) -> Result<&str, BrowserError> {
        if element.0 == INPUT && self.loaded {
            return Ok("");
        }
        self.rendered
            .iter()
            .find(|(e, _)| e == element)
            .map(|(_, text)| text.as_str())
            .ok_or(BrowserError::StaleElement)
    }

    fn press_enter(&mut self) -> Result<(), BrowserError> {
        let id: u64 = self.typed.trim().parse().map_err(|_| BrowserError::Driver {
            error: "invalid argument".into(),
            message: format!("not an id: {:?}", self.typed),
        })?;
        self.submitted.push(id);
        if let Some((stop_id, flag)) = &self.stop_after {
            if *stop_id == id {
                flag.store(true, Ordering::SeqCst);
            }
        }

        let reply = self
            .replies
            .get(&id)
            .cloned()
            .unwrap_or_else(|| cells(&["LAST NAME, FIRST NAME", "No data"]));

        if !self.in_place || self.rendered.is_empty() {
            self.generation += 1;
        }
        self.rendered.clear();
        match reply {
            Reply::Cells(texts) => {
                for (i, text) in texts.into_iter().enumerate() {
                    let element = ElementRef(format!("cell-{}-{i}", self.generation));
                    self.rendered.push((element, text));
                }
                Ok(())
            }
            Reply::Silent => Ok(()),
            Reply::Broken => Err(BrowserError::Driver {
                error: "element not interactable".into(),
                message: "input is covered by an overlay".into(),
            }),
            Reply::Crash => Err(BrowserError::SessionLost {
                reason: "browser process exited".into(),
            }),
        }
    }
}

impl Session for FakeDashboard {
    fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
        self.navigations += 1;
        self.loaded = true;
        self.typed.clear();
        self.rendered.clear();
        Ok(())
    }

    fn find_all(&mut self, selector: &str) -> Result<Vec<ElementRef>, BrowserError> {
        if !self.loaded {
            return Ok(vec![]);
        }
        Ok(match selector {
            INPUT_SELECTOR => vec![ElementRef(INPUT.into())],
            RESULT_SELECTOR => self.rendered.iter().map(|(e, _)| e.clone()).collect(),
            _ => vec![],
        })
    }

    fn clear(&mut self, element: &ElementRef) -> Result<(), BrowserError> {
        self.lookup(element)?;
        self.typed.clear();
        Ok(())
    }

    fn send_text(&mut self, element: &ElementRef, text: &str) -> Result<(), BrowserError> {
        self.lookup(element)?;
        if text == ENTER {
            self.press_enter()
        } else {
            self.typed.push_str(text);
            Ok(())
        }
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, BrowserError> {
        self.lookup(element).map(|_| true)
    }

    fn is_enabled(&mut self, element: &ElementRef) -> Result<bool, BrowserError> {
        self.lookup(element).map(|_| true)
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, BrowserError> {
        self.lookup(element).map(str::to_string)
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        self.closed = true;
        self.loaded = false;
        Ok(())
    }
}

pub fn quick_wait() -> Wait {
    Wait::new(Duration::from_millis(40), Duration::from_millis(1))
}
