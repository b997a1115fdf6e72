//! Bounded waits over page state.
//!
//! A condition is polled until it yields a value or the timeout elapses.
//! Stale or missing elements while polling mean "not yet", since the page
//! is expected to be re-rendering underneath us.

use std::time::{Duration, Instant};

use super::{BrowserError, ElementRef, Session};

#[derive(Debug, Clone, Copy)]
pub struct Wait {
    timeout: Duration,
    poll: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Wait { timeout, poll }
    }

    /// Same poll interval, timeout no longer than `max`.
    pub fn capped(self, max: Duration) -> Self {
        Wait {
            timeout: self.timeout.min(max),
            ..self
        }
    }

    pub fn until<S, T, F>(
        &self,
        session: &mut S,
        waiting_for: &str,
        mut condition: F,
    ) -> Result<T, BrowserError>
    where
        S: Session + ?Sized,
        F: FnMut(&mut S) -> Result<Option<T>, BrowserError>,
    {
        let start = Instant::now();

        loop {
            match condition(&mut *session) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(BrowserError::StaleElement) | Err(BrowserError::ElementNotFound { .. }) => {}
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(BrowserError::WaitTimeout {
                    waiting_for: waiting_for.to_string(),
                    duration: self.timeout,
                });
            }
            std::thread::sleep(self.poll.min(self.timeout - elapsed));
        }
    }
}

/// First element matching `selector` that is displayed and enabled.
pub fn element_clickable<S: Session + ?Sized>(
    selector: &str,
) -> impl FnMut(&mut S) -> Result<Option<ElementRef>, BrowserError> {
    let selector = selector.to_string();
    move |session| {
        let Some(element) = session.find(&selector)? else {
            return Ok(None);
        };
        if session.is_displayed(&element)? && session.is_enabled(&element)? {
            Ok(Some(element))
        } else {
            Ok(None)
        }
    }
}

/// Any element matching `selector` that is displayed.
pub fn any_visible<S: Session + ?Sized>(
    selector: &str,
) -> impl FnMut(&mut S) -> Result<Option<ElementRef>, BrowserError> {
    let selector = selector.to_string();
    move |session| {
        for element in session.find_all(&selector)? {
            if session.is_displayed(&element)? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

/// Every element matching `selector`, once there is at least one and all are displayed.
pub fn all_visible<S: Session + ?Sized>(
    selector: &str,
) -> impl FnMut(&mut S) -> Result<Option<Vec<ElementRef>>, BrowserError> {
    let selector = selector.to_string();
    move |session| {
        let elements = session.find_all(&selector)?;
        if elements.is_empty() {
            return Ok(None);
        }
        for element in &elements {
            if !session.is_displayed(element)? {
                return Ok(None);
            }
        }
        Ok(Some(elements))
    }
}

pub fn staleness_of<S: Session + ?Sized>(
    element: &ElementRef,
) -> impl FnMut(&mut S) -> Result<Option<()>, BrowserError> {
    let element = element.clone();
    move |session| Ok(session.is_stale(&element)?.then_some(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders one `span.cell-value` after a fixed number of lookups.
    struct SlowPage {
        lookups: usize,
        appears_after: usize,
        detached: bool,
    }

    impl SlowPage {
        fn new(appears_after: usize) -> Self {
            SlowPage { lookups: 0, appears_after, detached: false }
        }
    }

    impl Session for SlowPage {
        fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
            Ok(())
        }

        fn find_all(&mut self, _selector: &str) -> Result<Vec<ElementRef>, BrowserError> {
            self.lookups += 1;
            if self.lookups > self.appears_after {
                Ok(vec![ElementRef("cell-0".into())])
            } else {
                Ok(vec![])
            }
        }

        fn clear(&mut self, _e: &ElementRef) -> Result<(), BrowserError> {
            Ok(())
        }

        fn send_text(&mut self, _e: &ElementRef, _text: &str) -> Result<(), BrowserError> {
            Ok(())
        }

        fn is_displayed(&mut self, _e: &ElementRef) -> Result<bool, BrowserError> {
            Ok(true)
        }

        fn is_enabled(&mut self, _e: &ElementRef) -> Result<bool, BrowserError> {
            if self.detached {
                Err(BrowserError::StaleElement)
            } else {
                Ok(true)
            }
        }

        fn text(&mut self, _e: &ElementRef) -> Result<String, BrowserError> {
            Ok("DELACRUZ, JUAN".into())
        }

        fn close(&mut self) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    fn quick() -> Wait {
        Wait::new(Duration::from_millis(200), Duration::from_millis(1))
    }

    #[test]
    fn waits_until_element_appears() {
        let mut page = SlowPage::new(3);
        let element = quick()
            .until(&mut page, "result", any_visible::<SlowPage>("span.cell-value"))
            .unwrap();
        assert_eq!(element, ElementRef("cell-0".into()));
        assert_eq!(page.lookups, 4);
    }

    #[test]
    fn times_out_when_nothing_renders() {
        let mut page = SlowPage::new(usize::MAX);
        let err = Wait::new(Duration::from_millis(20), Duration::from_millis(5))
            .until(&mut page, "result", all_visible::<SlowPage>("span.cell-value"))
            .unwrap_err();
        assert!(matches!(err, BrowserError::WaitTimeout { .. }));
        assert!(page.lookups >= 2);
    }

    #[test]
    fn clickable_requires_enabled() {
        let mut page = SlowPage::new(0);
        page.detached = true;
        let err = Wait::new(Duration::from_millis(10), Duration::from_millis(2))
            .until(&mut page, "input", element_clickable::<SlowPage>("input"))
            .unwrap_err();
        assert!(matches!(err, BrowserError::WaitTimeout { .. }));
    }

    #[test]
    fn staleness_detected() {
        let mut page = SlowPage::new(0);
        let element = ElementRef("cell-0".into());
        assert!(!page.is_stale(&element).unwrap());

        page.detached = true;
        quick()
            .until(&mut page, "old results to detach", staleness_of::<SlowPage>(&element))
            .unwrap();
    }

    #[test]
    fn capped_only_shortens() {
        let wait = Wait::new(Duration::from_secs(20), Duration::from_millis(250));
        assert_eq!(wait.capped(Duration::from_secs(2)).timeout, Duration::from_secs(2));
        assert_eq!(wait.capped(Duration::from_secs(60)).timeout, Duration::from_secs(20));
        assert_eq!(wait.capped(Duration::from_secs(2)).poll, Duration::from_millis(250));
    }

    #[test]
    fn fatal_errors_are_not_swallowed() {
        let mut page = SlowPage::new(0);
        let err = quick()
            .until(&mut page, "anything", |_: &mut SlowPage| -> Result<Option<()>, BrowserError> {
                Err(BrowserError::SessionLost { reason: "gone".into() })
            })
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
