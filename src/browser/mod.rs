//! Browser automation session.
//!
//! The scan only needs a handful of operations from a browser: navigate,
//! find elements by CSS selector, clear/type/submit into an input, and read
//! visibility and text. [`Session`] captures exactly that so the controller
//! can be driven by a real WebDriver session or an in-process fake.
//!
//! - **`webdriver`**: blocking W3C WebDriver client (geckodriver, chromedriver).
//! - **`wait`**: bounded polling waits with the usual expected conditions.

pub mod error;
pub mod wait;
pub mod webdriver;

pub use error::BrowserError;
pub use wait::Wait;
pub use webdriver::{WebDriverOptions, WebDriverSession};

/// WebDriver key code for Enter.
pub const ENTER: &str = "\u{E007}";

/// Opaque handle to a DOM element, valid until the element leaves the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

pub trait Session {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// All elements matching `selector`, in document order.
    fn find_all(&mut self, selector: &str) -> Result<Vec<ElementRef>, BrowserError>;

    fn clear(&mut self, element: &ElementRef) -> Result<(), BrowserError>;

    fn send_text(&mut self, element: &ElementRef, text: &str) -> Result<(), BrowserError>;

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, BrowserError>;

    fn is_enabled(&mut self, element: &ElementRef) -> Result<bool, BrowserError>;

    fn text(&mut self, element: &ElementRef) -> Result<String, BrowserError>;

    /// End the session. Calling it twice is harmless.
    fn close(&mut self) -> Result<(), BrowserError>;

    fn find(&mut self, selector: &str) -> Result<Option<ElementRef>, BrowserError> {
        Ok(self.find_all(selector)?.into_iter().next())
    }

    /// Press Enter in the element.
    fn submit(&mut self, element: &ElementRef) -> Result<(), BrowserError> {
        self.send_text(element, ENTER)
    }

    /// True once the element is no longer attached to the page.
    fn is_stale(&mut self, element: &ElementRef) -> Result<bool, BrowserError> {
        match self.is_enabled(element) {
            Ok(_) => Ok(false),
            Err(BrowserError::StaleElement) => Ok(true),
            Err(e) => Err(e),
        }
    }
}
