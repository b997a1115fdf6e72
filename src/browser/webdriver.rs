//! Blocking W3C WebDriver client.
//!
//! Talks to a running geckodriver or chromedriver over HTTP. Only the
//! endpoints the scan needs are implemented. The remote session is deleted
//! on `close` or, failing that, when the value is dropped.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{BrowserError, ElementRef, Session};

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Firefox,
    Chrome,
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "firefox" => Ok(Browser::Firefox),
            "chrome" | "chromium" => Ok(Browser::Chrome),
            other => Err(format!("unsupported browser '{other}' (expected firefox or chrome)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    pub endpoint: String,
    pub browser: Browser,
    pub headless: bool,
    /// Upper bound on any single HTTP round trip to the driver.
    pub request_timeout: Duration,
}

impl Default for WebDriverOptions {
    fn default() -> Self {
        WebDriverOptions {
            endpoint: "http://localhost:4444".to_string(),
            browser: Browser::Firefox,
            headless: true,
            request_timeout: Duration::from_secs(60),
        }
    }
}

fn capabilities(options: &WebDriverOptions) -> Value {
    let always_match = match options.browser {
        Browser::Firefox => {
            let args: Vec<&str> = if options.headless { vec!["-headless"] } else { vec![] };
            json!({ "browserName": "firefox", "moz:firefoxOptions": { "args": args } })
        }
        Browser::Chrome => {
            let args: Vec<&str> = if options.headless { vec!["--headless=new"] } else { vec![] };
            json!({ "browserName": "chrome", "goog:chromeOptions": { "args": args } })
        }
    };
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Map a WebDriver error payload (`{"value": {"error", "message"}}`) onto our errors.
fn driver_error(body: &Value) -> BrowserError {
    let value = body.get("value").unwrap_or(body);
    let error = value
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_string();

    match error.as_str() {
        "stale element reference" => BrowserError::StaleElement,
        "no such element" => BrowserError::ElementNotFound { selector: message },
        "invalid session id" | "no such window" => BrowserError::SessionLost { reason: message },
        _ => BrowserError::Driver { error, message },
    }
}

fn element_refs(value: &Value) -> Result<Vec<ElementRef>, BrowserError> {
    let items = value.as_array().ok_or_else(|| BrowserError::Protocol {
        detail: format!("expected an array of elements, got {value}"),
    })?;

    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(|id| id.as_str())
                .map(|id| ElementRef(id.to_string()))
                .ok_or_else(|| BrowserError::Protocol {
                    detail: format!("element reference missing from {item}"),
                })
        })
        .collect()
}

pub struct WebDriverSession {
    http: Client,
    endpoint: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Create a new remote session; fails if the driver is unreachable.
    pub fn start(options: &WebDriverOptions) -> Result<Self, BrowserError> {
        let endpoint = options.endpoint.trim_end_matches('/').to_string();
        let connection_failed = |reason: String| BrowserError::ConnectionFailed {
            url: endpoint.clone(),
            reason,
        };

        let http = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| connection_failed(e.to_string()))?;

        let resp = http
            .post(format!("{endpoint}/session"))
            .json(&capabilities(options))
            .send()
            .map_err(|e| connection_failed(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp.json().map_err(|e| connection_failed(e.to_string()))?;
        if !status.is_success() {
            return Err(connection_failed(driver_error(&body).to_string()));
        }

        let session_id = body
            .pointer("/value/sessionId")
            .and_then(|id| id.as_str())
            .ok_or_else(|| connection_failed(format!("no sessionId in {body}")))?
            .to_string();

        tracing::debug!(session = %session_id, browser = ?options.browser, "webdriver session started");

        Ok(WebDriverSession {
            http,
            endpoint,
            session_id: Some(session_id),
        })
    }

    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, BrowserError> {
        let session_id = self.session_id.as_deref().ok_or_else(|| BrowserError::SessionLost {
            reason: "session already closed".to_string(),
        })?;
        let url = format!("{}/session/{session_id}{path}", self.endpoint);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let resp = request.send().map_err(|e| {
            if e.is_connect() {
                BrowserError::SessionLost { reason: e.to_string() }
            } else {
                BrowserError::Protocol { detail: e.to_string() }
            }
        })?;

        let status = resp.status();
        let payload: Value = resp.json().map_err(|e| BrowserError::Protocol {
            detail: format!("{url}: {e}"),
        })?;

        if !status.is_success() {
            return Err(driver_error(&payload));
        }
        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }

    fn element_command(
        &self,
        method: Method,
        element: &ElementRef,
        action: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        self.command(method, &format!("/element/{}/{action}", element.0), body)
    }

    fn expect_bool(value: Value) -> Result<bool, BrowserError> {
        value.as_bool().ok_or_else(|| BrowserError::Protocol {
            detail: format!("expected a boolean, got {value}"),
        })
    }
}

impl Session for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn find_all(&mut self, selector: &str) -> Result<Vec<ElementRef>, BrowserError> {
        let value = self.command(
            Method::POST,
            "/elements",
            Some(json!({ "using": "css selector", "value": selector })),
        )?;
        element_refs(&value)
    }

    fn clear(&mut self, element: &ElementRef) -> Result<(), BrowserError> {
        self.element_command(Method::POST, element, "clear", Some(json!({})))?;
        Ok(())
    }

    fn send_text(&mut self, element: &ElementRef, text: &str) -> Result<(), BrowserError> {
        self.element_command(Method::POST, element, "value", Some(json!({ "text": text })))?;
        Ok(())
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, BrowserError> {
        Self::expect_bool(self.element_command(Method::GET, element, "displayed", None)?)
    }

    fn is_enabled(&mut self, element: &ElementRef) -> Result<bool, BrowserError> {
        Self::expect_bool(self.element_command(Method::GET, element, "enabled", None)?)
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, BrowserError> {
        let value = self.element_command(Method::GET, element, "text", None)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let url = format!("{}/session/{session_id}", self.endpoint);
        self.http
            .delete(&url)
            .send()
            .map_err(|e| BrowserError::Protocol { detail: e.to_string() })?;
        tracing::debug!(session = %session_id, "webdriver session closed");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to close webdriver session: {e}");
        }
    }
}
