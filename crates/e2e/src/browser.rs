//! Raw browser automation: the seam the driver wraps
//!
//! [`Browser`] is the handful of WebDriver commands the wait helpers need.
//! [`WebDriverSession`] implements it over a `fantoccini` client talking to
//! chromedriver or geckodriver.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder, Locator};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

/// Commands issued against a live browser session
#[async_trait]
pub trait Browser: Send + Sync {
    type Element: Clone + fmt::Debug + Send + Sync;

    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> E2eResult<()>;

    /// All elements matching an XPath expression, in document order
    async fn find_all(&self, xpath: &str) -> E2eResult<Vec<Self::Element>>;

    async fn is_displayed(&self, element: &Self::Element) -> E2eResult<bool>;

    async fn is_enabled(&self, element: &Self::Element) -> E2eResult<bool>;

    async fn click(&self, element: &Self::Element) -> E2eResult<()>;

    async fn clear(&self, element: &Self::Element) -> E2eResult<()>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> E2eResult<()>;

    async fn text(&self, element: &Self::Element) -> E2eResult<String>;

    /// Run `script` in the page with `element` bound to `arguments[0]`
    async fn execute_with(&self, script: &str, element: &Self::Element) -> E2eResult<Value>;

    /// End the session
    async fn quit(&self) -> E2eResult<()>;
}

/// Opens one fresh browser per test attempt
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Browser: Browser;

    async fn open(&self) -> E2eResult<Self::Browser>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// How to reach and launch the WebDriver browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// chromedriver / geckodriver endpoint
    pub webdriver_url: String,

    pub browser: BrowserKind,

    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser: BrowserKind::Chrome,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }
}

impl WebDriverConfig {
    /// W3C capabilities requesting the configured browser
    pub fn capabilities(&self) -> serde_json::Map<String, Value> {
        let mut caps = serde_json::Map::new();
        caps.insert("browserName".to_string(), json!(self.browser.as_str()));

        match self.browser {
            BrowserKind::Chrome => {
                let mut args = vec![
                    format!("--window-size={},{}", self.viewport_width, self.viewport_height),
                    "--disable-gpu".to_string(),
                    "--no-sandbox".to_string(),
                ];
                if self.headless {
                    args.push("--headless=new".to_string());
                }
                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
            }
            BrowserKind::Firefox => {
                let mut args = vec![
                    format!("--width={}", self.viewport_width),
                    format!("--height={}", self.viewport_height),
                ];
                if self.headless {
                    args.push("-headless".to_string());
                }
                caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
            }
        }

        caps
    }

    /// Start a new WebDriver session
    pub async fn connect(&self) -> E2eResult<WebDriverSession> {
        info!(
            "Starting {} session via {} (headless: {})",
            self.browser, self.webdriver_url, self.headless
        );

        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| E2eError::Session(format!("{}: {}", self.webdriver_url, e)))?;

        client
            .set_window_size(self.viewport_width, self.viewport_height)
            .await
            .map_err(|e| cmd_error("set window size", e))?;

        Ok(WebDriverSession { client })
    }
}

#[async_trait]
impl SessionFactory for WebDriverConfig {
    type Browser = WebDriverSession;

    async fn open(&self) -> E2eResult<WebDriverSession> {
        self.connect().await
    }
}

/// Classify a WebDriver command failure
fn cmd_error(context: &str, e: CmdError) -> E2eError {
    if let CmdError::Standard(ref wd) = e {
        match wd.error {
            ErrorStatus::ElementClickIntercepted => {
                return E2eError::ClickIntercepted(format!("{}: {}", context, wd.message));
            }
            ErrorStatus::StaleElementReference => {
                return E2eError::StaleElement(format!("{}: {}", context, wd.message));
            }
            _ => {}
        }
    }
    E2eError::WebDriver(format!("{}: {}", context, e))
}

/// Live WebDriver session
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Underlying client, for commands the driver does not wrap
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    type Element = fantoccini::elements::Element;

    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        self.client.goto(url).await.map_err(|e| cmd_error(url, e))
    }

    async fn find_all(&self, xpath: &str) -> E2eResult<Vec<Self::Element>> {
        self.client
            .find_all(Locator::XPath(xpath))
            .await
            .map_err(|e| cmd_error(xpath, e))
    }

    async fn is_displayed(&self, element: &Self::Element) -> E2eResult<bool> {
        element.is_displayed().await.map_err(|e| cmd_error("is_displayed", e))
    }

    async fn is_enabled(&self, element: &Self::Element) -> E2eResult<bool> {
        element.is_enabled().await.map_err(|e| cmd_error("is_enabled", e))
    }

    async fn click(&self, element: &Self::Element) -> E2eResult<()> {
        element.click().await.map_err(|e| cmd_error("click", e))
    }

    async fn clear(&self, element: &Self::Element) -> E2eResult<()> {
        element.clear().await.map_err(|e| cmd_error("clear", e))
    }

    async fn send_keys(&self, element: &Self::Element, text: &str) -> E2eResult<()> {
        element.send_keys(text).await.map_err(|e| cmd_error("send_keys", e))
    }

    async fn text(&self, element: &Self::Element) -> E2eResult<String> {
        element.text().await.map_err(|e| cmd_error("text", e))
    }

    async fn execute_with(&self, script: &str, element: &Self::Element) -> E2eResult<Value> {
        let arg = serde_json::to_value(element)?;
        self.client
            .execute(script, vec![arg])
            .await
            .map_err(|e| cmd_error("execute", e))
    }

    async fn quit(&self) -> E2eResult<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| cmd_error("close session", e))
    }
}
