//! XPath wait helpers layered over a [`Browser`] session
//!
//! Every helper is idempotent: waiting for something that is already true
//! returns on the first poll. Timeouts name the locator, the awaited
//! condition and how long was spent waiting.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::Browser;
use crate::error::E2eResult;
use crate::wait::{
    Condition, Poller, DEFAULT_CLICK_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};

/// True when the topmost element at the centre of `arguments[0]` is the
/// element itself or one of its descendants.
pub const IS_UNOBSCURED_JS: &str = r#"
    const el = arguments[0];
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) { return false; }
    const x = rect.left + rect.width / 2;
    const y = rect.top + rect.height / 2;
    const top = document.elementFromPoint(x, y);
    return top !== null && (top === el || el.contains(top));
"#;

pub const SCROLL_INTO_VIEW_JS: &str = "arguments[0].scrollIntoView({block: 'center'});";

pub const SCROLL_PARENT_INTO_VIEW_JS: &str =
    "arguments[0].parentNode.scrollIntoView({block: 'center'});";

pub const SCRIPT_CLICK_JS: &str = "arguments[0].click();";

/// Scroll so the element sits at the bottom edge of the viewport, leaving room
/// for dialogs that open below it.
pub const SCROLL_ELEMENT_TO_TOP_JS: &str = r#"
    const viewPortHeight = Math.max(document.documentElement.clientHeight, window.innerHeight || 0);
    const elementTop = arguments[0].getBoundingClientRect().top;
    window.scrollBy(0, viewPortHeight - elementTop);
"#;

/// What gets scrolled into view before a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollStrategy {
    /// The element itself
    #[default]
    Element,
    /// The element's parent node; for entries inside overflow or virtualized
    /// containers such as menu lists
    Parent,
}

impl ScrollStrategy {
    fn script(&self) -> &'static str {
        match self {
            ScrollStrategy::Element => SCROLL_INTO_VIEW_JS,
            ScrollStrategy::Parent => SCROLL_PARENT_INTO_VIEW_JS,
        }
    }
}

/// How [`Driver::click_xpath`] locates and clicks its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    /// Wait for clickability rather than mere presence
    pub wait_clickable: bool,
    pub scroll: ScrollStrategy,
    /// `None` uses the driver's click timeout
    pub timeout: Option<Duration>,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            wait_clickable: true,
            scroll: ScrollStrategy::Element,
            timeout: None,
        }
    }
}

impl ClickOptions {
    /// Click as soon as the element exists
    pub fn present() -> Self {
        Self {
            wait_clickable: false,
            ..Self::default()
        }
    }

    pub fn scroll_parent(mut self) -> Self {
        self.scroll = ScrollStrategy::Parent;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Default timeouts and retry budget for a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    pub wait_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Scroll-and-click attempts before falling back to a script click
    pub click_attempts: u32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT.as_millis() as u64,
            click_timeout_ms: DEFAULT_CLICK_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            click_attempts: 3,
        }
    }
}

impl DriverSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Browser session plus the application's base URL
pub struct Driver<B: Browser> {
    browser: B,
    base_url: String,
    settings: DriverSettings,
}

impl<B: Browser> Driver<B> {
    pub fn new(browser: B, base_url: impl Into<String>, settings: DriverSettings) -> Self {
        Self {
            browser,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Absolute URL for an application path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Navigate to an application path
    pub async fn get(&self, path: &str) -> E2eResult<()> {
        self.browser.goto(&self.url(path)).await
    }

    /// Switch the session to another user through the test-mode login route
    pub async fn become_user(&self, user_id: i64) -> E2eResult<()> {
        debug!("Becoming user {}", user_id);
        self.get(&format!("/become_user/{}", user_id)).await
    }

    fn poller(&self, timeout: Option<Duration>, default: Duration) -> Poller {
        Poller::new(timeout.unwrap_or(default), self.settings.poll_interval())
    }

    /// Wait until at least one element matches; returns the first match
    pub async fn wait_for_xpath(
        &self,
        xpath: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<B::Element> {
        let browser = &self.browser;
        self.poller(timeout, self.settings.wait_timeout())
            .until(xpath, Condition::Present, move || async move {
                Ok(browser.find_all(xpath).await?.into_iter().next())
            })
            .await
    }

    /// Wait until nothing matches
    pub async fn wait_for_xpath_to_disappear(
        &self,
        xpath: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<()> {
        let browser = &self.browser;
        self.poller(timeout, self.settings.wait_timeout())
            .until(xpath, Condition::Absent, move || async move {
                let matches = browser.find_all(xpath).await?;
                Ok(matches.is_empty().then_some(()))
            })
            .await
    }

    /// Wait until a match is displayed, enabled and not covered by another
    /// element once scrolled into view
    pub async fn wait_for_xpath_to_be_clickable(
        &self,
        xpath: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<B::Element> {
        self.wait_clickable(xpath, ScrollStrategy::Element, timeout).await
    }

    async fn wait_clickable(
        &self,
        xpath: &str,
        strategy: ScrollStrategy,
        timeout: Option<Duration>,
    ) -> E2eResult<B::Element> {
        self.poller(timeout, self.settings.wait_timeout())
            .until(xpath, Condition::Clickable, || {
                self.first_clickable(xpath, strategy)
            })
            .await
    }

    async fn first_clickable(
        &self,
        xpath: &str,
        strategy: ScrollStrategy,
    ) -> E2eResult<Option<B::Element>> {
        for element in self.browser.find_all(xpath).await? {
            if !self.is_interactable(&element).await? {
                continue;
            }
            // The hit test only sees what is inside the viewport
            self.scroll_to_element(&element, strategy).await?;
            if self.is_unobscured(&element).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Displayed and enabled
    pub async fn is_interactable(&self, element: &B::Element) -> E2eResult<bool> {
        if !self.browser.is_displayed(element).await? {
            return Ok(false);
        }
        self.browser.is_enabled(element).await
    }

    /// Topmost at its centre point within the current viewport
    pub async fn is_unobscured(&self, element: &B::Element) -> E2eResult<bool> {
        let unobscured = self.browser.execute_with(IS_UNOBSCURED_JS, element).await?;
        Ok(unobscured.as_bool().unwrap_or(false))
    }

    /// Wait for `xpath`, then scroll it (or its parent) into view and click it
    pub async fn click_xpath(&self, xpath: &str, options: ClickOptions) -> E2eResult<()> {
        let timeout = Some(options.timeout.unwrap_or(self.settings.click_timeout()));
        let element = if options.wait_clickable {
            self.wait_clickable(xpath, options.scroll, timeout).await?
        } else {
            self.wait_for_xpath(xpath, timeout).await?
        };
        debug!("click {}", xpath);
        self.scroll_and_click(&element, options.scroll).await
    }

    pub async fn scroll_to_element(
        &self,
        element: &B::Element,
        strategy: ScrollStrategy,
    ) -> E2eResult<()> {
        self.browser.execute_with(strategy.script(), element).await?;
        Ok(())
    }

    /// Scroll the element into view and click it, re-scrolling while another
    /// element intercepts the click
    pub async fn scroll_to_element_and_click(&self, element: &B::Element) -> E2eResult<()> {
        self.scroll_and_click(element, ScrollStrategy::Element).await
    }

    async fn scroll_and_click(
        &self,
        element: &B::Element,
        strategy: ScrollStrategy,
    ) -> E2eResult<()> {
        let attempts = self.settings.click_attempts.max(1);

        for attempt in 1..=attempts {
            self.scroll_to_element(element, strategy).await?;
            match self.browser.click(element).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_intercepted() => {
                    warn!("Click attempt {}/{} intercepted: {}", attempt, attempts, e);
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.poll_interval()).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        warn!("Falling back to script click after {} intercepted attempt(s)", attempts);
        self.browser.execute_with(SCRIPT_CLICK_JS, element).await?;
        Ok(())
    }

    /// Run a script with the element bound to `arguments[0]`
    pub async fn execute_script(&self, script: &str, element: &B::Element) -> E2eResult<Value> {
        self.browser.execute_with(script, element).await
    }

    pub async fn scroll_element_to_top(&self, element: &B::Element) -> E2eResult<()> {
        self.browser.execute_with(SCROLL_ELEMENT_TO_TOP_JS, element).await?;
        Ok(())
    }

    pub async fn click(&self, element: &B::Element) -> E2eResult<()> {
        self.browser.click(element).await
    }

    pub async fn clear(&self, element: &B::Element) -> E2eResult<()> {
        self.browser.clear(element).await
    }

    pub async fn send_keys(&self, element: &B::Element, text: &str) -> E2eResult<()> {
        self.browser.send_keys(element, text).await
    }

    /// Clear an input and type a new value
    pub async fn replace_text(&self, element: &B::Element, text: &str) -> E2eResult<()> {
        self.browser.clear(element).await?;
        self.browser.send_keys(element, text).await
    }

    pub async fn text(&self, element: &B::Element) -> E2eResult<String> {
        self.browser.text(element).await
    }

    /// End the browser session
    pub async fn quit(self) -> E2eResult<()> {
        self.browser.quit().await
    }
}
