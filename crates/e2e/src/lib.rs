//! Scanning page E2E harness
//!
//! Drives the candidate scanning page of a live portal through WebDriver:
//! - Seeds fixtures through the portal's JSON API
//! - Waits on XPath locators with bounded polling
//! - Clicks through overlays with scroll/retry/script fallbacks
//! - Reruns flaky scenarios in fresh browser sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 E2E Test Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner<S: SessionFactory>                              │
//! │    ├── run_all() / run_tagged(tag) / run_test(name)         │
//! │    ├── RetryPolicy: reruns per scenario name                │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (registry)                                        │
//! │    ├── ApiClient: seed candidates, sources, annotations...  │
//! │    └── Driver<B: Browser>                                   │
//! │          ├── wait_for_xpath / _to_disappear / _clickable    │
//! │          ├── click_xpath(xpath, ClickOptions)               │
//! │          └── scroll_to_element_and_click                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Browser: WebDriverSession (fantoccini)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod locators;
pub mod retry;
pub mod runner;
pub mod scenarios;
pub mod wait;

#[cfg(test)]
mod testing;

pub use browser::{Browser, BrowserKind, SessionFactory, WebDriverConfig, WebDriverSession};
pub use config::{E2eConfig, Fixtures};
pub use driver::{ClickOptions, Driver, DriverSettings, ScrollStrategy};
pub use error::{E2eError, E2eResult};
pub use retry::RetryPolicy;
pub use runner::{TestResult, TestRunner, TestSuiteResult};
pub use scenarios::Scenario;
pub use wait::{Condition, Poller};
