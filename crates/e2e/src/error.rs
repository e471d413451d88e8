//! Error types for E2E testing

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Timed out after {:.1}s waiting for {locator} to {condition}", .elapsed.as_secs_f64())]
    Timeout {
        locator: String,
        condition: &'static str,
        elapsed: Duration,
    },

    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("API error: {0}")]
    Api(#[from] scanpage_common::Error),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl E2eError {
    /// Element was re-rendered between lookup and use
    pub fn is_stale(&self) -> bool {
        matches!(self, E2eError::StaleElement(_))
    }

    /// Another element would have received the click
    pub fn is_intercepted(&self) -> bool {
        matches!(self, E2eError::ClickIntercepted(_))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
