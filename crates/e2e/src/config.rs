//! Harness configuration
//!
//! Loaded from a YAML file, then overridden by `SCANPAGE_E2E_*` environment
//! variables, then by CLI flags in the harness binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use scanpage_common::ApiConfig;

use crate::browser::WebDriverConfig;
use crate::driver::DriverSettings;
use crate::error::{E2eError, E2eResult};
use crate::retry::RetryPolicy;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SCANPAGE_E2E_";

/// Config file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = "scanpage-e2e.yaml";

/// Full harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Root URL of the application under test
    pub server_url: String,

    /// Keyword placed before API tokens in the `Authorization` header
    pub auth_scheme: String,

    pub request_timeout_ms: u64,

    pub webdriver: WebDriverConfig,

    pub driver: DriverSettings,

    pub retry: RetryPolicy,

    pub runner: RunnerSettings,

    pub fixtures: Fixtures,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            auth_scheme: "token".to_string(),
            request_timeout_ms: 30_000,
            webdriver: WebDriverConfig::default(),
            driver: DriverSettings::default(),
            retry: RetryPolicy::default(),
            runner: RunnerSettings::default(),
            fixtures: Fixtures::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Scenarios run at once, each with its own browser session
    pub concurrency: usize,

    /// Where `test-results.json` is written
    pub output_dir: PathBuf,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Users, groups and tokens provisioned outside the harness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub user_id: i64,
    pub group_admin_user_id: i64,
    pub view_only_user_id: i64,
    pub public_group_id: i64,
    pub public_filter_id: i64,
    pub public_candidate_id: String,
    pub public_candidate2_id: String,
    pub ztf_camera_id: i64,
    pub tokens: Tokens,
}

/// API tokens, one per permission set the scenarios need
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tokens {
    pub upload_data: String,
    pub super_admin: String,
    pub annotation: String,
    pub taxonomy: String,
    pub classification: String,
}

impl Fixtures {
    /// Names of fixture fields that were never filled in
    pub fn missing(&self) -> Vec<&'static str> {
        let ids = [
            ("user_id", self.user_id),
            ("group_admin_user_id", self.group_admin_user_id),
            ("view_only_user_id", self.view_only_user_id),
            ("public_group_id", self.public_group_id),
            ("public_filter_id", self.public_filter_id),
            ("ztf_camera_id", self.ztf_camera_id),
        ];
        let strings = [
            ("public_candidate_id", &self.public_candidate_id),
            ("public_candidate2_id", &self.public_candidate2_id),
            ("tokens.upload_data", &self.tokens.upload_data),
            ("tokens.super_admin", &self.tokens.super_admin),
            ("tokens.annotation", &self.tokens.annotation),
            ("tokens.taxonomy", &self.tokens.taxonomy),
            ("tokens.classification", &self.tokens.classification),
        ];

        ids.iter()
            .filter(|(_, id)| *id <= 0)
            .map(|(name, _)| *name)
            .chain(
                strings
                    .iter()
                    .filter(|(_, value)| value.is_empty())
                    .map(|(name, _)| *name),
            )
            .collect()
    }
}

impl E2eConfig {
    /// Parse a config from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a config from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from `path` (or the default file if it exists), then apply the
    /// process environment
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        let mut config = match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                info!("Loading config from {}", DEFAULT_CONFIG_FILE);
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No config file; using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SCANPAGE_E2E_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(url) = var("SERVER_URL") {
            self.server_url = url;
        }
        if let Some(url) = var("WEBDRIVER_URL") {
            self.webdriver.webdriver_url = url;
        }
        if let Some(browser) = var("BROWSER") {
            self.webdriver.browser = browser.parse()?;
        }
        if let Some(headless) = var("HEADLESS") {
            self.webdriver.headless = parse_bool("HEADLESS", &headless)?;
        }
        Ok(())
    }

    /// Fail unless every fixture the scenarios rely on is present
    pub fn validate(&self) -> E2eResult<()> {
        if self.runner.concurrency == 0 {
            return Err(E2eError::Config("runner.concurrency must be at least 1".to_string()));
        }
        let missing = self.fixtures.missing();
        if !missing.is_empty() {
            return Err(E2eError::Config(format!(
                "missing fixtures: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Settings for the API client
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            server_url: self.server_url.clone(),
            auth_scheme: self.auth_scheme.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> E2eResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::Config(format!(
            "{}{} must be a boolean, got '{}'",
            ENV_PREFIX, name, other
        ))),
    }
}
