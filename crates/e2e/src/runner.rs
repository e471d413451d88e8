//! Test runner that opens browser sessions, reruns flaky scenarios and
//! collects results

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use scanpage_common::ApiClient;

use crate::browser::SessionFactory;
use crate::config::E2eConfig;
use crate::driver::Driver;
use crate::error::E2eResult;
use crate::scenarios::{Scenario, ScenarioContext};

/// File written into the output directory
pub const RESULTS_FILE: &str = "test-results.json";

/// Result of running a single scenario, reruns included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub attempts: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Registered scenarios left out by a tag or name selection
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, skipped: usize, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            skipped,
            duration_ms,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main E2E test runner
pub struct TestRunner<S: SessionFactory> {
    sessions: S,
    api: ApiClient,
    config: E2eConfig,
}

impl<S: SessionFactory> TestRunner<S> {
    pub fn new(sessions: S, config: E2eConfig) -> E2eResult<Self> {
        let api = ApiClient::new(config.api_config())?;
        Ok(Self {
            sessions,
            api,
            config,
        })
    }

    pub fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Run every registered scenario
    pub async fn run_all(&self) -> TestSuiteResult {
        self.run_scenarios(&Scenario::ALL).await
    }

    /// Run scenarios carrying `tag`
    pub async fn run_tagged(&self, tag: &str) -> TestSuiteResult {
        self.run_scenarios(&Scenario::tagged(tag)).await
    }

    /// Run one scenario by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestSuiteResult> {
        let scenario: Scenario = name.parse()?;
        Ok(self.run_scenarios(&[scenario]).await)
    }

    /// Run `scenarios`, up to `runner.concurrency` at a time. Results keep
    /// the order of `scenarios`.
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> TestSuiteResult {
        let start = Instant::now();
        let concurrency = self.config.runner.concurrency.max(1);
        let skipped = Scenario::ALL
            .iter()
            .filter(|scenario| !scenarios.contains(scenario))
            .count();

        info!(
            "Running {} scenario(s), {} at a time...",
            scenarios.len(),
            concurrency
        );

        let results: Vec<TestResult> = stream::iter(scenarios.iter().copied())
            .map(|scenario| self.run_scenario(scenario))
            .buffered(concurrency)
            .collect()
            .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let suite = TestSuiteResult::from_results(results, skipped, duration_ms);

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );
        suite
    }

    /// Run one scenario under the retry policy
    pub async fn run_scenario(&self, scenario: Scenario) -> TestResult {
        let start = Instant::now();
        let name = scenario.name();
        let reruns = self
            .config
            .retry
            .reruns_for(name, scenario.flaky_reruns());
        debug!("Running {} (up to {} rerun(s))", name, reruns);

        let outcome = self
            .config
            .retry
            .run(name, reruns, |attempt| self.attempt(scenario, attempt))
            .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let error = match outcome.result {
            Ok(()) => {
                info!("✓ {} ({} ms, {} attempt(s))", name, duration_ms, outcome.attempts);
                None
            }
            Err(e) => {
                error!("✗ {} - {}", name, e);
                Some(e.to_string())
            }
        };

        TestResult {
            name: name.to_string(),
            success: error.is_none(),
            attempts: outcome.attempts,
            duration_ms,
            error,
        }
    }

    /// One attempt in a fresh browser session. The session is closed whether
    /// or not the scenario passed.
    async fn attempt(&self, scenario: Scenario, attempt: u32) -> E2eResult<()> {
        debug!("{} attempt {}", scenario, attempt);
        let browser = self.sessions.open().await?;
        let cx = ScenarioContext {
            driver: Driver::new(browser, self.config.server_url.as_str(), self.config.driver),
            api: self.api.clone(),
            fixtures: self.config.fixtures.clone(),
        };

        let result = scenario.run(&cx).await;

        if let Err(e) = cx.driver.quit().await {
            warn!("Failed to close browser session for {}: {}", scenario, e);
        }
        result
    }

    /// Write results to `test-results.json` under the configured output dir
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.config.runner.output_dir, results)
    }
}

/// Write results to `test-results.json` under `output_dir`
pub fn write_results(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SessionFactory;
    use crate::config::Fixtures;
    use crate::error::E2eError;
    use crate::locators;
    use crate::testing::{FakeBrowser, FakeNode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeSessions {
        browser: FakeBrowser,
        opened: AtomicU32,
        fail_open: bool,
    }

    impl FakeSessions {
        fn new(browser: FakeBrowser) -> Self {
            Self {
                browser,
                opened: AtomicU32::new(0),
                fail_open: false,
            }
        }
    }

    #[async_trait]
    impl SessionFactory for FakeSessions {
        type Browser = FakeBrowser;

        async fn open(&self) -> E2eResult<FakeBrowser> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(E2eError::Session("chromedriver not running".to_string()));
            }
            Ok(self.browser.clone())
        }
    }

    fn config() -> E2eConfig {
        let mut config = E2eConfig {
            fixtures: Fixtures {
                group_admin_user_id: 3,
                public_group_id: 5,
                public_candidate_id: "ZTF20public1".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        config.driver.wait_timeout_ms = 1000;
        config.driver.click_timeout_ms = 1000;
        config
    }

    fn quick_save_page(browser: &FakeBrowser) {
        browser.add(FakeNode::new(&locators::group_checkbox(5)));
        browser.add(FakeNode::new(locators::SEARCH_BUTTON));
        browser.add(FakeNode::new(&locators::candidate_link("ZTF20public1")));
        browser.add(
            FakeNode::new(&locators::initial_save_button("ZTF20public1")).disappear_after(1),
        );
        browser.add(FakeNode::new(locators::PREVIOUSLY_SAVED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_passing_scenario_runs_once_and_quits() {
        let browser = FakeBrowser::new();
        quick_save_page(&browser);
        let runner = TestRunner::new(FakeSessions::new(browser.clone()), config()).unwrap();

        let result = runner.run_scenario(Scenario::SaveCandidateQuickSave).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.attempts, 1);
        assert_eq!(runner.sessions.opened.load(Ordering::SeqCst), 1);
        let log = browser.log();
        assert_eq!(log[0], "goto http://localhost:5000/become_user/3");
        assert_eq!(log[1], "goto http://localhost:5000/candidates");
        assert_eq!(log.last().map(String::as_str), Some("quit"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_scenario_gets_fresh_session_per_attempt() {
        let browser = FakeBrowser::new();
        let runner = TestRunner::new(FakeSessions::new(browser.clone()), config()).unwrap();

        let result = runner.run_scenario(Scenario::SaveCandidateQuickSave).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 3);
        assert_eq!(runner.sessions.opened.load(Ordering::SeqCst), 3);
        let quits = browser.log().iter().filter(|entry| *entry == "quit").count();
        assert_eq!(quits, 3);
        assert!(result.error.unwrap().contains("Timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_disables_reruns() {
        let mut config = config();
        config
            .retry
            .overrides
            .insert("save_candidate_quick_save".to_string(), 0);
        let runner = TestRunner::new(FakeSessions::new(FakeBrowser::new()), config).unwrap();

        let result = runner.run_scenario(Scenario::SaveCandidateQuickSave).await;
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_session_failure_is_reported() {
        let mut sessions = FakeSessions::new(FakeBrowser::new());
        sessions.fail_open = true;
        let runner = TestRunner::new(sessions, config()).unwrap();

        let result = runner.run_scenario(Scenario::CandidateRejectionFiltering).await;
        assert!(!result.success);
        assert_eq!(result.attempts, 1);
        assert!(result.error.unwrap().contains("chromedriver not running"));
    }

    #[tokio::test]
    async fn test_unknown_scenario_name() {
        let runner = TestRunner::new(FakeSessions::new(FakeBrowser::new()), config()).unwrap();
        let err = runner.run_test("candidate_teleport").await.unwrap_err();
        assert!(matches!(err, E2eError::ScenarioNotFound(_)));
    }

    #[tokio::test]
    async fn test_suite_keeps_scenario_order() {
        let mut sessions = FakeSessions::new(FakeBrowser::new());
        sessions.fail_open = true;
        let mut config = config();
        config.retry.default_reruns = 0;
        config.runner.concurrency = 3;
        let runner = TestRunner::new(sessions, config).unwrap();

        let suite = runner.run_tagged("saving").await;
        let names: Vec<&str> = suite.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "save_candidate_quick_save",
                "save_candidate_select_groups",
                "save_candidate_no_groups_error_message",
            ]
        );
        assert_eq!(suite.total, 3);
        assert_eq!(suite.failed, 3);
        assert_eq!(suite.skipped, Scenario::ALL.len() - 3);
        assert!(!suite.success());
    }

    #[tokio::test]
    async fn test_run_by_name_counts_the_rest_as_skipped() {
        let mut sessions = FakeSessions::new(FakeBrowser::new());
        sessions.fail_open = true;
        let runner = TestRunner::new(sessions, config()).unwrap();

        let suite = runner.run_test("candidate_rejection_filtering").await.unwrap();
        assert_eq!(suite.total, 1);
        assert_eq!(suite.skipped, 10);
        assert_eq!(suite.results[0].name, "candidate_rejection_filtering");
    }

    #[tokio::test]
    async fn test_full_run_skips_nothing() {
        let mut sessions = FakeSessions::new(FakeBrowser::new());
        sessions.fail_open = true;
        let mut config = config();
        config.retry.default_reruns = 0;
        config.runner.concurrency = 4;
        let runner = TestRunner::new(sessions, config).unwrap();

        let suite = runner.run_all().await;
        assert_eq!(suite.total, Scenario::ALL.len());
        assert_eq!(suite.skipped, 0);
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let suite = TestSuiteResult::from_results(
            vec![
                TestResult {
                    name: "candidate_group_filtering".to_string(),
                    success: true,
                    attempts: 2,
                    duration_ms: 1200,
                    error: None,
                },
                TestResult {
                    name: "candidate_redshift_filtering".to_string(),
                    success: false,
                    attempts: 1,
                    duration_ms: 5000,
                    error: Some("boom".to_string()),
                },
            ],
            9,
            6200,
        );

        let path = write_results(&dir.path().join("out"), &suite).unwrap();
        assert_eq!(path.file_name().unwrap(), RESULTS_FILE);

        let written: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.total, 2);
        assert_eq!(written.passed, 1);
        assert_eq!(written.failed, 1);
        assert_eq!(written.skipped, 9);
        assert_eq!(written.results[0].attempts, 2);
    }
}
