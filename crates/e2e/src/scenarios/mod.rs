//! Candidate scanning page scenarios
//!
//! Each scenario seeds its own fixtures through the API with fresh ids,
//! drives the browser as a specific user, and waits for the page to reflect
//! the seeded state. Scenarios share nothing with each other.

mod annotations;
mod filtering;
mod saving;

use std::fmt;
use std::str::FromStr;

use scanpage_common::ApiClient;
use uuid::Uuid;

use crate::browser::Browser;
use crate::config::Fixtures;
use crate::driver::{ClickOptions, Driver};
use crate::error::{E2eError, E2eResult};
use crate::locators;

/// Reruns given to scenarios known to be timing-sensitive
pub const FLAKY_RERUNS: u32 = 2;

/// Everything a scenario needs for one attempt
pub struct ScenarioContext<B: Browser> {
    pub driver: Driver<B>,
    pub api: ApiClient,
    pub fixtures: Fixtures,
}

/// Registered scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    CandidateGroupFiltering,
    CandidateSavedStatusFiltering,
    CandidateDateFiltering,
    SaveCandidateQuickSave,
    SaveCandidateSelectGroups,
    SaveCandidateNoGroupsErrorMessage,
    SubmitAnnotationsSorting,
    SubmitAnnotationsFiltering,
    CandidateClassificationsFiltering,
    CandidateRedshiftFiltering,
    CandidateRejectionFiltering,
}

impl Scenario {
    pub const ALL: [Scenario; 11] = [
        Scenario::CandidateGroupFiltering,
        Scenario::CandidateSavedStatusFiltering,
        Scenario::CandidateDateFiltering,
        Scenario::SaveCandidateQuickSave,
        Scenario::SaveCandidateSelectGroups,
        Scenario::SaveCandidateNoGroupsErrorMessage,
        Scenario::SubmitAnnotationsSorting,
        Scenario::SubmitAnnotationsFiltering,
        Scenario::CandidateClassificationsFiltering,
        Scenario::CandidateRedshiftFiltering,
        Scenario::CandidateRejectionFiltering,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::CandidateGroupFiltering => "candidate_group_filtering",
            Scenario::CandidateSavedStatusFiltering => "candidate_saved_status_filtering",
            Scenario::CandidateDateFiltering => "candidate_date_filtering",
            Scenario::SaveCandidateQuickSave => "save_candidate_quick_save",
            Scenario::SaveCandidateSelectGroups => "save_candidate_select_groups",
            Scenario::SaveCandidateNoGroupsErrorMessage => "save_candidate_no_groups_error_message",
            Scenario::SubmitAnnotationsSorting => "submit_annotations_sorting",
            Scenario::SubmitAnnotationsFiltering => "submit_annotations_filtering",
            Scenario::CandidateClassificationsFiltering => "candidate_classifications_filtering",
            Scenario::CandidateRedshiftFiltering => "candidate_redshift_filtering",
            Scenario::CandidateRejectionFiltering => "candidate_rejection_filtering",
        }
    }

    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Scenario::CandidateGroupFiltering
            | Scenario::CandidateSavedStatusFiltering
            | Scenario::CandidateDateFiltering
            | Scenario::CandidateClassificationsFiltering
            | Scenario::CandidateRedshiftFiltering
            | Scenario::CandidateRejectionFiltering => &["filtering"],
            Scenario::SaveCandidateQuickSave
            | Scenario::SaveCandidateSelectGroups
            | Scenario::SaveCandidateNoGroupsErrorMessage => &["saving"],
            Scenario::SubmitAnnotationsSorting => &["annotations"],
            Scenario::SubmitAnnotationsFiltering => &["annotations", "filtering"],
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    /// Reruns the scenario is marked with, if it is known to be flaky
    pub fn flaky_reruns(&self) -> Option<u32> {
        match self {
            Scenario::CandidateClassificationsFiltering
            | Scenario::CandidateRedshiftFiltering
            | Scenario::CandidateRejectionFiltering => None,
            _ => Some(FLAKY_RERUNS),
        }
    }

    /// Scenarios carrying `tag`
    pub fn tagged(tag: &str) -> Vec<Scenario> {
        Self::ALL.into_iter().filter(|s| s.has_tag(tag)).collect()
    }

    /// Run one attempt of the scenario
    pub async fn run<B: Browser>(&self, cx: &ScenarioContext<B>) -> E2eResult<()> {
        match self {
            Scenario::CandidateGroupFiltering => filtering::candidate_group_filtering(cx).await,
            Scenario::CandidateSavedStatusFiltering => {
                filtering::candidate_saved_status_filtering(cx).await
            }
            Scenario::CandidateDateFiltering => filtering::candidate_date_filtering(cx).await,
            Scenario::SaveCandidateQuickSave => saving::save_candidate_quick_save(cx).await,
            Scenario::SaveCandidateSelectGroups => saving::save_candidate_select_groups(cx).await,
            Scenario::SaveCandidateNoGroupsErrorMessage => {
                saving::save_candidate_no_groups_error_message(cx).await
            }
            Scenario::SubmitAnnotationsSorting => annotations::submit_annotations_sorting(cx).await,
            Scenario::SubmitAnnotationsFiltering => {
                annotations::submit_annotations_filtering(cx).await
            }
            Scenario::CandidateClassificationsFiltering => {
                filtering::candidate_classifications_filtering(cx).await
            }
            Scenario::CandidateRedshiftFiltering => {
                filtering::candidate_redshift_filtering(cx).await
            }
            Scenario::CandidateRejectionFiltering => {
                filtering::candidate_rejection_filtering(cx).await
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| E2eError::ScenarioNotFound(s.to_string()))
    }
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fail the scenario with `message` unless `condition` holds
fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}

/// Log in as `user_id` and open the candidates page
async fn open_candidates<B: Browser>(cx: &ScenarioContext<B>, user_id: i64) -> E2eResult<()> {
    cx.driver.become_user(user_id).await?;
    cx.driver.get("/candidates").await
}

/// Tick a group checkbox in the search form
async fn select_group<B: Browser>(cx: &ScenarioContext<B>, group_id: i64) -> E2eResult<()> {
    cx.driver
        .click_xpath(&locators::group_checkbox(group_id), ClickOptions::present())
        .await
}

/// Open the candidates page as `user_id`, filter on the public group and search
async fn search_public_group<B: Browser>(cx: &ScenarioContext<B>, user_id: i64) -> E2eResult<()> {
    open_candidates(cx, user_id).await?;
    select_group(cx, cx.fixtures.public_group_id).await?;
    cx.driver
        .click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await
}

/// Pick `value` from the menu list that is currently open
async fn choose_menu_option<B: Browser>(cx: &ScenarioContext<B>, value: &str) -> E2eResult<()> {
    cx.driver
        .click_xpath(
            &locators::menu_option(value),
            ClickOptions::default().scroll_parent(),
        )
        .await
}
