//! Search form filters: groups, saved status, dates, classifications,
//! redshift and rejection

use std::time::Duration;

use scanpage_common::{
    CandidatePayload, ClassificationPayload, GroupPayload, PhotometryPayload, SourcePayload,
    TaxonomyPayload,
};
use tracing::debug;

use super::{choose_menu_option, fresh_id, open_candidates, select_group, ScenarioContext};
use crate::browser::Browser;
use crate::driver::ClickOptions;
use crate::error::E2eResult;
use crate::locators;

const BATCH: usize = 5;

/// Date-filtered searches can take a while to come back
const DATE_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

fn batch_ids() -> Vec<String> {
    let base = fresh_id();
    (0..BATCH).map(|i| format!("{}_{}", base, i)).collect()
}

async fn post_candidates<B: Browser>(cx: &ScenarioContext<B>, ids: &[String]) -> E2eResult<()> {
    let f = &cx.fixtures;
    for id in ids {
        cx.api
            .post_candidate(
                &CandidatePayload::new(id.as_str(), f.public_filter_id),
                &f.tokens.upload_data,
            )
            .await?;
    }
    debug!("Seeded {} candidate(s)", ids.len());
    Ok(())
}

/// Only candidates passing a selected group's filters are listed
pub(super) async fn candidate_group_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let ids = batch_ids();
    post_candidates(cx, &ids).await?;

    let new_group_id = cx
        .api
        .post_group(
            &GroupPayload {
                name: fresh_id(),
                group_admins: vec![f.user_id],
            },
            &f.tokens.super_admin,
        )
        .await?;

    open_candidates(cx, f.user_id).await?;
    let public_checkbox = d
        .wait_for_xpath(&locators::group_checkbox(f.public_group_id), None)
        .await?;
    d.scroll_to_element_and_click(&public_checkbox).await?;
    let submit = d.wait_for_xpath(locators::SEARCH_BUTTON, None).await?;
    d.scroll_to_element_and_click(&submit).await?;
    for id in &ids {
        d.wait_for_xpath(&locators::candidate_link(id), None).await?;
    }

    // Swap the public group for the empty one
    d.scroll_to_element_and_click(&public_checkbox).await?;
    select_group(cx, new_group_id).await?;
    d.scroll_to_element_and_click(&submit).await?;
    for id in &ids {
        d.wait_for_xpath_to_disappear(&locators::candidate_link(id), None)
            .await?;
    }
    Ok(())
}

/// Saved-to-any-accessible-group filter, both ways
pub(super) async fn candidate_saved_status_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let ids = batch_ids();
    for id in &ids {
        cx.api
            .post_source(
                &SourcePayload::new(id.as_str(), vec![f.public_group_id]),
                &f.tokens.upload_data,
            )
            .await?;
        cx.api
            .post_candidate(
                &CandidatePayload::new(id.as_str(), f.public_filter_id),
                &f.tokens.upload_data,
            )
            .await?;
    }

    open_candidates(cx, f.user_id).await?;
    select_group(cx, f.public_group_id).await?;

    d.click_xpath(locators::SAVED_STATUS_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, "notSavedToAnyAccessible").await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;
    for id in &ids {
        d.wait_for_xpath_to_disappear(&locators::candidate_link(id), None)
            .await?;
    }

    d.click_xpath(locators::SAVED_STATUS_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, "savedToAnyAccessible").await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;
    for id in &ids {
        d.wait_for_xpath(&locators::candidate_link(id), None).await?;
    }
    Ok(())
}

/// Candidates passing before the date range are hidden; widening the range
/// past `passed_at` brings them back
pub(super) async fn candidate_date_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let ids = batch_ids();
    for id in &ids {
        cx.api
            .post_candidate(
                &CandidatePayload::new(id.as_str(), f.public_filter_id),
                &f.tokens.upload_data,
            )
            .await?;
        cx.api
            .post_photometry(
                &PhotometryPayload::ztfr(id.as_str(), f.ztf_camera_id, vec![f.public_group_id]),
                &f.tokens.upload_data,
            )
            .await?;
    }

    open_candidates(cx, f.user_id).await?;
    select_group(cx, f.public_group_id).await?;

    let start_date = d.wait_for_xpath(locators::START_DATE_INPUT, None).await?;
    d.replace_text(&start_date, "200012120000").await?;
    let end_date = d.wait_for_xpath(locators::END_DATE_INPUT, None).await?;
    d.replace_text(&end_date, "200112120000").await?;

    let submit = d
        .wait_for_xpath_to_be_clickable(locators::SEARCH_BUTTON, None)
        .await?;
    d.scroll_to_element_and_click(&submit).await?;
    for id in &ids {
        d.wait_for_xpath_to_disappear(&locators::candidate_link(id), Some(DATE_SEARCH_TIMEOUT))
            .await?;
    }

    d.replace_text(&end_date, "209012120000").await?;
    let submit = d
        .wait_for_xpath_to_be_clickable(locators::SEARCH_BUTTON, None)
        .await?;
    d.scroll_to_element_and_click(&submit).await?;
    for id in &ids {
        d.wait_for_xpath(&locators::candidate_link(id), Some(DATE_SEARCH_TIMEOUT))
            .await?;
    }
    Ok(())
}

/// Filtering on a classification shows only objects classified that way
pub(super) async fn candidate_classifications_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let candidate_id = fresh_id();
    cx.api
        .post_candidate(
            &CandidatePayload::new(candidate_id.as_str(), f.public_filter_id).without_altdata(),
            &f.tokens.upload_data,
        )
        .await?;
    cx.api
        .post_source(&SourcePayload::existing(candidate_id.as_str()), &f.tokens.upload_data)
        .await?;

    let taxonomy_id = cx
        .api
        .post_taxonomy(
            &TaxonomyPayload::sample(
                format!("test taxonomy{}", fresh_id()),
                vec![f.public_group_id],
            ),
            &f.tokens.taxonomy,
        )
        .await?;
    cx.api
        .post_classification(
            &ClassificationPayload {
                obj_id: candidate_id.clone(),
                classification: "Algol".to_string(),
                taxonomy_id,
                probability: 1.0,
                group_ids: vec![f.public_group_id],
            },
            &f.tokens.classification,
        )
        .await?;

    open_candidates(cx, f.user_id).await?;
    select_group(cx, f.public_group_id).await?;
    d.click_xpath(locators::CLASSIFICATIONS_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, "Algol").await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;
    d.wait_for_xpath(&locators::candidate_link(&candidate_id), None)
        .await?;

    // Clicking Algol again deselects it
    d.click_xpath(locators::CLASSIFICATIONS_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, "Algol").await?;
    choose_menu_option(cx, "AGN").await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;
    d.wait_for_xpath_to_disappear(&locators::candidate_link(&candidate_id), None)
        .await
}

/// Redshift range [0, 0.5] keeps z=0 and drops z=1
pub(super) async fn candidate_redshift_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let low_z = fresh_id();
    let high_z = fresh_id();
    for (id, redshift) in [(&low_z, 0.0), (&high_z, 1.0)] {
        cx.api
            .post_candidate(
                &CandidatePayload::new(id.as_str(), f.public_filter_id)
                    .without_altdata()
                    .with_redshift(redshift),
                &f.tokens.upload_data,
            )
            .await?;
    }

    open_candidates(cx, f.user_id).await?;
    select_group(cx, f.public_group_id).await?;
    let min_box = d.wait_for_xpath(locators::MIN_REDSHIFT_INPUT, None).await?;
    d.send_keys(&min_box, "0").await?;
    let max_box = d.wait_for_xpath(locators::MAX_REDSHIFT_INPUT, None).await?;
    d.send_keys(&max_box, "0.5").await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;

    d.wait_for_xpath(&locators::candidate_link(&low_z), None).await?;
    d.wait_for_xpath_to_disappear(&locators::candidate_link(&high_z), None)
        .await
}

/// Rejected candidates drop out of the default view and come back with
/// rejected status "show"
pub(super) async fn candidate_rejection_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let candidate_id = fresh_id();
    cx.api
        .post_candidate(
            &CandidatePayload::new(candidate_id.as_str(), f.public_filter_id),
            &f.tokens.upload_data,
        )
        .await?;

    open_candidates(cx, f.user_id).await?;
    select_group(cx, f.public_group_id).await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;

    d.click_xpath(
        &locators::reject_candidate_icon(&candidate_id),
        ClickOptions::default(),
    )
    .await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;
    d.wait_for_xpath(locators::NO_MATCHING_RECORDS, None).await?;

    d.click_xpath(locators::REJECTED_STATUS_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, "show").await?;
    d.click_xpath(locators::SEARCH_BUTTON, ClickOptions::default())
        .await?;
    d.wait_for_xpath(&locators::rejected_candidate_icon(&candidate_id), None)
        .await?;
    Ok(())
}
