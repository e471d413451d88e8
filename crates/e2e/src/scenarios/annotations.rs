//! Sorting and filtering the results table on an annotation value

use scanpage_common::AnnotationPayload;

use super::{choose_menu_option, fresh_id, search_public_group, ScenarioContext};
use crate::browser::Browser;
use crate::driver::ClickOptions;
use crate::error::E2eResult;
use crate::locators;

const FIELD: &str = "numeric_field";

/// Annotate both public candidates under `origin`: the first with 1, the
/// second with 2. Then search the public group as the view-only user.
async fn annotate_and_search<B: Browser>(cx: &ScenarioContext<B>, origin: &str) -> E2eResult<()> {
    let f = &cx.fixtures;
    for (obj_id, value) in [(&f.public_candidate_id, 1.0), (&f.public_candidate2_id, 2.0)] {
        cx.api
            .post_annotation(
                &AnnotationPayload::numeric(obj_id.as_str(), origin, FIELD, value),
                &f.tokens.annotation,
            )
            .await?;
    }

    search_public_group(cx, f.view_only_user_id).await?;
    cx.driver
        .wait_for_xpath(&locators::candidate_link(&f.public_candidate_id), None)
        .await?;
    Ok(())
}

/// Sorting on the selected annotation orders rows by value
pub(super) async fn submit_annotations_sorting<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let d = &cx.driver;
    let origin: String = fresh_id().chars().take(5).collect();
    annotate_and_search(cx, &origin).await?;

    d.click_xpath(&locators::annotation_entry(FIELD, 1.0), ClickOptions::default())
        .await?;
    // The selected annotation shows up in the info column
    d.wait_for_xpath(&locators::annotation_cell(1.0), None).await?;

    d.wait_for_xpath_to_be_clickable(locators::SORT_ON_ANNOTATION_BUTTON, None)
        .await?;
    d.click_xpath(locators::SORT_ON_ANNOTATION_BUTTON, ClickOptions::default())
        .await?;

    d.wait_for_xpath(&locators::annotation_cell_at(1, 0, 1.0), None)
        .await?;
    d.wait_for_xpath(&locators::annotation_cell_at(1, 1, 2.0), None)
        .await?;
    Ok(())
}

/// Filtering on an annotation range keeps only rows whose value falls inside
pub(super) async fn submit_annotations_filtering<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;
    let origin = fresh_id();
    annotate_and_search(cx, &origin).await?;

    // The filter dialog gets cut off unless its button is near the top
    let filter_button = d.wait_for_xpath(locators::FILTER_TABLE_BUTTON, None).await?;
    d.scroll_element_to_top(&filter_button).await?;
    d.click(&filter_button).await?;

    d.click_xpath(locators::ANNOTATION_ORIGIN_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, &origin).await?;
    d.click_xpath(locators::ANNOTATION_KEY_SELECT, ClickOptions::default())
        .await?;
    choose_menu_option(cx, &format!("{}<>{}", origin, FIELD)).await?;

    let min_box = d.wait_for_xpath(locators::ANNOTATION_MIN_INPUT, None).await?;
    d.send_keys(&min_box, "0").await?;
    let max_box = d.wait_for_xpath(locators::ANNOTATION_MAX_INPUT, None).await?;
    d.send_keys(&max_box, "1.5").await?;
    d.click_xpath(locators::SUBMIT_BUTTON, ClickOptions::default())
        .await?;

    d.wait_for_xpath(&locators::candidate_link(&f.public_candidate_id), None)
        .await?;
    d.wait_for_xpath_to_disappear(&locators::candidate_link(&f.public_candidate2_id), None)
        .await
}
