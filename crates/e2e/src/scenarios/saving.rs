//! Saving a candidate as a source from the scanning page

use tracing::debug;

use super::{ensure, search_public_group, ScenarioContext};
use crate::browser::Browser;
use crate::driver::SCRIPT_CLICK_JS;
use crate::error::E2eResult;
use crate::locators;

const SELECT_GROUPS_AND_SAVE: &str = "Select groups & save";

/// Search the public group as the group admin and wait for the public candidate
async fn show_public_candidate<B: Browser>(cx: &ScenarioContext<B>) -> E2eResult<&str> {
    let f = &cx.fixtures;
    search_public_group(cx, f.group_admin_user_id).await?;
    cx.driver
        .wait_for_xpath(&locators::candidate_link(&f.public_candidate_id), None)
        .await?;
    Ok(f.public_candidate_id.as_str())
}

/// Switch the save button to "Select groups & save" and press it, opening
/// the group dialog
async fn open_save_dialog<B: Browser>(cx: &ScenarioContext<B>, obj_id: &str) -> E2eResult<()> {
    let d = &cx.driver;

    let carat = d
        .wait_for_xpath_to_be_clickable(&locators::save_dropdown_arrow(obj_id), None)
        .await?;
    d.scroll_to_element_and_click(&carat).await?;

    // The menu entry sits under a popper that swallows native clicks
    let option = d
        .wait_for_xpath_to_be_clickable(
            &locators::button_menu_option(obj_id, SELECT_GROUPS_AND_SAVE),
            None,
        )
        .await?;
    d.execute_script(SCRIPT_CLICK_JS, &option).await?;

    let save_button = d
        .wait_for_xpath_to_be_clickable(&locators::initial_save_button(obj_id), None)
        .await?;
    d.scroll_to_element_and_click(&save_button).await
}

async fn wait_until_saved<B: Browser>(cx: &ScenarioContext<B>, obj_id: &str) -> E2eResult<()> {
    cx.driver
        .wait_for_xpath_to_disappear(&locators::initial_save_button(obj_id), None)
        .await?;
    cx.driver
        .wait_for_xpath(locators::PREVIOUSLY_SAVED, None)
        .await?;
    debug!("{} saved", obj_id);
    Ok(())
}

/// One-click save to the default groups
pub(super) async fn save_candidate_quick_save<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let obj_id = show_public_candidate(cx).await?;
    let save_button = cx
        .driver
        .wait_for_xpath(&locators::initial_save_button(obj_id), None)
        .await?;
    cx.driver.scroll_to_element_and_click(&save_button).await?;
    wait_until_saved(cx, obj_id).await
}

/// Save through the group selection dialog with its default selection
pub(super) async fn save_candidate_select_groups<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let obj_id = show_public_candidate(cx).await?;
    open_save_dialog(cx, obj_id).await?;

    let final_save = cx
        .driver
        .wait_for_xpath(&locators::final_save_button(obj_id), None)
        .await?;
    cx.driver.click(&final_save).await?;
    wait_until_saved(cx, obj_id).await
}

/// Unticking every group in the dialog blocks the save with an error
pub(super) async fn save_candidate_no_groups_error_message<B: Browser>(
    cx: &ScenarioContext<B>,
) -> E2eResult<()> {
    let f = &cx.fixtures;
    let d = &cx.driver;

    let obj_id = show_public_candidate(cx).await?;
    open_save_dialog(cx, obj_id).await?;

    let group_checkbox = d
        .wait_for_xpath(&locators::save_group_checkbox(f.public_group_id), None)
        .await?;
    d.click(&group_checkbox).await?;
    let final_save = d
        .wait_for_xpath_to_be_clickable(&locators::final_save_button(obj_id), None)
        .await?;
    d.click(&final_save).await?;

    let error = d.wait_for_xpath(locators::SELECT_GROUP_ERROR, None).await?;
    let message = d.text(&error).await?;
    ensure(
        message.contains("Select at least one group"),
        format!("unexpected save error text: {:?}", message),
    )
}
