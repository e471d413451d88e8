//! XPath locators for the candidate scanning page

/// Quote `value` as an XPath string literal.
///
/// XPath 1.0 has no escape sequences, so a value containing both quote kinds
/// is assembled with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    if !value.contains('\'') {
        return format!("'{}'", value);
    }

    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

pub const SEARCH_BUTTON: &str = r#"//span[text()="Search"]"#;
pub const SUBMIT_BUTTON: &str = "//span[text()='Submit']";
pub const PREVIOUSLY_SAVED: &str = r#"//span[text()="Previously Saved"]"#;
pub const SAVED_STATUS_SELECT: &str = "//*[@data-testid='savedStatusSelect']";
pub const START_DATE_INPUT: &str = "//*[@data-testid='startDatePicker']//input";
pub const END_DATE_INPUT: &str = "//*[@data-testid='endDatePicker']//input";
pub const SELECT_GROUP_ERROR: &str = r#"//div[contains(.,"Select at least one group")]"#;
pub const SORT_ON_ANNOTATION_BUTTON: &str = "//button[@data-testid='sortOnAnnotationButton']";
pub const FILTER_TABLE_BUTTON: &str = "//button[@data-testid='Filter Table-iconButton']";
pub const ANNOTATION_ORIGIN_SELECT: &str = "//div[@id='root_origin']";
pub const ANNOTATION_KEY_SELECT: &str = "//div[@id='root_key']";
pub const ANNOTATION_MIN_INPUT: &str = "//*[@id='root_min']";
pub const ANNOTATION_MAX_INPUT: &str = "//*[@id='root_max']";
pub const CLASSIFICATIONS_SELECT: &str = "//div[@id='classifications-select']";
pub const MIN_REDSHIFT_INPUT: &str = "//input[@id='minimum-redshift']";
pub const MAX_REDSHIFT_INPUT: &str = "//input[@id='maximum-redshift']";
pub const REJECTED_STATUS_SELECT: &str = r#"//div[@id="mui-component-select-rejectedStatus"]"#;
pub const NO_MATCHING_RECORDS: &str = r#"//*[contains(text(), "no matching records found")]"#;

/// Row link for a candidate in the results table
pub fn candidate_link(obj_id: &str) -> String {
    format!("//a[@data-testid={}]", xpath_literal(obj_id))
}

/// Group checkbox in the search form
pub fn group_checkbox(group_id: i64) -> String {
    format!(r#"//*[@data-testid="filteringFormGroupCheckbox-{}"]"#, group_id)
}

/// Group checkbox in the "select groups & save" dialog
pub fn save_group_checkbox(group_id: i64) -> String {
    format!("//*[@data-testid='saveCandGroupCheckbox-{}']", group_id)
}

/// Option in an open menu list
pub fn menu_option(value: &str) -> String {
    format!("//li[@data-value={}]", xpath_literal(value))
}

pub fn initial_save_button(obj_id: &str) -> String {
    format!(
        "//button[@name={}]",
        xpath_literal(&format!("initialSaveCandidateButton{}", obj_id))
    )
}

pub fn final_save_button(obj_id: &str) -> String {
    format!(
        "//button[@name={}]",
        xpath_literal(&format!("finalSaveCandidateButton{}", obj_id))
    )
}

pub fn save_dropdown_arrow(obj_id: &str) -> String {
    format!(
        "//button[@name={}]",
        xpath_literal(&format!("saveCandidateButtonDropDownArrow{}", obj_id))
    )
}

/// Entry in a button's dropdown menu, e.g. "Select groups & save"
pub fn button_menu_option(obj_id: &str, label: &str) -> String {
    format!(
        "//*[@name={}]",
        xpath_literal(&format!("buttonMenuOption{}_{}", obj_id, label))
    )
}

/// Annotation entry shown in the candidate's info panel
pub fn annotation_entry(key: &str, value: f64) -> String {
    format!("//p[text()={}]", xpath_literal(&format!("{}: {:.4}", key, value)))
}

/// Results table cell (any column/row) containing a formatted annotation value
pub fn annotation_cell(value: f64) -> String {
    format!(
        r#"//td[contains(@data-testid, "MuiDataTableBodyCell")][.//span[text()={}]]"#,
        xpath_literal(&format!("{:.4}", value))
    )
}

/// Results table cell at `column`, `row` containing a formatted annotation value
pub fn annotation_cell_at(column: usize, row: usize, value: f64) -> String {
    format!(
        r#"//td[contains(@data-testid, "MuiDataTableBodyCell-{}-{}")][.//span[text()={}]]"#,
        column,
        row,
        xpath_literal(&format!("{:.4}", value))
    )
}

/// Icon that rejects a visible candidate
pub fn reject_candidate_icon(obj_id: &str) -> String {
    format!("//*[@data-testid={}]", xpath_literal(&format!("rejected-visible_{}", obj_id)))
}

/// Icon marking a candidate as already rejected
pub fn rejected_candidate_icon(obj_id: &str) -> String {
    format!("//*[@data-testid={}]", xpath_literal(&format!("rejected_invisible_{}", obj_id)))
}
