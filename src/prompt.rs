//! Fixed prompt and notice strings for the one-shot elaboration exchange.

use crate::context::SelectionContext;

/// System role message sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Notice rendered in place of any partial content when a request fails.
pub const ERROR_NOTICE: &str = "There was an issue with the request. \
    Please ensure plugin configuration settings are correct and try again.";

/// Maximum number of selection characters shown in the context-menu label.
const MENU_LABEL_LIMIT: usize = 24;

/// Build the single user message from the captured selection and context.
pub fn user_prompt(context: &SelectionContext) -> String {
    format!(
        "Elaborate on \"{}\" in the context of \"{}\"",
        context.selected_text, context.surrounding_text
    )
}

/// Label for the host's context-menu entry, with long selections truncated.
pub fn menu_label(selection: &str) -> String {
    let shortened = if selection.chars().count() > MENU_LABEL_LIMIT {
        let prefix: String = selection.chars().take(MENU_LABEL_LIMIT).collect();
        format!("{prefix}...")
    } else {
        selection.to_string()
    };
    format!("Expand on \"{shortened}\" in context with AI")
}
