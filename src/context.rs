//! Selection capture: the selected text plus a bounded window of the line
//! around the cursor.

use crate::host::EditorAccess;

/// Maximum number of characters captured on each side of the cursor.
pub const CONTEXT_WINDOW: usize = 500;

/// What the user selected and the text surrounding it, captured fresh for
/// one elaboration request and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    pub selected_text: String,
    pub surrounding_text: String,
}

impl SelectionContext {
    /// Capture the current selection and surrounding context from the editor.
    ///
    /// The surrounding text is the cursor's line clipped to at most
    /// [`CONTEXT_WINDOW`] characters before and after the cursor column, and
    /// never crosses a line boundary. Clipping is character-based, so
    /// multibyte text cannot be split mid code point.
    pub fn capture(editor: &dyn EditorAccess) -> Self {
        let selected_text = editor.selection();
        let cursor = editor.cursor_position();
        let line = editor.line_text(cursor.line);

        let line_len = line.chars().count();
        let column = cursor.column.min(line_len);
        let start = column.saturating_sub(CONTEXT_WINDOW);
        let end = (column + CONTEXT_WINDOW).min(line_len);

        let surrounding_text = line
            .chars()
            .skip(start)
            .take(end - start)
            .collect::<String>();

        Self {
            selected_text,
            surrounding_text,
        }
    }
}
