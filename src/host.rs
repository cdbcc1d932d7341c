//! Capability traits for the host application.
//!
//! The crate never talks to a concrete editor, settings store, or UI toolkit.
//! The host hands these three capabilities to the session at construction,
//! which keeps the whole core runnable against fakes in tests.

use serde_json::Value;

/// Cursor location inside the host editor. `column` counts characters, not
/// bytes, from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

/// Read access to the host editor's selection and surrounding text.
///
/// All three reads are synchronous and side-effect free.
pub trait EditorAccess {
    /// The current selection. The host only offers the elaborate action when
    /// a selection exists, so this is non-empty by the time a session runs.
    fn selection(&self) -> String;

    fn cursor_position(&self) -> CursorPosition;

    /// Full text of the given line, without the trailing newline.
    fn line_text(&self, line: usize) -> String;
}

/// The host's opaque key/value persistence primitive.
pub trait SettingsPersistence {
    /// Previously saved record, if any.
    fn load_record(&self) -> Option<Value>;

    fn save_record(&self, record: Value);
}

/// One mutable content region inside an open panel.
///
/// Every setter fully replaces the region's prior content. Implementations
/// must tolerate calls after the user closed the panel (returning `false`
/// from [`is_open`](ContentRegion::is_open) lets the session skip them).
pub trait ContentRegion {
    /// Replace the region content with rendered markdown. Hosts without rich
    /// rendering may display the raw markup.
    fn set_markdown(&mut self, text: &str);

    /// Replace the region content with an error notice, styled distinctly
    /// from prose and not selectable as regular text.
    fn set_error_notice(&mut self, text: &str);

    fn is_open(&self) -> bool;
}

/// Opens titled panels with a single content region.
pub trait DisplaySurface {
    fn open_panel(&self, title: &str) -> Box<dyn ContentRegion>;
}
