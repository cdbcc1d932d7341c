//! One elaboration session: capture the selection, stream a completion, and
//! render the growing response into the host display surface.

use futures::StreamExt;
use tracing::{debug, warn};

use crate::completion::CompletionClient;
use crate::context::SelectionContext;
use crate::error::RequestError;
use crate::host::{ContentRegion, DisplaySurface, EditorAccess};
use crate::prompt;
use crate::settings::ProviderSettings;

/// Lifecycle of one session. `Completed` and `Failed` are terminal; a
/// session never returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Completed,
    Failed,
}

/// Monotonically growing concatenation of the fragments received so far.
///
/// Kept separate from rendering so ordering can be tested without any host
/// dependency. Never reset mid-stream; the failure path abandons it instead.
#[derive(Debug, Default)]
pub struct RollingText {
    text: String,
}

impl RollingText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The end-to-end lifecycle of one user-initiated elaboration request.
///
/// Each session owns its configuration snapshot, accumulator, and display
/// region; concurrent sessions are fully independent. There is exactly one
/// suspension point per fragment, so the accumulator is only ever touched
/// from this cooperative sequence.
pub struct ElaborationSession<E: EditorAccess, D: DisplaySurface> {
    editor: E,
    display: D,
    settings: ProviderSettings,
    client: CompletionClient,
    state: SessionState,
}

impl<E: EditorAccess, D: DisplaySurface> ElaborationSession<E, D> {
    /// Create an idle session over the host capabilities and a configuration
    /// snapshot.
    pub fn new(editor: E, display: D, settings: ProviderSettings) -> Result<Self, RequestError> {
        Ok(Self {
            editor,
            display,
            settings,
            client: CompletionClient::new()?,
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to its terminal state.
    ///
    /// Opens a panel titled with the selection, streams fragments into the
    /// accumulator, and re-renders the full accumulator after each one. On
    /// any failure the partial content is replaced by the fixed error
    /// notice. A region the user closed is skipped, never mutated.
    ///
    /// Runs at most once: calling `run` again after a terminal state returns
    /// that state unchanged without opening a panel or issuing a request.
    pub async fn run(&mut self) -> SessionState {
        if self.state != SessionState::Idle {
            return self.state;
        }

        let context = SelectionContext::capture(&self.editor);
        let mut region = self.display.open_panel(&context.selected_text);
        let user_prompt = prompt::user_prompt(&context);

        self.state = SessionState::Streaming;
        debug!(model = %self.settings.model, "Elaboration session started");

        let mut fragments = match self
            .client
            .stream_chat(&self.settings, prompt::SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(fragments) => fragments,
            Err(err) => {
                warn!(error = %err, "Failed to open completion stream");
                return self.fail(region.as_mut());
            }
        };

        let mut rolling = RollingText::new();
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    rolling.push(&fragment);
                    if region.is_open() {
                        region.set_markdown(rolling.text());
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Completion stream failed");
                    return self.fail(region.as_mut());
                }
            }
        }

        debug!(
            rendered_chars = rolling.text().chars().count(),
            "Elaboration session completed"
        );
        self.state = SessionState::Completed;
        self.state
    }

    fn fail(&mut self, region: &mut dyn ContentRegion) -> SessionState {
        if region.is_open() {
            region.set_error_notice(prompt::ERROR_NOTICE);
        }
        self.state = SessionState::Failed;
        self.state
    }
}
