//! # expound
//!
//! Elaborate on an editor selection with a streaming chat-completion
//! endpoint.
//!
//! The host application (editor, settings persistence, display panel) is
//! modeled as a set of capability traits in [`host`]; the crate supplies the
//! configuration store, the streaming completion client, and the session
//! state machine that ties them together. Each user invocation is a single
//! one-shot prompt/response cycle: capture the selection plus its line
//! context, open a titled panel, stream fragments into a growing markdown
//! region, and end on `Completed` or `Failed`.
//!
//! ## Provider configuration
//!
//! ```rust
//! use expound::{ProviderKind, ProviderSettings};
//!
//! let mut settings = ProviderSettings::default();
//! assert_eq!(settings.base_url, "https://api.openai.com/v1/");
//!
//! settings.apply_preset(ProviderKind::Ollama);
//! assert_eq!(settings.base_url, "http://localhost:11434/v1/");
//! ```

pub mod completion;
pub mod context;
pub mod error;
pub mod host;
pub mod prompt;
pub mod session;
pub mod settings;

pub use completion::{CompletionClient, FragmentStream};
pub use context::SelectionContext;
pub use error::RequestError;
pub use host::{ContentRegion, CursorPosition, DisplaySurface, EditorAccess, SettingsPersistence};
pub use session::{ElaborationSession, RollingText, SessionState};
pub use settings::{ProviderKind, ProviderSettings, SettingsStore};
