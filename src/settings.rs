//! Provider configuration: the active provider kind plus base address, model
//! identifier, and credential.
//!
//! Settings are a flat record persisted through the host's opaque store.
//! Loading merges the persisted record over built-in defaults so records
//! written by older versions keep working; saving always writes the full
//! record.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::SettingsPersistence;

/// Which completion endpoint the user selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Remote hosted OpenAI API.
    OpenAi,
    /// Locally hosted Ollama server speaking the OpenAI-compatible API.
    Ollama,
    /// User-supplied endpoint.
    Custom,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "OpenAI"),
            ProviderKind::Ollama => write!(f, "Ollama"),
            ProviderKind::Custom => write!(f, "Custom"),
        }
    }
}

impl ProviderKind {
    /// Model identifiers the host settings panel offers as a dropdown for
    /// this kind. Empty for `Custom`, where the model is free text.
    pub fn model_choices(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["gpt-3.5-turbo", "gpt-4o", "gpt-4-turbo"],
            ProviderKind::Ollama => &["llama3", "mistral"],
            ProviderKind::Custom => &[],
        }
    }
}

/// The full provider configuration record.
///
/// `api_key` may be empty; some providers require none and the transport
/// substitutes a placeholder where the wire format needs a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let mut settings = Self {
            provider: ProviderKind::OpenAi,
            base_url: String::new(),
            model: String::new(),
            api_key: String::new(),
        };
        settings.apply_preset(ProviderKind::OpenAi);
        settings
    }
}

impl ProviderSettings {
    /// Reset base address, model, and credential to the preset for `kind`.
    ///
    /// Switching kinds never preserves prior values; a stale remote model
    /// name against a local address is worse than retyping a field.
    pub fn apply_preset(&mut self, kind: ProviderKind) {
        self.provider = kind;
        self.api_key.clear();
        match kind {
            ProviderKind::OpenAi => {
                self.base_url = "https://api.openai.com/v1/".to_string();
                self.model = "gpt-3.5-turbo".to_string();
            }
            ProviderKind::Ollama => {
                self.base_url = "http://localhost:11434/v1/".to_string();
                self.model = "llama3".to_string();
            }
            ProviderKind::Custom => {
                self.base_url.clear();
                self.model.clear();
            }
        }
    }
}

/// Loads and saves [`ProviderSettings`] through the host persistence
/// capability.
pub struct SettingsStore<P: SettingsPersistence> {
    persistence: P,
}

impl<P: SettingsPersistence> SettingsStore<P> {
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    /// Load settings, merging the persisted record over built-in defaults.
    ///
    /// Missing fields take their default value. A record that cannot be
    /// deserialized at all falls back to full defaults rather than failing
    /// startup.
    pub fn load(&self) -> ProviderSettings {
        let Some(record) = self.persistence.load_record() else {
            return ProviderSettings::default();
        };

        match serde_json::from_value(record) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "Malformed settings record, using defaults");
                ProviderSettings::default()
            }
        }
    }

    /// Persist the full record. Call after every field mutation so state
    /// survives host restarts.
    pub fn save(&self, settings: &ProviderSettings) {
        match serde_json::to_value(settings) {
            Ok(record) => self.persistence.save_record(record),
            Err(err) => warn!(error = %err, "Failed to serialize settings record"),
        }
    }
}
