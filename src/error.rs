use thiserror::Error;

/// Errors produced while opening or consuming a completion stream.
///
/// The variants exist for diagnostics; callers that render to a user are
/// expected to collapse all of them into one fixed remediation notice.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The connection could not be established or dropped before a response
    /// arrived.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The endpoint answered with a non-success status (bad credential,
    /// unknown model, ...).
    #[error("API error ({status_code}): {message}")]
    Api { message: String, status_code: u16 },

    /// The response body ended mid-transfer, before the terminal marker.
    #[error("Stream terminated abnormally: {message}")]
    Stream { message: String },

    /// A frame arrived but its payload could not be decoded.
    #[error("Failed to parse stream payload: {message}")]
    Parse {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The HTTP client itself could not be constructed.
    #[error("Client configuration error: {0}")]
    Configuration(String),
}
