use thiserror::Error;
use tracing::{error, warn};

/// Why a fetch (or a chain of fetches) produced no data.
///
/// `Clone` because one shared network execution hands the same outcome to
/// every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::NotFound(_) => "not_found",
            FetchError::MalformedPayload(_) => "malformed",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }

    /// Text shown to the user. Malformed payloads read like any other
    /// failure; only the logs tell them apart.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::NotFound(what) => format!("No such {}!", what),
            FetchError::Transport(detail) => format!("Sorry, something went wrong: {}", detail),
            FetchError::MalformedPayload(_) => {
                "Sorry, something went wrong: unexpected response from the football API".to_string()
            }
        }
    }

    /// Log at a level matching the error category.
    pub fn log(&self, context: &str) {
        match self {
            FetchError::MalformedPayload(detail) => {
                error!(kind = self.kind(), context, detail = %detail, "Malformed payload");
            }
            FetchError::Transport(detail) => {
                warn!(kind = self.kind(), context, detail = %detail, "Fetch failed");
            }
            FetchError::NotFound(what) => {
                warn!(kind = self.kind(), context, what = %what, "Entity not found");
            }
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::MalformedPayload(e.to_string())
    }
}
