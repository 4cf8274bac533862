use thiserror::Error;

/// Why a page or detail fetch did not produce data. Every variant is
/// recoverable: the view keeps running and offers a retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never completed (connect, timeout, body read).
    #[error("network error: {0}")]
    Transport(String),

    /// Non-2xx response.
    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Body was not valid JSON or lacked the expected fields.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Text shown to the user next to the retry affordance.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(_) => "Could not reach the server. Check your connection.".to_string(),
            FetchError::Status { message, .. } => message.clone(),
            FetchError::Malformed(_) => "The server sent an unexpected response.".to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
