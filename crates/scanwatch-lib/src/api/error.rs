use thiserror::Error;

use super::Endpoint;

/// Failure of a Secure API call
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, reset)
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with anything other than 200
    #[error("Unexpected HTTP response status: {status}")]
    UnexpectedStatus { status: u16, endpoint: Endpoint },

    /// The body was not the JSON shape the endpoint documents
    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid secure URL authority: '{0}'")]
    InvalidAuthority(String),

    #[error("API token contains characters not allowed in an HTTP header")]
    InvalidToken,
}

impl ApiError {
    /// Whether the failure happened before any HTTP response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// HTTP status carried by an unexpected response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
