//! Lead store errors.

use thiserror::Error;

/// Errors from listing leads.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never got a response.
    #[error("could not reach the lead service: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("lead service returned status {status}")]
    Server { status: u16 },

    /// The response body was not a well-formed lead list.
    #[error("malformed lead list response: {0}")]
    Decode(String),
}

/// Errors from creating or importing leads.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service refused the write. The message is shown to the user as is.
    #[error("{0}")]
    Rejected(String),

    /// The request never got a response.
    #[error("could not reach the lead service: {0}")]
    Network(String),

    /// The service answered with a non-success status and no message.
    #[error("lead service returned status {status}")]
    Server { status: u16 },

    /// The response body could not be read.
    #[error("malformed lead service response: {0}")]
    Decode(String),

    /// The upload payload could not be built.
    #[error("failed to encode upload: {0}")]
    Encode(String),
}

/// Errors from signing in.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The service did not accept the credentials.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// The request never got a response.
    #[error("could not reach the lead service: {0}")]
    Network(String),

    /// The login response could not be read.
    #[error("malformed login response: {0}")]
    Decode(String),
}

/// Errors building an [`HttpLeadStore`](super::HttpLeadStore).
#[derive(Debug, Error)]
pub enum ClientInitError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint URL could not be derived from the base URL.
    #[error("invalid lead service URL: {0}")]
    Url(#[from] url::ParseError),
}
