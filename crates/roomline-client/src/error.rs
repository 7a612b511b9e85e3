use thiserror::Error;

use roomline_shared::{EncodeError, ProtocolError};
use roomline_store::StoreError;

/// Errors surfaced by client operations.
///
/// Every variant renders as a single line of user-facing text; the
/// rendering layer never sees anything else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Bad credentials or input, shown inline next to the form.
    #[error("{0}")]
    Validation(String),

    /// Transport failure or unexpected server status.
    #[error("Network error: {0}")]
    Network(String),

    /// The session is invalid or expired; forces a logout.
    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// The server answered with a body that violates the room schema.
    #[error("Unexpected server response: {0}")]
    Deserialization(String),

    /// A file could not be turned into an attachment.
    #[error("Attachment conversion failed: {0}")]
    AttachmentConversion(#[from] EncodeError),

    /// Token storage failed.
    #[error("Storage error: {0}")]
    Store(String),

    /// The operation needs a signed-in session.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The session changed while the request was in flight; its result was dropped.
    #[error("Request superseded by a newer session")]
    Superseded,

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        ClientError::Deserialization(e.to_string())
    }
}

impl From<StoreError> for ClientError {
    fn from(e: StoreError) -> Self {
        ClientError::Store(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
