//! Request and response bodies exchanged with the room server.
//!
//! Every response type implements [`Validate`] so that a body which parses
//! as JSON but violates the room schema is rejected at the boundary instead
//! of leaking half-filled values into client state.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_ATTACHMENTS;
use crate::error::ProtocolError;
use crate::types::{Message, User};

/// Body of `POST /api/login` and `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub nickname: String,
    pub password: String,
    /// Initial avatar, only meaningful for registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Snapshot returned by `GET /api/state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomState {
    pub me: User,
    pub users: Vec<User>,
    pub messages: Vec<Message>,
}

/// Body of `POST /api/message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub attachments: Vec<String>,
}

/// Body of `POST /api/avatar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarUpdate {
    pub avatar: String,
}

/// Generic acknowledgement. `avatar` is echoed back by `POST /api/avatar`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Error body used by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Schema checks that go beyond what serde can express.
pub trait Validate {
    fn validate(&self) -> Result<(), ProtocolError>;
}

/// Parse and validate a response body.
pub fn decode<T>(body: &str) -> Result<T, ProtocolError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(body)?;
    value.validate()?;
    Ok(value)
}

impl Validate for TokenResponse {
    fn validate(&self) -> Result<(), ProtocolError> {
        if self.token.trim().is_empty() {
            return Err(ProtocolError::Schema("empty token".into()));
        }
        Ok(())
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ProtocolError> {
        if self.nickname.is_empty() {
            return Err(ProtocolError::Schema("user without nickname".into()));
        }
        Ok(())
    }
}

impl Validate for Message {
    fn validate(&self) -> Result<(), ProtocolError> {
        if self.nickname.is_empty() {
            return Err(ProtocolError::Schema(format!(
                "message {} has no sender",
                self.id
            )));
        }
        if self.attachments.len() > MAX_ATTACHMENTS {
            return Err(ProtocolError::Schema(format!(
                "message {} carries {} attachments (max {MAX_ATTACHMENTS})",
                self.id,
                self.attachments.len()
            )));
        }
        if self.body().is_none() && self.attachments.is_empty() {
            return Err(ProtocolError::Schema(format!(
                "message {} has neither text nor attachments",
                self.id
            )));
        }
        Ok(())
    }
}

impl Validate for RoomState {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.me.validate()?;

        let mut seen = HashSet::with_capacity(self.users.len());
        for user in &self.users {
            user.validate()?;
            if !seen.insert(user.nickname.as_str()) {
                return Err(ProtocolError::Schema(format!(
                    "duplicate user '{}'",
                    user.nickname
                )));
            }
        }

        let mut ids = HashSet::with_capacity(self.messages.len());
        for message in &self.messages {
            message.validate()?;
            if !ids.insert(message.id) {
                return Err(ProtocolError::Schema(format!(
                    "duplicate message id {}",
                    message.id
                )));
            }
        }
        Ok(())
    }
}

impl Validate for Ack {
    fn validate(&self) -> Result<(), ProtocolError> {
        Ok(())
    }
}
