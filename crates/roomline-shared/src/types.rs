use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, the unit the room server uses for `createdAt`.
pub type Millis = i64;

pub fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

fn default_online() -> bool {
    true
}

// A room member. Nickname is the room-scoped identity key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub nickname: String,
    /// Avatar as an image data URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// `me` objects carry no presence flag; the local identity is online by definition.
    #[serde(default = "default_online")]
    pub online: bool,
}

impl User {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            avatar: None,
            online: true,
        }
    }
}

/// An authoritative message as returned by the room server. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub nickname: String,
    /// Sender avatar, denormalized at send time.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: Millis,
}

impl Message {
    /// Message text, treating blank text as absent.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

}

pub fn millis_to_datetime(ms: Millis) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_default()
}
