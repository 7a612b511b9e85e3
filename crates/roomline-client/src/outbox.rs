//! Optimistic message queue.
//!
//! A submitted message is shown immediately as a [`PendingMessage`] and
//! lives here until either the next successful sync (which replaces it with
//! the authoritative copy) or the failure of its own send request.  Several
//! sends may be in flight at once; each one is tracked by its [`TempId`].

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use roomline_shared::constants::{MAX_ATTACHMENTS, MAX_TEXT_LEN};
use roomline_shared::protocol::OutgoingMessage;
use roomline_shared::{Millis, User};

/// Locally unique identifier of a pending message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TempId(Uuid);

impl TempId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub temp_id: TempId,
    pub nickname: String,
    pub avatar: Option<String>,
    pub text: Option<String>,
    pub attachments: Vec<String>,
    pub created_at: Millis,
}

/// Normalize compose input into a sendable message.
///
/// Text is trimmed and capped the way the server stores it; at most
/// [`MAX_ATTACHMENTS`] images go out.  Returns `None` when there is nothing
/// to send.
pub fn prepare(text: &str, mut attachments: Vec<String>) -> Option<OutgoingMessage> {
    let text: String = text.trim().chars().take(MAX_TEXT_LEN).collect();
    attachments.truncate(MAX_ATTACHMENTS);
    if text.is_empty() && attachments.is_empty() {
        return None;
    }
    Some(OutgoingMessage { text, attachments })
}

#[derive(Debug, Clone, Default)]
pub struct OptimisticQueue {
    pending: Vec<PendingMessage>,
}

impl OptimisticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PendingMessage] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: TempId) -> bool {
        self.pending.iter().any(|p| p.temp_id == id)
    }

    /// Append a pending copy of `message` authored by `author`.
    pub fn enqueue(&mut self, author: &User, message: &OutgoingMessage, created_at: Millis) -> TempId {
        let temp_id = TempId::new();
        self.pending.push(PendingMessage {
            temp_id,
            nickname: author.nickname.clone(),
            avatar: author.avatar.clone(),
            text: Some(message.text.clone()).filter(|t| !t.is_empty()),
            attachments: message.attachments.clone(),
            created_at,
        });
        temp_id
    }

    /// Drop one pending message. Returns `false` if it was already gone.
    pub fn resolve(&mut self, id: TempId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.temp_id != id);
        self.pending.len() != before
    }

    /// Drop everything; called after a successful sync.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_rejects_blank_input() {
        assert!(prepare("   \n\t", vec![]).is_none());
        assert!(prepare("", vec![]).is_none());
    }

    #[test]
    fn prepare_accepts_attachment_only_messages() {
        let msg = prepare("  ", vec!["data:image/png;base64,AA==".into()]).unwrap();
        assert_eq!(msg.text, "");
        assert_eq!(msg.attachments.len(), 1);
    }

    #[test]
    fn prepare_trims_and_caps() {
        let long = format!("  {}  ", "x".repeat(MAX_TEXT_LEN + 50));
        let images = (0..9).map(|i| format!("img-{i}")).collect();
        let msg = prepare(&long, images).unwrap();
        assert_eq!(msg.text.chars().count(), MAX_TEXT_LEN);
        assert_eq!(msg.attachments.len(), MAX_ATTACHMENTS);
    }

    #[test]
    fn enqueue_and_resolve_by_temp_id() {
        let mut queue = OptimisticQueue::new();
        let ann = User::new("ann");
        let a = queue.enqueue(&ann, &prepare("one", vec![]).unwrap(), 10);
        let b = queue.enqueue(&ann, &prepare("two", vec![]).unwrap(), 11);
        assert_ne!(a, b);
        assert_eq!(queue.len(), 2);

        assert!(queue.resolve(a));
        assert!(!queue.resolve(a));
        assert!(queue.contains(b));
        assert_eq!(queue.items()[0].text.as_deref(), Some("two"));
        assert_eq!(queue.items()[0].nickname, "ann");
    }

    #[test]
    fn clear_reports_dropped_count() {
        let mut queue = OptimisticQueue::new();
        let ann = User::new("ann");
        queue.enqueue(&ann, &prepare("one", vec![]).unwrap(), 1);
        queue.enqueue(&ann, &prepare("two", vec![]).unwrap(), 2);
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
