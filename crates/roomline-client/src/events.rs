use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::scroll::ScrollCommand;
use crate::session::Screen;

pub const EVENT_SCREEN_CHANGED: &str = "screen-changed";
pub const EVENT_TIMELINE_CHANGED: &str = "timeline-changed";
pub const EVENT_USERS_CHANGED: &str = "users-changed";
pub const EVENT_IDENTITY_CHANGED: &str = "identity-changed";
pub const EVENT_CHAT_ERROR: &str = "chat-error";
pub const EVENT_AUTH_ERROR: &str = "auth-error";
pub const EVENT_STAGING_CHANGED: &str = "staging-changed";
pub const EVENT_COMPOSE_CLEARED: &str = "compose-cleared";
pub const EVENT_JUMP_AFFORDANCE: &str = "jump-affordance";
pub const EVENT_SYNC_STOPPED: &str = "sync-stopped";

/// Notification for the rendering layer. Payloads are small; the renderer
/// pulls a fresh [`ChatView`](crate::state::ChatView) when it needs data.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ScreenChanged(Screen),
    TimelineChanged { scroll: ScrollCommand },
    UsersChanged,
    IdentityChanged,
    ChatErrorChanged(Option<String>),
    AuthErrorChanged(Option<String>),
    StagingChanged { count: usize },
    ComposeCleared,
    JumpAffordance(bool),
    SyncStopped,
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::ScreenChanged(_) => EVENT_SCREEN_CHANGED,
            UiEvent::TimelineChanged { .. } => EVENT_TIMELINE_CHANGED,
            UiEvent::UsersChanged => EVENT_USERS_CHANGED,
            UiEvent::IdentityChanged => EVENT_IDENTITY_CHANGED,
            UiEvent::ChatErrorChanged(_) => EVENT_CHAT_ERROR,
            UiEvent::AuthErrorChanged(_) => EVENT_AUTH_ERROR,
            UiEvent::StagingChanged { .. } => EVENT_STAGING_CHANGED,
            UiEvent::ComposeCleared => EVENT_COMPOSE_CLEARED,
            UiEvent::JumpAffordance(_) => EVENT_JUMP_AFFORDANCE,
            UiEvent::SyncStopped => EVENT_SYNC_STOPPED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<UiEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, UnboundedReceiver<UiEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: UiEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::warn!(event = name, "Failed to emit event: receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitted_events_arrive_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(UiEvent::UsersChanged);
        sink.emit(UiEvent::StagingChanged { count: 2 });

        assert_eq!(rx.recv().await, Some(UiEvent::UsersChanged));
        assert_eq!(rx.recv().await, Some(UiEvent::StagingChanged { count: 2 }));
    }

    #[test]
    fn emitting_without_receiver_does_not_panic() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(UiEvent::SyncStopped);
    }
}
