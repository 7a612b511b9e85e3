//! Room state shared by every client operation.
//!
//! [`ChatState`] lives behind a `Mutex` inside the client and is only ever
//! locked for short synchronous sections, never across an `.await`.  The
//! synchronizer is its only writer for users and messages; the outbox and
//! staging buffer are mutated by the messaging commands.

use roomline_shared::{Message, User};

use crate::outbox::OptimisticQueue;
use crate::scroll::ScrollAnchor;
use crate::session::Screen;
use crate::staging::{AttachmentStaging, StagedAttachment};
use crate::timeline::{delivery_mark, merge, DeliveryMark, TimelineItem};

/// What a snapshot changed, so the caller knows which events to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotOutcome {
    pub timeline_changed: bool,
    pub users_changed: bool,
    pub dropped_pending: usize,
}

#[derive(Debug)]
pub struct ChatState {
    users: Vec<User>,
    messages: Vec<Message>,
    outbox: OptimisticQueue,
    staging: AttachmentStaging,
    compose: String,
    /// Error line of the chat pane.
    error: Option<String>,
    scroll: ScrollAnchor,
}

impl ChatState {
    pub fn new(near_bottom_threshold: f64) -> Self {
        Self {
            users: Vec::new(),
            messages: Vec::new(),
            outbox: OptimisticQueue::new(),
            staging: AttachmentStaging::new(),
            compose: String::new(),
            error: None,
            scroll: ScrollAnchor::new(near_bottom_threshold),
        }
    }

    /// Replace the authoritative lists with a fresh server snapshot.
    ///
    /// Pending messages are dropped unconditionally: the snapshot is assumed
    /// to contain everything that was acknowledged before it was taken.
    pub fn apply_snapshot(&mut self, users: Vec<User>, messages: Vec<Message>) -> SnapshotOutcome {
        let history_changed = self.messages != messages;
        let users_changed = self.users != users;

        self.users = users;
        self.messages = messages;
        let dropped_pending = self.outbox.clear();

        SnapshotOutcome {
            timeline_changed: history_changed || dropped_pending > 0,
            users_changed,
            dropped_pending,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn outbox(&self) -> &OptimisticQueue {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut OptimisticQueue {
        &mut self.outbox
    }

    pub fn staging(&self) -> &AttachmentStaging {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut AttachmentStaging {
        &mut self.staging
    }

    pub fn scroll(&self) -> &ScrollAnchor {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollAnchor {
        &mut self.scroll
    }

    pub fn compose(&self) -> &str {
        &self.compose
    }

    pub fn set_compose(&mut self, text: impl Into<String>) {
        self.compose = text.into();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns `true` when the error line actually changed.
    pub fn set_error(&mut self, error: Option<String>) -> bool {
        if self.error == error {
            return false;
        }
        self.error = error;
        true
    }

    pub fn timeline(&self) -> Vec<TimelineItem> {
        merge(&self.messages, self.outbox.items())
    }

    /// Users split into (online, offline), each in server order.
    pub fn presence(&self) -> (Vec<User>, Vec<User>) {
        self.users.iter().cloned().partition(|u| u.online)
    }

    /// Forget everything tied to the session.
    pub fn reset(&mut self) {
        self.users.clear();
        self.messages.clear();
        self.outbox.clear();
        self.staging.clear();
        self.compose.clear();
        self.error = None;
        self.scroll.reset();
    }
}

#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub item: TimelineItem,
    pub mine: bool,
    pub mark: Option<DeliveryMark>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct ChatView {
    pub screen: Screen,
    pub me: Option<User>,
    pub messages: Vec<RenderedMessage>,
    pub online: Vec<User>,
    pub offline: Vec<User>,
    pub error: Option<String>,
    pub auth_error: Option<String>,
    pub staged: Vec<StagedAttachment>,
    pub compose: String,
    pub show_jump_to_bottom: bool,
}

impl ChatView {
    pub fn build(
        state: &ChatState,
        screen: Screen,
        me: Option<User>,
        auth_error: Option<String>,
    ) -> Self {
        let my_nick = me.as_ref().map(|u| u.nickname.as_str());
        let messages = state
            .timeline()
            .into_iter()
            .map(|item| RenderedMessage {
                mine: item.is_mine(my_nick),
                mark: delivery_mark(&item, my_nick, state.users()),
                item,
            })
            .collect();
        let (online, offline) = state.presence();

        Self {
            screen,
            messages,
            online,
            offline,
            error: state.error.clone(),
            auth_error,
            staged: state.staging.items().to_vec(),
            compose: state.compose.clone(),
            show_jump_to_bottom: state.scroll.shows_jump_affordance(),
            me,
        }
    }
}
