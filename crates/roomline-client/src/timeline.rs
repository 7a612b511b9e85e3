//! Merged timeline: authoritative history plus pending messages.
//!
//! The timeline is derived, never stored.  It is the concatenation of the
//! server's messages and the local pending ones, stable-sorted by
//! `created_at`, so equal timestamps keep insertion order (authoritative
//! first, then pending in submission order).

use roomline_shared::{Message, Millis, User};

use crate::outbox::{PendingMessage, TempId};

/// Stable identity of a timeline row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Delivered(i64),
    Pending(TempId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub key: EntryKey,
    pub nickname: String,
    pub avatar: Option<String>,
    pub text: Option<String>,
    pub attachments: Vec<String>,
    pub created_at: Millis,
}

impl TimelineItem {
    pub fn is_pending(&self) -> bool {
        matches!(self.key, EntryKey::Pending(_))
    }

    /// Pending entries only ever come from the local outbox.
    pub fn is_mine(&self, me: Option<&str>) -> bool {
        self.is_pending() || me.is_some_and(|me| me == self.nickname)
    }
}

impl From<&Message> for TimelineItem {
    fn from(m: &Message) -> Self {
        Self {
            key: EntryKey::Delivered(m.id),
            nickname: m.nickname.clone(),
            avatar: m.avatar.clone(),
            text: m.body().map(str::to_string),
            attachments: m.attachments.clone(),
            created_at: m.created_at,
        }
    }
}

impl From<&PendingMessage> for TimelineItem {
    fn from(p: &PendingMessage) -> Self {
        Self {
            key: EntryKey::Pending(p.temp_id),
            nickname: p.nickname.clone(),
            avatar: p.avatar.clone(),
            text: p.text.clone(),
            attachments: p.attachments.clone(),
            created_at: p.created_at,
        }
    }
}

pub fn merge(messages: &[Message], pending: &[PendingMessage]) -> Vec<TimelineItem> {
    let mut items: Vec<TimelineItem> = messages
        .iter()
        .map(TimelineItem::from)
        .chain(pending.iter().map(TimelineItem::from))
        .collect();
    // sort_by_key is stable.
    items.sort_by_key(|it| it.created_at);
    items
}

/// Delivery-status icon shown on the local user's own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMark {
    /// Not yet acknowledged.
    Clock,
    /// Delivered, nobody else online to see it.
    SingleCheck,
    /// Delivered while another participant is online.
    DoubleCheck,
}

impl DeliveryMark {
    pub fn symbol(self) -> &'static str {
        match self {
            DeliveryMark::Clock => "🕓",
            DeliveryMark::SingleCheck => "✓",
            DeliveryMark::DoubleCheck => "✓✓",
        }
    }
}

pub fn others_online(me: &str, users: &[User]) -> bool {
    users.iter().any(|u| u.online && u.nickname != me)
}

/// Mark for `item`, or `None` when it isn't the local user's message.
pub fn delivery_mark(item: &TimelineItem, me: Option<&str>, users: &[User]) -> Option<DeliveryMark> {
    if item.is_pending() {
        return Some(DeliveryMark::Clock);
    }
    let me = me?;
    if !item.is_mine(Some(me)) {
        return None;
    }
    Some(if others_online(me, users) {
        DeliveryMark::DoubleCheck
    } else {
        DeliveryMark::SingleCheck
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i64, nick: &str, at: Millis) -> Message {
        Message {
            id,
            nickname: nick.into(),
            avatar: None,
            text: Some(format!("m{id}")),
            attachments: vec![],
            created_at: at,
        }
    }

    fn pending(nick: &str, at: Millis) -> PendingMessage {
        PendingMessage {
            temp_id: TempId::new(),
            nickname: nick.into(),
            avatar: None,
            text: Some("p".into()),
            attachments: vec![],
            created_at: at,
        }
    }

    fn user(nick: &str, online: bool) -> User {
        User {
            nickname: nick.into(),
            avatar: None,
            online,
        }
    }

    #[test]
    fn merge_sorts_ascending() {
        let messages = vec![msg(1, "bob", 30), msg(2, "bob", 10)];
        let pend = vec![pending("ann", 20), pending("ann", 5)];
        let merged = merge(&messages, &pend);
        let times: Vec<_> = merged.iter().map(|i| i.created_at).collect();
        assert_eq!(times, vec![5, 10, 20, 30]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let messages = vec![msg(1, "bob", 10), msg(2, "bob", 10)];
        let p = pending("ann", 10);
        let merged = merge(&messages, std::slice::from_ref(&p));
        let keys: Vec<_> = merged.iter().map(|i| i.key).collect();
        assert_eq!(
            keys,
            vec![
                EntryKey::Delivered(1),
                EntryKey::Delivered(2),
                EntryKey::Pending(p.temp_id)
            ]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let messages = vec![msg(3, "bob", 7), msg(1, "cat", 3), msg(2, "bob", 7)];
        let pend = vec![pending("ann", 7), pending("ann", 1)];
        let first = merge(&messages, &pend);
        let second = merge(&messages, &pend);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn marks_only_my_messages() {
        let users = vec![user("ann", true), user("bob", true)];
        let mine = TimelineItem::from(&msg(1, "ann", 1));
        let theirs = TimelineItem::from(&msg(2, "bob", 2));
        let waiting = TimelineItem::from(&pending("ann", 3));

        assert_eq!(
            delivery_mark(&mine, Some("ann"), &users),
            Some(DeliveryMark::DoubleCheck)
        );
        assert_eq!(delivery_mark(&theirs, Some("ann"), &users), None);
        assert_eq!(
            delivery_mark(&waiting, Some("ann"), &users),
            Some(DeliveryMark::Clock)
        );
        assert_eq!(delivery_mark(&mine, None, &users), None);
    }

    #[test]
    fn pending_is_mine_before_identity_is_known() {
        let waiting = TimelineItem::from(&pending("", 3));
        assert!(waiting.is_mine(None));
        assert_eq!(delivery_mark(&waiting, None, &[]), Some(DeliveryMark::Clock));
    }

    #[test]
    fn single_check_when_alone() {
        let users = vec![user("ann", true), user("bob", false)];
        let mine = TimelineItem::from(&msg(1, "ann", 1));
        assert_eq!(
            delivery_mark(&mine, Some("ann"), &users),
            Some(DeliveryMark::SingleCheck)
        );
    }
}
