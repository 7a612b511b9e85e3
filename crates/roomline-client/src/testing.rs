//! In-process stand-in for the room server, used by unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use roomline_shared::protocol::{
    Ack, AvatarUpdate, Credentials, OutgoingMessage, RoomState, TokenResponse,
};
use roomline_shared::types::now_millis;
use roomline_shared::{Message, User};

use crate::api::ChatApi;
use crate::error::{ClientError, Result};

pub const PASSWORD: &str = "secret";

#[derive(Default)]
struct Room {
    me: Option<User>,
    users: Vec<User>,
    messages: Vec<Message>,
    next_id: i64,
    valid_tokens: HashSet<String>,
    issued: usize,
    profile_failure: Option<ClientError>,
    fetch_failures: VecDeque<ClientError>,
    send_failure: Option<ClientError>,
    sent: Vec<OutgoingMessage>,
    logouts: Vec<String>,
    fetch_gate: Option<Arc<Notify>>,
    send_gate: Option<Arc<Notify>>,
}

pub struct FakeApi {
    nickname: String,
    room: Mutex<Room>,
    auth_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeApi {
    /// A room where `nickname` can sign in with [`PASSWORD`].
    pub fn new(nickname: &str) -> Self {
        let me = User::new(nickname);
        Self {
            nickname: nickname.to_string(),
            room: Mutex::new(Room {
                users: vec![me.clone()],
                me: Some(me),
                next_id: 1,
                ..Room::default()
            }),
            auth_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Accept `token` as if it had been issued earlier.
    pub fn with_token(self, token: &str) -> Self {
        self.room().valid_tokens.insert(token.to_string());
        self
    }

    fn room(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap()
    }

    pub fn add_user(&self, nickname: &str, online: bool) {
        self.room().users.push(User {
            nickname: nickname.to_string(),
            avatar: None,
            online,
        });
    }

    pub fn post(&self, nickname: &str, text: &str, created_at: i64) -> i64 {
        let mut room = self.room();
        let id = room.next_id;
        room.next_id += 1;
        room.messages.push(Message {
            id,
            nickname: nickname.to_string(),
            avatar: None,
            text: Some(text.to_string()),
            attachments: vec![],
            created_at,
        });
        id
    }

    /// Invalidate every token, as a server restart would.
    pub fn revoke_tokens(&self) {
        self.room().valid_tokens.clear();
    }

    /// Make `GET /api/me` fail, as an unreachable server would.
    pub fn fail_profile(&self, error: Option<ClientError>) {
        self.room().profile_failure = error;
    }

    pub fn fail_next_fetch(&self, error: ClientError) {
        self.room().fetch_failures.push_back(error);
    }

    pub fn fail_sends(&self, error: Option<ClientError>) {
        self.room().send_failure = error;
    }

    /// Park every fetch until the returned gate is notified.
    pub fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.room().fetch_gate = Some(gate.clone());
        gate
    }

    pub fn release_fetches(&self) {
        if let Some(gate) = self.room().fetch_gate.take() {
            gate.notify_waiters();
        }
    }

    pub fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.room().send_gate = Some(gate.clone());
        gate
    }

    pub fn release_sends(&self) {
        if let Some(gate) = self.room().send_gate.take() {
            gate.notify_waiters();
        }
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn fetches_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_fetches_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.room().sent.clone()
    }

    pub fn logouts(&self) -> Vec<String> {
        self.room().logouts.clone()
    }

    fn issue_token(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if credentials.nickname != self.nickname || credentials.password != PASSWORD {
            return Err(ClientError::Validation("invalid credentials".into()));
        }
        let mut room = self.room();
        room.issued += 1;
        let token = format!("token-{}-{}", self.nickname, room.issued);
        room.valid_tokens.insert(token.clone());
        Ok(TokenResponse { token })
    }

    fn authorize(&self, token: &str) -> Result<()> {
        if self.room().valid_tokens.contains(token) {
            Ok(())
        } else {
            Err(ClientError::Unauthorized)
        }
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.issue_token(credentials)
    }

    async fn register(&self, credentials: &Credentials) -> Result<TokenResponse> {
        let response = self.issue_token(credentials)?;
        if let Some(avatar) = credentials.avatar.clone() {
            if let Some(me) = self.room().me.as_mut() {
                me.avatar = Some(avatar);
            }
        }
        Ok(response)
    }

    async fn me(&self, token: &str) -> Result<User> {
        if let Some(error) = self.room().profile_failure.clone() {
            return Err(error);
        }
        self.authorize(token)?;
        Ok(self
            .room()
            .me
            .clone()
            .unwrap_or_else(|| User::new(&self.nickname)))
    }

    async fn fetch_state(&self, token: &str) -> Result<RoomState> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = self.room().fetch_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.authorize(token)?;
        let mut room = self.room();
        if let Some(error) = room.fetch_failures.pop_front() {
            return Err(error);
        }
        Ok(RoomState {
            me: room.me.clone().unwrap_or_else(|| User::new(&self.nickname)),
            users: room.users.clone(),
            messages: room.messages.clone(),
        })
    }

    async fn send_message(&self, token: &str, message: &OutgoingMessage) -> Result<Ack> {
        let gate = self.room().send_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.authorize(token)?;

        let mut room = self.room();
        if let Some(error) = room.send_failure.clone() {
            return Err(error);
        }
        room.sent.push(message.clone());
        let id = room.next_id;
        room.next_id += 1;
        room.messages.push(Message {
            id,
            nickname: self.nickname.clone(),
            avatar: None,
            text: Some(message.text.clone()).filter(|t| !t.is_empty()),
            attachments: message.attachments.clone(),
            created_at: now_millis(),
        });
        Ok(Ack {
            ok: true,
            avatar: None,
        })
    }

    async fn update_avatar(&self, token: &str, update: &AvatarUpdate) -> Result<Ack> {
        self.authorize(token)?;
        if let Some(me) = self.room().me.as_mut() {
            me.avatar = Some(update.avatar.clone());
        }
        Ok(Ack {
            ok: true,
            avatar: Some(update.avatar.clone()),
        })
    }

    async fn logout(&self, token: &str) -> Result<Ack> {
        let mut room = self.room();
        room.logouts.push(token.to_string());
        room.valid_tokens.remove(token);
        Ok(Ack {
            ok: true,
            avatar: None,
        })
    }
}

/// Let time pass in 10 ms steps until `cond` holds.
///
/// Meant for `start_paused` tests, where sleeping only advances the clock.
pub async fn until(cond: impl Fn() -> bool) {
    for _ in 0..2_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 20s");
}
