//! The chat client: one handle tying the session gate, the room state, the
//! synchronizer and the event sink together.
//!
//! [`ChatClient`] is cheap to clone; every clone drives the same client.
//! User-facing operations live in [`crate::commands`], grouped by domain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use roomline_shared::protocol::RoomState;
use roomline_store::TokenStore;

use crate::api::ChatApi;
use crate::config::ClientConfig;
use crate::events::{EventSink, UiEvent};
use crate::session::{EndReason, Screen, SessionGate};
use crate::state::{ChatState, ChatView};
use crate::sync::SyncHandle;

pub(crate) struct ClientCore<A: ChatApi> {
    pub(crate) api: A,
    pub(crate) session: SessionGate,
    pub(crate) events: EventSink,
    pub(crate) config: ClientConfig,
    state: Mutex<ChatState>,
    sync: Mutex<Option<SyncHandle>>,
    /// One permit, held for the duration of every room state fetch, shared
    /// by successive synchronizers.
    pub(crate) fetch_slot: Semaphore,
    alive: AtomicBool,
}

impl<A: ChatApi> ClientCore<A> {
    /// Lock the room state. Never hold the guard across an `.await`.
    pub(crate) fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sync_slot(&self) -> MutexGuard<'_, Option<SyncHandle>> {
        self.sync.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Whether work started under `epoch` may still touch client state.
    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.is_alive() && self.session.is_current(epoch)
    }

    pub(crate) fn stop_sync(&self) {
        if let Some(handle) = self.sync_slot().take() {
            handle.stop();
        }
    }

    pub(crate) fn request_sync(&self) {
        if let Some(handle) = self.sync_slot().as_ref() {
            handle.request_sync();
        }
    }

    pub(crate) fn set_chat_error(&self, error: Option<String>) {
        let changed = self.state().set_error(error.clone());
        if changed {
            self.events.emit(UiEvent::ChatErrorChanged(error));
        }
    }

    /// Replace users and history with a fetched snapshot.
    pub(crate) fn apply_room_state(&self, room: RoomState, epoch: u64) {
        let identity_changed = self.session.update_identity(room.me, epoch);

        let applied = {
            let mut state = self.state();
            // Checked under the state lock so a concurrent logout, which
            // resets the state after ending the session, always wins.
            if !self.is_current(epoch) {
                None
            } else {
                let outcome = state.apply_snapshot(room.users, room.messages);
                let error_cleared = state.set_error(None);
                let scroll = outcome
                    .timeline_changed
                    .then(|| state.scroll_mut().on_timeline_changed());
                Some((outcome, error_cleared, scroll))
            }
        };

        let Some((outcome, error_cleared, scroll)) = applied else {
            return;
        };

        if outcome.dropped_pending > 0 {
            debug!(dropped = outcome.dropped_pending, "Pending messages replaced by snapshot");
        }
        if identity_changed {
            self.events.emit(UiEvent::IdentityChanged);
        }
        if outcome.users_changed {
            self.events.emit(UiEvent::UsersChanged);
        }
        if let Some(scroll) = scroll {
            self.events.emit(UiEvent::TimelineChanged { scroll });
        }
        if error_cleared {
            self.events.emit(UiEvent::ChatErrorChanged(None));
        }
    }

    /// The server rejected the token: stop polling and fall back to sign-in.
    pub(crate) fn handle_unauthorized(&self) {
        self.stop_sync();
        let ended = self.session.end(EndReason::Unauthorized);
        self.state().reset();

        if ended.is_some() {
            warn!("Session rejected by the server, signing out");
            self.events
                .emit(UiEvent::ScreenChanged(Screen::Unauthenticated));
            self.events
                .emit(UiEvent::AuthErrorChanged(self.session.auth_error()));
        }
    }
}

pub struct ChatClient<A: ChatApi> {
    pub(crate) core: Arc<ClientCore<A>>,
}

impl<A: ChatApi> Clone for ChatClient<A> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<A: ChatApi> ChatClient<A> {
    /// Build a client and the receiving end of its UI event stream.
    pub fn new(
        api: A,
        store: Arc<dyn TokenStore>,
        config: ClientConfig,
    ) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events, rx) = EventSink::channel();
        (Self::with_events(api, store, config, events), rx)
    }

    pub fn with_events(
        api: A,
        store: Arc<dyn TokenStore>,
        config: ClientConfig,
        events: EventSink,
    ) -> Self {
        let state = ChatState::new(config.near_bottom_threshold);
        Self {
            core: Arc::new(ClientCore {
                api,
                session: SessionGate::new(store),
                events,
                config,
                state: Mutex::new(state),
                sync: Mutex::new(None),
                fetch_slot: Semaphore::new(1),
                alive: AtomicBool::new(true),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.core.api
    }

    pub fn session(&self) -> &SessionGate {
        &self.core.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.core.config
    }

    pub fn screen(&self) -> Screen {
        self.core.session.screen()
    }

    /// Leave the loading screen from the stored token, polling right away
    /// when it still holds.
    pub async fn restore(&self) -> Screen {
        let core = &self.core;
        let screen = core.session.restore(&core.api).await;
        core.events.emit(UiEvent::ScreenChanged(screen));
        if screen == Screen::Authenticated {
            if core.session.identity().is_some() {
                core.events.emit(UiEvent::IdentityChanged);
            }
            self.start_sync();
        }
        screen
    }

    /// Start polling for the current session. No-op if already running.
    pub fn start_sync(&self) {
        let core = &self.core;
        if !core.is_alive() || core.session.screen() != Screen::Authenticated {
            return;
        }
        let epoch = core.session.epoch();

        let mut slot = core.sync_slot();
        if let Some(handle) = slot.as_ref() {
            if handle.epoch() == epoch && handle.is_running() {
                return;
            }
        }
        if let Some(stale) = slot.take() {
            stale.stop();
        }
        *slot = Some(SyncHandle::spawn(core.clone(), epoch));
    }

    pub fn stop_sync(&self) {
        self.core.stop_sync();
    }

    pub fn request_sync(&self) {
        self.core.request_sync();
    }

    pub fn is_syncing(&self) -> bool {
        self.core
            .sync_slot()
            .as_ref()
            .is_some_and(SyncHandle::is_running)
    }

    /// Snapshot of everything the renderer shows.
    pub fn view(&self) -> ChatView {
        let session = &self.core.session;
        let (screen, me, auth_error) = (session.screen(), session.identity(), session.auth_error());
        let state = self.core.state();
        ChatView::build(&state, screen, me, auth_error)
    }

    /// Tear the client down. Responses arriving afterwards are ignored; the
    /// stored token is kept for the next start.
    pub fn shutdown(&self) {
        if !self.core.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.core.sync_slot().take() {
            handle.abort();
        }
        info!("Client shut down");
    }
}
