//! Session gate: owner of the bearer token and of screen selection.
//!
//! The gate is an explicit handle cloned into every component that needs
//! the token.  Reads and writes of the token go through it only, and it is
//! the single writer of the durable token entry.
//!
//! Every transition bumps the session *epoch*.  Asynchronous work captures
//! the epoch before suspending and checks [`SessionGate::is_current`]
//! afterwards, so a response that belongs to an ended session is dropped
//! instead of mutating fresh state.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use roomline_shared::constants::{MAX_NICKNAME_LEN, MIN_NICKNAME_LEN, MIN_PASSWORD_LEN};
use roomline_shared::protocol::Credentials;
use roomline_shared::User;
use roomline_store::TokenStore;

use crate::api::ChatApi;
use crate::error::{ClientError, Result};

/// Which top-level screen the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Logout,
    Unauthorized,
}

/// Outcome of resolving the stored token.
enum Restored {
    Anonymous,
    Rejected,
    Session(String, Option<User>),
}

#[derive(Debug)]
struct Session {
    screen: Screen,
    token: Option<String>,
    // Invariant: Some only while `token` is Some.
    identity: Option<User>,
    epoch: u64,
    auth_error: Option<String>,
}

#[derive(Clone)]
pub struct SessionGate {
    inner: Arc<Mutex<Session>>,
    store: Arc<dyn TokenStore>,
}

impl SessionGate {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Session {
                screen: Screen::Loading,
                token: None,
                identity: None,
                epoch: 0,
                auth_error: None,
            })),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Leave `Loading` using whatever token the store holds.
    ///
    /// A stored token is resolved to an identity through `GET /api/me`
    /// while the screen is still `Loading`.  A token the server rejects is
    /// cleared and leads to `Unauthenticated`.  Any other failure keeps the
    /// session; the first successful sync fills the identity in.
    pub async fn restore<A: ChatApi + ?Sized>(&self, api: &A) -> Screen {
        let stored = match self.store.load() {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored session token");
                None
            }
        };

        let started_epoch = {
            let session = self.lock();
            if session.screen != Screen::Loading {
                return session.screen;
            }
            session.epoch
        };

        let restored = match stored {
            None => Restored::Anonymous,
            Some(token) => match api.me(&token).await {
                Ok(me) => Restored::Session(token, Some(me)),
                Err(ClientError::Unauthorized) => Restored::Rejected,
                Err(e) => {
                    warn!(error = %e, "Identity lookup failed, keeping the stored session");
                    Restored::Session(token, None)
                }
            },
        };

        let rejected = matches!(restored, Restored::Rejected);
        let screen = {
            let mut session = self.lock();
            if session.screen != Screen::Loading || session.epoch != started_epoch {
                return session.screen;
            }
            session.epoch += 1;
            let screen = match restored {
                Restored::Session(token, identity) => {
                    session.token = Some(token);
                    session.identity = identity;
                    Screen::Authenticated
                }
                Restored::Anonymous | Restored::Rejected => Screen::Unauthenticated,
            };
            session.screen = screen;
            info!(
                screen = ?session.screen,
                identified = session.identity.is_some(),
                "Session restored"
            );
            session.screen
        };

        if rejected {
            warn!("Stored session token was rejected by the server");
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear stored session token");
            }
        }
        screen
    }

    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn identity(&self) -> Option<User> {
        self.lock().identity.clone()
    }

    pub fn nickname(&self) -> Option<String> {
        self.lock().identity.as_ref().map(|u| u.nickname.clone())
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Whether work started under `epoch` may still mutate state.
    pub fn is_current(&self, epoch: u64) -> bool {
        let session = self.lock();
        session.epoch == epoch && session.screen == Screen::Authenticated
    }

    pub fn auth_error(&self) -> Option<String> {
        self.lock().auth_error.clone()
    }

    /// Client-side credential checks, run before any request.
    ///
    /// Returns the trimmed nickname that will be sent.
    pub fn validate_credentials(nickname: &str, password: &str) -> Result<String> {
        let nickname: String = nickname.trim().chars().take(MAX_NICKNAME_LEN).collect();
        if nickname.chars().count() < MIN_NICKNAME_LEN {
            return Err(ClientError::Validation(format!(
                "Nickname must be at least {MIN_NICKNAME_LEN} characters"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(nickname)
    }

    /// Log in or register, persist the token and enter `Authenticated`.
    pub async fn authenticate<A: ChatApi + ?Sized>(
        &self,
        api: &A,
        nickname: &str,
        password: &str,
        mode: AuthMode,
        avatar: Option<String>,
    ) -> Result<String> {
        let nickname = match Self::validate_credentials(nickname, password) {
            Ok(n) => n,
            Err(e) => {
                self.lock().auth_error = Some(e.to_string());
                return Err(e);
            }
        };

        let credentials = Credentials {
            nickname: nickname.clone(),
            password: password.to_string(),
            avatar: if mode == AuthMode::Register { avatar } else { None },
        };

        let started_epoch = self.epoch();

        let result = match mode {
            AuthMode::Login => api.login(&credentials).await,
            AuthMode::Register => api.register(&credentials).await,
        };

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                let mut session = self.lock();
                if session.epoch == started_epoch {
                    session.auth_error = Some(e.to_string());
                }
                warn!(nickname = %nickname, mode = ?mode, error = %e, "Authentication failed");
                return Err(e);
            }
        };

        {
            let mut session = self.lock();
            if session.epoch != started_epoch {
                return Err(ClientError::Superseded);
            }
            session.epoch += 1;
            session.token = Some(response.token.clone());
            session.identity = Some(User::new(nickname.clone()));
            session.screen = Screen::Authenticated;
            session.auth_error = None;
        }

        if let Err(e) = self.store.save(&response.token) {
            // The session still works for this process; it just won't survive a restart.
            warn!(error = %e, "Failed to persist session token");
        }

        info!(nickname = %nickname, mode = ?mode, "Authenticated");
        Ok(response.token)
    }

    /// Replace the local identity with the server's view of it.
    ///
    /// Ignored when `epoch` is stale, which keeps the identity/token
    /// invariant intact after a logout races a sync.
    pub fn update_identity(&self, me: User, epoch: u64) -> bool {
        let mut session = self.lock();
        if session.epoch != epoch || session.token.is_none() {
            return false;
        }
        let changed = session.identity.as_ref() != Some(&me);
        session.identity = Some(me);
        changed
    }

    /// Set the avatar on the local identity.
    pub fn set_avatar(&self, avatar: String, epoch: u64) -> bool {
        let mut session = self.lock();
        if session.epoch != epoch {
            return false;
        }
        match session.identity.as_mut() {
            Some(identity) => {
                identity.avatar = Some(avatar);
                true
            }
            None => false,
        }
    }

    /// End the session: forget token and identity, clear the durable entry.
    ///
    /// Returns the token that was active, if any.  Idempotent.
    pub fn end(&self, reason: EndReason) -> Option<String> {
        let token = {
            let mut session = self.lock();
            let was_active = session.screen == Screen::Authenticated;
            let token = session.token.take();
            session.identity = None;
            session.screen = Screen::Unauthenticated;
            if reason == EndReason::Unauthorized && was_active {
                session.auth_error = Some(ClientError::Unauthorized.to_string());
            }
            if was_active || token.is_some() {
                session.epoch += 1;
            }
            token
        };

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session token");
        }

        if token.is_some() {
            info!(reason = ?reason, "Session ended");
        }
        token
    }

    /// Best-effort server notification for an already-ended session.
    pub async fn notify_logout<A: ChatApi + ?Sized>(api: &A, token: &str) {
        if let Err(e) = api.logout(token).await {
            warn!(error = %e, "Logout notification failed (ignored)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use roomline_store::MemoryTokenStore;

    fn gate_with(store: Arc<MemoryTokenStore>) -> SessionGate {
        SessionGate::new(store)
    }

    #[tokio::test]
    async fn restore_without_token_is_unauthenticated() {
        let gate = gate_with(Arc::new(MemoryTokenStore::new()));
        assert_eq!(gate.screen(), Screen::Loading);
        assert_eq!(gate.restore(&FakeApi::new("ann")).await, Screen::Unauthenticated);
        assert!(gate.token().is_none());
    }

    #[tokio::test]
    async fn restore_resolves_the_identity() {
        let gate = gate_with(Arc::new(MemoryTokenStore::with_token("tok")));
        let api = FakeApi::new("ann").with_token("tok");

        assert_eq!(gate.restore(&api).await, Screen::Authenticated);
        assert_eq!(gate.token().as_deref(), Some("tok"));
        assert_eq!(gate.nickname().as_deref(), Some("ann"));
    }

    #[tokio::test]
    async fn rejected_stored_token_is_cleared() {
        let store = Arc::new(MemoryTokenStore::with_token("expired"));
        let gate = gate_with(store.clone());

        assert_eq!(gate.restore(&FakeApi::new("ann")).await, Screen::Unauthenticated);
        assert!(gate.token().is_none());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_server_keeps_the_stored_session() {
        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let gate = gate_with(store.clone());
        let api = FakeApi::new("ann").with_token("tok");
        api.fail_profile(Some(ClientError::Network("connection refused".into())));

        assert_eq!(gate.restore(&api).await, Screen::Authenticated);
        assert_eq!(gate.token().as_deref(), Some("tok"));
        assert!(gate.identity().is_none());
        assert_eq!(store.load().unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn validation_rejects_short_inputs() {
        assert!(SessionGate::validate_credentials("an", "secret").is_err());
        assert!(SessionGate::validate_credentials("ann", "12345").is_err());
        assert_eq!(
            SessionGate::validate_credentials("  ann  ", "secret").unwrap(),
            "ann"
        );
    }

    #[tokio::test]
    async fn login_persists_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let gate = gate_with(store.clone());
        let api = FakeApi::new("ann");
        gate.restore(&api).await;

        let token = gate
            .authenticate(&api, "ann", "secret", AuthMode::Login, None)
            .await
            .unwrap();

        assert_eq!(gate.screen(), Screen::Authenticated);
        assert_eq!(store.load().unwrap(), Some(token));
        assert_eq!(gate.nickname().as_deref(), Some("ann"));
        assert!(gate.auth_error().is_none());
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_server() {
        let gate = gate_with(Arc::new(MemoryTokenStore::new()));
        let api = FakeApi::new("ann");
        gate.restore(&api).await;

        let err = gate
            .authenticate(&api, "an", "secret", AuthMode::Register, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(api.auth_calls(), 0);
        assert!(gate.auth_error().is_some());
        assert_eq!(gate.screen(), Screen::Unauthenticated);
    }

    #[tokio::test]
    async fn rejected_credentials_surface_inline() {
        let gate = gate_with(Arc::new(MemoryTokenStore::new()));
        let api = FakeApi::new("ann");
        gate.restore(&api).await;

        let err = gate
            .authenticate(&api, "ann", "wrong-password", AuthMode::Login, None)
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::Validation("invalid credentials".into()));
        assert_eq!(gate.auth_error().as_deref(), Some("invalid credentials"));
        assert!(gate.token().is_none());
    }

    #[tokio::test]
    async fn end_clears_everything_and_bumps_epoch() {
        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let gate = gate_with(store.clone());
        gate.restore(&FakeApi::new("ann").with_token("tok")).await;
        let epoch = gate.epoch();

        assert_eq!(gate.end(EndReason::Unauthorized).as_deref(), Some("tok"));
        assert_eq!(gate.screen(), Screen::Unauthenticated);
        assert!(!gate.is_current(epoch));
        assert_eq!(store.load().unwrap(), None);
        assert!(gate.auth_error().is_some());

        // Second call is a no-op.
        assert_eq!(gate.end(EndReason::Logout), None);
    }

    #[tokio::test]
    async fn stale_identity_update_is_ignored() {
        let gate = gate_with(Arc::new(MemoryTokenStore::with_token("tok")));
        gate.restore(&FakeApi::new("ann").with_token("tok")).await;
        let epoch = gate.epoch();
        gate.end(EndReason::Logout);

        assert!(!gate.update_identity(User::new("bob"), epoch));
        assert!(gate.identity().is_none());
    }
}
