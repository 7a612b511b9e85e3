use tracing::info;

use crate::api::ChatApi;
use crate::client::ChatClient;
use crate::error::Result;
use crate::events::UiEvent;
use crate::session::{AuthMode, EndReason, Screen, SessionGate};

impl<A: ChatApi> ChatClient<A> {
    pub async fn login(&self, nickname: &str, password: &str) -> Result<()> {
        self.authenticate(nickname, password, AuthMode::Login, None)
            .await
    }

    /// Register a new account. `avatar` is an already encoded data URL.
    pub async fn register(
        &self,
        nickname: &str,
        password: &str,
        avatar: Option<String>,
    ) -> Result<()> {
        self.authenticate(nickname, password, AuthMode::Register, avatar)
            .await
    }

    /// Sign in and start polling for the new session.
    pub async fn authenticate(
        &self,
        nickname: &str,
        password: &str,
        mode: AuthMode,
        avatar: Option<String>,
    ) -> Result<()> {
        let core = &self.core;
        let result = core
            .session
            .authenticate(&core.api, nickname, password, mode, avatar)
            .await;
        core.events
            .emit(UiEvent::AuthErrorChanged(core.session.auth_error()));
        result?;

        // Nothing from a previous session may leak into this one.
        core.stop_sync();
        core.state().reset();
        core.events
            .emit(UiEvent::ScreenChanged(Screen::Authenticated));
        self.start_sync();
        Ok(())
    }

    /// End the session locally, then tell the server on a best-effort basis.
    ///
    /// The notification goes out last so a slow or unreachable server can
    /// never delay or fail the logout itself: token, identity and room state
    /// are gone before the request is sent.
    pub async fn logout(&self) {
        let core = &self.core;
        core.stop_sync();
        let token = core.session.end(EndReason::Logout);
        core.state().reset();
        core.events
            .emit(UiEvent::ScreenChanged(Screen::Unauthenticated));

        if let Some(token) = token {
            info!("Signed out");
            SessionGate::notify_logout(&core.api, &token).await;
        }
    }
}
