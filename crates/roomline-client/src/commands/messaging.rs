use tracing::{debug, warn};

use roomline_shared::types::now_millis;
use roomline_shared::User;

use crate::api::ChatApi;
use crate::client::ChatClient;
use crate::error::{ClientError, Result};
use crate::events::UiEvent;
use crate::outbox::{prepare, TempId};

impl<A: ChatApi> ChatClient<A> {
    pub fn set_compose(&self, text: &str) {
        self.core.state().set_compose(text);
    }

    pub fn compose(&self) -> String {
        self.core.state().compose().to_string()
    }

    /// Send the compose text together with everything staged.
    pub async fn send_compose(&self) -> Result<Option<TempId>> {
        let (text, attachments) = {
            let state = self.core.state();
            let attachments = state
                .staging()
                .items()
                .iter()
                .map(|it| it.encoded.clone())
                .collect();
            (state.compose().to_string(), attachments)
        };
        self.submit(&text, attachments).await
    }

    /// Show a message immediately, then send it.
    ///
    /// Returns `Ok(None)` when there was nothing to send.  The pending copy
    /// is removed whatever the outcome; on success the next sync brings the
    /// authoritative one and is requested right away.
    pub async fn submit(&self, text: &str, attachments: Vec<String>) -> Result<Option<TempId>> {
        let Some(message) = prepare(text, attachments) else {
            return Ok(None);
        };
        let core = &self.core;
        let epoch = core.session.epoch();
        let Some(token) = core.session.token() else {
            let e = ClientError::NotAuthenticated;
            core.set_chat_error(Some(e.to_string()));
            return Err(e);
        };
        // Identity is unknown only when a restored session could not reach
        // the server yet; the pending copy renders as ours either way.
        let author = core.session.identity().unwrap_or_else(|| User::new(""));

        let (temp_id, scroll) = {
            let mut state = core.state();
            if !core.is_current(epoch) {
                return Err(ClientError::Superseded);
            }
            let temp_id = state.outbox_mut().enqueue(&author, &message, now_millis());
            state.set_compose("");
            state.staging_mut().clear();
            (temp_id, state.scroll_mut().on_timeline_changed())
        };
        core.events.emit(UiEvent::ComposeCleared);
        core.events.emit(UiEvent::StagingChanged { count: 0 });
        core.events.emit(UiEvent::TimelineChanged { scroll });
        debug!(
            temp_id = %temp_id,
            text_len = message.text.len(),
            attachments = message.attachments.len(),
            "Message queued"
        );

        let result = core.api.send_message(&token, &message).await;

        // A reset session already dropped the pending copy.
        if !core.is_current(epoch) {
            debug!(temp_id = %temp_id, "Dropping send result for an ended session");
            return Err(ClientError::Superseded);
        }

        let removed = {
            let mut state = core.state();
            state
                .outbox_mut()
                .resolve(temp_id)
                .then(|| state.scroll_mut().on_timeline_changed())
        };
        if let Some(scroll) = removed {
            core.events.emit(UiEvent::TimelineChanged { scroll });
        }

        match result {
            Ok(_) => {
                debug!(temp_id = %temp_id, "Message acknowledged");
                core.request_sync();
                Ok(Some(temp_id))
            }
            Err(ClientError::Unauthorized) => {
                core.handle_unauthorized();
                Err(ClientError::Unauthorized)
            }
            Err(e) => {
                warn!(temp_id = %temp_id, error = %e, "Message send failed");
                core.set_chat_error(Some(e.to_string()));
                Err(e)
            }
        }
    }
}
