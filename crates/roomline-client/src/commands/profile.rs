use tracing::{info, warn};

use roomline_shared::constants::MAX_AVATAR_SIZE;
use roomline_shared::protocol::AvatarUpdate;

use crate::api::ChatApi;
use crate::client::ChatClient;
use crate::error::{ClientError, Result};
use crate::events::UiEvent;
use crate::intake::{convert, CandidateFile};

impl<A: ChatApi> ChatClient<A> {
    /// Replace the signed-in user's avatar. Returns the stored data URL.
    pub async fn update_avatar(&self, file: CandidateFile) -> Result<String> {
        let core = &self.core;
        let epoch = core.session.epoch();
        let token = core.session.token().ok_or(ClientError::NotAuthenticated)?;

        let encoded = tokio::task::spawn_blocking(move || convert(&file, MAX_AVATAR_SIZE))
            .await
            .map_err(|e| ClientError::Task(e.to_string()))??;

        let update = AvatarUpdate { avatar: encoded };
        let result = core.api.update_avatar(&token, &update).await;
        if !core.is_current(epoch) {
            return Err(ClientError::Superseded);
        }

        match result {
            Ok(ack) => {
                let avatar = ack.avatar.unwrap_or(update.avatar);
                if core.session.set_avatar(avatar.clone(), epoch) {
                    core.events.emit(UiEvent::IdentityChanged);
                }
                info!(size = avatar.len(), "Avatar updated");
                core.request_sync();
                Ok(avatar)
            }
            Err(ClientError::Unauthorized) => {
                core.handle_unauthorized();
                Err(ClientError::Unauthorized)
            }
            Err(e) => {
                warn!(error = %e, "Avatar update failed");
                core.set_chat_error(Some(e.to_string()));
                Err(e)
            }
        }
    }
}
