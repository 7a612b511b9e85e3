use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use roomline_shared::constants::MAX_ATTACHMENT_SIZE;

use crate::api::ChatApi;
use crate::client::ChatClient;
use crate::events::UiEvent;
use crate::intake::{encode_batch, CandidateFile, IntakeSource};
use crate::staging::StagedAttachment;

impl<A: ChatApi> ChatClient<A> {
    /// Stage images picked from disk. Returns how many were added.
    pub async fn stage_files(&self, paths: &[PathBuf]) -> usize {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match CandidateFile::read(path).await {
                Ok(file) => files.push(file),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable file"),
            }
        }
        self.stage_candidates(IntakeSource::FilePicker, files).await
    }

    /// Stage the image items of a clipboard paste.
    pub async fn paste(&self, items: Vec<CandidateFile>) -> usize {
        self.stage_candidates(IntakeSource::Clipboard, items).await
    }

    async fn stage_candidates(&self, source: IntakeSource, files: Vec<CandidateFile>) -> usize {
        let epoch = self.core.session.epoch();
        let encoded = encode_batch(source, files, MAX_ATTACHMENT_SIZE).await;
        if !self.core.is_alive() || self.core.session.epoch() != epoch {
            return 0;
        }
        self.stage_encoded(encoded)
    }

    /// Stage already encoded data URLs.
    pub fn stage_encoded(&self, encoded: Vec<String>) -> usize {
        if encoded.is_empty() {
            return 0;
        }
        let (added, count) = {
            let mut state = self.core.state();
            let added = state.staging_mut().add(encoded).len();
            (added, state.staging().len())
        };
        if added > 0 {
            self.core.events.emit(UiEvent::StagingChanged { count });
        }
        added
    }

    pub fn unstage(&self, id: Uuid) -> bool {
        let (removed, count) = {
            let mut state = self.core.state();
            let removed = state.staging_mut().remove(id);
            (removed, state.staging().len())
        };
        if removed {
            self.core.events.emit(UiEvent::StagingChanged { count });
        }
        removed
    }

    pub fn clear_staging(&self) {
        self.core.state().staging_mut().clear();
        self.core.events.emit(UiEvent::StagingChanged { count: 0 });
    }

    pub fn staged(&self) -> Vec<StagedAttachment> {
        self.core.state().staging().items().to_vec()
    }
}
