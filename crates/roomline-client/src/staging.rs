//! Attachment staging buffer.
//!
//! Holds encoded images the user picked or pasted until the next send.
//! Values are unique (exact equality) and the buffer never grows past
//! [`MAX_ATTACHMENTS`]; candidates beyond the cap are dropped silently.

use tracing::debug;
use uuid::Uuid;

use roomline_shared::constants::MAX_ATTACHMENTS;

#[derive(Debug, Clone)]
pub struct StagedAttachment {
    pub id: Uuid,
    pub encoded: String,
    digest: blake3::Hash,
}

#[derive(Debug, Clone)]
pub struct AttachmentStaging {
    items: Vec<StagedAttachment>,
    capacity: usize,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ATTACHMENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    pub fn items(&self) -> &[StagedAttachment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.items.len())
    }

    pub fn contains(&self, encoded: &str) -> bool {
        let digest = blake3::hash(encoded.as_bytes());
        self.items
            .iter()
            .any(|it| it.digest == digest && it.encoded == encoded)
    }

    /// Stage each image not already present, in order, until the cap is hit.
    ///
    /// Returns the ids of the items actually added.
    pub fn add<I>(&mut self, images: I) -> Vec<Uuid>
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = Vec::new();
        let mut dropped = 0usize;

        for encoded in images {
            if self.contains(&encoded) {
                continue;
            }
            if self.remaining() == 0 {
                dropped += 1;
                continue;
            }
            let id = Uuid::new_v4();
            let digest = blake3::hash(encoded.as_bytes());
            self.items.push(StagedAttachment {
                id,
                encoded,
                digest,
            });
            added.push(id);
        }

        if dropped > 0 {
            debug!(dropped, capacity = self.capacity, "Staging full, extra images dropped");
        }
        added
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|it| it.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for AttachmentStaging {
    fn default() -> Self {
        Self::new()
    }
}
