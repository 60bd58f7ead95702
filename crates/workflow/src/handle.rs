//! Session-scoped handles to converted images.
//!
//! A [`ResultHandle`] is what the UI displays and exports. The
//! [`HandleRegistry`] is the session's table of live handles; the
//! workflow releases the previous entry before registering a new one so
//! the table never grows past a single result.

use std::collections::HashMap;
use std::sync::Arc;

use symbolart_client::api::ConvertedImage;
use symbolart_core::image_info::ImageInfo;

/// Identifier of a registered result.
pub type HandleId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Cheap-to-clone reference to one converted image.
#[derive(Debug, Clone)]
pub struct ResultHandle {
    id: HandleId,
    bytes: Arc<[u8]>,
    info: ImageInfo,
    content_type: Option<String>,
    created_at: Timestamp,
}

impl ResultHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The image bytes exactly as the service returned them.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    /// `Content-Type` reported by the service, falling back to the media
    /// type of the detected format.
    pub fn media_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| self.info.media_type())
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for ResultHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResultHandle {}

/// Table of handles that are live in the current session.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    live: HashMap<HandleId, ResultHandle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a converted image in a new handle and record it as live.
    pub fn register(&mut self, image: ConvertedImage) -> ResultHandle {
        let handle = ResultHandle {
            id: uuid::Uuid::now_v7(),
            bytes: Arc::from(image.bytes),
            info: image.info,
            content_type: image.content_type,
            created_at: chrono::Utc::now(),
        };
        self.live.insert(handle.id, handle.clone());
        tracing::debug!(handle_id = %handle.id, bytes = handle.len(), "Registered result handle");
        handle
    }

    /// Release a handle. Returns `false` if it was not live.
    pub fn release(&mut self, id: HandleId) -> bool {
        let released = self.live.remove(&id).is_some();
        if released {
            tracing::debug!(handle_id = %id, "Released result handle");
        }
        released
    }

    /// Release every live handle.
    pub fn release_all(&mut self) {
        for id in self.live.keys() {
            tracing::debug!(handle_id = %id, "Released result handle");
        }
        self.live.clear();
    }

    /// Look up a live handle.
    pub fn resolve(&self, id: HandleId) -> Option<&ResultHandle> {
        self.live.get(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
