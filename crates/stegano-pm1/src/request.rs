use std::sync::Arc;

use crate::error::{Pm1Error, Result};
use crate::image::CoverImage;
use crate::protocol::MAX_MESSAGE_LEN;

/// A cover image, the message to hide in it and the key that scatters it.
///
/// Cloning is cheap: the cover is shared and never written to, embedding always
/// produces a fresh image.
#[derive(Debug, Clone)]
pub struct EmbedRequest {
    cover: Arc<CoverImage>,
    message: Vec<u8>,
    key: String,
}

impl EmbedRequest {
    pub fn new(
        cover: CoverImage,
        message: impl Into<Vec<u8>>,
        key: impl Into<String>,
    ) -> Result<Self> {
        Self::shared(Arc::new(cover), message, key)
    }

    /// Like [`EmbedRequest::new`] for a cover that is already shared.
    pub fn shared(
        cover: Arc<CoverImage>,
        message: impl Into<Vec<u8>>,
        key: impl Into<String>,
    ) -> Result<Self> {
        let message = message.into();
        if message.len() > MAX_MESSAGE_LEN {
            return Err(Pm1Error::MessageTooLong {
                message_len: message.len(),
            });
        }
        Ok(EmbedRequest {
            cover,
            message,
            key: key.into(),
        })
    }

    #[inline]
    pub fn cover(&self) -> &CoverImage {
        &self.cover
    }

    #[inline]
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }
}
