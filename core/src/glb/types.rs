//! Data types exchanged between the pipeline stages.

use std::collections::BTreeMap;

use crate::texture::Blob;

/// An embedded image extracted from a container.
///
/// Owns its bytes through a [`Blob`], independent of the raw block it was
/// sliced from.
#[derive(Debug, Clone)]
pub struct TextureInfo {
    /// Position in the document's `images` array.
    pub index: usize,
    /// Display name (texture name, image name, or `"Texture {index}"`).
    pub name: String,
    /// Decoded pixel width.
    pub original_width: u32,
    /// Decoded pixel height.
    pub original_height: u32,
    /// The current image bytes.
    pub blob: Blob,
    /// MIME type of the current bytes.
    pub mime_type: String,
    /// `images[index].bufferView`.
    pub buffer_view_index: usize,
    /// Set once the bytes have been substituted by an edit.
    pub is_replaced: bool,
}

impl TextureInfo {
    /// Resolvable reference to the current bytes.
    pub fn url(&self) -> String {
        self.blob.url()
    }
}

/// New bytes for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// MIME type written back into `images[i].mimeType`.
    pub mime_type: String,
}

impl Replacement {
    /// Create a replacement payload.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

/// Image index → replacement. Absent images keep their original bytes.
pub type ReplacementMap = BTreeMap<usize, Replacement>;

/// Knobs for [`rebuild_with`](super::rebuild_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOptions {
    /// Alignment of every rewritten `byteOffset`, in bytes.
    ///
    /// With the default of 1 each offset is exactly the sum of the preceding
    /// lengths. Larger powers of two insert zero padding between views.
    pub view_alignment: u32,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self { view_alignment: 1 }
    }
}
