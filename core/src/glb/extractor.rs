//! Embedded image extraction.
//!
//! Every image is sliced and wrapped in a blob up front, so a bad byte range
//! fails the batch before any decoding starts. Decoding then fans out onto
//! tokio's blocking pool and is joined with a fail-fast barrier.

use futures::future::try_join_all;
use serde_json::Value;

use crate::texture::{self, Blob, BlobStore};

use super::document;
use super::error::ExtractError;
use super::types::TextureInfo;

/// Fallback MIME type for images that declare none and cannot be sniffed.
const UNKNOWN_MIME: &str = "application/octet-stream";

struct PendingTexture {
    index: usize,
    name: String,
    mime_type: String,
    buffer_view_index: usize,
    blob: Blob,
}

/// Slice one image out of the raw block and register its bytes.
fn stage_image(
    doc: &Value,
    image: &document::ImageRef<'_>,
    views: &[document::BufferViewRef],
    bin: &[u8],
    store: &BlobStore,
) -> Result<PendingTexture, ExtractError> {
    let buffer_view = image
        .buffer_view
        .ok_or(ExtractError::NotEmbedded { image: image.index })?;
    let view = views.get(buffer_view).ok_or(ExtractError::MissingBufferView {
        image: image.index,
        buffer_view,
    })?;
    let bytes = view.slice(bin).ok_or(ExtractError::Range {
        image: image.index,
        buffer_view,
        start: view.byte_offset,
        end: view.end_saturating(),
        available: bin.len(),
    })?;

    let mime_type = image
        .mime_type
        .or_else(|| texture::sniff_mime_type(bytes))
        .unwrap_or(UNKNOWN_MIME)
        .to_owned();

    log::debug!(
        "image {}: bufferView {} ({} bytes, {})",
        image.index,
        buffer_view,
        bytes.len(),
        mime_type
    );

    Ok(PendingTexture {
        index: image.index,
        name: document::resolve_texture_name(doc, image.index),
        blob: store.register(bytes.to_vec(), mime_type.as_str()),
        mime_type,
        buffer_view_index: buffer_view,
    })
}

async fn probe(index: usize, blob: Blob) -> Result<(u32, u32), ExtractError> {
    let joined = tokio::task::spawn_blocking(move || {
        texture::probe_dimensions(blob.bytes(), blob.mime_type())
    })
    .await;

    match joined {
        Ok(result) => result.map_err(|source| ExtractError::Decode { image: index, source }),
        Err(e) => Err(ExtractError::TaskFailed {
            image: index,
            message: e.to_string(),
        }),
    }
}

/// Extract every embedded image of a parsed container.
///
/// Returns an empty list when the document has no `images` or no
/// `bufferViews`. The result is ordered by image index. A malformed
/// bufferView entry or any range or decode failure fails the whole call; no
/// partial list is returned.
///
/// Must be called from within a tokio runtime.
pub async fn extract_textures(
    doc: &Value,
    bin: &[u8],
    store: &BlobStore,
) -> Result<Vec<TextureInfo>, ExtractError> {
    let views = document::buffer_views(doc)?;
    let (Some(images), Some(views)) = (document::images(doc), views) else {
        log::debug!("document has no images or bufferViews, nothing to extract");
        return Ok(Vec::new());
    };

    let pending = images
        .iter()
        .map(|image| stage_image(doc, image, &views, bin, store))
        .collect::<Result<Vec<_>, _>>()?;

    let dimensions = try_join_all(
        pending
            .iter()
            .map(|texture| probe(texture.index, texture.blob.clone())),
    )
    .await?;

    let textures: Vec<TextureInfo> = pending
        .into_iter()
        .zip(dimensions)
        .map(|(texture, (width, height))| TextureInfo {
            index: texture.index,
            name: texture.name,
            original_width: width,
            original_height: height,
            blob: texture.blob,
            mime_type: texture.mime_type,
            buffer_view_index: texture.buffer_view_index,
            is_replaced: false,
        })
        .collect();

    log::info!("extracted {} textures", textures.len());
    Ok(textures)
}
