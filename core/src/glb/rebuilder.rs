//! Container reassembly after image substitution.
//!
//! Every bufferView is laid out again from offset zero in index order. None
//! of the input offsets are reused, so the output is consistent no matter
//! how the replacements changed individual sizes.

use std::collections::HashMap;

use serde_json::Value;

use super::container::{padding_for, write_container};
use super::document;
use super::error::RebuildError;
use super::types::{RebuildOptions, ReplacementMap};

fn to_u32(value: usize) -> Result<u32, RebuildError> {
    u32::try_from(value).map_err(|_| RebuildError::TooLarge(value))
}

/// Map each replaced image's bufferView to that image.
///
/// Images sharing a view are fine as long as at most one of them is replaced.
fn replaced_views(
    images: &[document::ImageRef<'_>],
    view_count: usize,
    replacements: &ReplacementMap,
) -> Result<HashMap<usize, usize>, RebuildError> {
    let mut owners = HashMap::with_capacity(replacements.len());
    for &image_index in replacements.keys() {
        let image = images
            .get(image_index)
            .ok_or(RebuildError::UnknownImage(image_index))?;
        let view = image.buffer_view.ok_or_else(|| {
            RebuildError::UnsupportedStructure(format!(
                "image {image_index} is not embedded in a bufferView"
            ))
        })?;
        if view >= view_count {
            return Err(RebuildError::UnsupportedStructure(format!(
                "image {image_index} references missing bufferView {view}"
            )));
        }
        if let Some(previous) = owners.insert(view, image_index) {
            return Err(RebuildError::UnsupportedStructure(format!(
                "images {previous} and {image_index} share bufferView {view} \
                 and cannot both be replaced"
            )));
        }
    }
    Ok(owners)
}

/// Rebuild a container with offsets laid out back to back.
///
/// Equivalent to [`rebuild_with`] with [`RebuildOptions::default`].
pub fn rebuild(
    doc: &Value,
    bin: &[u8],
    replacements: &ReplacementMap,
) -> Result<Vec<u8>, RebuildError> {
    rebuild_with(doc, bin, replacements, &RebuildOptions::default())
}

/// Rebuild a container, substituting the bytes of the images in `replacements`.
///
/// `doc` is never modified; the output carries a rewritten copy. BufferViews
/// that hold no image data (geometry, animation, ...) are copied verbatim and
/// re-offset like every other view.
pub fn rebuild_with(
    doc: &Value,
    bin: &[u8],
    replacements: &ReplacementMap,
    options: &RebuildOptions,
) -> Result<Vec<u8>, RebuildError> {
    let alignment = options.view_alignment;
    if !alignment.is_power_of_two() {
        return Err(RebuildError::InvalidAlignment(alignment));
    }
    document::validate_single_buffer(doc)?;

    let images = document::images(doc).unwrap_or_default();
    let views = document::buffer_views(doc)?.unwrap_or_default();
    let owners = replaced_views(&images, views.len(), replacements)?;

    let mut out = doc.clone();
    let mut new_bin = Vec::with_capacity(bin.len());

    for view in &views {
        let payload: &[u8] = match owners.get(&view.index) {
            Some(image_index) => &replacements[image_index].data,
            None => view.slice(bin).ok_or(RebuildError::Range {
                buffer_view: view.index,
                start: view.byte_offset,
                end: view.end_saturating(),
                available: bin.len(),
            })?,
        };

        let padding = padding_for(new_bin.len(), alignment as usize);
        new_bin.resize(new_bin.len() + padding, 0);

        let offset = to_u32(new_bin.len())?;
        let length = to_u32(payload.len())?;
        new_bin.extend_from_slice(payload);
        document::set_buffer_view_range(&mut out, view.index, offset, length);
    }

    for (&image_index, replacement) in replacements {
        document::set_image_mime_type(&mut out, image_index, &replacement.mime_type);
    }
    document::set_buffer_length(&mut out, to_u32(new_bin.len())?);

    let json = serde_json::to_vec(&out)?;
    let glb = write_container(&json, &new_bin)?;

    log::info!(
        "rebuilt container: {} bufferViews, {} replaced, {} -> {} raw bytes",
        views.len(),
        replacements.len(),
        bin.len(),
        new_bin.len()
    );
    Ok(glb)
}
