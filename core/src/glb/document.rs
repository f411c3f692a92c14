//! Typed views over the structural document.
//!
//! The document stays a [`serde_json::Value`] so that unknown fields, VRM
//! extension blocks and extras survive a rebuild untouched. Only the fields
//! the codec reads or writes (`images`, `bufferViews`, `buffers`, `textures`)
//! get accessors here.

use std::ops::Range;

use serde_json::Value;

use super::error::{MalformedBufferView, RebuildError};

/// One entry of `images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef<'a> {
    /// Position in `images`.
    pub index: usize,
    /// `bufferView` holding the encoded image, if embedded.
    pub buffer_view: Option<usize>,
    /// Declared `mimeType`.
    pub mime_type: Option<&'a str>,
    /// Optional `name`.
    pub name: Option<&'a str>,
}

/// One entry of `bufferViews`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferViewRef {
    /// Position in `bufferViews`.
    pub index: usize,
    /// Owning buffer index.
    pub buffer: usize,
    /// `byteOffset`, defaulting to 0.
    pub byte_offset: usize,
    /// `byteLength`.
    pub byte_length: usize,
}

impl BufferViewRef {
    /// The byte range this view covers, or `None` if it overflows `usize`.
    pub fn range(&self) -> Option<Range<usize>> {
        let end = self.byte_offset.checked_add(self.byte_length)?;
        Some(self.byte_offset..end)
    }

    /// Slice this view out of the raw block, or `None` if it does not fit.
    pub fn slice<'b>(&self, bin: &'b [u8]) -> Option<&'b [u8]> {
        bin.get(self.range()?)
    }

    /// End offset for error reporting, saturating instead of overflowing.
    pub(crate) fn end_saturating(&self) -> usize {
        self.byte_offset.saturating_add(self.byte_length)
    }
}

/// One entry of `textures`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef<'a> {
    /// Position in `textures`.
    pub index: usize,
    /// Image index this texture samples.
    pub source: Option<usize>,
    /// Optional `name`.
    pub name: Option<&'a str>,
}

fn as_index(value: Option<&Value>) -> Option<usize> {
    value.and_then(Value::as_u64).and_then(|v| usize::try_from(v).ok())
}

fn array<'a>(doc: &'a Value, key: &str) -> Option<&'a [Value]> {
    doc.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

/// All `images`, or `None` when the document has no `images` array.
pub fn images(doc: &Value) -> Option<Vec<ImageRef<'_>>> {
    let entries = array(doc, "images")?;
    Some(
        entries
            .iter()
            .enumerate()
            .map(|(index, image)| ImageRef {
                index,
                buffer_view: as_index(image.get("bufferView")),
                mime_type: image.get("mimeType").and_then(Value::as_str),
                name: image.get("name").and_then(Value::as_str),
            })
            .collect(),
    )
}

/// Read an index-like field: absent falls back to `default`, anything but a
/// non-negative integer is malformed.
fn view_field(
    view: &Value,
    index: usize,
    field: &'static str,
    default: Option<usize>,
) -> Result<usize, MalformedBufferView> {
    let malformed = MalformedBufferView { index, field };
    match view.get(field) {
        None => default.ok_or(malformed),
        value => as_index(value).ok_or(malformed),
    }
}

/// All `bufferViews`, or `None` when the document has no `bufferViews` array.
///
/// `byteOffset` defaults to 0. `buffer` and `byteLength` are required.
pub fn buffer_views(doc: &Value) -> Result<Option<Vec<BufferViewRef>>, MalformedBufferView> {
    let Some(entries) = array(doc, "bufferViews") else {
        return Ok(None);
    };
    entries
        .iter()
        .enumerate()
        .map(|(index, view)| {
            Ok(BufferViewRef {
                index,
                buffer: view_field(view, index, "buffer", None)?,
                byte_offset: view_field(view, index, "byteOffset", Some(0))?,
                byte_length: view_field(view, index, "byteLength", None)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// All `textures`; empty when the array is absent.
pub fn textures(doc: &Value) -> Vec<TextureRef<'_>> {
    array(doc, "textures")
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, texture)| TextureRef {
            index,
            source: as_index(texture.get("source")),
            name: texture.get("name").and_then(Value::as_str),
        })
        .collect()
}

/// Number of entries in `buffers`.
pub fn buffer_count(doc: &Value) -> usize {
    array(doc, "buffers").map_or(0, <[Value]>::len)
}

/// Display name for image `index`.
///
/// Prefers the name of the first texture sampling this image, then the
/// image's own name, then `"Texture {index}"`. Empty names count as absent.
pub fn resolve_texture_name(doc: &Value, index: usize) -> String {
    let from_texture = textures(doc)
        .into_iter()
        .find(|texture| texture.source == Some(index))
        .and_then(|texture| texture.name)
        .filter(|name| !name.is_empty());
    if let Some(name) = from_texture {
        return name.to_owned();
    }

    let from_image = array(doc, "images")
        .and_then(|images| images.get(index))
        .and_then(|image| image.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty());
    match from_image {
        Some(name) => name.to_owned(),
        None => format!("Texture {index}"),
    }
}

/// Check the single embedded buffer precondition.
///
/// The rebuilder rewrites `buffers[0]` only, so anything else is refused.
pub fn validate_single_buffer(doc: &Value) -> Result<(), RebuildError> {
    let count = buffer_count(doc);
    if count != 1 {
        return Err(RebuildError::UnsupportedStructure(format!(
            "expected exactly one buffer, found {count}"
        )));
    }
    if doc["buffers"][0].get("uri").is_some() {
        return Err(RebuildError::UnsupportedStructure(
            "buffer 0 references an external uri".into(),
        ));
    }
    if let Some(views) = buffer_views(doc)?
        && let Some(view) = views.iter().find(|view| view.buffer != 0)
    {
        return Err(RebuildError::UnsupportedStructure(format!(
            "bufferView {} references buffer {}",
            view.index, view.buffer
        )));
    }
    Ok(())
}

/// Overwrite `byteOffset`/`byteLength` of a bufferView.
pub fn set_buffer_view_range(doc: &mut Value, index: usize, byte_offset: u32, byte_length: u32) {
    if let Some(view) = entry_mut(doc, "bufferViews", index) {
        view.insert("byteOffset".into(), Value::from(byte_offset));
        view.insert("byteLength".into(), Value::from(byte_length));
    }
}

/// Overwrite `buffers[0].byteLength`.
pub fn set_buffer_length(doc: &mut Value, byte_length: u32) {
    if let Some(buffer) = entry_mut(doc, "buffers", 0) {
        buffer.insert("byteLength".into(), Value::from(byte_length));
    }
}

/// Overwrite `images[index].mimeType`.
pub fn set_image_mime_type(doc: &mut Value, index: usize, mime_type: &str) {
    if let Some(image) = entry_mut(doc, "images", index) {
        image.insert("mimeType".into(), Value::from(mime_type));
    }
}

fn entry_mut<'a>(
    doc: &'a mut Value,
    key: &str,
    index: usize,
) -> Option<&'a mut serde_json::Map<String, Value>> {
    doc.get_mut(key)?
        .as_array_mut()?
        .get_mut(index)?
        .as_object_mut()
}
