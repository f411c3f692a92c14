use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
use serde_json::{Map, Value, json};

use super::write_container;


/// Encode a solid-colour RGBA PNG.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 40, 90, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("png encode");
    out
}

/// Encode a solid-colour RGB JPEG.
pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([30u8, 160, 220]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .expect("jpeg encode");
    out
}

/// Builds small single-buffer containers for scenario tests.
///
/// Views are laid out in call order when the container is built. Without
/// [`GlbBuilder::aligned`] they are packed back to back, which is exactly what
/// a default rebuild produces.
#[derive(Default)]
pub(crate) struct GlbBuilder {
    payloads: Vec<Vec<u8>>,
    images: Vec<Value>,
    textures: Vec<Value>,
    extensions: Map<String, Value>,
    align_views: bool,
}

impl GlbBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start every view on a 4-byte boundary.
    pub(crate) fn aligned(mut self) -> Self {
        self.align_views = true;
        self
    }

    fn push_view(&mut self, bytes: &[u8]) -> usize {
        self.payloads.push(bytes.to_vec());
        self.payloads.len() - 1
    }

    /// Lay out every payload: the bufferView entries and the raw block.
    fn layout(&self) -> (Vec<Value>, Vec<u8>) {
        let mut bin = Vec::new();
        let mut views = Vec::with_capacity(self.payloads.len());
        for payload in &self.payloads {
            if self.align_views {
                while bin.len() % 4 != 0 {
                    bin.push(0);
                }
            }
            views.push(json!({
                "buffer": 0,
                "byteOffset": bin.len(),
                "byteLength": payload.len(),
            }));
            bin.extend_from_slice(payload);
        }
        (views, bin)
    }

    /// Embedded image with a declared MIME type.
    pub(crate) fn image(mut self, bytes: &[u8], mime_type: &str) -> Self {
        let view = self.push_view(bytes);
        self.images.push(json!({ "bufferView": view, "mimeType": mime_type }));
        self
    }

    /// Embedded image with a declared MIME type and an image-level name.
    pub(crate) fn named_image(mut self, bytes: &[u8], mime_type: &str, name: &str) -> Self {
        let view = self.push_view(bytes);
        self.images
            .push(json!({ "bufferView": view, "mimeType": mime_type, "name": name }));
        self
    }

    /// Embedded image without a `mimeType` field.
    pub(crate) fn untyped_image(mut self, bytes: &[u8]) -> Self {
        let view = self.push_view(bytes);
        self.images.push(json!({ "bufferView": view }));
        self
    }

    /// Image that reuses an existing bufferView.
    pub(crate) fn image_on_view(mut self, view: usize, mime_type: &str) -> Self {
        self.images.push(json!({ "bufferView": view, "mimeType": mime_type }));
        self
    }

    /// Image referencing an external file.
    pub(crate) fn uri_image(mut self, uri: &str) -> Self {
        self.images.push(json!({ "uri": uri }));
        self
    }

    /// Texture sampling image `source`.
    pub(crate) fn texture(mut self, source: usize, name: Option<&str>) -> Self {
        let mut texture = json!({ "source": source });
        if let Some(name) = name {
            texture["name"] = Value::from(name);
        }
        self.textures.push(texture);
        self
    }

    /// Non-image data such as vertex attributes.
    pub(crate) fn raw_view(mut self, bytes: &[u8]) -> Self {
        self.push_view(bytes);
        self
    }

    /// Top-level extension block carried through untouched.
    pub(crate) fn extension(mut self, name: &str, value: Value) -> Self {
        self.extensions.insert(name.to_owned(), value);
        self
    }

    /// The structural document this builder describes.
    pub(crate) fn document(&self) -> Value {
        let (views, bin) = self.layout();
        let mut doc = json!({
            "asset": { "version": "2.0", "generator": "glb-fixture" },
            "buffers": [{ "byteLength": bin.len() }],
        });
        if !views.is_empty() {
            doc["bufferViews"] = Value::Array(views);
        }
        if !self.images.is_empty() {
            doc["images"] = Value::Array(self.images.clone());
        }
        if !self.textures.is_empty() {
            doc["textures"] = Value::Array(self.textures.clone());
        }
        if !self.extensions.is_empty() {
            let used: Vec<Value> = self.extensions.keys().cloned().map(Value::from).collect();
            doc["extensionsUsed"] = Value::Array(used);
            doc["extensions"] = Value::Object(self.extensions.clone());
        }
        doc
    }

    /// The unpadded raw block.
    pub(crate) fn bin(&self) -> Vec<u8> {
        self.layout().1
    }

    /// Serialize into a binary container.
    pub(crate) fn build(&self) -> Vec<u8> {
        let json = serde_json::to_vec(&self.document()).expect("serialize fixture");
        write_container(&json, &self.bin()).expect("assemble fixture")
    }
}

/// Read the `(byteOffset, byteLength)` pairs of every bufferView.
pub(crate) fn view_ranges(doc: &Value) -> Vec<(u64, u64)> {
    doc["bufferViews"]
        .as_array()
        .map(|views| {
            views
                .iter()
                .map(|view| {
                    (
                        view["byteOffset"].as_u64().unwrap_or(0),
                        view["byteLength"].as_u64().unwrap_or(0),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
