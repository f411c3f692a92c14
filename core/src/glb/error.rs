//! Error types for the container codec.
//!
//! Each pipeline stage has its own error enum so callers can tell which stage
//! failed without inspecting messages.

use std::fmt;

/// Which of the two required chunks a container was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// The structural (JSON) chunk.
    Json,
    /// The raw-data (BIN) chunk.
    Bin,
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Bin => f.write_str("BIN"),
        }
    }
}

/// Errors raised while splitting a binary container into its chunks.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The magic number is not `glTF`.
    #[error("not a valid container (magic {found:#010x})")]
    NotAContainer {
        /// The first four bytes read as a little-endian `u32`.
        found: u32,
    },
    /// The header declares a version other than 2.
    #[error("unsupported version {0}, expected 2")]
    UnsupportedVersion(u32),
    /// The JSON or BIN chunk never appeared.
    #[error("missing required chunk: {0}")]
    MissingChunk(ChunkKind),
    /// A header or chunk extends past the end of the buffer.
    #[error("truncated container: {needed} bytes needed at offset {offset}, {available} available")]
    Truncated {
        /// Byte offset where the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes actually left in the buffer.
        available: usize,
    },
    /// The JSON chunk is not UTF-8.
    #[error("JSON chunk is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// The JSON chunk is not a JSON document.
    #[error("JSON chunk could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A `bufferViews` entry whose `buffer`, `byteOffset` or `byteLength` is
/// missing where required, or is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bufferView {index}: `{field}` is missing or not a non-negative integer")]
pub struct MalformedBufferView {
    /// BufferView index.
    pub index: usize,
    /// Offending field name.
    pub field: &'static str,
}

/// Errors raised while extracting embedded images.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The image is not stored in a bufferView (external or data URI).
    #[error("image {image} is not embedded in a bufferView")]
    NotEmbedded {
        /// Image index.
        image: usize,
    },
    /// The image points at a bufferView index that does not exist.
    #[error("image {image} references missing bufferView {buffer_view}")]
    MissingBufferView {
        /// Image index.
        image: usize,
        /// The dangling bufferView index.
        buffer_view: usize,
    },
    /// The bufferView range does not fit inside the raw block.
    #[error(
        "image {image}: bufferView {buffer_view} range {start}..{end} \
         exceeds raw block of {available} bytes"
    )]
    Range {
        /// Image index.
        image: usize,
        /// BufferView index.
        buffer_view: usize,
        /// Declared start offset.
        start: usize,
        /// Declared end offset (exclusive).
        end: usize,
        /// Raw block length.
        available: usize,
    },
    /// A bufferView entry could not be read.
    #[error(transparent)]
    BufferView(#[from] MalformedBufferView),
    /// The image bytes could not be decoded.
    #[error("image {image} could not be decoded: {source}")]
    Decode {
        /// Image index.
        image: usize,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// The background decode task died before reporting a result.
    #[error("decode task for image {image} failed: {message}")]
    TaskFailed {
        /// Image index.
        image: usize,
        /// Join error description.
        message: String,
    },
}

/// Errors raised while rebuilding a container.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    /// The document uses a layout the rebuilder cannot rewrite safely.
    #[error("unsupported structure: {0}")]
    UnsupportedStructure(String),
    /// An original bufferView range lies outside the raw block.
    #[error("bufferView {buffer_view} range {start}..{end} exceeds raw block of {available} bytes")]
    Range {
        /// BufferView index.
        buffer_view: usize,
        /// Declared start offset.
        start: usize,
        /// Declared end offset (exclusive).
        end: usize,
        /// Raw block length.
        available: usize,
    },
    /// A bufferView entry could not be read.
    #[error(transparent)]
    BufferView(#[from] MalformedBufferView),
    /// A replacement was keyed by an image index the document does not have.
    #[error("replacement targets image {0}, which does not exist")]
    UnknownImage(usize),
    /// The rebuilt container does not fit the 32-bit length fields.
    #[error("rebuilt data of {0} bytes exceeds the 4 GiB container limit")]
    TooLarge(usize),
    /// The requested bufferView alignment is not a power of two.
    #[error("bufferView alignment must be a non-zero power of two, got {0}")]
    InvalidAlignment(u32),
    /// The structural document could not be serialized.
    #[error("structural document could not be serialized: {0}")]
    Json(#[from] serde_json::Error),
}
