//! Binary glTF / VRM container codec.
//!
//! Three stages used in strict pipeline order:
//!
//! 1. [`parse_container`] splits the container into the structural document
//!    (a generic JSON tree) and the raw-data block.
//! 2. [`extract_textures`] slices every embedded image out of the raw block
//!    into an independently owned [`TextureInfo`] with decoded dimensions.
//! 3. [`rebuild`] / [`rebuild_with`] take a [`ReplacementMap`] keyed by image
//!    index and emit a new container with every bufferView offset recomputed.
//!
//! The rebuilder never looks at extracted handles, so anything that can fill
//! a replacement map (UI, script, test) can drive it.
//!
//! # Example
//!
//! ```ignore
//! use vrmtex_core::glb::{parse_container, rebuild, Replacement, ReplacementMap};
//!
//! let data = std::fs::read("avatar.vrm").unwrap();
//! let container = parse_container(&data).unwrap();
//!
//! let mut replacements = ReplacementMap::new();
//! replacements.insert(0, Replacement::new(std::fs::read("hair.png").unwrap(), "image/png"));
//!
//! let out = rebuild(&container.document, container.bin, &replacements).unwrap();
//! std::fs::write("avatar_edited.vrm", &out).unwrap();
//! ```
//!
//! # Limits
//!
//! Only single-buffer documents with an embedded BIN chunk are rebuilt.
//! External resources and sparse accessors are out of scope.

mod container;
pub mod document;
mod error;
mod extractor;
mod rebuilder;
#[cfg(test)]
pub(crate) mod tests;
mod types;

pub use container::{
    CHUNK_BIN, CHUNK_HEADER_LEN, CHUNK_JSON, Container, GLB_MAGIC, GLB_VERSION, HEADER_LEN,
    parse_container, write_container,
};
pub use error::{ChunkKind, ExtractError, FormatError, MalformedBufferView, RebuildError};
pub use extractor::extract_textures;
pub use rebuilder::{rebuild, rebuild_with};
pub use types::{RebuildOptions, Replacement, ReplacementMap, TextureInfo};
