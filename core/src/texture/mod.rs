//! Texture payload helpers.
//!
//! Provides [`BlobStore`] / [`Blob`] for owning extracted image bytes behind a
//! resolvable URL, plus dimension probing and downscaling on top of the
//! `image` crate.

mod blob;
mod image_ops;

pub use blob::{Blob, BlobStore};
pub use image_ops::{EncodedImage, downscale, fit_within, probe_dimensions, sniff_mime_type};
