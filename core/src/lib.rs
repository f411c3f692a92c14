//! # vrmtex core
//!
//! Texture codec for binary glTF / VRM avatars: parse a container, pull its
//! embedded images out as independently owned handles, and write the
//! container back with some images substituted.
//!
//! - [`glb`] holds the three pipeline stages.
//! - [`texture`] holds the blob registry and image probing / downscaling.
//! - [`session`] tracks edits over one loaded container.

pub mod glb;
pub mod session;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
