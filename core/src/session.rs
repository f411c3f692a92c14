//! Editing session over one loaded container.
//!
//! [`TextureSession`] owns the parsed document, the raw block and the list of
//! extracted textures, and tracks the edits applied to them: byte
//! replacements and pending downscales. [`TextureSession::export`] turns the
//! edits into a [`ReplacementMap`] and rebuilds the container.
//!
//! The texture list sits behind a `RwLock`; every mutation takes the write
//! lock for its whole update, so a reader never sees a half-replaced handle.
//! No lock is held across an `.await`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::try_join_all;
use parking_lot::RwLock;
use serde_json::Value;

use crate::glb::{
    self, ExtractError, FormatError, RebuildError, RebuildOptions, Replacement, ReplacementMap,
    TextureInfo,
};
use crate::texture::{self, Blob, BlobStore};

/// Errors surfaced by [`TextureSession`]. Messages name the failing stage.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The container could not be parsed.
    #[error("parse failed: {0}")]
    Parse(#[from] FormatError),
    /// Texture extraction failed.
    #[error("extract failed: {0}")]
    Extract(#[from] ExtractError),
    /// The container could not be rebuilt.
    #[error("rebuild failed: {0}")]
    Rebuild(#[from] RebuildError),
    /// No container is loaded.
    #[error("no container loaded")]
    NotLoaded,
    /// The texture index is out of range.
    #[error("texture {0} does not exist")]
    UnknownTexture(usize),
    /// Resize was requested for a texture whose bytes were replaced.
    #[error("texture {0} has been replaced and cannot also be resized")]
    ResizeReplaced(usize),
    /// A zero resize target.
    #[error("resize target must be at least 1 pixel")]
    InvalidDimension,
    /// Replacement bytes are not a decodable image.
    #[error("replacement for texture {index} could not be decoded: {source}")]
    InvalidReplacement {
        /// Texture index.
        index: usize,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// Downscaling a texture failed.
    #[error("resize of texture {index} failed: {source}")]
    Resize {
        /// Texture index.
        index: usize,
        /// Codec error.
        #[source]
        source: image::ImageError,
    },
    /// A background task died before reporting a result.
    #[error("background task failed: {0}")]
    TaskFailed(String),
}

/// Options applied by [`TextureSession::export`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Passed to [`glb::rebuild_with`].
    pub rebuild: RebuildOptions,
}

struct Loaded {
    /// Distinguishes successive loads so in-flight edits from an earlier
    /// container are discarded.
    generation: u64,
    document: Arc<Value>,
    bin: Arc<[u8]>,
    textures: Vec<TextureInfo>,
    /// Texture index → requested max dimension.
    resizes: BTreeMap<usize, u32>,
}

/// Per-texture work resolved concurrently before a rebuild.
enum Job {
    Replace { index: usize, blob: Blob },
    Resize { index: usize, blob: Blob, max_dimension: u32 },
}

/// A loaded container plus the edits made to its textures.
pub struct TextureSession {
    store: BlobStore,
    options: SessionOptions,
    generations: AtomicU64,
    state: RwLock<Option<Loaded>>,
}

impl TextureSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::with_options(SessionOptions::default())
    }

    /// Create an empty session with custom export options.
    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            store: BlobStore::new(),
            options,
            generations: AtomicU64::new(0),
            state: RwLock::new(None),
        }
    }

    /// The blob registry backing texture URLs.
    pub fn blob_store(&self) -> &BlobStore {
        &self.store
    }

    /// Parse a container and extract its textures.
    ///
    /// Any previous state is discarded first. On failure the session stays
    /// empty.
    pub async fn load(&self, data: &[u8]) -> Result<(), SessionError> {
        self.reset();

        let container = glb::parse_container(data)?;
        let textures =
            glb::extract_textures(&container.document, container.bin, &self.store).await?;

        log::info!("loaded container with {} textures", textures.len());
        *self.state.write() = Some(Loaded {
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
            bin: Arc::from(container.bin),
            document: Arc::new(container.document),
            textures,
            resizes: BTreeMap::new(),
        });
        Ok(())
    }

    /// Forget the loaded container and release every texture blob.
    pub fn reset(&self) {
        if self.state.write().take().is_some() {
            log::debug!("session reset");
        }
    }

    /// Whether a container is loaded.
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    /// Snapshot of the texture list, ordered by image index.
    pub fn textures(&self) -> Vec<TextureInfo> {
        self.state
            .read()
            .as_ref()
            .map(|loaded| loaded.textures.clone())
            .unwrap_or_default()
    }

    /// Snapshot of one texture.
    pub fn texture(&self, index: usize) -> Option<TextureInfo> {
        self.state.read().as_ref()?.textures.get(index).cloned()
    }

    /// The loaded structural document.
    pub fn document(&self) -> Option<Arc<Value>> {
        self.state.read().as_ref().map(|loaded| Arc::clone(&loaded.document))
    }

    /// Pending resize target of a texture.
    pub fn pending_resize(&self, index: usize) -> Option<u32> {
        self.state.read().as_ref()?.resizes.get(&index).copied()
    }

    /// Substitute the bytes of texture `index`.
    ///
    /// The bytes are decoded to refresh the dimensions. `mime_type` is sniffed
    /// from the bytes when not given. Any pending resize of this texture is
    /// dropped. If the session is reset or reloaded while the bytes are being
    /// decoded, the result is discarded and [`SessionError::NotLoaded`] is
    /// returned.
    pub async fn replace(
        &self,
        index: usize,
        data: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<(), SessionError> {
        let generation = self.check_index(index)?;

        let mime_type = mime_type
            .or_else(|| texture::sniff_mime_type(&data))
            .unwrap_or("image/png")
            .to_owned();
        let blob = self.store.register(data, mime_type.as_str());

        let probe_blob = blob.clone();
        let (width, height) = tokio::task::spawn_blocking(move || {
            texture::probe_dimensions(probe_blob.bytes(), probe_blob.mime_type())
        })
        .await
        .map_err(|e| SessionError::TaskFailed(e.to_string()))?
        .map_err(|source| SessionError::InvalidReplacement { index, source })?;

        let mut state = self.state.write();
        let loaded = state
            .as_mut()
            .filter(|loaded| loaded.generation == generation)
            .ok_or(SessionError::NotLoaded)?;
        let texture = loaded
            .textures
            .get_mut(index)
            .ok_or(SessionError::UnknownTexture(index))?;

        // The superseded blob is released when the old handle drops.
        texture.blob = blob;
        texture.mime_type = mime_type;
        texture.original_width = width;
        texture.original_height = height;
        texture.is_replaced = true;
        loaded.resizes.remove(&index);

        log::info!("texture {index} replaced ({width}x{height})");
        Ok(())
    }

    /// Schedule texture `index` to be downscaled to `max_dimension` on export.
    pub fn request_resize(&self, index: usize, max_dimension: u32) -> Result<(), SessionError> {
        if max_dimension == 0 {
            return Err(SessionError::InvalidDimension);
        }
        let mut state = self.state.write();
        let loaded = state.as_mut().ok_or(SessionError::NotLoaded)?;
        let texture = loaded
            .textures
            .get(index)
            .ok_or(SessionError::UnknownTexture(index))?;
        if texture.is_replaced {
            return Err(SessionError::ResizeReplaced(index));
        }
        loaded.resizes.insert(index, max_dimension);
        log::debug!("texture {index} scheduled for resize to {max_dimension}px");
        Ok(())
    }

    /// Cancel a pending resize. Returns whether one was pending.
    pub fn clear_resize(&self, index: usize) -> bool {
        self.state
            .write()
            .as_mut()
            .is_some_and(|loaded| loaded.resizes.remove(&index).is_some())
    }

    /// Resolve every edit into replacement bytes and rebuild the container.
    ///
    /// Replacement reads and downscales run concurrently; the first failure
    /// aborts the export.
    pub async fn export(&self) -> Result<Vec<u8>, SessionError> {
        let (document, bin, jobs) = {
            let state = self.state.read();
            let loaded = state.as_ref().ok_or(SessionError::NotLoaded)?;
            let jobs: Vec<Job> = loaded
                .textures
                .iter()
                .filter_map(|texture| {
                    if texture.is_replaced {
                        Some(Job::Replace {
                            index: texture.index,
                            blob: texture.blob.clone(),
                        })
                    } else {
                        loaded.resizes.get(&texture.index).map(|&max_dimension| Job::Resize {
                            index: texture.index,
                            blob: texture.blob.clone(),
                            max_dimension,
                        })
                    }
                })
                .collect();
            (Arc::clone(&loaded.document), Arc::clone(&loaded.bin), jobs)
        };

        let resolved = try_join_all(jobs.into_iter().map(resolve_job)).await?;
        let replacements: ReplacementMap = resolved.into_iter().flatten().collect();

        let glb = glb::rebuild_with(&document, &bin, &replacements, &self.options.rebuild)?;
        Ok(glb)
    }

    /// Validate `index` and return the generation it belongs to.
    fn check_index(&self, index: usize) -> Result<u64, SessionError> {
        let state = self.state.read();
        let loaded = state.as_ref().ok_or(SessionError::NotLoaded)?;
        if index >= loaded.textures.len() {
            return Err(SessionError::UnknownTexture(index));
        }
        Ok(loaded.generation)
    }
}

impl Default for TextureSession {
    fn default() -> Self {
        Self::new()
    }
}

async fn resolve_job(job: Job) -> Result<Option<(usize, Replacement)>, SessionError> {
    match job {
        Job::Replace { index, blob } => Ok(Some((
            index,
            Replacement::new(blob.bytes().to_vec(), blob.mime_type()),
        ))),
        Job::Resize {
            index,
            blob,
            max_dimension,
        } => {
            let encoded = tokio::task::spawn_blocking(move || {
                texture::downscale(blob.bytes(), blob.mime_type(), max_dimension)
            })
            .await
            .map_err(|e| SessionError::TaskFailed(e.to_string()))?
            .map_err(|source| SessionError::Resize { index, source })?;

            // Already within bounds: keep the original bytes.
            Ok(encoded.map(|image| (index, Replacement::new(image.data, image.mime_type))))
        }
    }
}

/// File name for an edited container: `<stem><suffix>.<ext>`.
///
/// The extension defaults to `vrm` when the original has none.
pub fn suggested_file_name(original: &str, suffix: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("model");
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("vrm");
    format!("{stem}{suffix}.{extension}")
}
