use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// URL scheme prefix of every blob reference.
const URL_PREFIX: &str = "blob:vrmtex/";

/// Process-local registry of displayable image blobs.
///
/// Each registered [`Blob`] gets a URL-like reference (`blob:vrmtex/<id>`)
/// that can be resolved back to the bytes while the blob is alive. The entry
/// is released when the last clone of the blob is dropped, so a texture list
/// being discarded releases every reference it held.
///
/// `Clone` is cheap (Arc internals). Thread-safe (`Send + Sync`).
#[derive(Clone, Default)]
pub struct BlobStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, Weak<BlobInner>>>,
}

impl BlobStore {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `data` and register it under a fresh URL.
    pub fn register(&self, data: Vec<u8>, mime_type: impl Into<String>) -> Blob {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::new(BlobInner {
            id,
            data,
            mime_type: mime_type.into(),
            store: Arc::downgrade(&self.inner),
        });
        self.inner.entries.lock().insert(id, Arc::downgrade(&inner));
        log::trace!("registered blob {id} ({} bytes)", inner.data.len());
        Blob { inner }
    }

    /// Look a blob up by its URL. Returns `None` once it has been released.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        let id: u64 = url.strip_prefix(URL_PREFIX)?.parse().ok()?;
        let entries = self.inner.entries.lock();
        let inner = entries.get(&id)?.upgrade()?;
        Some(Blob { inner })
    }

    /// Number of blobs currently alive.
    pub fn live_count(&self) -> usize {
        self.inner.entries.lock().len()
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// An owned, immutable image payload with a resolvable URL.
///
/// Clones share the same bytes; the registry entry goes away with the last
/// clone. Call [`Blob::dispose`] to make the release explicit.
#[derive(Clone)]
pub struct Blob {
    inner: Arc<BlobInner>,
}

struct BlobInner {
    id: u64,
    data: Vec<u8>,
    mime_type: String,
    store: Weak<StoreInner>,
}

impl Drop for BlobInner {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.entries.lock().remove(&self.id);
            log::trace!("released blob {}", self.id);
        }
    }
}

impl Blob {
    /// The URL this blob resolves under.
    pub fn url(&self) -> String {
        format!("{URL_PREFIX}{}", self.inner.id)
    }

    /// The payload.
    pub fn bytes(&self) -> &[u8] {
        &self.inner.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    /// MIME type the payload was registered with.
    pub fn mime_type(&self) -> &str {
        &self.inner.mime_type
    }

    /// Drop this reference.
    pub fn dispose(self) {}
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("url", &self.url())
            .field("mime_type", &self.inner.mime_type)
            .field("len", &self.inner.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let store = BlobStore::new();
        let blob = store.register(vec![1, 2, 3], "image/png");
        assert!(blob.url().starts_with("blob:vrmtex/"));
        assert_eq!(blob.mime_type(), "image/png");
        assert_eq!(blob.len(), 3);

        let resolved = store.resolve(&blob.url()).unwrap();
        assert_eq!(resolved.bytes(), &[1, 2, 3]);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn urls_are_unique() {
        let store = BlobStore::new();
        let a = store.register(vec![], "image/png");
        let b = store.register(vec![], "image/png");
        assert_ne!(a.url(), b.url());
    }

    #[test]
    fn last_clone_releases_entry() {
        let store = BlobStore::new();
        let blob = store.register(vec![0; 16], "image/png");
        let url = blob.url();
        let copy = blob.clone();

        blob.dispose();
        assert_eq!(store.live_count(), 1);
        assert!(store.resolve(&url).is_some());

        drop(copy);
        assert_eq!(store.live_count(), 0);
        assert!(store.resolve(&url).is_none());
    }

    #[test]
    fn resolve_rejects_foreign_urls() {
        let store = BlobStore::new();
        let _blob = store.register(vec![1], "image/png");
        assert!(store.resolve("blob:other/0").is_none());
        assert!(store.resolve("blob:vrmtex/abc").is_none());
        assert!(store.resolve("blob:vrmtex/999").is_none());
    }

    #[test]
    fn blob_outlives_store() {
        let store = BlobStore::new();
        let blob = store.register(vec![5], "image/jpeg");
        drop(store);
        assert_eq!(blob.bytes(), &[5]);
    }
}
