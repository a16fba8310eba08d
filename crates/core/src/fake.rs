//! In-memory collaborators for tests.
//!
//! Enabled for this crate's tests and, through the `test-util` feature, for
//! dependent crates. Both fakes count their calls so tests can assert which
//! remote steps a request reached.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::qr::{QrArtifact, QrError, QrIssuer, RenderOptions, render_png};
use crate::storage::{AssetStore, StorageError, StoredAsset};

/// Public base URL used by [`FakeStore`].
pub const FAKE_STORE_BASE_URL: &str = "https://files.test";

/// `FakeStore` keeps objects in memory and can be told to fail or stall.
pub struct FakeStore {
    objects: Mutex<HashMap<String, Bytes>>,
    put_calls: AtomicUsize,
    failure: Option<StorageError>,
    delay: Option<Duration>,
    download_urls: bool,
}

impl FakeStore {
    /// Create an empty store that accepts every write.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            put_calls: AtomicUsize::new(0),
            failure: None,
            delay: None,
            download_urls: false,
        }
    }

    /// Create a store whose writes all fail with `err`.
    #[must_use]
    pub fn failing(err: StorageError) -> Self {
        Self {
            failure: Some(err),
            ..Self::new()
        }
    }

    /// Delay every write by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report a download URL for every stored object.
    #[must_use]
    pub fn with_download_urls(mut self) -> Self {
        self.download_urls = true;
        self
    }

    /// Number of `put` calls received, failed ones included.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Stored bytes for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the object map lock is poisoned.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .expect("objects lock poisoned")
            .get(key)
            .cloned()
    }

    /// Stored object behind a public URL issued by this store.
    pub fn object_at(&self, public_url: &str) -> Option<Bytes> {
        public_url
            .strip_prefix(FAKE_STORE_BASE_URL)
            .and_then(|path| path.strip_prefix('/'))
            .and_then(|key| self.object(key))
    }

    /// Number of stored objects.
    ///
    /// # Panics
    ///
    /// Panics if the object map lock is poisoned.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("objects lock poisoned").len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for FakeStore {
    async fn put(
        &self,
        key: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let size = payload.len() as u64;
        self.objects
            .lock()
            .expect("objects lock poisoned")
            .insert(key.to_string(), payload);

        let public_url = format!("{FAKE_STORE_BASE_URL}/{key}");
        Ok(StoredAsset {
            key: key.to_string(),
            download_url: self
                .download_urls
                .then(|| format!("{public_url}?download=1")),
            public_url,
            content_type: content_type.to_string(),
            size,
        })
    }
}

/// `FakeQrIssuer` renders real QR codes without persisting them.
pub struct FakeQrIssuer {
    calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl FakeQrIssuer {
    /// Create an issuer that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Create an issuer that always fails with an encode error carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Number of `issue` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Targets passed to `issue`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the target list lock is poisoned.
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().expect("targets lock poisoned").clone()
    }
}

impl Default for FakeQrIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QrIssuer for FakeQrIssuer {
    async fn issue(&self, target_url: &str) -> Result<QrArtifact, QrError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.targets
            .lock()
            .expect("targets lock poisoned")
            .push(target_url.to_string());

        if let Some(message) = &self.failure {
            return Err(QrError::Encode(message.clone()));
        }

        let png = Bytes::from(render_png(target_url, RenderOptions::default())?);
        let key = format!("qr/fake-{call}.png");
        let image_url = format!("https://qr.test/{key}");
        Ok(QrArtifact {
            target_url: target_url.to_string(),
            image_url: image_url.clone(),
            asset: StoredAsset {
                key,
                public_url: image_url,
                download_url: None,
                content_type: "image/png".to_string(),
                size: png.len() as u64,
            },
            png,
        })
    }
}
