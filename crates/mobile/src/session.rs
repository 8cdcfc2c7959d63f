use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    error::EmbedError,
    provider::{MapSource, StyleProvider, TileStyleProvider},
    snapshot::ConfigurationSnapshot,
};

/// A connection to the style provider. Open it once, fetch from it, release it
/// once. Nothing may be fetched after release.
#[derive(uniffi::Object)]
pub struct SessionHandle {
    provider: Arc<dyn StyleProvider>,
    released: AtomicBool,
}

impl SessionHandle {
    pub fn open(provider: Arc<dyn StyleProvider>) -> Arc<Self> {
        tracing::debug!("opening configuration session");
        Arc::new(Self {
            provider,
            released: AtomicBool::new(false),
        })
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl SessionHandle {
    /// Open a session backed by the on-device NYC tiles under `base_path`.
    #[uniffi::constructor]
    pub fn new(base_path: String) -> Arc<Self> {
        Self::open(Arc::new(TileStyleProvider::new(MapSource::nyc(base_path))))
    }

    /// Fetch a fresh snapshot. There is no timeout here; callers that want one
    /// wrap this call.
    pub async fn fetch_configuration(&self) -> Result<Arc<ConfigurationSnapshot>, EmbedError> {
        if self.is_released() {
            tracing::error!("configuration fetched from a released session");
            return Err(EmbedError::UseAfterRelease {
                resource: "session handle",
            });
        }

        let snapshot = self.provider.load().await?;

        // the session went away while the provider was working
        if self.is_released() {
            tracing::debug!("session released mid-fetch, discarding snapshot");
            snapshot.release();
            return Err(EmbedError::Disposed);
        }

        Ok(Arc::new(snapshot))
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            tracing::warn!("configuration session released twice");
        } else {
            tracing::debug!("configuration session released");
        }
    }
}
