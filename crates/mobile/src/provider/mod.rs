//! Sources of style configuration for a [`SessionHandle`](crate::session::SessionHandle).

use futures_util::future::BoxFuture;

use crate::{error::EmbedError, snapshot::ConfigurationSnapshot};

pub mod source;
pub mod tiles;

pub use source::MapSource;
pub use tiles::TileStyleProvider;

/// Produces a fresh snapshot on every call. The caller owns what it gets back.
pub trait StyleProvider: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<ConfigurationSnapshot, EmbedError>>;
}

/// Hands out a fixed style with no native resources behind it.
pub struct StaticStyleProvider {
    style_json: String,
}

impl StaticStyleProvider {
    pub fn new(style_json: impl Into<String>) -> Self {
        Self {
            style_json: style_json.into(),
        }
    }
}

impl StyleProvider for StaticStyleProvider {
    fn load(&self) -> BoxFuture<'_, Result<ConfigurationSnapshot, EmbedError>> {
        Box::pin(async move { Ok(ConfigurationSnapshot::new(self.style_json.clone())) })
    }
}
