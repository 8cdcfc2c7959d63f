use std::sync::Mutex;

use crate::{error::EmbedError, lock, tile_server::TileServer};

/// An immutable style document produced by one fetch, together with the native
/// resources that must stay alive while the map uses it.
#[derive(uniffi::Object)]
pub struct ConfigurationSnapshot {
    contents: Mutex<Option<Contents>>,
}

struct Contents {
    style_json: String,
    // serves the tiles the style points at
    tile_server: Option<TileServer>,
}

impl ConfigurationSnapshot {
    pub fn new(style_json: String) -> Self {
        Self::from_contents(style_json, None)
    }

    pub(crate) fn with_tile_server(style_json: String, tile_server: TileServer) -> Self {
        Self::from_contents(style_json, Some(tile_server))
    }

    fn from_contents(style_json: String, tile_server: Option<TileServer>) -> Self {
        Self {
            contents: Mutex::new(Some(Contents {
                style_json,
                tile_server,
            })),
        }
    }
}

#[uniffi::export]
impl ConfigurationSnapshot {
    pub fn style_json(&self) -> Result<String, EmbedError> {
        match &*lock(&self.contents) {
            Some(contents) => Ok(contents.style_json.clone()),
            None => {
                tracing::error!("configuration snapshot read after release");
                Err(EmbedError::UseAfterRelease {
                    resource: "configuration snapshot",
                })
            }
        }
    }

    pub fn is_released(&self) -> bool {
        lock(&self.contents).is_none()
    }

    /// Drop the style and shut down anything the snapshot owns.
    pub fn release(&self) {
        let contents = lock(&self.contents).take();

        match contents {
            Some(contents) => {
                tracing::debug!(
                    has_tile_server = contents.tile_server.is_some(),
                    "releasing configuration snapshot"
                );
                drop(contents);
            }
            None => tracing::warn!("configuration snapshot released twice"),
        }
    }
}
