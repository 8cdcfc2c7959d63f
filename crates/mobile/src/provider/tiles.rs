use futures_util::future::BoxFuture;

use crate::{
    error::EmbedError,
    provider::{StyleProvider, source::MapSource},
    snapshot::ConfigurationSnapshot,
    tile_server::{TileServer, routes::tile_url_template},
};

const DEFAULT_STYLE: &str = include_str!("../../assets/bright.json");

/// Starts a local tile server for the source's archive and points the base
/// style's vector sources at it.
pub struct TileStyleProvider {
    source: MapSource,
    base_style: String,
}

impl TileStyleProvider {
    pub fn new(source: MapSource) -> Self {
        Self::with_style(source, DEFAULT_STYLE)
    }

    pub fn with_style(source: MapSource, base_style: impl Into<String>) -> Self {
        Self {
            source,
            base_style: base_style.into(),
        }
    }
}

impl StyleProvider for TileStyleProvider {
    fn load(&self) -> BoxFuture<'_, Result<ConfigurationSnapshot, EmbedError>> {
        Box::pin(async move {
            let tile_server = TileServer::start(self.source.pmtiles_path.clone())
                .await
                .map_err(EmbedError::provider)?;
            let style_json = rewrite_style_sources(&self.base_style, tile_server.port())?;

            Ok(ConfigurationSnapshot::with_tile_server(style_json, tile_server))
        })
    }
}

pub fn rewrite_style_sources(base_style: &str, port: u16) -> Result<String, EmbedError> {
    let mut style: serde_json::Value =
        serde_json::from_str(base_style).map_err(EmbedError::provider)?;

    if let Some(sources) = style.get_mut("sources").and_then(|s| s.as_object_mut()) {
        for (name, source) in sources.iter_mut() {
            let Some(obj) = source.as_object_mut() else {
                continue;
            };

            if obj.get("type").and_then(|t| t.as_str()) == Some("vector") {
                tracing::trace!(source = %name, port, "pointing vector source at local tiles");
                obj.remove("url");
                obj.insert(
                    "tiles".to_string(),
                    serde_json::json!([tile_url_template(port)]),
                );
            }
        }
    }

    serde_json::to_string(&style).map_err(EmbedError::provider)
}
