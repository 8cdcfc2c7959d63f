use serde::Deserialize;

use crate::error::EmbedError;

/// Initial camera and chrome settings for a map view. These only take effect
/// when the view is constructed.
#[derive(Debug, Clone, PartialEq, Deserialize, uniffi::Record)]
#[serde(default, rename_all = "camelCase")]
pub struct MapViewOptions {
    pub target_latitude: f64,
    pub target_longitude: f64,
    pub zoom_level: f64,
    pub compass_visible: bool,
    pub attribution_visible: bool,
    pub logo_visible: bool,
}

impl Default for MapViewOptions {
    fn default() -> Self {
        // midtown, looking over the park
        Self {
            target_latitude: 40.7571418,
            target_longitude: -73.9805655,
            zoom_level: 12.0,
            compass_visible: false,
            attribution_visible: false,
            logo_visible: false,
        }
    }
}

#[uniffi::export]
pub fn default_map_view_options() -> MapViewOptions {
    MapViewOptions::default()
}

/// Parse a partial options document. Missing fields keep their defaults.
#[uniffi::export]
pub fn map_view_options_from_json(json: String) -> Result<MapViewOptions, EmbedError> {
    serde_json::from_str(&json).map_err(EmbedError::provider)
}
