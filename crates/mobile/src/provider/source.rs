use std::path::PathBuf;

/// Where the on-device map data for a game region lives.
pub struct MapSource {
    pub(crate) pmtiles_path: PathBuf,
}

impl MapSource {
    pub fn nyc(base_path: impl Into<PathBuf>) -> Self {
        MapSource {
            pmtiles_path: base_path.into().join("nyc_tiles.pmtiles"),
        }
    }

    pub fn pmtiles_path(&self) -> &std::path::Path {
        &self.pmtiles_path
    }
}
