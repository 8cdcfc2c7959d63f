//! The foreign map view and the adapter that owns its lifecycle.

use std::sync::Arc;

use crate::options::MapViewOptions;

mod adapter;
mod ready;

pub use adapter::EmbeddedViewAdapter;
pub use ready::ReadySignal;

/// Opaque reference to the map library's renderable map, valid once the view
/// reports ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Record)]
pub struct MapHandle {
    pub id: u64,
}

/// Lifecycle calls understood by the map view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ViewEvent {
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ViewPhase {
    Uninitialized,
    AttachedPending,
    Ready,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ApplyOutcome {
    Applied,
    /// The view has no map yet. Not an error, readiness and the fetch race.
    NotReady,
    AlreadyApplied,
    Disposed,
}

/// A map view living on the host side, e.g. a MapLibre `MapView`.
#[uniffi::export(with_foreign)]
pub trait MapView: Send + Sync {
    fn set_style(&self, handle: MapHandle, style_json: String);
    fn on_start(&self);
    fn on_resume(&self);
    fn on_pause(&self);
    fn on_stop(&self);
    fn on_destroy(&self);
}

/// Builds host map views. The view must call `ready.fire(..)` once its map is
/// usable, which may happen during `create_view` or any time after.
#[uniffi::export(with_foreign)]
pub trait MapViewFactory: Send + Sync {
    fn create_view(&self, options: MapViewOptions, ready: Arc<ReadySignal>) -> Arc<dyn MapView>;
}
