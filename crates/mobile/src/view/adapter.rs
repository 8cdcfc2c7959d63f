use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    error::EmbedError,
    options::MapViewOptions,
    snapshot::ConfigurationSnapshot,
    view::{
        ApplyOutcome, MapHandle, MapView, MapViewFactory, ReadySignal, ViewEvent, ViewPhase,
        ready::{ViewCell, ViewState},
    },
};

/// Owns one foreign map view from construction to destruction.
///
/// The view exists as soon as [`create`](Self::create) returns, but its map is
/// only usable after the host fires the [`ReadySignal`]. Every operation
/// checks the current [`ViewPhase`] before touching the view.
pub struct EmbeddedViewAdapter {
    cell: Arc<ViewCell>,
    view: Arc<dyn MapView>,
    destroyed: AtomicBool,
    observed: AtomicBool,
}

impl EmbeddedViewAdapter {
    pub fn create(factory: &dyn MapViewFactory, options: MapViewOptions) -> Arc<Self> {
        tracing::debug!(?options, "creating map view");

        let cell = Arc::new(ViewCell::new());
        let ready = Arc::new(ReadySignal::new(Arc::downgrade(&cell)));
        let view = factory.create_view(options, ready);
        cell.constructed();

        Arc::new(Self {
            cell,
            view,
            destroyed: AtomicBool::new(false),
            observed: AtomicBool::new(false),
        })
    }

    pub fn phase(&self) -> ViewPhase {
        self.cell.state().phase()
    }

    /// Run `callback` once the map is ready, immediately if it already is.
    /// Never runs if the view is disposed first.
    pub fn on_ready(&self, callback: impl FnOnce(MapHandle) + Send + 'static) {
        self.cell.on_ready(Box::new(callback));
    }

    /// Resolves with the map handle, or [`EmbedError::Disposed`] if the view
    /// is torn down before it becomes ready.
    pub async fn ready(&self) -> Result<MapHandle, EmbedError> {
        self.cell.ready().await
    }

    pub fn apply_configuration(
        &self,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<ApplyOutcome, EmbedError> {
        let handle = match self.cell.state() {
            ViewState::Ready(handle) if !self.destroyed.load(Ordering::Acquire) => handle,
            ViewState::Uninitialized | ViewState::AttachedPending => {
                tracing::warn!("configuration applied before the map was ready, skipping");
                return Ok(ApplyOutcome::NotReady);
            }
            ViewState::Ready(_) | ViewState::Disposed => {
                tracing::debug!("configuration applied to a disposed view, skipping");
                return Ok(ApplyOutcome::Disposed);
            }
        };

        let style_json = snapshot.style_json()?;
        tracing::info!(?handle, bytes = style_json.len(), "applying map style");
        self.view.set_style(handle, style_json);

        Ok(ApplyOutcome::Applied)
    }

    pub fn forward(&self, event: ViewEvent) {
        if self.destroyed.load(Ordering::Acquire) {
            tracing::trace!(?event, "view already destroyed, dropping lifecycle event");
            return;
        }

        tracing::trace!(?event, "forwarding lifecycle event");
        match event {
            ViewEvent::Start => self.view.on_start(),
            ViewEvent::Resume => self.view.on_resume(),
            ViewEvent::Pause => self.view.on_pause(),
            ViewEvent::Stop => self.view.on_stop(),
            ViewEvent::Destroy => self.destroy(),
        }
    }

    /// Forward `destroy` unless the host already did, then mark the view
    /// disposed. Idempotent.
    pub fn dispose(&self) {
        self.destroy();
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.view.on_destroy();
        self.cell.dispose();
        tracing::debug!("map view destroyed");
    }

    pub(crate) fn claim_observer(&self) -> Result<(), EmbedError> {
        if self.observed.swap(true, Ordering::AcqRel) {
            return Err(EmbedError::AlreadyAttached);
        }
        Ok(())
    }

    pub(crate) fn release_observer(&self) {
        self.observed.store(false, Ordering::Release);
    }
}
