use std::sync::{
    Mutex, Weak,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;

use crate::{
    error::EmbedError,
    lock,
    view::{MapHandle, ViewPhase},
};

pub(crate) type ReadyCallback = Box<dyn FnOnce(MapHandle) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewState {
    Uninitialized,
    AttachedPending,
    Ready(MapHandle),
    Disposed,
}

impl ViewState {
    pub(crate) fn phase(&self) -> ViewPhase {
        match self {
            ViewState::Uninitialized => ViewPhase::Uninitialized,
            ViewState::AttachedPending => ViewPhase::AttachedPending,
            ViewState::Ready(_) => ViewPhase::Ready,
            ViewState::Disposed => ViewPhase::Disposed,
        }
    }
}

/// Readiness state shared between the adapter and the signal handed to the
/// foreign view.
pub(crate) struct ViewCell {
    state: watch::Sender<ViewState>,
    pending: Mutex<Vec<ReadyCallback>>,
}

impl ViewCell {
    pub(crate) fn new() -> Self {
        Self {
            state: watch::Sender::new(ViewState::Uninitialized),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn state(&self) -> ViewState {
        *self.state.borrow()
    }

    pub(crate) fn constructed(&self) {
        self.state.send_if_modified(|state| match state {
            ViewState::Uninitialized => {
                *state = ViewState::AttachedPending;
                true
            }
            _ => false,
        });
    }

    fn mark_ready(&self, handle: MapHandle) {
        let became_ready = self.state.send_if_modified(|state| match state {
            ViewState::Uninitialized | ViewState::AttachedPending => {
                *state = ViewState::Ready(handle);
                true
            }
            ViewState::Ready(_) => {
                tracing::warn!(?handle, "map view reported ready twice");
                false
            }
            ViewState::Disposed => {
                tracing::debug!(?handle, "map became ready after disposal, ignoring");
                false
            }
        });

        if became_ready {
            tracing::debug!(?handle, "map view ready");
            let callbacks = std::mem::take(&mut *lock(&self.pending));
            for callback in callbacks {
                callback(handle);
            }
        }
    }

    pub(crate) fn on_ready(&self, callback: ReadyCallback) {
        let mut pending = lock(&self.pending);

        // checked under the pending lock so a concurrent mark_ready either sees
        // this callback or we see its state
        match self.state() {
            ViewState::Ready(handle) => {
                drop(pending);
                callback(handle);
            }
            ViewState::Disposed => {}
            ViewState::Uninitialized | ViewState::AttachedPending => pending.push(callback),
        }
    }

    pub(crate) async fn ready(&self) -> Result<MapHandle, EmbedError> {
        let mut rx = self.state.subscribe();
        let state = *rx
            .wait_for(|state| matches!(state, ViewState::Ready(_) | ViewState::Disposed))
            .await
            .map_err(|_| EmbedError::Disposed)?;

        match state {
            ViewState::Ready(handle) => Ok(handle),
            _ => Err(EmbedError::Disposed),
        }
    }

    pub(crate) fn dispose(&self) {
        self.state.send_replace(ViewState::Disposed);
        let dropped = std::mem::take(&mut *lock(&self.pending));
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "dropping ready callbacks of a disposed view");
        }
    }
}

/// One-shot notification the host fires once the map view can be used.
#[derive(uniffi::Object)]
pub struct ReadySignal {
    cell: Weak<ViewCell>,
    fired: AtomicBool,
}

impl ReadySignal {
    pub(crate) fn new(cell: Weak<ViewCell>) -> Self {
        Self {
            cell,
            fired: AtomicBool::new(false),
        }
    }
}

#[uniffi::export]
impl ReadySignal {
    pub fn fire(&self, handle: MapHandle) {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::warn!(?handle, "ready signal fired more than once");
            return;
        }

        match self.cell.upgrade() {
            Some(cell) => cell.mark_ready(handle),
            None => tracing::debug!(?handle, "ready signal fired for a dropped view"),
        }
    }
}
