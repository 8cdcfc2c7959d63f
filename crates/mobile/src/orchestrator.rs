//! Composition root for one embedded map.
//!
//! An [`Orchestrator`] owns the three foreign resources of a map embedding:
//! the view (through its [`EmbeddedViewAdapter`]), the style snapshot, and the
//! session that produced it. [`run`](Orchestrator::run) waits for the style and
//! the map concurrently and applies the style once both are there.
//! [`dispose`](Orchestrator::dispose) releases everything in a fixed order:
//!
//! 1. lifecycle observer
//! 2. map view
//! 3. configuration snapshot
//! 4. session
//!
//! Work still in flight when the orchestrator is disposed is abandoned, and
//! anything it produces late is released on arrival.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;

use crate::{
    error::EmbedError,
    lifecycle::{HostLifecycle, LifecycleBridge, LifecycleSubscription},
    lock,
    options::MapViewOptions,
    session::SessionHandle,
    snapshot::ConfigurationSnapshot,
    view::{ApplyOutcome, EmbeddedViewAdapter, MapViewFactory, ViewPhase},
};

#[derive(uniffi::Object)]
pub struct Orchestrator {
    session: Arc<SessionHandle>,
    adapter: Arc<EmbeddedViewAdapter>,
    subscription: Mutex<Option<LifecycleSubscription>>,
    snapshot: Mutex<Option<Arc<ConfigurationSnapshot>>>,
    applied: AtomicBool,
    disposed: watch::Sender<bool>,
}

#[uniffi::export(async_runtime = "tokio")]
impl Orchestrator {
    /// Create the map view and start relaying host lifecycle events to it.
    #[uniffi::constructor]
    pub fn start(
        session: Arc<SessionHandle>,
        factory: Arc<dyn MapViewFactory>,
        lifecycle: Arc<dyn HostLifecycle>,
        options: MapViewOptions,
    ) -> Result<Arc<Self>, EmbedError> {
        let adapter = EmbeddedViewAdapter::create(factory.as_ref(), options);
        let subscription = LifecycleBridge::attach(lifecycle, &adapter)?;

        Ok(Arc::new(Self {
            session,
            adapter,
            subscription: Mutex::new(Some(subscription)),
            snapshot: Mutex::new(None),
            applied: AtomicBool::new(false),
            disposed: watch::Sender::new(false),
        }))
    }

    /// Fetch the style and wait for the map, then apply the style once.
    ///
    /// On a provider failure the map keeps its default style and the error is
    /// returned. Nothing is retried.
    pub async fn run(&self) -> Result<ApplyOutcome, EmbedError> {
        let mut disposed = self.disposed.subscribe();
        if *disposed.borrow_and_update() {
            return Ok(ApplyOutcome::Disposed);
        }
        if self.applied.load(Ordering::Acquire) {
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        let work = async {
            let (snapshot, _handle) = tokio::try_join!(self.fetch(), self.adapter.ready())?;
            self.apply_once(&snapshot)
        };

        // disposal also fails the ready wait, so check it first to report it as
        // an outcome rather than an error
        tokio::select! {
            biased;
            _ = disposed.wait_for(|disposed| *disposed) => {
                tracing::debug!("disposed while waiting for style or map");
                Ok(ApplyOutcome::Disposed)
            }
            outcome = work => outcome.inspect_err(|error| match error {
                EmbedError::ProviderUnavailable(_) => {
                    tracing::warn!(%error, "map style unavailable, keeping the default style")
                }
                _ => tracing::debug!(%error, "map style not applied"),
            }),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        *self.disposed.borrow()
    }

    pub fn view_phase(&self) -> ViewPhase {
        self.adapter.phase()
    }

    /// Tear the embedding down. Idempotent, and also run on drop.
    pub fn dispose(&self) {
        if self.disposed.send_replace(true) {
            return;
        }
        tracing::info!("disposing map embedding");

        let subscription = lock(&self.subscription).take();
        if let Some(subscription) = subscription {
            subscription.detach();
        }

        self.adapter.dispose();

        let snapshot = lock(&self.snapshot).take();
        if let Some(snapshot) = snapshot {
            snapshot.release();
        }

        self.session.release();
    }
}

impl Orchestrator {
    async fn fetch(&self) -> Result<Arc<ConfigurationSnapshot>, EmbedError> {
        let fetched = self.session.fetch_configuration().await?;

        // dispose() flips the flag before it empties the slot, so checking it
        // under the slot lock means a late snapshot is never stranded
        let mut slot = lock(&self.snapshot);
        if self.is_disposed() {
            drop(slot);
            fetched.release();
            return Err(EmbedError::Disposed);
        }

        match &*slot {
            Some(current) => {
                tracing::debug!("snapshot already held, releasing the duplicate");
                let current = Arc::clone(current);
                drop(slot);
                fetched.release();
                Ok(current)
            }
            None => {
                *slot = Some(Arc::clone(&fetched));
                Ok(fetched)
            }
        }
    }

    fn apply_once(&self, snapshot: &ConfigurationSnapshot) -> Result<ApplyOutcome, EmbedError> {
        if self.is_disposed() {
            return Ok(ApplyOutcome::Disposed);
        }
        if self.applied.swap(true, Ordering::AcqRel) {
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        let outcome = self.adapter.apply_configuration(snapshot);
        if !matches!(outcome, Ok(ApplyOutcome::Applied)) {
            self.applied.store(false, Ordering::Release);
        }
        outcome
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}
