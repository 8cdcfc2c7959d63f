//! In-crate stand-ins for the host side of the FFI boundary.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use futures_util::future::BoxFuture;
use tokio::sync::watch;

use crate::{
    error::EmbedError,
    lifecycle::{HostLifecycle, LifecycleEvent, LifecycleObserver},
    options::MapViewOptions,
    provider::StyleProvider,
    snapshot::ConfigurationSnapshot,
    view::{MapHandle, MapView, MapViewFactory, ReadySignal},
};

/// Ordered record of host-visible calls, shared between fakes.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    fn push(&self, entry: &'static str) {
        self.0.lock().unwrap().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ViewCall {
    SetStyle(MapHandle, String),
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

pub(crate) struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
    journal: Journal,
}

impl RecordingView {
    pub(crate) fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn styles_applied(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ViewCall::SetStyle(..)))
            .count()
    }

    fn record(&self, call: ViewCall, entry: &'static str) {
        self.calls.lock().unwrap().push(call);
        self.journal.push(entry);
    }
}

impl MapView for RecordingView {
    fn set_style(&self, handle: MapHandle, style_json: String) {
        self.record(ViewCall::SetStyle(handle, style_json), "view.set_style");
    }

    fn on_start(&self) {
        self.record(ViewCall::Start, "view.on_start");
    }

    fn on_resume(&self) {
        self.record(ViewCall::Resume, "view.on_resume");
    }

    fn on_pause(&self) {
        self.record(ViewCall::Pause, "view.on_pause");
    }

    fn on_stop(&self) {
        self.record(ViewCall::Stop, "view.on_stop");
    }

    fn on_destroy(&self) {
        self.record(ViewCall::Destroy, "view.on_destroy");
    }
}

pub(crate) struct FakeFactory {
    immediate: Option<MapHandle>,
    view: Arc<RecordingView>,
    ready: Mutex<Option<Arc<ReadySignal>>>,
    options: Mutex<Option<MapViewOptions>>,
}

impl FakeFactory {
    pub(crate) fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            immediate: None,
            view: Arc::new(RecordingView {
                calls: Mutex::new(Vec::new()),
                journal,
            }),
            ready: Mutex::new(None),
            options: Mutex::new(None),
        }
    }

    /// A factory whose views are ready before `create_view` returns.
    pub(crate) fn ready_immediately(handle: MapHandle) -> Self {
        Self {
            immediate: Some(handle),
            ..Self::new()
        }
    }

    pub(crate) fn fire(&self, handle: MapHandle) {
        let ready = self.ready.lock().unwrap().clone();
        ready.expect("no view was created").fire(handle);
    }

    pub(crate) fn view(&self) -> Arc<RecordingView> {
        self.view.clone()
    }

    pub(crate) fn options(&self) -> Option<MapViewOptions> {
        self.options.lock().unwrap().clone()
    }
}

impl MapViewFactory for FakeFactory {
    fn create_view(&self, options: MapViewOptions, ready: Arc<ReadySignal>) -> Arc<dyn MapView> {
        *self.options.lock().unwrap() = Some(options);
        *self.ready.lock().unwrap() = Some(ready.clone());

        if let Some(handle) = self.immediate {
            ready.fire(handle);
        }

        self.view.clone()
    }
}

pub(crate) struct FakeLifecycle {
    observers: Mutex<Vec<Arc<LifecycleObserver>>>,
    journal: Journal,
}

impl FakeLifecycle {
    pub(crate) fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            journal,
        }
    }

    pub(crate) fn emit(&self, event: LifecycleEvent) {
        for observer in self.observers() {
            observer.on_event(event);
        }
    }

    pub(crate) fn observers(&self) -> Vec<Arc<LifecycleObserver>> {
        self.observers.lock().unwrap().clone()
    }
}

impl HostLifecycle for FakeLifecycle {
    fn add_observer(&self, observer: Arc<LifecycleObserver>) {
        self.journal.push("lifecycle.add_observer");
        self.observers.lock().unwrap().push(observer);
    }

    fn remove_observer(&self, observer: Arc<LifecycleObserver>) {
        self.journal.push("lifecycle.remove_observer");
        self.observers
            .lock()
            .unwrap()
            .retain(|existing| !Arc::ptr_eq(existing, &observer));
    }
}

/// A provider whose result is decided by the test while a load is in flight.
pub(crate) struct GatedProvider {
    outcome: watch::Sender<Option<Result<String, String>>>,
    loads: AtomicUsize,
}

impl GatedProvider {
    pub(crate) fn new() -> Self {
        Self {
            outcome: watch::Sender::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn succeed(&self, style_json: &str) {
        self.outcome.send_replace(Some(Ok(style_json.to_string())));
    }

    pub(crate) fn fail(&self, reason: &str) {
        self.outcome.send_replace(Some(Err(reason.to_string())));
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl StyleProvider for GatedProvider {
    fn load(&self) -> BoxFuture<'_, Result<ConfigurationSnapshot, EmbedError>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.outcome.subscribe();

        Box::pin(async move {
            let outcome = rx
                .wait_for(Option::is_some)
                .await
                .map_err(EmbedError::provider)?
                .clone();

            match outcome {
                Some(Ok(style_json)) => Ok(ConfigurationSnapshot::new(style_json)),
                Some(Err(reason)) => Err(EmbedError::ProviderUnavailable(reason)),
                None => unreachable!("waited for an outcome"),
            }
        })
    }
}
