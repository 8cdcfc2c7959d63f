use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod options;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod snapshot;
pub(crate) mod tile_server;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use error::EmbedError;
pub use lifecycle::{HostLifecycle, LifecycleBridge, LifecycleEvent, LifecycleObserver, LifecycleSubscription};
pub use options::MapViewOptions;
pub use orchestrator::Orchestrator;
pub use session::SessionHandle;
pub use snapshot::ConfigurationSnapshot;
pub use view::{ApplyOutcome, EmbeddedViewAdapter, MapHandle, MapView, MapViewFactory, ReadySignal, ViewEvent, ViewPhase};

uniffi::setup_scaffolding!();

/// Initialize the library with proper panic handling
/// Call this once at startup from Kotlin/Swift
#[uniffi::export]
pub fn init_panic_handler() {
    logging::install_panic_hook();
}

// Every mutex in this crate guards plain state with no invariants that a panic
// can break halfway, so a poisoned lock is still safe to use.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
