use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    error::EmbedError,
    view::{EmbeddedViewAdapter, ViewEvent},
};

/// Host lifecycle events, mirroring `androidx.lifecycle.Lifecycle.Event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LifecycleEvent {
    OnCreate,
    OnStart,
    OnResume,
    OnPause,
    OnStop,
    OnDestroy,
    OnAny,
}

impl LifecycleEvent {
    fn view_event(self) -> Option<ViewEvent> {
        match self {
            LifecycleEvent::OnStart => Some(ViewEvent::Start),
            LifecycleEvent::OnResume => Some(ViewEvent::Resume),
            LifecycleEvent::OnPause => Some(ViewEvent::Pause),
            LifecycleEvent::OnStop => Some(ViewEvent::Stop),
            LifecycleEvent::OnDestroy => Some(ViewEvent::Destroy),
            LifecycleEvent::OnCreate | LifecycleEvent::OnAny => None,
        }
    }
}

/// The host's lifecycle owner.
#[uniffi::export(with_foreign)]
pub trait HostLifecycle: Send + Sync {
    fn add_observer(&self, observer: Arc<LifecycleObserver>);
    fn remove_observer(&self, observer: Arc<LifecycleObserver>);
}

/// Registered with the host; relays its events to the adapter without keeping
/// the adapter alive.
#[derive(uniffi::Object)]
pub struct LifecycleObserver {
    adapter: Weak<EmbeddedViewAdapter>,
    detached: AtomicBool,
}

#[uniffi::export]
impl LifecycleObserver {
    /// Events are forwarded synchronously on the caller's thread, so the order
    /// the host emits them in is the order the view sees them.
    pub fn on_event(&self, event: LifecycleEvent) {
        if self.detached.load(Ordering::Acquire) {
            tracing::trace!(?event, "lifecycle event after detach, ignoring");
            return;
        }

        let Some(view_event) = event.view_event() else {
            return;
        };

        match self.adapter.upgrade() {
            Some(adapter) => adapter.forward(view_event),
            None => tracing::trace!(?event, "lifecycle event for a dropped view, ignoring"),
        }
    }
}

pub struct LifecycleBridge;

impl LifecycleBridge {
    /// Start relaying `host` events to `adapter`. A view accepts one bridge at
    /// a time.
    pub fn attach(
        host: Arc<dyn HostLifecycle>,
        adapter: &Arc<EmbeddedViewAdapter>,
    ) -> Result<LifecycleSubscription, EmbedError> {
        adapter.claim_observer()?;

        let observer = Arc::new(LifecycleObserver {
            adapter: Arc::downgrade(adapter),
            detached: AtomicBool::new(false),
        });
        host.add_observer(Arc::clone(&observer));
        tracing::debug!("lifecycle observer attached");

        Ok(LifecycleSubscription {
            host,
            observer,
            detached: false,
        })
    }
}

/// Live registration of a [`LifecycleObserver`]. Call [`detach`](Self::detach)
/// before disposing the adapter it feeds.
pub struct LifecycleSubscription {
    host: Arc<dyn HostLifecycle>,
    observer: Arc<LifecycleObserver>,
    detached: bool,
}

impl LifecycleSubscription {
    pub fn detach(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;

        // stop relaying before the host lets go, residual events are dropped
        self.observer.detached.store(true, Ordering::Release);
        self.host.remove_observer(Arc::clone(&self.observer));

        if let Some(adapter) = self.observer.adapter.upgrade() {
            adapter.release_observer();
        }
        tracing::debug!("lifecycle observer detached");
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        if !self.detached {
            tracing::warn!("lifecycle subscription dropped without detach");
            self.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        options::MapViewOptions,
        testing::{FakeFactory, FakeLifecycle, ViewCall},
        view::ViewPhase,
    };

    fn setup() -> (FakeFactory, Arc<FakeLifecycle>, Arc<EmbeddedViewAdapter>) {
        let factory = FakeFactory::new();
        let lifecycle = Arc::new(FakeLifecycle::new());
        let adapter = EmbeddedViewAdapter::create(&factory, MapViewOptions::default());
        (factory, lifecycle, adapter)
    }

    #[test]
    fn test_events_forwarded_in_order() {
        let (factory, lifecycle, adapter) = setup();
        let subscription = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();

        for event in [
            LifecycleEvent::OnCreate,
            LifecycleEvent::OnStart,
            LifecycleEvent::OnResume,
            LifecycleEvent::OnPause,
            LifecycleEvent::OnStop,
            LifecycleEvent::OnAny,
            LifecycleEvent::OnDestroy,
        ] {
            lifecycle.emit(event);
        }

        assert_eq!(
            factory.view().calls(),
            vec![
                ViewCall::Start,
                ViewCall::Resume,
                ViewCall::Pause,
                ViewCall::Stop,
                ViewCall::Destroy,
            ]
        );
        assert_eq!(adapter.phase(), ViewPhase::Disposed);
        subscription.detach();
    }

    #[test]
    fn test_repeated_pause_resume_cycles() {
        let (factory, lifecycle, adapter) = setup();
        let subscription = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();

        lifecycle.emit(LifecycleEvent::OnResume);
        lifecycle.emit(LifecycleEvent::OnPause);
        lifecycle.emit(LifecycleEvent::OnResume);

        assert_eq!(
            factory.view().calls(),
            vec![ViewCall::Resume, ViewCall::Pause, ViewCall::Resume]
        );
        subscription.detach();
    }

    #[test]
    fn test_detach_unregisters_and_silences_residual_events() {
        let (factory, lifecycle, adapter) = setup();
        let subscription = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();
        let observer = lifecycle.observers().pop().unwrap();

        subscription.detach();
        assert!(lifecycle.observers().is_empty());

        // a host racing teardown may still hold on to the observer
        observer.on_event(LifecycleEvent::OnStop);
        assert!(factory.view().calls().is_empty());
    }

    #[test]
    fn test_events_after_destroy_are_noops() {
        let (factory, lifecycle, adapter) = setup();
        let subscription = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();

        lifecycle.emit(LifecycleEvent::OnDestroy);
        lifecycle.emit(LifecycleEvent::OnDestroy);
        lifecycle.emit(LifecycleEvent::OnStart);

        assert_eq!(factory.view().calls(), vec![ViewCall::Destroy]);
        subscription.detach();
    }

    #[test]
    fn test_one_registration_per_view() {
        let (_factory, lifecycle, adapter) = setup();
        let subscription = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();

        assert!(matches!(
            LifecycleBridge::attach(lifecycle.clone(), &adapter),
            Err(EmbedError::AlreadyAttached)
        ));
        assert_eq!(lifecycle.observers().len(), 1);

        subscription.detach();
        let again = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();
        assert_eq!(lifecycle.observers().len(), 1);
        again.detach();
    }

    #[test]
    fn test_observer_does_not_keep_adapter_alive() {
        let (_factory, lifecycle, adapter) = setup();
        let subscription = LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap();

        drop(adapter);
        lifecycle.emit(LifecycleEvent::OnStart);
        subscription.detach();
        assert!(lifecycle.observers().is_empty());
    }

    #[test]
    fn test_dropping_subscription_detaches() {
        let (_factory, lifecycle, adapter) = setup();
        drop(LifecycleBridge::attach(lifecycle.clone(), &adapter).unwrap());

        assert!(lifecycle.observers().is_empty());
        assert!(LifecycleBridge::attach(lifecycle.clone(), &adapter).is_ok());
    }
}
