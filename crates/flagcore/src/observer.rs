//! Observer Registry (§4.5): subscribers filtered by a set of interesting
//! keys, dispatched with the registry held in reader mode only and no other
//! lock held (§5's snapshot-then-dispatch pattern).

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::key::FlagKey;

/// A subscriber to flag-change events, identified by object identity
/// (`Arc::ptr_eq`), not by any field of the observer itself.
pub trait Observer: Send + Sync {
    fn flags_changed(&self, changed: &[FlagKey]);
}

struct Subscription {
    observer: Arc<dyn Observer>,
    interests: HashSet<FlagKey>,
}

/// `register`/`deregister` take the writer lock; `notify` takes the reader
/// lock only long enough to build a snapshot, then releases it before
/// invoking any callback — this is what makes it safe for a callback to
/// reenter and call `register`/`deregister` (§8 scenario S5).
pub struct ObserverRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl ObserverRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscriptions: RwLock::new(Vec::new()),
        })
    }

    /// Idempotent per observer identity: a second registration unions the
    /// key set into the existing one rather than creating a duplicate entry.
    pub fn register(&self, observer: Arc<dyn Observer>, keys: impl IntoIterator<Item = FlagKey>) {
        let mut subscriptions = self.subscriptions.write();
        match subscriptions
            .iter_mut()
            .find(|sub| Arc::ptr_eq(&sub.observer, &observer))
        {
            Some(existing) => existing.interests.extend(keys),
            None => subscriptions.push(Subscription {
                observer,
                interests: keys.into_iter().collect(),
            }),
        }
    }

    /// After this returns, the registry will not invoke `observer` again.
    pub fn deregister(&self, observer: &Arc<dyn Observer>) {
        let mut subscriptions = self.subscriptions.write();
        subscriptions.retain(|sub| !Arc::ptr_eq(&sub.observer, observer));
    }

    /// For each observer whose interest set intersects `keys`, invokes
    /// `flags_changed` exactly once with that intersection. A panicking
    /// observer is caught so it cannot starve the others or escape into the
    /// caller of `set`/`update` (§7).
    pub fn notify(&self, keys: &[FlagKey]) {
        let snapshot: Vec<(Arc<dyn Observer>, Vec<FlagKey>)> = {
            let subscriptions = self.subscriptions.read();
            subscriptions
                .iter()
                .filter_map(|sub| {
                    let changed: Vec<FlagKey> = keys
                        .iter()
                        .copied()
                        .filter(|key| sub.interests.contains(key))
                        .collect();
                    if changed.is_empty() {
                        None
                    } else {
                        Some((Arc::clone(&sub.observer), changed))
                    }
                })
                .collect()
        };

        for (observer, changed) in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| observer.flags_changed(&changed)));
            if let Err(panic) = result {
                tracing::debug!("observer panicked during notification");
                drop(panic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingObserver {
        received: Mutex<Vec<Vec<FlagKey>>>,
    }

    impl Observer for RecordingObserver {
        fn flags_changed(&self, changed: &[FlagKey]) {
            self.received.lock().unwrap().push(changed.to_vec());
        }
    }

    #[test]
    fn notifies_only_the_intersection_of_interests_and_changed_keys() {
        let registry = ObserverRegistry::new();
        let observer = Arc::new(RecordingObserver {
            received: Mutex::new(Vec::new()),
        });
        registry.register(
            observer.clone(),
            [FlagKey::ControlRequestInterval, FlagKey::Hostname],
        );

        registry.notify(&[FlagKey::ControlRequestInterval, FlagKey::UpdateChannel]);

        let received = observer.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], vec![FlagKey::ControlRequestInterval]);
    }

    #[test]
    fn disjoint_interest_set_receives_no_call() {
        let registry = ObserverRegistry::new();
        let observer = Arc::new(RecordingObserver {
            received: Mutex::new(Vec::new()),
        });
        registry.register(observer.clone(), [FlagKey::Hostname]);

        registry.notify(&[FlagKey::UpdateChannel]);

        assert!(observer.received.lock().unwrap().is_empty());
    }

    #[test]
    fn second_registration_unions_interests() {
        let registry = ObserverRegistry::new();
        let observer = Arc::new(RecordingObserver {
            received: Mutex::new(Vec::new()),
        });
        registry.register(observer.clone(), [FlagKey::Hostname]);
        registry.register(observer.clone(), [FlagKey::UpdateChannel]);

        registry.notify(&[FlagKey::UpdateChannel]);

        assert_eq!(observer.received.lock().unwrap().len(), 1);
    }

    #[test]
    fn deregister_stops_future_notifications() {
        let registry = ObserverRegistry::new();
        let observer = Arc::new(RecordingObserver {
            received: Mutex::new(Vec::new()),
        });
        registry.register(observer.clone(), [FlagKey::Hostname]);
        let handle: Arc<dyn Observer> = observer.clone();
        registry.deregister(&handle);

        registry.notify(&[FlagKey::Hostname]);

        assert!(observer.received.lock().unwrap().is_empty());
    }

    struct ReentrantObserver {
        registry: Arc<ObserverRegistry>,
        reregistered: AtomicUsize,
    }

    impl Observer for ReentrantObserver {
        fn flags_changed(&self, _changed: &[FlagKey]) {
            // Reentrant call while the dispatcher's snapshot is already
            // taken — must not deadlock (§8 S5).
            let marker = Arc::new(RecordingObserver {
                received: Mutex::new(Vec::new()),
            });
            self.registry.register(marker, [FlagKey::DesktopEnabled]);
            self.reregistered.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn observer_may_reenter_and_register_during_its_own_callback() {
        let registry = ObserverRegistry::new();
        let reentrant = Arc::new(ReentrantObserver {
            registry: registry.clone(),
            reregistered: AtomicUsize::new(0),
        });
        registry.register(reentrant.clone(), [FlagKey::ControlRequestInterval]);

        registry.notify(&[FlagKey::ControlRequestInterval]);

        assert_eq!(reentrant.reregistered.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriptions.read().len(), 2);
    }

    struct PanickingObserver;
    impl Observer for PanickingObserver {
        fn flags_changed(&self, _changed: &[FlagKey]) {
            panic!("boom");
        }
    }

    #[test]
    fn a_panicking_observer_does_not_prevent_others_from_being_notified() {
        let registry = ObserverRegistry::new();
        registry.register(Arc::new(PanickingObserver), [FlagKey::Hostname]);
        let observer = Arc::new(RecordingObserver {
            received: Mutex::new(Vec::new()),
        });
        registry.register(observer.clone(), [FlagKey::Hostname]);

        registry.notify(&[FlagKey::Hostname]);

        assert_eq!(observer.received.lock().unwrap().len(), 1);
    }
}
