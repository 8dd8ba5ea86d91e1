//! Bounded-lifetime in-memory overrides with self-expiring timers (§4.3).
//!
//! Lock ordering is the load-bearing invariant here (§5): the registry lock
//! is never held while observers are notified. `start` notifies once before
//! taking the lock (to refresh any cached view before the override takes
//! effect) and the timer notifies again, after releasing the lock, on
//! expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::key::FlagKey;
use crate::observer::ObserverRegistry;
use crate::value::TypedValue;

/// How often the expiry timer re-checks its deadline against the injected
/// [`Clock`] rather than sleeping for the full requested duration in one
/// shot. This is what lets a `ManualClock`-backed registry fire a timer
/// armed for a long duration almost immediately once a test advances the
/// clock past the deadline, instead of the thread being asleep on a
/// `std::thread::sleep` call the clock has no influence over.
const POLL_INTERVAL_CAP: Duration = Duration::from_millis(10);

struct OverrideEntry {
    value: TypedValue,
    generation: u64,
}

/// At most one live override per key. A timer fired for a generation that
/// has since been replaced is a no-op (§4.3 "timer callbacks are idempotent
/// against the override already being replaced").
pub struct OverrideRegistry<C: Clock = SystemClock> {
    entries: RwLock<HashMap<FlagKey, OverrideEntry>>,
    next_generation: AtomicU64,
    clock: Arc<C>,
}

impl OverrideRegistry<SystemClock> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_clock(Arc::new(SystemClock)))
    }
}

impl<C: Clock> OverrideRegistry<C> {
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            clock,
        }
    }

    /// The registry's reader-lock read (§4.2 step 1/4): a snapshot, so the
    /// lock is never held across resolution.
    pub fn value_of(&self, key: FlagKey) -> Option<TypedValue> {
        self.entries.read().get(&key).map(|entry| entry.value.clone())
    }

    /// Installs or replaces the override for `key`, arming a single-shot
    /// expiry timer. Armed → armed (on replacement) and absent → armed both
    /// notify observers on every transition (§4.4's state machine).
    pub fn start(
        self: &Arc<Self>,
        observers: &Arc<ObserverRegistry>,
        key: FlagKey,
        value: TypedValue,
        duration: Duration,
    ) {
        observers.notify(&[key]);

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let armed_at = self.clock.now();
        let deadline = armed_at + duration;
        {
            let mut entries = self.entries.write();
            entries.insert(key, OverrideEntry { value, generation });
        }
        tracing::debug!(%key, generation, ?duration, "override armed");

        let registry = Arc::clone(self);
        let observers = Arc::clone(observers);
        let clock = Arc::clone(&self.clock);
        std::thread::spawn(move || {
            // Poll the injected clock against `deadline` instead of a
            // single `sleep(duration)`, so a `ManualClock` the test advances
            // out-of-band is actually what decides when this fires (see
            // `POLL_INTERVAL_CAP`'s doc comment).
            let poll_interval = duration.min(POLL_INTERVAL_CAP).max(Duration::from_millis(1));
            while clock.now() < deadline {
                std::thread::sleep(poll_interval);
            }
            let fired = {
                let mut entries = registry.entries.write();
                match entries.get(&key) {
                    Some(entry) if entry.generation == generation => {
                        entries.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if fired {
                tracing::debug!(%key, generation, elapsed = ?clock.now().duration_since(armed_at), "override expired");
                observers.notify(&[key]);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::observer::ObserverRegistry;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;
    use std::time::Duration;

    struct CountingObserver {
        interests: Vec<FlagKey>,
        calls: AtomicUsize,
    }

    impl crate::observer::Observer for CountingObserver {
        fn flags_changed(&self, _changed: &[FlagKey]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn override_is_visible_until_it_expires() {
        let observers = ObserverRegistry::new();
        let registry = OverrideRegistry::new();
        let observer = Arc::new(CountingObserver {
            interests: vec![FlagKey::ControlRequestInterval],
            calls: AtomicUsize::new(0),
        });
        observers.register(observer.clone(), observer.interests.clone());

        registry.start(
            &observers,
            FlagKey::ControlRequestInterval,
            TypedValue::Duration(Duration::from_secs(6)),
            Duration::from_millis(100),
        );
        assert_eq!(
            registry
                .value_of(FlagKey::ControlRequestInterval)
                .unwrap()
                .as_duration(),
            Some(Duration::from_secs(6))
        );

        std::thread::sleep(Duration::from_millis(250));
        assert!(registry.value_of(FlagKey::ControlRequestInterval).is_none());
        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn replacing_an_override_resets_its_timer_and_the_stale_one_is_a_no_op() {
        let observers = ObserverRegistry::new();
        let registry = OverrideRegistry::new();

        registry.start(
            &observers,
            FlagKey::ControlRequestInterval,
            TypedValue::Duration(Duration::from_secs(1)),
            Duration::from_millis(50),
        );
        registry.start(
            &observers,
            FlagKey::ControlRequestInterval,
            TypedValue::Duration(Duration::from_secs(2)),
            Duration::from_millis(300),
        );

        std::thread::sleep(Duration::from_millis(150));
        // The first timer fired in this window; it must not have removed
        // the second (replacing) override.
        assert_eq!(
            registry
                .value_of(FlagKey::ControlRequestInterval)
                .unwrap()
                .as_duration(),
            Some(Duration::from_secs(2))
        );

        std::thread::sleep(Duration::from_millis(300));
        assert!(registry.value_of(FlagKey::ControlRequestInterval).is_none());
    }

    #[test]
    fn manual_clock_fires_an_override_armed_for_a_long_duration_without_waiting_for_it() {
        let observers = ObserverRegistry::new();
        let clock = Arc::new(ManualClock::new(Instant::now()));
        let registry = Arc::new(OverrideRegistry::with_clock(clock.clone()));

        // Armed for ten minutes of "clock" time; the test does not sleep
        // anywhere near that long in real wall-clock time.
        registry.start(
            &observers,
            FlagKey::ControlRequestInterval,
            TypedValue::Duration(Duration::from_secs(30)),
            Duration::from_secs(600),
        );
        assert!(registry.value_of(FlagKey::ControlRequestInterval).is_some());

        clock.advance(Duration::from_secs(601));

        // The timer thread polls the clock every `POLL_INTERVAL_CAP`; a few
        // of those ticks in real time is enough for it to observe the
        // advanced deadline and fire.
        std::thread::sleep(POLL_INTERVAL_CAP * 5);
        assert!(registry.value_of(FlagKey::ControlRequestInterval).is_none());
    }
}
