//! Process-wide "unauthorized" notification.
//!
//! The API client emits the signal whenever the backend answers 401; the
//! session store subscribes to it and logs the user out. Observers are held
//! weakly, so dropping a store unsubscribes it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Receives unauthorized notifications.
///
/// Called synchronously from the request path; implementations must not
/// block or issue requests.
pub trait UnauthorizedObserver: Send + Sync {
    fn on_unauthorized(&self);
}

/// Fan-out of unauthorized notifications to subscribed observers.
///
/// Clones share the same observer list.
#[derive(Clone, Default)]
pub struct UnauthorizedSignal {
    observers: Arc<Mutex<Vec<Weak<dyn UnauthorizedObserver>>>>,
}

impl UnauthorizedSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for future emissions.
    pub fn subscribe(&self, observer: &Arc<dyn UnauthorizedObserver>) {
        self.lock().push(Arc::downgrade(observer));
    }

    /// Notifies every live observer once. Returns how many were notified.
    ///
    /// The list lock is released before observers run, so an observer may
    /// subscribe or emit without deadlocking.
    pub fn emit(&self) -> usize {
        let live: Vec<Arc<dyn UnauthorizedObserver>> = {
            let mut observers = self.lock();
            observers.retain(|weak| weak.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };

        for observer in &live {
            observer.on_unauthorized();
        }
        live.len()
    }

    /// Number of observers still alive.
    pub fn observer_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<dyn UnauthorizedObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for UnauthorizedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedSignal")
            .field("observers", &self.observer_count())
            .finish()
    }
}
