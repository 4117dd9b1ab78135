//! Auth-state event bus.
//!
//! Observers are plain synchronous callbacks. They are invoked in
//! registration order, one call per state transition, and never while the
//! bus's own lock is held, so an observer may unsubscribe itself or others.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

use crate::UserHandle;

/// Callback receiving the new user, or `None` once signed out.
pub type AuthObserver = Arc<dyn Fn(Option<UserHandle>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, AuthObserver)>,
}

#[derive(Clone, Default)]
pub struct AuthStateBus {
    registry: Arc<Mutex<Registry>>,
}

impl AuthStateBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: AuthObserver) -> Subscription {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, observer));
        debug!(id, observers = registry.observers.len(), "auth observer registered");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `user` to every observer registered at the time of the call.
    pub fn notify(&self, user: Option<&UserHandle>) {
        let observers: Vec<AuthObserver> = self
            .lock()
            .observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        debug!(
            observers = observers.len(),
            signed_in = user.is_some(),
            "notifying auth observers"
        );

        for observer in observers {
            observer(user.cloned());
        }
    }

    pub fn len(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration handle returned by `on_auth_state_changed`.
///
/// Dropping the handle keeps the observer registered; call
/// [`Subscription::unsubscribe`] to release it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.observers.retain(|(id, _)| *id != self.id);
        debug!(id = self.id, "auth observer released");
    }
}
