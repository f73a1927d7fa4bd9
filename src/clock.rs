//! Frame clock and resize notifications.
//!
//! Both are the same shape: a host-owned [`Notifier`] that calls every
//! subscribed callback when it fires. Subscribing returns a [`Subscription`]
//! guard; cancelling it (explicitly or by dropping it) unregisters the
//! callback.
//!
//! Everything here is single-threaded. A callback may cancel any
//! subscription, including its own, while the notifier is firing: the
//! running callback finishes, and the cancelled one is not called again from
//! the next notification on. Callbacks subscribed during a notification
//! first run on the next one.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::particle::Bounds;

type Callback<T> = Box<dyn FnMut(&T)>;

struct Slot<T> {
    id: u64,
    /// `None` while the callback is running.
    callback: Option<Callback<T>>,
}

struct Registry<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
}

impl<T> Registry<T> {
    fn take(&mut self, id: u64) -> Option<Slot<T>> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        Some(self.slots.remove(index))
    }
}

/// A list of callbacks fired together.
pub struct Notifier<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Register `callback` until the returned guard is cancelled or dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.slots.push(Slot {
                id,
                callback: Some(Box::new(callback)),
            });
            id
        };
        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    // Release the borrow before the callback is dropped; its
                    // captures may cancel other subscriptions.
                    let removed = registry.borrow_mut().take(id);
                    drop(removed);
                }
            })),
        }
    }

    /// Call every current subscriber with `value`. Returns how many ran.
    pub fn notify(&self, value: &T) -> usize {
        let ids: Vec<u64> = self.registry.borrow().slots.iter().map(|s| s.id).collect();
        let mut called = 0;
        for id in ids {
            let callback = self
                .registry
                .borrow_mut()
                .slots
                .iter_mut()
                .find(|slot| slot.id == id)
                .and_then(|slot| slot.callback.take());
            let Some(mut callback) = callback else {
                continue;
            };

            callback(value);
            called += 1;

            // Put it back unless it was cancelled while running.
            let mut registry = self.registry.borrow_mut();
            if let Some(slot) = registry.slots.iter_mut().find(|slot| slot.id == id) {
                slot.callback = Some(callback);
            }
        }
        called
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.registry.borrow().slots.len())
            .finish()
    }
}

/// Viewport size changes, pushed by the host.
pub type ResizeNotifier = Notifier<Bounds>;

/// Guard for a registered callback.
///
/// Cancelling is idempotent and safe after the notifier itself is gone.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unregister the callback. Later calls do nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// True until [`cancel`](Self::cancel) runs.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Passed to frame callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Zero-based index of this tick.
    pub index: u64,
}

/// The "run me on the next display refresh" primitive.
///
/// The host calls [`tick`](Self::tick) once per refresh; tests call it by hand.
#[derive(Debug, Default)]
pub struct FrameClock {
    frames: Notifier<FrameTick>,
    next_index: Cell<u64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` on every tick until the guard is cancelled.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn schedule(&self, callback: impl FnMut(&FrameTick) + 'static) -> Subscription {
        self.frames.subscribe(callback)
    }

    /// Fire one frame. Returns how many callbacks ran.
    pub fn tick(&self) -> usize {
        let tick = FrameTick {
            index: self.next_index.get(),
        };
        self.next_index.set(tick.index + 1);
        self.frames.notify(&tick)
    }

    /// Number of callbacks waiting for the next tick.
    pub fn scheduled(&self) -> usize {
        self.frames.len()
    }
}
