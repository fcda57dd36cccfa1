use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

/// Single-threaded broadcast channel with scoped subscriptions.
///
/// `emit` queues a clone of the value in every live subscriber's inbox; subscribers drain
/// their inbox from their own tick, so nothing runs re-entrantly inside `emit`. Dropping a
/// [`Subscription`] unsubscribes it.
pub struct Signal<T> {
    shared: Rc<RefCell<Inboxes<T>>>,
}

struct Inboxes<T> {
    next_id: u64,
    inboxes: BTreeMap<u64, VecDeque<T>>,
}

impl<T: Clone> Signal<T> {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Inboxes {
                next_id: 0,
                inboxes: BTreeMap::new(),
            })),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let mut shared = self.shared.borrow_mut();
        let id = shared.next_id;
        shared.next_id += 1;
        shared.inboxes.insert(id, VecDeque::new());
        Subscription {
            id,
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub fn emit(&self, value: T) {
        let mut shared = self.shared.borrow_mut();
        for inbox in shared.inboxes.values_mut() {
            inbox.push_back(value.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.borrow().inboxes.len()
    }
}

impl<T: Clone> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles share the same subscriber set.
impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.shared.borrow().inboxes.len())
            .finish()
    }
}

pub struct Subscription<T> {
    id: u64,
    shared: Weak<RefCell<Inboxes<T>>>,
}

impl<T> Subscription<T> {
    /// Takes everything delivered since the last drain, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let Some(shared) = self.shared.upgrade() else {
            return Vec::new();
        };
        let mut shared = shared.borrow_mut();
        shared
            .inboxes
            .get_mut(&self.id)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.borrow_mut().inboxes.remove(&self.id);
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
