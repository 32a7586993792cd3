//! Subscriber registry shared by query streams and list views.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked with every delivered value.
pub type Observer<T> = Box<dyn FnMut(&T) + Send>;

struct Subscription<K, T> {
    key: K,
    observer: Observer<T>,
}

/// Keyed subscriber list.
///
/// Each subscriber registers under a key (the query it observes, or `()`
/// when there is only one stream). Notifications run in subscription order.
pub struct Subscribers<K, T> {
    entries: BTreeMap<SubscriptionId, Subscription<K, T>>,
    next_id: u64,
}

impl<K, T> Default for Subscribers<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Subscribers<K, T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Registers `observer` under `key` and returns its id.
    pub fn subscribe(&mut self, key: K, observer: Observer<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Subscription { key, observer });
        id
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Delivers `value` to one subscriber.
    pub fn notify(&mut self, id: SubscriptionId, value: &T) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                (entry.observer)(value);
                true
            }
            None => false,
        }
    }

    /// Delivers `value` to every subscriber regardless of key.
    pub fn notify_all(&mut self, value: &T) -> usize {
        for entry in self.entries.values_mut() {
            (entry.observer)(value);
        }
        self.entries.len()
    }

    /// Delivers to every subscriber whose key resolves to a value.
    ///
    /// Returns the number of deliveries made.
    pub fn notify_with<'v, F>(&mut self, mut value_for: F) -> usize
    where
        F: FnMut(&K) -> Option<&'v T>,
        T: 'v,
    {
        let mut delivered = 0;
        for entry in self.entries.values_mut() {
            if let Some(value) = value_for(&entry.key) {
                (entry.observer)(value);
                delivered += 1;
            }
        }
        delivered
    }

    /// Keys of all current subscribers, in subscription order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.values().map(|entry| &entry.key)
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
