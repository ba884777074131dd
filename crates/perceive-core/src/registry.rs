use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Returned when a registration is refused.
            pub const INVALID: Self = Self(-1);

            pub fn is_valid(self) -> bool {
                self.0 >= 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle_type!(
    /// Registration handle of a sensor. Also keys the sensor's memory.
    SensorHandle
);

handle_type!(
    /// Registration handle of a signal.
    SignalHandle
);

/// Handle-keyed storage with monotonically increasing keys.
///
/// Keys start at 0 and are never reused, so a stale key can only miss, never
/// alias a newer entry. Iteration follows registration order.
#[derive(Debug)]
pub struct Registry<T> {
    entries: BTreeMap<i32, T>,
    next: i32,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 0,
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under the next key and return that key.
    pub fn insert(&mut self, value: T) -> i32 {
        let key = self.next;
        self.entries.insert(key, value);
        self.next += 1;
        key
    }

    pub fn remove(&mut self, key: i32) -> Option<T> {
        self.entries.remove(&key)
    }

    pub fn get(&self, key: i32) -> Option<&T> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: i32) -> Option<&mut T> {
        self.entries.get_mut(&key)
    }

    pub fn contains(&self, key: i32) -> bool {
        self.entries.contains_key(&key)
    }

    /// Snapshot of live keys in registration order. Safe to hold while the
    /// registry is mutated.
    pub fn keys(&self) -> Vec<i32> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. The key counter keeps counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_start_at_zero_and_increment() {
        let mut reg = Registry::new();
        assert_eq!(reg.insert("a"), 0);
        assert_eq!(reg.insert("b"), 1);
        assert_eq!(reg.insert("c"), 2);
        assert_eq!(reg.keys(), vec![0, 1, 2]);
    }

    #[test]
    fn test_keys_never_reused() {
        let mut reg = Registry::new();
        let a = reg.insert("a");
        reg.remove(a);
        let b = reg.insert("b");
        assert_ne!(a, b);
        assert!(reg.get(a).is_none());

        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.insert("c"), 2);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut reg: Registry<u8> = Registry::new();
        assert_eq!(reg.remove(7), None);
        assert_eq!(reg.remove(-1), None);
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let mut reg = Registry::new();
        for v in 0..4 {
            reg.insert(v);
        }
        let snapshot = reg.keys();
        reg.remove(1);
        let seen: Vec<i32> = snapshot.into_iter().filter(|k| reg.contains(*k)).collect();
        assert_eq!(seen, vec![0, 2, 3]);
    }

    #[test]
    fn test_handle_validity() {
        assert!(!SensorHandle::INVALID.is_valid());
        assert!(SensorHandle(0).is_valid());
        assert_eq!(SignalHandle::default(), SignalHandle::INVALID);
        assert_eq!(SignalHandle(4).to_string(), "4");
    }
}
