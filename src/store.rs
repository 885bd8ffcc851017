//! Thread-local logging context.
//!
//! Each thread owns an independent `String -> String` map. The five
//! identity/tracing attributes live here under their header names, next to
//! any other keys collaborators choose to keep for their own log output.
//!
//! No operation in this module can fail. Nothing here is shared between
//! threads, so no locking is involved.

use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static STORE: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// Returns the value stored under `key` on the current thread.
pub fn get(key: &str) -> Option<String> {
    STORE.with(|store| store.borrow().get(key).cloned())
}

/// Stores `value` under `key` on the current thread, replacing any prior value.
pub fn put(key: impl Into<String>, value: impl Into<String>) {
    let key = key.into();
    let value = value.into();
    STORE.with(|store| {
        store.borrow_mut().insert(key, value);
    });
}

/// Removes `key` from the current thread's store.
pub fn remove(key: &str) {
    STORE.with(|store| {
        store.borrow_mut().remove(key);
    });
}

/// Returns `true` if `key` is present on the current thread.
pub fn contains(key: &str) -> bool {
    STORE.with(|store| store.borrow().contains_key(key))
}

/// Removes every entry from the current thread's store, including keys
/// that are not identity attributes.
pub fn clear() {
    STORE.with(|store| store.borrow_mut().clear());
}

/// Number of entries on the current thread.
pub fn len() -> usize {
    STORE.with(|store| store.borrow().len())
}

/// Returns `true` if the current thread's store holds no entries.
pub fn is_empty() -> bool {
    len() == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        clear();
        put("X-SPINNAKER-USER", "alice");
        assert_eq!(get("X-SPINNAKER-USER").as_deref(), Some("alice"));
        assert!(contains("X-SPINNAKER-USER"));

        put("X-SPINNAKER-USER", "bob");
        assert_eq!(get("X-SPINNAKER-USER").as_deref(), Some("bob"));

        remove("X-SPINNAKER-USER");
        assert!(get("X-SPINNAKER-USER").is_none());
        assert!(is_empty());
    }

    #[test]
    fn clear_removes_unrelated_keys_too() {
        clear();
        put("X-SPINNAKER-USER", "alice");
        put("custom-log-key", "value");
        assert_eq!(len(), 2);

        clear();
        assert!(is_empty());
    }

    #[test]
    fn removing_missing_key_is_noop() {
        clear();
        remove("never-set");
        assert!(is_empty());
    }

    #[test]
    fn stores_are_per_thread() {
        clear();
        put("X-SPINNAKER-USER", "alice");

        let seen = std::thread::spawn(|| get("X-SPINNAKER-USER"))
            .join()
            .expect("thread panicked");

        assert!(seen.is_none());
        assert_eq!(get("X-SPINNAKER-USER").as_deref(), Some("alice"));
    }
}
