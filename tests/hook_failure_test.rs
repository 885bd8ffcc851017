//! A secondary context store that fails to clear must not disturb the
//! propagated task or the restore of the executing thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use authenticated_request::{
    propagate_as, propagate_with_restore, register_hook, store, AttributeSet, ContextHook, User,
    SPINNAKER_REQUEST_ID, SPINNAKER_USER,
};

#[derive(Default)]
struct UnavailableStoreHook {
    attempts: AtomicUsize,
}

impl ContextHook for UnavailableStoreHook {
    fn name(&self) -> &str {
        "unavailable-store"
    }

    fn clear(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        panic!("secondary logging backend not present");
    }
}

#[test]
fn failing_hook_keeps_result_and_restores_store() {
    let hook = Arc::new(UnavailableStoreHook::default());
    register_hook(hook.clone());

    store::clear();
    store::put(SPINNAKER_USER, "worker");
    store::put(SPINNAKER_REQUEST_ID, "worker-req");
    let before = AttributeSet::current();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        propagate_as(|| 7u32, User::new("alice").into()).call()
    }));

    assert_eq!(outcome.ok(), Some(7));
    assert_eq!(AttributeSet::current(), before);
    assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("worker"));
    assert_eq!(hook.attempts.load(Ordering::SeqCst), 1);

    let cleared = panic::catch_unwind(AssertUnwindSafe(|| {
        propagate_with_restore(|| "done", false).call()
    }));

    assert_eq!(cleared.ok(), Some("done"));
    assert!(store::is_empty());
    assert_eq!(hook.attempts.load(Ordering::SeqCst), 2);
}
