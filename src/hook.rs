//! Cleanup hooks for secondary logging context stores.
//!
//! A deployment that bridges the thread-local store into another logging
//! backend with its own per-thread state can register a hook here; it runs
//! every time a propagated task finishes. With nothing registered the
//! cleanup step does nothing extra.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A secondary per-thread context store that must be cleared alongside
/// the primary one.
pub trait ContextHook: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Clears the calling thread's state in the secondary store.
    fn clear(&self);
}

impl fmt::Debug for dyn ContextHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHook")
            .field("name", &self.name())
            .finish()
    }
}

fn registry() -> &'static RwLock<Vec<Arc<dyn ContextHook>>> {
    static HOOKS: OnceLock<RwLock<Vec<Arc<dyn ContextHook>>>> = OnceLock::new();
    HOOKS.get_or_init(|| RwLock::new(Vec::new()))
}

/// Registers `hook` for the rest of the process lifetime (or until
/// [`clear_hooks`]).
pub fn register_hook(hook: Arc<dyn ContextHook>) {
    tracing::debug!(hook = hook.name(), "registered context hook");
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(hook);
}

/// Unregisters every hook.
pub fn clear_hooks() {
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

/// Number of registered hooks.
pub fn hook_count() -> usize {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

/// Runs every registered hook on the calling thread.
///
/// A hook that panics is logged and skipped; the remaining hooks still run
/// and the panic does not reach the caller.
pub(crate) fn run_clear_hooks() {
    let hooks: Vec<Arc<dyn ContextHook>> = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    clear_each(&hooks);
}

fn clear_each(hooks: &[Arc<dyn ContextHook>]) -> usize {
    let mut failed = 0;
    for hook in hooks {
        tracing::trace!(hook = hook.name(), "clearing secondary context");
        if panic::catch_unwind(AssertUnwindSafe(|| hook.clear())).is_err() {
            tracing::warn!(hook = hook.name(), "context hook failed to clear, ignoring");
            failed += 1;
        }
    }
    failed
}
