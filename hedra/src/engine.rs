//! Process-wide scratch state and cooperative cancellation.
//!
//! The only shared mutable state in the library is a reusable saturator
//! counting buffer used by `simplify` and an optional deadline callback
//! consulted by the conversion loop. Both are thread-local and owned by an
//! [`Engine`] guard: creating the guard initializes them, dropping it
//! finalizes them. Library calls made while no guard is alive still work
//! (the buffer is created on demand); the guard exists so an embedding
//! application can bound the lifetime of the scratch state explicitly.

use std::cell::{Cell, RefCell};

thread_local! {
    static SATURATOR_COUNTS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static DEADLINE: RefCell<Option<Box<dyn Fn() -> bool>>> = const { RefCell::new(None) };
    static ENGINE_ALIVE: Cell<bool> = const { Cell::new(false) };
}

/// Guard owning the thread-local scratch state.
#[derive(Debug)]
pub struct Engine {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Engine {
    /// Initializes the scratch state for the current thread.
    ///
    /// # Panics
    ///
    /// Panics if an `Engine` is already alive on this thread.
    pub fn new() -> Self {
        ENGINE_ALIVE.with(|alive| {
            assert!(!alive.get(), "Engine already initialized on this thread");
            alive.set(true);
        });
        Self {
            _not_send: std::marker::PhantomData,
        }
    }

    /// Installs a cooperative deadline: the callback is polled at row
    /// granularity inside long conversions and a `true` return makes the
    /// running operation fail with [`crate::Error::Timeout`], leaving the
    /// receiver in its pre-call state.
    pub fn set_deadline(&self, expired: impl Fn() -> bool + 'static) {
        DEADLINE.with(|d| *d.borrow_mut() = Some(Box::new(expired)));
    }

    /// Removes any installed deadline.
    pub fn clear_deadline(&self) {
        DEADLINE.with(|d| *d.borrow_mut() = None);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        DEADLINE.with(|d| *d.borrow_mut() = None);
        SATURATOR_COUNTS.with(|s| {
            let mut s = s.borrow_mut();
            s.clear();
            s.shrink_to_fit();
        });
        ENGINE_ALIVE.with(|alive| alive.set(false));
    }
}

/// Whether the installed deadline, if any, has fired.
pub(crate) fn deadline_expired() -> bool {
    DEADLINE.with(|d| match &*d.borrow() {
        Some(expired) => expired(),
        None => false,
    })
}

/// Runs `f` with the reusable saturator-count buffer, resized to `len`
/// zeros.
pub(crate) fn with_saturator_counts<T>(len: usize, f: impl FnOnce(&mut [usize]) -> T) -> T {
    SATURATOR_COUNTS.with(|s| {
        let mut counts = s.borrow_mut();
        counts.clear();
        counts.resize(len, 0);
        f(&mut counts)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_lifecycle() {
        assert!(!deadline_expired());
        {
            let engine = Engine::new();
            engine.set_deadline(|| true);
            assert!(deadline_expired());
            engine.clear_deadline();
            assert!(!deadline_expired());
            engine.set_deadline(|| true);
        }
        // Dropping the guard uninstalls the deadline.
        assert!(!deadline_expired());
    }

    #[test]
    fn scratch_buffer_is_zeroed_per_call() {
        with_saturator_counts(3, |counts| {
            counts[1] = 7;
        });
        with_saturator_counts(2, |counts| {
            assert_eq!(counts, &[0, 0]);
        });
    }
}
