//! In-flight call deduplication
//!
//! While a call for a key is running, later callers for the same key block
//! and receive a clone of its result instead of running their own. The
//! record is dropped as soon as the leader finishes, so results (including
//! failures) are never cached here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

enum State<T> {
    Pending,
    Done(T),
    /// Leader unwound without a result; waiters retry
    Abandoned,
}

struct Call<T> {
    state: Mutex<State<T>>,
    done: Condvar,
    /// Callers that joined instead of leading
    waiters: AtomicUsize,
}

impl<T: Clone> Call<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending),
            done: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    fn finish(&self, state: State<T>) {
        *self.state.lock() = state;
        self.done.notify_all();
    }

    /// Block until the leader finishes; None if it was abandoned
    fn wait(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                State::Done(value) => return Some(value.clone()),
                State::Abandoned => return None,
                State::Pending => {}
            }
            self.done.wait(&mut state);
        }
    }
}

/// Deduplicates concurrent calls by key
pub struct FlightGroup<T> {
    calls: Mutex<HashMap<String, Arc<Call<T>>>>,
}

impl<T: Clone> Default for FlightGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FlightGroup<T> {
    /// Create an empty flight group
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` for `key` unless a call is already in flight
    ///
    /// Returns the result and whether it was shared from another caller.
    pub fn run<F>(&self, key: &str, f: F) -> (T, bool)
    where
        F: FnOnce() -> T,
    {
        loop {
            let call = {
                let mut calls = self.calls.lock();
                match calls.get(key).cloned() {
                    Some(call) => {
                        call.waiters.fetch_add(1, Ordering::SeqCst);
                        call
                    }
                    None => {
                        let call = Arc::new(Call::new());
                        calls.insert(key.to_string(), Arc::clone(&call));
                        drop(calls);
                        return (self.lead(key, &call, f), false);
                    }
                }
            };

            if let Some(value) = call.wait() {
                return (value, true);
            }
        }
    }

    /// Number of keys with a call in flight
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Callers currently queued behind the in-flight call for `key`
    #[cfg(test)]
    pub(crate) fn waiting(&self, key: &str) -> usize {
        self.calls
            .lock()
            .get(key)
            .map(|call| call.waiters.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    fn lead<F>(&self, key: &str, call: &Call<T>, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut guard = LeaderGuard {
            calls: &self.calls,
            key,
            call,
            finished: false,
        };
        let value = f();
        call.finish(State::Done(value.clone()));
        guard.finished = true;
        trace!(
            key,
            waiters = call.waiters.load(Ordering::SeqCst),
            "in-flight call finished"
        );
        value
    }
}

/// Clears the in-flight record when the leader returns or unwinds
struct LeaderGuard<'a, T: Clone> {
    calls: &'a Mutex<HashMap<String, Arc<Call<T>>>>,
    key: &'a str,
    call: &'a Call<T>,
    finished: bool,
}

impl<T: Clone> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(self.key);
        if !self.finished {
            self.call.finish(State::Abandoned);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
