use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// Mutex that the owning thread may acquire again without blocking.
///
/// Unlike `std::sync::Mutex` it can be released without a guard, which is
/// what the `lock_properties`/`unlock_properties` entry points need.
#[derive(Debug, Default)]
pub(crate) struct RecursiveLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl RecursiveLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock(&self) {
        let me = thread::current().id();
        let mut state = self.state();
        loop {
            match state.owner {
                None => {
                    state.owner = Some(me);
                    state.depth = 1;
                    return;
                }
                Some(owner) if owner == me => {
                    state.depth += 1;
                    return;
                }
                Some(_) => {
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Releases one level of ownership.
    ///
    /// Returns `false` if the calling thread does not hold the lock.
    pub(crate) fn unlock(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state();
        if state.owner != Some(me) {
            return false;
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.released.notify_one();
        }
        true
    }

    pub(crate) fn guard(&self) -> RecursiveGuard<'_> {
        self.lock();
        RecursiveGuard { lock: self }
    }
}

pub(crate) struct RecursiveGuard<'a> {
    lock: &'a RecursiveLock,
}

impl Drop for RecursiveGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
