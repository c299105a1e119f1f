use crate::error::{CallbackError, CallbackResult};
use crate::signature::{IntoCallback, Signature};
use crate::token::{CallbackToken, TokenCounter};
use rustc_hash::FxHashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Entry<S> = Arc<Mutex<Box<<S as Signature>::Callback>>>;

struct Table<S: Signature> {
    entries: FxHashMap<CallbackToken, Entry<S>>,
    tokens: TokenCounter,
}

/// Thread-safe callback registry.
///
/// Same operations as [`CallbackRegistry`](crate::CallbackRegistry), all
/// through `&self`. The table lock is only held while looking entries up;
/// callbacks run after it is released, so a callback may register, remove or
/// invoke other entries of the same registry.
///
/// Each entry has its own lock. A callback that invokes its own token through
/// [`invoke`](Self::invoke) deadlocks.
///
/// # Example
///
/// ```
/// use callback_bridge_core::SharedCallbackRegistry;
/// use std::sync::Arc;
/// use std::thread;
///
/// let registry = Arc::new(SharedCallbackRegistry::<fn(u32) -> u32>::new());
/// let token = registry.register(|x: u32| x * 2).unwrap();
///
/// let worker = Arc::clone(&registry);
/// let doubled = thread::spawn(move || worker.invoke(token, (21,))).join().unwrap();
/// assert_eq!(doubled, 42);
/// ```
pub struct SharedCallbackRegistry<S: Signature> {
    table: Mutex<Table<S>>,
}

impl<S: Signature> SharedCallbackRegistry<S> {
    pub fn new() -> Self {
        Self::with_counter(TokenCounter::new())
    }

    /// Creates a registry whose first token is `first`.
    pub fn starting_at(first: NonZeroUsize) -> Self {
        Self::with_counter(TokenCounter::starting_at(first))
    }

    fn with_counter(tokens: TokenCounter) -> Self {
        Self {
            table: Mutex::new(Table {
                entries: FxHashMap::default(),
                tokens,
            }),
        }
    }

    // User callbacks never run under this lock, so a poisoned table is still
    // consistent.
    fn table(&self) -> MutexGuard<'_, Table<S>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register<F: IntoCallback<S>>(&self, callback: F) -> CallbackResult<CallbackToken> {
        let entry = Arc::new(Mutex::new(callback.into_callback()));
        let mut table = self.table();
        let token = table.tokens.mint()?;
        table.entries.insert(token, entry);
        log::trace!("registered shared {token}");
        Ok(token)
    }

    /// Calls the callback stored under `token`.
    ///
    /// # Panics
    ///
    /// Panics if `token` is not registered, or if a previous call of the same
    /// callback panicked.
    #[track_caller]
    pub fn invoke(&self, token: CallbackToken, args: S::Args) -> S::Output {
        match self.try_invoke(token, args) {
            Ok(output) => output,
            Err(err) => panic!("{err}"),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_invoke(&self, token: CallbackToken, args: S::Args) -> CallbackResult<S::Output> {
        let entry = self
            .table()
            .entries
            .get(&token)
            .cloned()
            .ok_or(CallbackError::UnknownToken(token))?;
        let mut callback = entry.lock()?;
        Ok(S::call(&mut **callback, args))
    }

    /// Removes the callback stored under `token` and calls it.
    ///
    /// The entry is removed before the callback runs, whatever the outcome.
    ///
    /// # Panics
    ///
    /// Panics if `token` is not registered.
    #[track_caller]
    pub fn invoke_once(&self, token: CallbackToken, args: S::Args) -> S::Output {
        match self.try_invoke_once(token, args) {
            Ok(output) => output,
            Err(err) => panic!("{err}"),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_invoke_once(&self, token: CallbackToken, args: S::Args) -> CallbackResult<S::Output> {
        let entry = self
            .table()
            .entries
            .remove(&token)
            .ok_or(CallbackError::UnknownToken(token))?;
        log::trace!("invoking shared one-shot {token}");
        let mut callback = entry.lock()?;
        Ok(S::call(&mut **callback, args))
    }

    pub fn contains(&self, token: CallbackToken) -> bool {
        self.table().entries.contains_key(&token)
    }

    pub fn remove(&self, token: CallbackToken) -> bool {
        let removed = self.table().entries.remove(&token).is_some();
        if removed {
            log::trace!("removed shared {token}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().entries.is_empty()
    }
}

impl<S: Signature> Default for SharedCallbackRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Signature> fmt::Debug for SharedCallbackRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table();
        f.debug_struct("SharedCallbackRegistry")
            .field("signature", &std::any::type_name::<S>())
            .field("len", &table.entries.len())
            .field("next_token", &table.tokens.peek())
            .finish()
    }
}
