//! Unsynchronised callback registry.
//!
//! [`CallbackRegistry`] is the plain table: every mutation takes `&mut self`,
//! so sharing it between threads requires the caller to provide exclusion.
//! Use [`SharedCallbackRegistry`](crate::SharedCallbackRegistry) when the
//! table must be reachable from several threads or from `extern "C"`
//! trampolines.

use crate::error::{CallbackError, CallbackResult};
use crate::signature::{IntoCallback, Signature};
use crate::token::{CallbackToken, TokenCounter};
use rustc_hash::FxHashMap;
use std::fmt;
use std::num::NonZeroUsize;

/// Maps tokens to boxed closures of one signature.
///
/// # Example
///
/// ```
/// use callback_bridge_core::CallbackRegistry;
///
/// let mut registry = CallbackRegistry::<fn(i32) -> i32>::new();
/// let token = registry.register(|x: i32| x + 2).unwrap();
///
/// assert_eq!(registry.invoke(token, (42,)), 44);
/// assert_eq!(registry.invoke_once(token, (13,)), 15);
/// assert!(!registry.contains(token));
/// ```
pub struct CallbackRegistry<S: Signature> {
    entries: FxHashMap<CallbackToken, Box<S::Callback>>,
    tokens: TokenCounter,
}

impl<S: Signature> CallbackRegistry<S> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            tokens: TokenCounter::new(),
        }
    }

    /// Creates a registry whose first token is `first`.
    pub fn starting_at(first: NonZeroUsize) -> Self {
        Self {
            entries: FxHashMap::default(),
            tokens: TokenCounter::starting_at(first),
        }
    }

    /// Stores `callback` under a fresh token.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register<F: IntoCallback<S>>(&mut self, callback: F) -> CallbackResult<CallbackToken> {
        let token = self.tokens.mint()?;
        self.entries.insert(token, callback.into_callback());
        log::trace!("registered {token}");
        Ok(token)
    }

    /// Calls the callback stored under `token`.
    ///
    /// # Panics
    ///
    /// Panics if `token` is not registered. Tokens only come from
    /// [`register`](Self::register), so a miss is a caller bug.
    #[track_caller]
    pub fn invoke(&mut self, token: CallbackToken, args: S::Args) -> S::Output {
        match self.try_invoke(token, args) {
            Ok(output) => output,
            Err(err) => panic!("{err}"),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_invoke(&mut self, token: CallbackToken, args: S::Args) -> CallbackResult<S::Output> {
        let callback = self
            .entries
            .get_mut(&token)
            .ok_or(CallbackError::UnknownToken(token))?;
        Ok(S::call(&mut **callback, args))
    }

    /// Removes the callback stored under `token` and calls it.
    ///
    /// The entry is gone before the callback runs, so it stays removed even
    /// if the callback panics.
    ///
    /// # Panics
    ///
    /// Panics if `token` is not registered.
    #[track_caller]
    pub fn invoke_once(&mut self, token: CallbackToken, args: S::Args) -> S::Output {
        match self.try_invoke_once(token, args) {
            Ok(output) => output,
            Err(err) => panic!("{err}"),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_invoke_once(
        &mut self,
        token: CallbackToken,
        args: S::Args,
    ) -> CallbackResult<S::Output> {
        let mut callback = self
            .entries
            .remove(&token)
            .ok_or(CallbackError::UnknownToken(token))?;
        log::trace!("invoking one-shot {token}");
        Ok(S::call(&mut *callback, args))
    }

    pub fn contains(&self, token: CallbackToken) -> bool {
        self.entries.contains_key(&token)
    }

    /// Drops the callback stored under `token`.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, token: CallbackToken) -> bool {
        let removed = self.entries.remove(&token).is_some();
        if removed {
            log::trace!("removed {token}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Signature> Default for CallbackRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Signature> fmt::Debug for CallbackRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("signature", &std::any::type_name::<S>())
            .field("len", &self.entries.len())
            .field("next_token", &self.tokens.peek())
            .finish()
    }
}
