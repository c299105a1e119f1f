//! Opaque callback tokens.
//!
//! A [`CallbackToken`] identifies one registered callback. Native libraries
//! only ever see it as the `void *user_data` argument of a callback pair, so
//! the token knows how to turn itself into that pointer and back. No other
//! code should perform that conversion.

use crate::error::{CallbackError, CallbackResult};
use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;
use std::ptr;

/// Identifies a registered callback.
///
/// Tokens are never zero, so a null `user_data` pointer can never be mistaken
/// for a live registration.
///
/// # Example
///
/// ```
/// use callback_bridge_core::CallbackToken;
/// use std::num::NonZeroUsize;
///
/// let token = CallbackToken::new(NonZeroUsize::new(3).unwrap());
/// let user_data = token.into_user_data();
/// assert_eq!(CallbackToken::from_user_data(user_data), Some(token));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackToken(NonZeroUsize);

impl CallbackToken {
    /// Create a token from its raw value.
    #[inline]
    pub const fn new(raw: NonZeroUsize) -> Self {
        Self(raw)
    }

    /// Get the underlying value.
    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Encode the token as the `user_data` pointer handed to native code.
    #[inline]
    pub fn into_user_data(self) -> *mut c_void {
        ptr::without_provenance_mut(self.0.get())
    }

    /// Decode a token previously produced by [`into_user_data`](Self::into_user_data).
    ///
    /// Returns `None` for a null pointer.
    #[inline]
    pub fn from_user_data(user_data: *mut c_void) -> Option<Self> {
        NonZeroUsize::new(user_data.addr()).map(Self)
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback#{}", self.0)
    }
}

impl From<CallbackToken> for usize {
    fn from(token: CallbackToken) -> Self {
        token.get()
    }
}

/// Mints tokens in increasing order.
///
/// The counter never wraps: once `usize::MAX` has been issued every further
/// request fails with [`CallbackError::TokensExhausted`].
#[derive(Debug, Clone)]
pub(crate) struct TokenCounter {
    next: Option<NonZeroUsize>,
}

impl TokenCounter {
    pub(crate) const fn new() -> Self {
        Self::starting_at(NonZeroUsize::MIN)
    }

    pub(crate) const fn starting_at(first: NonZeroUsize) -> Self {
        Self { next: Some(first) }
    }

    pub(crate) fn mint(&mut self) -> CallbackResult<CallbackToken> {
        let Some(current) = self.next else {
            log::warn!("callback token space exhausted");
            return Err(CallbackError::TokensExhausted);
        };
        self.next = current.checked_add(1);
        Ok(CallbackToken(current))
    }

    pub(crate) fn peek(&self) -> Option<NonZeroUsize> {
        self.next
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}
