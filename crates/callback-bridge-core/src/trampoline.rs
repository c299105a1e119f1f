//! Glue between native `(function pointer, user_data)` pairs and registries.
//!
//! A native library only hands back the `user_data` pointer it was given, so
//! an `extern "C"` trampoline needs a `'static` path to the registry that owns
//! the token. [`RegistryHost`] names that path; [`dispatch`] and
//! [`dispatch_once`] do the token decoding and forwarding.
//!
//! ```
//! use callback_bridge_core::trampoline::{self, RegistryHost};
//! use callback_bridge_core::SharedCallbackRegistry;
//! use std::ffi::c_void;
//! use std::sync::OnceLock;
//!
//! type NotifyFn = fn(i32);
//!
//! struct Notifications;
//!
//! impl RegistryHost<NotifyFn> for Notifications {
//!     fn registry() -> &'static SharedCallbackRegistry<NotifyFn> {
//!         static REGISTRY: OnceLock<SharedCallbackRegistry<NotifyFn>> = OnceLock::new();
//!         REGISTRY.get_or_init(SharedCallbackRegistry::new)
//!     }
//! }
//!
//! unsafe extern "C" fn notify(user_data: *mut c_void, code: i32) {
//!     trampoline::dispatch_once::<NotifyFn, Notifications>(user_data, (code,));
//! }
//!
//! let token = Notifications::registry().register(|code: i32| assert_eq!(code, 3)).unwrap();
//! unsafe { notify(token.into_user_data(), 3) };
//! assert!(!Notifications::registry().contains(token));
//! ```

use crate::error::CallbackError;
use crate::shared::SharedCallbackRegistry;
use crate::signature::Signature;
use crate::token::CallbackToken;
use std::ffi::c_void;

/// Gives trampolines `'static` access to the registry for `S`.
pub trait RegistryHost<S: Signature> {
    fn registry() -> &'static SharedCallbackRegistry<S>;
}

#[track_caller]
fn decode(user_data: *mut c_void) -> CallbackToken {
    match CallbackToken::from_user_data(user_data) {
        Some(token) => token,
        None => panic!("{}", CallbackError::NullToken),
    }
}

/// Invokes the callback whose token was passed as `user_data`.
///
/// # Panics
///
/// Panics on a null or unknown token. Inside an `extern "C"` function the
/// panic cannot unwind and aborts the process.
#[track_caller]
pub fn dispatch<S: Signature, H: RegistryHost<S>>(user_data: *mut c_void, args: S::Args) -> S::Output {
    H::registry().invoke(decode(user_data), args)
}

/// Invokes and removes the callback whose token was passed as `user_data`.
///
/// # Panics
///
/// Same conditions as [`dispatch`].
#[track_caller]
pub fn dispatch_once<S: Signature, H: RegistryHost<S>>(
    user_data: *mut c_void,
    args: S::Args,
) -> S::Output {
    H::registry().invoke_once(decode(user_data), args)
}
