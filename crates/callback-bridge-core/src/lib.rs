//! Signature-partitioned callback registries for native callback interop.
//!
//! Native libraries report events through a function pointer plus an opaque
//! `user_data` pointer. This crate lets Rust closures sit behind such pairs:
//!
//! - [`CallbackRegistry`] stores closures of one [`Signature`] under
//!   [`CallbackToken`]s.
//! - [`SharedCallbackRegistry`] is the same table behind a mutex.
//! - [`trampoline`] turns a `user_data` pointer back into a registry call
//!   from inside an `extern "C"` function.

pub mod error;
pub mod registry;
pub mod shared;
pub mod signature;
pub mod token;
pub mod trampoline;

pub use error::{CallbackError, CallbackResult};
pub use registry::CallbackRegistry;
pub use shared::SharedCallbackRegistry;
pub use signature::{IntoCallback, Signature};
pub use token::CallbackToken;
pub use trampoline::RegistryHost;
