//! Rust closures behind native `(callback, user_data)` pairs.
//!
//! The native property store in `callback-bridge-sys` reports cleanup and
//! enumeration through plain C function pointers. This crate wraps it with
//! RAII handles and routes those callbacks into closures through the
//! signature-partitioned registries of `callback-bridge-core`.

pub mod core;
mod internal;

pub mod types;

pub use callback_bridge_core as registry;

// Re-export main types
pub mod prelude {
    pub use crate::core::error::{BridgeError, BridgeResult};
    pub use crate::core::last_error::*;
    pub use crate::core::properties::*;
    pub use crate::types::callbacks::*;
    pub use crate::types::property_type::*;
    pub use callback_bridge_core::{
        CallbackError, CallbackRegistry, CallbackResult, CallbackToken, IntoCallback,
        RegistryHost, SharedCallbackRegistry, Signature,
    };
}
