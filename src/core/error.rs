use callback_bridge_core::CallbackError;
use std::ffi::NulError;
use std::str::Utf8Error;
use std::sync::{MutexGuard, PoisonError};
use thiserror::Error;

pub type BridgeResult<T> = anyhow::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Native error: {0}")]
    Native(String),

    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    #[error("String conversion error: {0}")]
    StringConversion(#[from] NulError),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Conversion(#[from] Utf8Error),

    #[error("Mutex poisoned")]
    MutexPoisoned,
}

impl BridgeError {
    /// Turns a native success flag into a result, reading the last error
    /// message on failure.
    pub fn from_native(success: bool) -> BridgeResult<()> {
        if success {
            return Ok(());
        }

        Err(Self::last_native())
    }

    /// Builds a [`BridgeError::Native`] from the calling thread's last error.
    pub fn last_native() -> Self {
        let message = crate::core::last_error::last_error()
            .unwrap_or_else(|| "unknown native error".to_string());
        log::debug!("native call failed: {message}");
        BridgeError::Native(message)
    }

    /// Get the native message if this is a native error
    pub fn as_native(&self) -> Option<&str> {
        match self {
            BridgeError::Native(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for BridgeError {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        BridgeError::MutexPoisoned
    }
}
