use crate::token::CallbackToken;
use std::sync::{MutexGuard, PoisonError};
use thiserror::Error;

pub type CallbackResult<T> = anyhow::Result<T, CallbackError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("No callback registered for {0}")]
    UnknownToken(CallbackToken),

    #[error("Null callback token")]
    NullToken,

    #[error("Callback token space exhausted")]
    TokensExhausted,

    #[error("Mutex poisoned")]
    MutexPoisoned,
}

impl CallbackError {
    /// Returns the token this error refers to, if any.
    pub fn token(&self) -> Option<CallbackToken> {
        match self {
            CallbackError::UnknownToken(token) => Some(*token),
            _ => None,
        }
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for CallbackError {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        CallbackError::MutexPoisoned
    }
}
