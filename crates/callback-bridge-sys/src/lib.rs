//! C ABI of the native property store.
//!
//! Every entry point follows the native conventions: failures return `false`
//! or 0 and leave a message on the thread's last-error channel, callbacks are
//! plain `extern "C"` function pointers paired with a `void *userdata`.
//!
//! The C symbols carry a `cb_` prefix, e.g. `create_properties` links as
//! `cb_create_properties`.

mod error;
mod lock;
mod properties;

pub use error::{clear_error, get_error, set_error, set_error_message};
pub use properties::*;
