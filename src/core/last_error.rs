//! Safe access to the native thread-local error message.

use crate::internal::utils::read_cstring;
use callback_bridge_sys as sys;

/// Returns the calling thread's last native error, if one is set.
pub fn last_error() -> Option<String> {
    let message = read_cstring(sys::get_error())?;
    (!message.is_empty()).then_some(message)
}

/// Records `message` as the calling thread's native error.
pub fn set_error(message: &str) {
    sys::set_error_message(message);
}

pub fn clear_error() {
    sys::clear_error();
}
