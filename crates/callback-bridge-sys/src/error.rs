//! Thread-local last-error channel.
//!
//! Entry points that fail return `false` (or 0) and leave a message here.
//! Successful calls do not clear it.

use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char};

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

/// Records `message` as this thread's last error. Always returns `false`.
pub fn set_error_message(message: &str) -> bool {
    log::debug!("native error: {message}");
    let message = CString::new(message.replace('\0', "")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = message);
    false
}

pub(crate) fn invalid_param(name: &str) -> bool {
    set_error_message(&format!("Parameter '{name}' is invalid"))
}

/// Sets this thread's error message. Always returns `false`.
///
/// # Safety
///
/// `message` must be null or point to a NUL-terminated string.
#[unsafe(export_name = "cb_set_error")]
pub unsafe extern "C" fn set_error(message: *const c_char) -> bool {
    if message.is_null() {
        clear_error();
        return false;
    }
    let message = unsafe { CStr::from_ptr(message) }.to_owned();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = message);
    false
}

/// Returns this thread's last error message, or an empty string.
///
/// The pointer stays valid until the next error is recorded on this thread.
#[unsafe(export_name = "cb_get_error")]
pub extern "C" fn get_error() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ptr())
}

#[unsafe(export_name = "cb_clear_error")]
pub extern "C" fn clear_error() -> bool {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = CString::default());
    true
}
