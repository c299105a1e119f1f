use std::ffi::{CStr, c_char};

/// Copies a NUL-terminated string owned by native code.
///
/// Returns `None` for a null pointer. Invalid UTF-8 is replaced.
pub(crate) fn read_cstring(c_buf: *const c_char) -> Option<String> {
    if c_buf.is_null() {
        return None;
    }
    let c_str: &CStr = unsafe { CStr::from_ptr(c_buf) };
    Some(c_str.to_string_lossy().into_owned())
}
