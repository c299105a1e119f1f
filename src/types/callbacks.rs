use callback_bridge_sys::PropertiesID;
use std::ffi::c_void;

// ========== PROPERTY CALLBACKS ==========

/// Signature of cleanup closures attached to pointer properties.
///
/// The closure receives the pointer value that is being released. It runs
/// exactly once: when the property is replaced, cleared, its group is
/// destroyed, or the set call itself fails.
///
/// # Examples
///
/// ```rust
/// use callback_bridge::prelude::*;
/// use std::ffi::c_void;
///
/// let props = Properties::create()?;
/// let buffer = Box::into_raw(Box::new([0u8; 64])) as *mut c_void;
///
/// props.set_pointer_with_cleanup("scratch", buffer, |value| {
///     drop(unsafe { Box::from_raw(value as *mut [u8; 64]) });
/// })?;
/// # Ok::<(), BridgeError>(())
/// ```
pub type CleanupFn = fn(*mut c_void);

/// Signature of enumeration closures, called once per property name.
pub type EnumerateFn = fn(PropertiesID, String);
