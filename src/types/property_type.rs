use callback_bridge_sys as sys;
use num_enum::{FromPrimitive, IntoPrimitive};

/// Type of the value stored in a property.
///
/// Codes the native store does not know map to [`PropertyType::Invalid`].
///
/// ```
/// use callback_bridge::prelude::*;
///
/// assert_eq!(PropertyType::from(3), PropertyType::Number);
/// assert_eq!(PropertyType::from(77), PropertyType::Invalid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum PropertyType {
    /// No property with that name.
    #[num_enum(default)]
    Invalid = 0,
    /// Opaque pointer, possibly with a cleanup callback.
    Pointer = 1,
    /// Owned copy of a string.
    String = 2,
    /// Signed 64-bit integer.
    Number = 3,
    /// 32-bit float.
    Float = 4,
    Boolean = 5,
}

impl PropertyType {
    pub(crate) fn from_native(code: sys::PropertyType) -> Self {
        Self::from(code)
    }
}
