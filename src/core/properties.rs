use crate::core::error::{BridgeError, BridgeResult};
use crate::internal::callback_host::PropertyCallbacks;
use crate::internal::utils::read_cstring;
use crate::types::property_type::PropertyType;
use callback_bridge_sys as sys;
use callback_bridge_sys::PropertiesID;
use std::ffi::{CString, c_void};
use std::ptr;
use std::sync::{Arc, Mutex};

/// A group of named, typed properties in the native store.
///
/// Groups created with [`Properties::create`] are destroyed when the wrapper
/// is dropped, which runs the cleanup closure of every pointer property still
/// in the group. The handle returned by [`Properties::global`] is never
/// destroyed.
///
/// # Examples
///
/// ```rust
/// use callback_bridge::prelude::*;
///
/// let props = Properties::create()?;
/// props.set_number("width", 640)?;
/// props.set_string("title", "demo")?;
///
/// assert_eq!(props.get_number("width", 0), 640);
/// assert_eq!(props.get_string("width", ""), "640");
/// assert_eq!(props.property_type("title"), PropertyType::String);
/// assert_eq!(props.names()?, vec!["title", "width"]);
/// # Ok::<(), BridgeError>(())
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct Properties {
    id: PropertiesID,
    owned: bool,
}

impl Properties {
    /// Creates an empty property group owned by this wrapper.
    pub fn create() -> BridgeResult<Self> {
        let id = sys::create_properties();
        if id == 0 {
            return Err(BridgeError::last_native());
        }
        Ok(Self { id, owned: true })
    }

    /// Borrows the process-wide property group.
    pub fn global() -> BridgeResult<Self> {
        let id = sys::get_global_properties();
        if id == 0 {
            return Err(BridgeError::last_native());
        }
        Ok(Self { id, owned: false })
    }

    /// Wraps an existing group without taking ownership of it.
    pub fn borrowed(id: PropertiesID) -> Self {
        Self { id, owned: false }
    }

    pub fn id(&self) -> PropertiesID {
        self.id
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Locks the group for the calling thread until the guard is dropped.
    ///
    /// The lock is recursive: the owning thread may keep using the group.
    pub fn lock(&self) -> BridgeResult<PropertiesLock<'_>> {
        BridgeError::from_native(sys::lock_properties(self.id))?;
        Ok(PropertiesLock { properties: self })
    }

    /// Copies every property into `destination`, except pointer properties
    /// that carry a cleanup closure.
    pub fn copy_to(&self, destination: &Properties) -> BridgeResult<()> {
        BridgeError::from_native(sys::copy_properties(self.id, destination.id))
    }

    pub fn set_pointer(&self, name: &str, value: *mut c_void) -> BridgeResult<()> {
        let name = CString::new(name)?;
        BridgeError::from_native(unsafe {
            sys::set_pointer_property(self.id, name.as_ptr(), value)
        })
    }

    /// Sets a pointer property and attaches `cleanup` to it.
    ///
    /// `cleanup` runs exactly once with the pointer value: when the property
    /// is replaced, cleared, the group is destroyed, or this call fails. A
    /// null `value` clears the property and runs `cleanup` immediately.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn set_pointer_with_cleanup<F>(&self, name: &str, value: *mut c_void, cleanup: F) -> BridgeResult<()>
    where
        F: FnOnce(*mut c_void) + Send + 'static,
    {
        // Shared with the registered closure so the cleanup still runs if the
        // call fails before the native store owns it.
        let slot = Arc::new(Mutex::new(Some(cleanup)));
        let run_once = |slot: &Mutex<Option<F>>, released: *mut c_void| {
            let cleanup = slot.lock().ok().and_then(|mut cleanup| cleanup.take());
            if let Some(cleanup) = cleanup {
                cleanup(released);
            }
        };

        let name = match CString::new(name) {
            Ok(name) => name,
            Err(err) => {
                run_once(&slot, value);
                return Err(err.into());
            }
        };

        let pending = Arc::clone(&slot);
        let token = match PropertyCallbacks::cleanup()
            .register(move |released: *mut c_void| run_once(&pending, released))
        {
            Ok(token) => token,
            Err(err) => {
                run_once(&slot, value);
                return Err(err.into());
            }
        };

        BridgeError::from_native(unsafe {
            sys::set_pointer_property_with_cleanup(
                self.id,
                name.as_ptr(),
                value,
                Some(PropertyCallbacks::cvoid_cleanup_callback),
                token.into_user_data(),
            )
        })
    }

    pub fn set_string(&self, name: &str, value: &str) -> BridgeResult<()> {
        let name = CString::new(name)?;
        let value = CString::new(value)?;
        BridgeError::from_native(unsafe {
            sys::set_string_property(self.id, name.as_ptr(), value.as_ptr())
        })
    }

    pub fn set_number(&self, name: &str, value: i64) -> BridgeResult<()> {
        let name = CString::new(name)?;
        BridgeError::from_native(unsafe { sys::set_number_property(self.id, name.as_ptr(), value) })
    }

    pub fn set_float(&self, name: &str, value: f32) -> BridgeResult<()> {
        let name = CString::new(name)?;
        BridgeError::from_native(unsafe { sys::set_float_property(self.id, name.as_ptr(), value) })
    }

    pub fn set_boolean(&self, name: &str, value: bool) -> BridgeResult<()> {
        let name = CString::new(name)?;
        BridgeError::from_native(unsafe { sys::set_boolean_property(self.id, name.as_ptr(), value) })
    }

    pub fn has(&self, name: &str) -> bool {
        self.property_type(name) != PropertyType::Invalid
    }

    pub fn property_type(&self, name: &str) -> PropertyType {
        let Ok(name) = CString::new(name) else {
            return PropertyType::Invalid;
        };
        PropertyType::from_native(unsafe { sys::get_property_type(self.id, name.as_ptr()) })
    }

    pub fn get_pointer(&self, name: &str, default: *mut c_void) -> *mut c_void {
        let Ok(name) = CString::new(name) else {
            return default;
        };
        unsafe { sys::get_pointer_property(self.id, name.as_ptr(), default) }
    }

    /// Returns the property as a string; numbers, floats and booleans are
    /// rendered.
    pub fn get_string(&self, name: &str, default: &str) -> String {
        let Ok(c_name) = CString::new(name) else {
            return default.to_string();
        };
        // Keep the group locked while the native buffer is copied.
        let Ok(_locked) = self.lock() else {
            return default.to_string();
        };
        let value = unsafe { sys::get_string_property(self.id, c_name.as_ptr(), ptr::null()) };
        read_cstring(value).unwrap_or_else(|| default.to_string())
    }

    pub fn get_number(&self, name: &str, default: i64) -> i64 {
        let Ok(name) = CString::new(name) else {
            return default;
        };
        unsafe { sys::get_number_property(self.id, name.as_ptr(), default) }
    }

    pub fn get_float(&self, name: &str, default: f32) -> f32 {
        let Ok(name) = CString::new(name) else {
            return default;
        };
        unsafe { sys::get_float_property(self.id, name.as_ptr(), default) }
    }

    pub fn get_boolean(&self, name: &str, default: bool) -> bool {
        let Ok(name) = CString::new(name) else {
            return default;
        };
        unsafe { sys::get_boolean_property(self.id, name.as_ptr(), default) }
    }

    /// Removes a property, running its cleanup closure if it has one.
    pub fn clear(&self, name: &str) -> BridgeResult<()> {
        let name = CString::new(name)?;
        BridgeError::from_native(unsafe { sys::clear_property(self.id, name.as_ptr()) })
    }

    /// Names of every property in the group, sorted.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn names(&self) -> BridgeResult<Vec<String>> {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        let registry = PropertyCallbacks::enumerate();
        let token = registry.register(move |_: PropertiesID, name: String| {
            if let Ok(mut names) = sink.lock() {
                names.push(name);
            }
        })?;

        let success = unsafe {
            sys::enumerate_properties(
                self.id,
                Some(PropertyCallbacks::cvoid_enumerate_callback),
                token.into_user_data(),
            )
        };
        registry.remove(token);
        BridgeError::from_native(success)?;

        let names = std::mem::take(&mut *names.lock()?);
        Ok(names)
    }

    /// Calls `visit` with every property name, in name order.
    pub fn enumerate<F: FnMut(&str)>(&self, mut visit: F) -> BridgeResult<()> {
        for name in self.names()? {
            visit(&name);
        }
        Ok(())
    }
}

impl Drop for Properties {
    fn drop(&mut self) {
        if self.owned {
            sys::destroy_properties(self.id);
        }
    }
}

/// Holds a property group's lock; unlocks on drop.
#[derive(Debug)]
pub struct PropertiesLock<'a> {
    properties: &'a Properties,
}

impl PropertiesLock<'_> {
    pub fn properties(&self) -> &Properties {
        self.properties
    }
}

impl Drop for PropertiesLock<'_> {
    fn drop(&mut self) {
        sys::unlock_properties(self.properties.id);
    }
}

/// Number of cleanup closures still waiting for the native store to release
/// their property.
pub fn pending_cleanups() -> usize {
    PropertyCallbacks::cleanup().len()
}

/// Number of enumeration closures currently registered.
pub fn pending_enumerations() -> usize {
    PropertyCallbacks::enumerate().len()
}
