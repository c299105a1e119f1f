use crate::types::callbacks::{CleanupFn, EnumerateFn};
use callback_bridge_core::trampoline::{self, RegistryHost};
use callback_bridge_core::SharedCallbackRegistry;
use callback_bridge_sys::PropertiesID;
use std::ffi::{c_char, c_void};
use std::sync::OnceLock;

static CLEANUP_CALLBACKS: OnceLock<SharedCallbackRegistry<CleanupFn>> = OnceLock::new();
static ENUMERATE_CALLBACKS: OnceLock<SharedCallbackRegistry<EnumerateFn>> = OnceLock::new();

/// Owns the registries reached from the native property store.
#[derive(Debug)]
pub(crate) struct PropertyCallbacks;

impl RegistryHost<CleanupFn> for PropertyCallbacks {
    fn registry() -> &'static SharedCallbackRegistry<CleanupFn> {
        CLEANUP_CALLBACKS.get_or_init(SharedCallbackRegistry::new)
    }
}

impl RegistryHost<EnumerateFn> for PropertyCallbacks {
    fn registry() -> &'static SharedCallbackRegistry<EnumerateFn> {
        ENUMERATE_CALLBACKS.get_or_init(SharedCallbackRegistry::new)
    }
}

impl PropertyCallbacks {
    pub(crate) fn cleanup() -> &'static SharedCallbackRegistry<CleanupFn> {
        <Self as RegistryHost<CleanupFn>>::registry()
    }

    pub(crate) fn enumerate() -> &'static SharedCallbackRegistry<EnumerateFn> {
        <Self as RegistryHost<EnumerateFn>>::registry()
    }

    // C trampolines

    pub(crate) unsafe extern "C" fn cvoid_cleanup_callback(userdata: *mut c_void, value: *mut c_void) {
        trampoline::dispatch_once::<CleanupFn, Self>(userdata, (value,));
    }

    pub(crate) unsafe extern "C" fn cvoid_enumerate_callback(
        userdata: *mut c_void,
        props: PropertiesID,
        name: *const c_char,
    ) {
        let name = crate::internal::utils::read_cstring(name).unwrap_or_default();
        trampoline::dispatch::<EnumerateFn, Self>(userdata, (props, name));
    }
}
