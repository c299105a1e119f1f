//! Named, typed property groups.
//!
//! Groups are identified by a [`PropertiesID`]. Pointer properties may carry
//! a cleanup callback which the store calls exactly once, when the value is
//! replaced, cleared, its group destroyed, or the set itself fails.

use crate::error::{invalid_param, set_error_message};
use crate::lock::RecursiveLock;
use rustc_hash::FxHashMap;
use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

pub type PropertiesID = u32;

pub type PropertyType = u32;

pub const PROPERTY_TYPE_INVALID: PropertyType = 0;
pub const PROPERTY_TYPE_POINTER: PropertyType = 1;
pub const PROPERTY_TYPE_STRING: PropertyType = 2;
pub const PROPERTY_TYPE_NUMBER: PropertyType = 3;
pub const PROPERTY_TYPE_FLOAT: PropertyType = 4;
pub const PROPERTY_TYPE_BOOLEAN: PropertyType = 5;

/// Called with the `userdata` and the pointer value being released.
pub type CleanupPropertyCallback =
    Option<unsafe extern "C" fn(userdata: *mut c_void, value: *mut c_void)>;

/// Called once per property name during [`enumerate_properties`].
pub type EnumeratePropertiesCallback =
    Option<unsafe extern "C" fn(userdata: *mut c_void, props: PropertiesID, name: *const c_char)>;

#[derive(Debug, Clone)]
enum Value {
    Pointer(*mut c_void),
    String(CString),
    Number(i64),
    Float(f32),
    Boolean(bool),
}

#[derive(Debug)]
struct Property {
    value: Value,
    cleanup: CleanupPropertyCallback,
    userdata: *mut c_void,
    // String form of non-string values, handed out by `get_string_property`.
    rendered: Option<CString>,
}

// SAFETY: the store never dereferences pointer values or userdata; they are
// opaque payloads owned by whoever set them.
unsafe impl Send for Property {}

impl Property {
    fn new(value: Value) -> Self {
        Self {
            value,
            cleanup: None,
            userdata: ptr::null_mut(),
            rendered: None,
        }
    }

    fn with_cleanup(value: *mut c_void, cleanup: CleanupPropertyCallback, userdata: *mut c_void) -> Self {
        Self {
            value: Value::Pointer(value),
            cleanup,
            userdata,
            rendered: None,
        }
    }

    fn kind(&self) -> PropertyType {
        match self.value {
            Value::Pointer(_) => PROPERTY_TYPE_POINTER,
            Value::String(_) => PROPERTY_TYPE_STRING,
            Value::Number(_) => PROPERTY_TYPE_NUMBER,
            Value::Float(_) => PROPERTY_TYPE_FLOAT,
            Value::Boolean(_) => PROPERTY_TYPE_BOOLEAN,
        }
    }

    fn copyable(&self) -> bool {
        self.cleanup.is_none()
    }

    fn duplicate(&self) -> Self {
        Self::new(self.value.clone())
    }

    /// Consumes the property, running its cleanup callback if it has one.
    fn release(self) {
        if let (Value::Pointer(value), Some(cleanup)) = (&self.value, self.cleanup) {
            unsafe { cleanup(self.userdata, *value) };
        }
    }

    // Rendered once per value so earlier pointers stay valid across reads.
    fn as_c_str(&mut self) -> Option<*const c_char> {
        let value = &self.value;
        let rendered = match value {
            Value::String(value) => return Some(value.as_ptr()),
            Value::Pointer(_) => return None,
            _ => self.rendered.get_or_insert_with(|| render(value)),
        };
        Some(rendered.as_ptr())
    }

    fn as_number(&self) -> Option<i64> {
        match &self.value {
            Value::Number(value) => Some(*value),
            Value::String(value) => Some(parse_or_zero(value)),
            Value::Float(value) => Some(value.round() as i64),
            Value::Boolean(value) => Some(i64::from(*value)),
            Value::Pointer(_) => None,
        }
    }

    fn as_float(&self) -> Option<f32> {
        match &self.value {
            Value::Float(value) => Some(*value),
            Value::String(value) => Some(parse_or_zero(value)),
            Value::Number(value) => Some(*value as f32),
            Value::Boolean(value) => Some(if *value { 1.0 } else { 0.0 }),
            Value::Pointer(_) => None,
        }
    }

    fn as_boolean(&self, default: bool) -> bool {
        match &self.value {
            Value::Boolean(value) => *value,
            Value::String(value) => string_to_boolean(value, default),
            Value::Number(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Pointer(_) => default,
        }
    }
}

fn render(value: &Value) -> CString {
    let text = match value {
        Value::Number(value) => value.to_string(),
        Value::Float(value) => format!("{value:.6}"),
        Value::Boolean(value) => value.to_string(),
        Value::String(value) => return value.clone(),
        Value::Pointer(_) => String::new(),
    };
    CString::new(text).unwrap_or_default()
}

fn parse_or_zero<T: std::str::FromStr + Default>(value: &CStr) -> T {
    value
        .to_str()
        .ok()
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or_default()
}

fn string_to_boolean(value: &CStr, default: bool) -> bool {
    let text = value.to_bytes();
    if text.is_empty() {
        default
    } else {
        text != b"0" && !text.eq_ignore_ascii_case(b"false")
    }
}

type Table = FxHashMap<CString, Property>;

#[derive(Debug)]
struct PropertyGroup {
    lock: RecursiveLock,
    table: Mutex<Table>,
}

impl PropertyGroup {
    fn new() -> Self {
        Self {
            lock: RecursiveLock::new(),
            table: Mutex::new(Table::default()),
        }
    }

    // Callbacks never run under this lock, so a poisoned table is still
    // consistent.
    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
struct Store {
    groups: Mutex<FxHashMap<PropertiesID, Arc<PropertyGroup>>>,
    last_id: Mutex<PropertiesID>,
    global: Mutex<PropertiesID>,
}

impl Store {
    fn get() -> &'static Store {
        static STORE: OnceLock<Store> = OnceLock::new();
        STORE.get_or_init(Store::default)
    }

    fn groups(&self) -> MutexGuard<'_, FxHashMap<PropertiesID, Arc<PropertyGroup>>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create(&self) -> PropertiesID {
        let mut last_id = self.last_id.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(id) = last_id.checked_add(1) else {
            set_error_message("Out of property group identifiers");
            return 0;
        };
        *last_id = id;
        self.groups().insert(id, Arc::new(PropertyGroup::new()));
        log::trace!("created property group {id}");
        id
    }

    fn find(&self, props: PropertiesID) -> Result<Arc<PropertyGroup>, &'static str> {
        if props == 0 {
            return Err("Parameter 'props' is invalid");
        }
        self.groups()
            .get(&props)
            .cloned()
            .ok_or("Couldn't find properties")
    }
}

/// Borrows a property name argument; `None` for null or empty names.
unsafe fn name_arg<'a>(name: *const c_char) -> Option<&'a CStr> {
    if name.is_null() {
        return None;
    }
    let name = unsafe { CStr::from_ptr(name) };
    (!name.is_empty()).then_some(name)
}

fn set_property(props: PropertiesID, name: Option<&CStr>, property: Property) -> bool {
    let group = match Store::get().find(props) {
        Ok(group) => group,
        Err(message) => {
            property.release();
            return set_error_message(message);
        }
    };
    let Some(name) = name else {
        property.release();
        return invalid_param("name");
    };

    let _locked = group.lock.guard();
    let replaced = group.table().insert(name.to_owned(), property);
    if let Some(old) = replaced {
        old.release();
    }
    true
}

/// Runs `read` on the named property with the group locked.
unsafe fn with_property<T>(
    props: PropertiesID,
    name: *const c_char,
    read: impl FnOnce(&mut Property) -> Option<T>,
) -> Option<T> {
    let group = match Store::get().find(props) {
        Ok(group) => group,
        Err(message) => {
            set_error_message(message);
            return None;
        }
    };
    let Some(name) = (unsafe { name_arg(name) }) else {
        invalid_param("name");
        return None;
    };

    let _locked = group.lock.guard();
    let mut table = group.table();
    table.get_mut(name).and_then(read)
}

/// Returns the process-wide property group, creating it on first use.
#[unsafe(export_name = "cb_get_global_properties")]
pub extern "C" fn get_global_properties() -> PropertiesID {
    let store = Store::get();
    let mut global = store.global.lock().unwrap_or_else(PoisonError::into_inner);
    if *global == 0 || !store.groups().contains_key(&*global) {
        *global = store.create();
    }
    *global
}

/// Creates an empty property group. Returns 0 on failure.
#[unsafe(export_name = "cb_create_properties")]
pub extern "C" fn create_properties() -> PropertiesID {
    Store::get().create()
}

/// Copies every property of `src` into `dst`, except pointer properties that
/// have a cleanup callback.
#[unsafe(export_name = "cb_copy_properties")]
pub extern "C" fn copy_properties(src: PropertiesID, dst: PropertiesID) -> bool {
    let store = Store::get();
    let (source, destination) = match (store.find(src), store.find(dst)) {
        (Ok(source), Ok(destination)) => (source, destination),
        (Err(message), _) | (_, Err(message)) => return set_error_message(message),
    };
    if src == dst {
        return true;
    }

    // Lock in id order so opposite copies cannot deadlock.
    let (first, second) = if src < dst {
        (&source, &destination)
    } else {
        (&destination, &source)
    };
    let _first = first.lock.guard();
    let _second = second.lock.guard();

    let copies: Vec<(CString, Property)> = source
        .table()
        .iter()
        .filter(|(_, property)| property.copyable())
        .map(|(name, property)| (name.clone(), property.duplicate()))
        .collect();

    let replaced: Vec<Property> = {
        let mut table = destination.table();
        copies
            .into_iter()
            .filter_map(|(name, property)| table.insert(name, property))
            .collect()
    };
    for old in replaced {
        old.release();
    }
    true
}

/// Acquires the group's recursive lock for the calling thread.
#[unsafe(export_name = "cb_lock_properties")]
pub extern "C" fn lock_properties(props: PropertiesID) -> bool {
    match Store::get().find(props) {
        Ok(group) => {
            group.lock.lock();
            true
        }
        Err(message) => set_error_message(message),
    }
}

#[unsafe(export_name = "cb_unlock_properties")]
pub extern "C" fn unlock_properties(props: PropertiesID) {
    if let Ok(group) = Store::get().find(props) {
        if !group.lock.unlock() {
            log::warn!("unlock of property group {props} by a thread that does not hold it");
        }
    }
}

/// Sets a pointer property whose `cleanup` runs when the value is released.
///
/// A null `value` clears the property. `cleanup` is called even when the
/// call fails.
///
/// # Safety
///
/// `name` must be null or NUL-terminated. `cleanup` must be safe to call with
/// `userdata` and `value` from any thread.
#[unsafe(export_name = "cb_set_pointer_property_with_cleanup")]
pub unsafe extern "C" fn set_pointer_property_with_cleanup(
    props: PropertiesID,
    name: *const c_char,
    value: *mut c_void,
    cleanup: CleanupPropertyCallback,
    userdata: *mut c_void,
) -> bool {
    if value.is_null() {
        if let Some(cleanup) = cleanup {
            unsafe { cleanup(userdata, value) };
        }
        return unsafe { clear_property(props, name) };
    }
    let name = unsafe { name_arg(name) };
    set_property(props, name, Property::with_cleanup(value, cleanup, userdata))
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_set_pointer_property")]
pub unsafe extern "C" fn set_pointer_property(
    props: PropertiesID,
    name: *const c_char,
    value: *mut c_void,
) -> bool {
    unsafe { set_pointer_property_with_cleanup(props, name, value, None, ptr::null_mut()) }
}

/// Sets a string property; the string is copied. A null `value` clears it.
///
/// # Safety
///
/// `name` and `value` must be null or NUL-terminated.
#[unsafe(export_name = "cb_set_string_property")]
pub unsafe extern "C" fn set_string_property(
    props: PropertiesID,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    if value.is_null() {
        return unsafe { clear_property(props, name) };
    }
    let value = unsafe { CStr::from_ptr(value) }.to_owned();
    let name = unsafe { name_arg(name) };
    set_property(props, name, Property::new(Value::String(value)))
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_set_number_property")]
pub unsafe extern "C" fn set_number_property(
    props: PropertiesID,
    name: *const c_char,
    value: i64,
) -> bool {
    let name = unsafe { name_arg(name) };
    set_property(props, name, Property::new(Value::Number(value)))
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_set_float_property")]
pub unsafe extern "C" fn set_float_property(
    props: PropertiesID,
    name: *const c_char,
    value: f32,
) -> bool {
    let name = unsafe { name_arg(name) };
    set_property(props, name, Property::new(Value::Float(value)))
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_set_boolean_property")]
pub unsafe extern "C" fn set_boolean_property(
    props: PropertiesID,
    name: *const c_char,
    value: bool,
) -> bool {
    let name = unsafe { name_arg(name) };
    set_property(props, name, Property::new(Value::Boolean(value)))
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_has_property")]
pub unsafe extern "C" fn has_property(props: PropertiesID, name: *const c_char) -> bool {
    unsafe { get_property_type(props, name) != PROPERTY_TYPE_INVALID }
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_get_property_type")]
pub unsafe extern "C" fn get_property_type(props: PropertiesID, name: *const c_char) -> PropertyType {
    unsafe { with_property(props, name, |property| Some(property.kind())) }
        .unwrap_or(PROPERTY_TYPE_INVALID)
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_get_pointer_property")]
pub unsafe extern "C" fn get_pointer_property(
    props: PropertiesID,
    name: *const c_char,
    default_value: *mut c_void,
) -> *mut c_void {
    unsafe {
        with_property(props, name, |property| match property.value {
            Value::Pointer(value) => Some(value),
            _ => None,
        })
    }
    .unwrap_or(default_value)
}

/// Returns the property as a string, rendering numbers, floats and booleans.
///
/// The returned pointer is owned by the store and stays valid until the
/// property is changed or removed.
///
/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_get_string_property")]
pub unsafe extern "C" fn get_string_property(
    props: PropertiesID,
    name: *const c_char,
    default_value: *const c_char,
) -> *const c_char {
    unsafe { with_property(props, name, Property::as_c_str) }.unwrap_or(default_value)
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_get_number_property")]
pub unsafe extern "C" fn get_number_property(
    props: PropertiesID,
    name: *const c_char,
    default_value: i64,
) -> i64 {
    unsafe { with_property(props, name, |property| property.as_number()) }.unwrap_or(default_value)
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_get_float_property")]
pub unsafe extern "C" fn get_float_property(
    props: PropertiesID,
    name: *const c_char,
    default_value: f32,
) -> f32 {
    unsafe { with_property(props, name, |property| property.as_float()) }.unwrap_or(default_value)
}

/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_get_boolean_property")]
pub unsafe extern "C" fn get_boolean_property(
    props: PropertiesID,
    name: *const c_char,
    default_value: bool,
) -> bool {
    unsafe { with_property(props, name, |property| Some(property.as_boolean(default_value))) }
        .unwrap_or(default_value)
}

/// Removes a property, running its cleanup. Clearing a missing property
/// succeeds.
///
/// # Safety
///
/// `name` must be null or NUL-terminated.
#[unsafe(export_name = "cb_clear_property")]
pub unsafe extern "C" fn clear_property(props: PropertiesID, name: *const c_char) -> bool {
    let group = match Store::get().find(props) {
        Ok(group) => group,
        Err(message) => return set_error_message(message),
    };
    let Some(name) = (unsafe { name_arg(name) }) else {
        return invalid_param("name");
    };

    let _locked = group.lock.guard();
    let removed = group.table().remove(name);
    if let Some(property) = removed {
        property.release();
    }
    true
}

/// Calls `callback` once per property name, in name order, with the group
/// locked.
///
/// # Safety
///
/// `callback` must be safe to call with `userdata`.
#[unsafe(export_name = "cb_enumerate_properties")]
pub unsafe extern "C" fn enumerate_properties(
    props: PropertiesID,
    callback: EnumeratePropertiesCallback,
    userdata: *mut c_void,
) -> bool {
    let group = match Store::get().find(props) {
        Ok(group) => group,
        Err(message) => return set_error_message(message),
    };
    let Some(callback) = callback else {
        return invalid_param("callback");
    };

    let _locked = group.lock.guard();
    let mut names: Vec<CString> = group.table().keys().cloned().collect();
    names.sort();
    for name in &names {
        unsafe { callback(userdata, props, name.as_ptr()) };
    }
    true
}

/// Destroys a group, running the cleanup of every pointer property in it.
#[unsafe(export_name = "cb_destroy_properties")]
pub extern "C" fn destroy_properties(props: PropertiesID) {
    let removed = Store::get().groups().remove(&props);
    let Some(group) = removed else {
        return;
    };

    let _locked = group.lock.guard();
    let drained: Vec<Property> = group.table().drain().map(|(_, property)| property).collect();
    for property in drained {
        property.release();
    }
    log::trace!("destroyed property group {props}");
}
