//! Integration tests for callback-bridge using the prelude as the entry point.
//!
//! These tests drive the registries directly and through the native property
//! store, where every cleanup and enumeration goes through a C trampoline.

use callback_bridge::prelude::*;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn payload(addr: usize) -> *mut c_void {
    ptr::without_provenance_mut(addr)
}

/// Cleanup closure that counts its calls and records the last released value.
fn counting_cleanup(
    calls: &Arc<AtomicUsize>,
    released: &Arc<AtomicUsize>,
) -> impl FnOnce(*mut c_void) + Send + 'static {
    let calls = Arc::clone(calls);
    let released = Arc::clone(released);
    move |value| {
        calls.fetch_add(1, Ordering::SeqCst);
        released.store(value.addr(), Ordering::SeqCst);
    }
}

// =============================================================================
// Registries
// =============================================================================

#[test]
fn test_invoke_keeps_callback_registered() {
    init_logging();
    let mut registry = CallbackRegistry::<fn(i32) -> i32>::new();
    let token = registry.register(|x: i32| x + 1).unwrap();

    assert_eq!(registry.invoke(token, (41,)), 42);
    assert_eq!(registry.invoke(token, (1,)), 2);
    assert!(registry.contains(token));
}

#[test]
fn test_invoke_once_removes_callback() {
    let mut registry = CallbackRegistry::<fn(i32) -> i32>::new();
    let token = registry.register(|x: i32| x * 2).unwrap();

    assert_eq!(registry.invoke_once(token, (21,)), 42);
    assert!(!registry.contains(token));
    assert!(matches!(
        registry.try_invoke(token, (1,)),
        Err(CallbackError::UnknownToken(t)) if t == token
    ));
}

#[test]
fn test_signatures_are_partitioned() {
    let unary = SharedCallbackRegistry::<fn(i32) -> i32>::new();
    let binary = SharedCallbackRegistry::<fn(i32, i32) -> i32>::new();

    let token = unary.register(|x: i32| x).unwrap();
    assert!(unary.contains(token));
    assert!(!binary.contains(token));
    assert!(!binary.remove(token));
    assert!(unary.contains(token));
}

#[test]
fn test_removed_token_is_not_reused() {
    let mut registry = CallbackRegistry::<fn()>::new();
    let first = registry.register(|| {}).unwrap();
    assert!(registry.remove(first));
    assert!(!registry.remove(first));

    let second = registry.register(|| {}).unwrap();
    assert_ne!(first, second);
    assert!(!registry.contains(first));
}

#[test]
fn test_closure_state_persists_between_invocations() {
    let registry = SharedCallbackRegistry::<fn(&'static str)>::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let token = registry
        .register(move |word: &'static str| sink.lock().unwrap().push(word))
        .unwrap();

    registry.invoke(token, ("a",));
    registry.invoke(token, ("b",));
    assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_token_survives_user_data_round_trip() {
    let registry = SharedCallbackRegistry::<fn() -> u8>::new();
    let token = registry.register(|| 7u8).unwrap();

    let user_data = token.into_user_data();
    assert!(!user_data.is_null());
    let recovered = CallbackToken::from_user_data(user_data).unwrap();
    assert_eq!(recovered, token);
    assert_eq!(registry.invoke(recovered, ()), 7);
    assert_eq!(CallbackToken::from_user_data(ptr::null_mut()), None);
}

// =============================================================================
// Property store: values
// =============================================================================

#[test]
fn test_values_convert_between_types() {
    init_logging();
    let props = Properties::create().unwrap();
    props.set_number("n", 3).unwrap();
    props.set_float("f", 2.75).unwrap();
    props.set_boolean("b", true).unwrap();
    props.set_string("s", "12").unwrap();

    assert_eq!(props.get_float("n", 0.0), 3.0);
    assert!(props.get_boolean("n", false));
    assert_eq!(props.get_number("f", 0), 3);
    assert_eq!(props.get_string("b", ""), "true");
    assert_eq!(props.get_number("s", 0), 12);
    assert!(props.get_boolean("s", false));
    assert_eq!(props.get_string("f", ""), "2.750000");
}

#[test]
fn test_missing_property_returns_default() {
    let props = Properties::create().unwrap();
    assert!(!props.has("missing"));
    assert_eq!(props.property_type("missing"), PropertyType::Invalid);
    assert_eq!(props.get_number("missing", -5), -5);
    assert_eq!(props.get_string("missing", "fallback"), "fallback");
    assert_eq!(props.get_pointer("missing", payload(0x10)), payload(0x10));
}

#[test]
fn test_property_types_are_reported() {
    let props = Properties::create().unwrap();
    props.set_pointer("p", payload(0x20)).unwrap();
    props.set_string("s", "text").unwrap();
    props.set_number("n", 1).unwrap();
    props.set_float("f", 1.5).unwrap();
    props.set_boolean("b", false).unwrap();

    assert_eq!(props.property_type("p"), PropertyType::Pointer);
    assert_eq!(props.property_type("s"), PropertyType::String);
    assert_eq!(props.property_type("n"), PropertyType::Number);
    assert_eq!(props.property_type("f"), PropertyType::Float);
    assert_eq!(props.property_type("b"), PropertyType::Boolean);
    assert_eq!(props.names().unwrap(), vec!["b", "f", "n", "p", "s"]);
}

#[test]
fn test_clear_removes_property() {
    let props = Properties::create().unwrap();
    props.set_string("title", "demo").unwrap();
    props.clear("title").unwrap();
    assert!(!props.has("title"));
    assert!(props.names().unwrap().is_empty());
}

#[test]
fn test_global_group_is_shared() {
    let first = Properties::global().unwrap();
    first.set_number("unit_tests.global_counter", 11).unwrap();

    let second = Properties::global().unwrap();
    assert_eq!(first, second);
    assert_eq!(second.get_number("unit_tests.global_counter", 0), 11);
    second.clear("unit_tests.global_counter").unwrap();
}

#[test]
fn test_destroyed_group_reports_last_error() {
    let props = Properties::create().unwrap();
    let stale = Properties::borrowed(props.id());
    drop(props);

    clear_error();
    let err = stale.set_string("name", "value").unwrap_err();
    assert_eq!(err.as_native(), Some("Couldn't find properties"));
    assert_eq!(last_error().as_deref(), Some("Couldn't find properties"));
    assert!(stale.lock().is_err());
}

// =============================================================================
// Property store: cleanup callbacks
// =============================================================================

#[test]
fn test_cleanup_runs_once_on_replace() {
    let calls = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let props = Properties::create().unwrap();

    props
        .set_pointer_with_cleanup("slot", payload(0x100), counting_cleanup(&calls, &released))
        .unwrap();
    props.set_number("slot", 5).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 0x100);

    props.clear("slot").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cleanup_runs_once_on_destroy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));

    {
        let props = Properties::create().unwrap();
        props
            .set_pointer_with_cleanup("a", payload(0x200), counting_cleanup(&calls, &released))
            .unwrap();
        props
            .set_pointer_with_cleanup("b", payload(0x300), counting_cleanup(&calls, &released))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cleanup_runs_on_failed_set() {
    let calls = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let props = Properties::create().unwrap();

    let err = props
        .set_pointer_with_cleanup("", payload(0x400), counting_cleanup(&calls, &released))
        .unwrap_err();

    assert_eq!(err.as_native(), Some("Parameter 'name' is invalid"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 0x400);
}

#[test]
fn test_null_value_clears_and_runs_cleanup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(usize::MAX));
    let props = Properties::create().unwrap();
    props.set_number("slot", 1).unwrap();

    props
        .set_pointer_with_cleanup("slot", ptr::null_mut(), counting_cleanup(&calls, &released))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    assert!(!props.has("slot"));
}

#[test]
fn test_cleanup_can_free_boxed_value() {
    let dropped = Arc::new(AtomicUsize::new(0));

    struct Resource(Arc<AtomicUsize>);
    impl Drop for Resource {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let props = Properties::create().unwrap();
    let raw = Box::into_raw(Box::new(Resource(Arc::clone(&dropped)))) as *mut c_void;
    props
        .set_pointer_with_cleanup("resource", raw, |value| {
            drop(unsafe { Box::from_raw(value as *mut Resource) });
        })
        .unwrap();

    assert_eq!(props.get_pointer("resource", ptr::null_mut()), raw);
    assert_eq!(dropped.load(Ordering::SeqCst), 0);
    drop(props);
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_copy_skips_pointers_with_cleanup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let source = Properties::create().unwrap();
    let destination = Properties::create().unwrap();

    source.set_string("title", "copied").unwrap();
    source.set_pointer("plain", payload(0x500)).unwrap();
    source
        .set_pointer_with_cleanup("owned", payload(0x600), counting_cleanup(&calls, &released))
        .unwrap();

    source.copy_to(&destination).unwrap();

    assert_eq!(destination.get_string("title", ""), "copied");
    assert_eq!(destination.get_pointer("plain", ptr::null_mut()), payload(0x500));
    assert!(!destination.has("owned"));

    drop(destination);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    drop(source);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Property store: locking and enumeration
// =============================================================================

#[test]
fn test_lock_blocks_other_threads() {
    let props = Arc::new(Properties::create().unwrap());
    let guard = props.lock().unwrap();
    guard.properties().set_number("step", 1).unwrap();

    let worker = {
        let props = Arc::clone(&props);
        std::thread::spawn(move || {
            let _guard = props.lock().unwrap();
            props.get_number("step", 0)
        })
    };

    std::thread::sleep(std::time::Duration::from_millis(50));
    guard.properties().set_number("step", 2).unwrap();
    drop(guard);

    assert_eq!(worker.join().unwrap(), 2);
}

#[test]
fn test_enumerate_visits_every_name_in_order() {
    let props = Properties::create().unwrap();
    for name in ["delta", "alpha", "charlie", "bravo"] {
        props.set_boolean(name, true).unwrap();
    }

    let mut visited = Vec::new();
    props.enumerate(|name| visited.push(name.to_string())).unwrap();
    assert_eq!(visited, vec!["alpha", "bravo", "charlie", "delta"]);
}

#[test]
fn test_error_channel_is_thread_local() {
    set_error("main thread failure");

    let other = std::thread::spawn(|| {
        let before = last_error();
        set_error("worker failure");
        (before, last_error())
    })
    .join()
    .unwrap();

    assert_eq!(other, (None, Some("worker failure".to_string())));
    assert_eq!(last_error().as_deref(), Some("main thread failure"));
    clear_error();
}
