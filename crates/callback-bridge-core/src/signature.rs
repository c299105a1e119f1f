//! Call signatures used to partition registries.
//!
//! A registry is keyed by a plain function-pointer type such as
//! `fn(i32) -> i32`. The pointer type is never called; it only names the
//! argument list and result so that each signature gets its own table and its
//! own boxed closure type.

/// A callable shape that a registry can store and invoke.
pub trait Signature: 'static {
    /// Arguments as a tuple, `()` for no arguments.
    type Args;

    /// Value returned by the callback.
    type Output;

    /// Type-erased callback stored in the registry.
    type Callback: ?Sized + Send;

    /// Call `callback` with the unpacked `args`.
    fn call(callback: &mut Self::Callback, args: Self::Args) -> Self::Output;
}

/// Conversion of a concrete closure into the boxed callback of `S`.
pub trait IntoCallback<S: Signature> {
    fn into_callback(self) -> Box<S::Callback>;
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<R: 'static, $($arg: 'static),*> Signature for fn($($arg),*) -> R {
            type Args = ($($arg,)*);
            type Output = R;
            type Callback = dyn FnMut($($arg),*) -> R + Send;

            #[inline]
            #[allow(non_snake_case)]
            fn call(callback: &mut Self::Callback, ($($arg,)*): Self::Args) -> R {
                callback($($arg),*)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> IntoCallback<fn($($arg),*) -> R> for F
        where
            F: FnMut($($arg),*) -> R + Send + 'static,
        {
            #[inline]
            fn into_callback(self) -> Box<dyn FnMut($($arg),*) -> R + Send> {
                Box::new(self)
            }
        }
    };
}

impl_signature!();
impl_signature!(A0);
impl_signature!(A0, A1);
impl_signature!(A0, A1, A2);
impl_signature!(A0, A1, A2, A3);
impl_signature!(A0, A1, A2, A3, A4);
impl_signature!(A0, A1, A2, A3, A4, A5);
