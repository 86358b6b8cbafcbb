//! Binding of a call shape to concrete callables.
//!
//! A call shape is a tuple of argument types `Args` together with a return
//! type `R`. The [`Invoke`] trait connects such a shape to a concrete callable
//! type, so that the vtable can forward a packed argument tuple to it.

/// Trait for callables that can be invoked with the argument tuple `Args`,
/// returning `R`.
///
/// # When to Implement
///
/// You typically don't need to implement this trait directly. It is
/// implemented for every type implementing [`FnMut`] with up to twelve
/// arguments, which covers functions, function pointers and closures.
///
/// Implement this trait for your own function objects when the callable is
/// not a closure, for instance a struct that carries configuration and wants
/// to expose a call operation.
///
/// # Examples
///
/// ```
/// use erasedfn_internals::invoke::Invoke;
///
/// #[derive(Clone)]
/// struct Scale {
///     factor: i32,
/// }
///
/// impl Invoke<(i32,), i32> for Scale {
///     fn invoke(&mut self, (value,): (i32,)) -> i32 {
///         value * self.factor
///     }
/// }
///
/// let mut scale = Scale { factor: 3 };
/// assert_eq!(scale.invoke((5,)), 15);
///
/// let mut add = |a: i32, b: i32| a + b;
/// assert_eq!(Invoke::<(i32, i32), i32>::invoke(&mut add, (2, 2)), 4);
/// ```
pub trait Invoke<Args, R> {
    /// Calls the callable with the unpacked argument tuple.
    fn invoke(&mut self, args: Args) -> R;
}

/// Implements [`Invoke`] for every [`FnMut`] taking the listed arguments.
macro_rules! impl_invoke {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> Invoke<($($arg,)*), R> for F
        where
            F: FnMut($($arg),*) -> R,
        {
            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&mut self, ($($arg,)*): ($($arg,)*)) -> R {
                self($($arg),*)
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A1);
impl_invoke!(A1, A2);
impl_invoke!(A1, A2, A3);
impl_invoke!(A1, A2, A3, A4);
impl_invoke!(A1, A2, A3, A4, A5);
impl_invoke!(A1, A2, A3, A4, A5, A6);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);
