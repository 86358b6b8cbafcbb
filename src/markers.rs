//! Marker types and traits for the thread-safety semantics of a
//! [`Function`](crate::Function).
//!
//! The third type parameter of [`Function<Args, R, T>`](crate::Function) is a
//! thread-safety marker:
//!
//! - [`SendSync`] (the default): only callables that are `Send + Sync` can be
//!   stored, and the wrapper itself is `Send + Sync`.
//! - [`Local`]: any callable can be stored, including ones capturing `Rc` or
//!   `RefCell`, and the wrapper is neither `Send` nor `Sync`.
//!
//! The constraint is enforced when a callable is bound. It is impossible to
//! construct a `Function<_, _, SendSync>` around a callable that is not
//! `Send + Sync`.
//!
//! # Examples
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//!
//! use erasedfn::{Function, markers};
//!
//! let mut sendable: Function<(), i32> = Function::new(|| 4);
//! std::thread::spawn(move || assert_eq!(sendable.call(()), Ok(4)))
//!     .join()
//!     .unwrap();
//!
//! let counter = Rc::new(Cell::new(0));
//! let mut local: Function<(), i32, markers::Local> = Function::new(move || {
//!     counter.set(counter.get() + 1);
//!     counter.get()
//! });
//! assert_eq!(local.call(()), Ok(1));
//! ```

/// Marker type indicating that a [`Function`](crate::Function) and the
/// callable it holds are `Send + Sync`.
///
/// This is the default thread-safety marker. Closures that only capture
/// thread-safe values, plain functions and function pointers all qualify.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct SendSync;

/// Marker type indicating that a [`Function`](crate::Function) is not `Send`
/// or `Sync`.
///
/// Use `Local` when the callable captures `Rc<T>`, `Cell<T>`, `RefCell<T>`,
/// raw pointers or anything else that is `!Send` or `!Sync`.
///
/// A [`SendSync`] wrapper can always be converted into a `Local` one with
/// [`Function::into_local`](crate::Function::into_local).
///
/// ```compile_fail
/// use std::rc::Rc;
///
/// use erasedfn::Function;
///
/// // Rc is not Send + Sync, so it cannot live in the default wrapper
/// let shared = Rc::new(4);
/// let f: Function<(), i32> = Function::new(move || *shared);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Local;

/// Marker trait tying a callable type to a thread-safety marker.
///
/// # Implementations
///
/// - For `T = Local`: implemented for every `'static` type.
/// - For `T = SendSync`: implemented for every `'static` type that is also
///   `Send + Sync`.
///
/// Every constructor of [`Function<Args, R, T>`](crate::Function) requires
/// `F: CallableMarkerFor<T>`, which is what makes the `Send` and `Sync`
/// implementations of `Function<Args, R, SendSync>` sound.
pub trait CallableMarkerFor<T>: Sized + 'static {}

impl<F: Sized + 'static> CallableMarkerFor<Local> for F {}

impl<F: Sized + 'static> CallableMarkerFor<SendSync> for F where F: Send + Sync {}
