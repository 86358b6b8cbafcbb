#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A cloneable, type-erased callable wrapper with small-buffer optimization.
//!
//! ## Overview
//!
//! [`Function<Args, R>`] holds any callable that can be invoked with the
//! argument tuple `Args` and returns `R`: plain functions, function pointers,
//! closures with or without captures, and your own function objects. The
//! concrete type of the callable is erased, so callables of different types
//! can be stored side by side in a `Vec<Function<Args, R>>` or passed across
//! an API without leaking a generic parameter.
//!
//! Unlike `Box<dyn FnMut(..) -> R>`, a [`Function`]:
//!
//! - is [`Clone`], deep-copying the callable it holds;
//! - stores small callables inline, without allocating;
//! - can be empty, and reports calling an empty wrapper as an
//!   [`EmptyInvocation`](error::EmptyInvocation) error.
//!
//! ## Quick Example
//!
//! ```
//! use erasedfn::prelude::*;
//!
//! fn four() -> i32 {
//!     4
//! }
//!
//! let mut a: Function<(), i32> = Function::new(four);
//! let mut b: Function<(), i32> = Function::new(|| 5);
//! a.swap(&mut b);
//!
//! assert_eq!(a.call(()), Ok(5));
//! assert_eq!(b.call(()), Ok(4));
//!
//! let mut empty = Function::<(), i32>::default();
//! assert!(empty.call(()).is_err());
//! ```
//!
//! ## Storage
//!
//! A callable is stored inline when the callable together with one pointer of
//! bookkeeping fits into [`INLINE_SIZE`] bytes aligned to [`INLINE_ALIGN`].
//! On 64-bit targets this admits callables of up to
//! [`MAX_INLINE_CALLABLE_SIZE`] = 24 bytes, enough for a closure capturing
//! three words. Everything else lives in a single heap allocation owned by
//! the wrapper. [`Function::placement`] reports which storage is in use.
//!
//! Moving, swapping and cloning a [`Function`] work the same way for both
//! placements. No two wrappers ever share a callable.
//!
//! ## Signatures
//!
//! The argument list is spelled as a tuple: `Function<(i32, i32), i32>` holds
//! callables of shape `fn(i32, i32) -> i32`, and `Function<(), ()>` holds
//! callables taking and returning nothing. Closures bound to a wrapper need
//! annotated parameter types, as in `|a: i32, b: i32| a + b`.
//!
//! Closures and functions of up to twelve arguments are supported out of the
//! box. Other callables can implement [`Invoke`](invoke::Invoke).
//!
//! ## Thread Safety
//!
//! The third type parameter of [`Function`] is a thread-safety marker from
//! [`markers`]. The default, [`SendSync`](markers::SendSync), only accepts
//! `Send + Sync` callables and makes the wrapper `Send + Sync`.
//! [`Local`](markers::Local) accepts every callable.
//!
//! ## Features
//!
//! - `tracing` (default): emits [`tracing`](https://docs.rs/tracing) events
//!   when a callable is bound, when an empty wrapper is called and when an
//!   allocation fails.

extern crate alloc;

pub mod error;
mod function;
pub mod markers;
pub mod prelude;

pub use erasedfn_internals::{
    invoke,
    placement::{INLINE_ALIGN, INLINE_SIZE, MAX_INLINE_CALLABLE_SIZE, Placement},
};

pub use self::function::Function;
