//! Compile-time classification of callables into inline or heap storage.
//!
//! A callable is stored inline when the `#[repr(C)]` pair of its vtable
//! reference and the callable itself fits the inline arena in both size and
//! alignment. Everything else is heap allocated.
//!
//! # Relocation
//!
//! Inline payloads move whenever the wrapper that owns them moves. This is
//! sound for every Rust type: a move is a bitwise copy that cannot fail, after
//! which the old location is never used again. Callables that must keep a
//! stable address anyway (because unsafe code inside them has handed out
//! pointers into the callable) have to be placed on the heap explicitly with
//! [`RawFunction::new_heap`](crate::RawFunction::new_heap).

use core::mem::{align_of, size_of};

use crate::function::data::FunctionData;

/// Size in bytes of the inline arena.
pub const INLINE_SIZE: usize = 32;

/// Alignment in bytes of the inline arena.
pub const INLINE_ALIGN: usize = 32;

/// The largest callable, in bytes, that can still be stored inline on the
/// current target.
///
/// The vtable reference stored in front of every callable is part of the
/// inline footprint, so this is [`INLINE_SIZE`] minus one pointer.
pub const MAX_INLINE_CALLABLE_SIZE: usize = INLINE_SIZE - size_of::<&'static ()>();

/// Where a callable is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// The callable lives in the inline arena of its wrapper.
    Inline,
    /// The callable lives in a separate heap allocation owned by its wrapper.
    Heap,
}

impl Placement {
    /// Classifies the callable type `F` for the signature `(Args, R)`.
    ///
    /// This is a pure function of the type and is meant to be evaluated in a
    /// `const` context.
    ///
    /// # Examples
    ///
    /// ```
    /// use erasedfn_internals::placement::{MAX_INLINE_CALLABLE_SIZE, Placement};
    ///
    /// type Fits = [u8; MAX_INLINE_CALLABLE_SIZE];
    /// type TooBig = [u8; MAX_INLINE_CALLABLE_SIZE + 1];
    ///
    /// assert_eq!(Placement::of::<(), (), Fits>(), Placement::Inline);
    /// assert_eq!(Placement::of::<(), (), TooBig>(), Placement::Heap);
    /// ```
    #[must_use]
    pub const fn of<Args: 'static, R: 'static, F: 'static>() -> Self {
        let size = size_of::<FunctionData<Args, R, F>>();
        let align = align_of::<FunctionData<Args, R, F>>();
        if size <= INLINE_SIZE && align <= INLINE_ALIGN {
            Placement::Inline
        } else {
            Placement::Heap
        }
    }

    /// Returns `true` for [`Placement::Inline`].
    #[inline]
    #[must_use]
    pub const fn is_inline(self) -> bool {
        matches!(self, Placement::Inline)
    }

    /// Returns `true` for [`Placement::Heap`].
    #[inline]
    #[must_use]
    pub const fn is_heap(self) -> bool {
        matches!(self, Placement::Heap)
    }
}
