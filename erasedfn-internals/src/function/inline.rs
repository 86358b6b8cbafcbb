//! The inline arena that holds small payloads.

use core::{cell::UnsafeCell, mem::MaybeUninit, ptr::NonNull};

use crate::{
    function::data::FunctionData,
    placement::{INLINE_ALIGN, INLINE_SIZE},
    util::Erased,
};

/// Fixed-size, fixed-alignment raw memory for one inline payload.
///
/// The buffer itself knows nothing about its contents. It is only ever
/// interpreted through the [`RawFunction`] that owns it, which tracks whether
/// a payload is currently constructed inside it.
///
/// The bytes sit in an [`UnsafeCell`] because a payload reached through a
/// shared reference may still have interior mutability of its own.
///
/// [`RawFunction`]: crate::RawFunction
#[repr(C, align(32))]
pub(crate) struct InlineBuffer {
    /// The raw bytes of the arena
    bytes: UnsafeCell<[MaybeUninit<u8>; INLINE_SIZE]>,
}

const _: () = {
    assert!(core::mem::size_of::<InlineBuffer>() == INLINE_SIZE);
    assert!(core::mem::align_of::<InlineBuffer>() == INLINE_ALIGN);
};

impl InlineBuffer {
    /// Creates a buffer without any payload in it.
    #[inline]
    pub(crate) const fn uninit() -> Self {
        Self {
            bytes: UnsafeCell::new([MaybeUninit::uninit(); INLINE_SIZE]),
        }
    }

    /// Returns a pointer to the payload slot, valid for reads and for writes
    /// through interior mutability.
    #[inline]
    pub(crate) fn payload<Args: 'static, R: 'static>(
        &self,
    ) -> NonNull<FunctionData<Args, R, Erased>> {
        NonNull::from(&self.bytes).cast()
    }

    /// Returns a pointer to the payload slot, valid for reads and writes.
    #[inline]
    pub(crate) fn payload_mut<Args: 'static, R: 'static>(
        &mut self,
    ) -> NonNull<FunctionData<Args, R, Erased>> {
        NonNull::from(&mut self.bytes).cast()
    }
}
