//! This module encapsulates the fields of the [`FunctionData`]. Since this is
//! the only place they are visible, this means that the type of the
//! [`FunctionVtable`] is guaranteed to always be in sync with the type of the
//! actual callable. This follows from the fact that they are in sync when
//! created and that the API offers no way to change the [`FunctionVtable`] or
//! callable type after creation.

use core::ptr::NonNull;

use crate::{function::vtable::FunctionVtable, invoke::Invoke, util::Erased};

/// Type-erased callable payload with vtable-based dispatch.
///
/// This struct uses `#[repr(C)]` to enable safe field access in type-erased
/// contexts, allowing access to the vtable field even when the concrete
/// callable type `F` is unknown. The same layout is used for both inline and
/// heap storage.
#[repr(C)]
pub(crate) struct FunctionData<Args: 'static, R: 'static, F: 'static> {
    /// The Vtable of this callable
    vtable: &'static FunctionVtable<Args, R>,
    /// The actual callable
    callable: F,
}

impl<Args: 'static, R: 'static, F: 'static> FunctionData<Args, R, F> {
    /// Creates a new [`FunctionData`] for the callable.
    ///
    /// This method creates the vtable for type-erased dispatch and pairs it
    /// with the callable.
    #[inline]
    pub(crate) fn new(callable: F) -> Self
    where
        F: Invoke<Args, R> + Clone,
    {
        Self {
            vtable: FunctionVtable::new::<F>(),
            callable,
        }
    }

    /// Creates a second [`FunctionData`] with a clone of the callable and the
    /// same vtable.
    #[inline]
    pub(super) fn duplicate(&self) -> Self
    where
        F: Clone,
    {
        Self {
            vtable: self.vtable,
            callable: self.callable.clone(),
        }
    }

    /// Returns a reference to the callable.
    #[inline]
    pub(super) fn callable(&self) -> &F {
        &self.callable
    }

    /// Returns a mutable reference to the callable.
    #[inline]
    pub(super) fn callable_mut(&mut self) -> &mut F {
        &mut self.callable
    }
}

impl<Args: 'static, R: 'static> FunctionData<Args, R, Erased> {
    /// Returns the [`FunctionVtable`] of the payload pointed to by `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized `FunctionData<Args, R, F>` for some
    ///    `F`, either inside an inline arena or in a heap allocation.
    #[inline]
    pub(super) unsafe fn vtable(ptr: NonNull<Self>) -> &'static FunctionVtable<Args, R> {
        let ptr = ptr.as_ptr().cast_const();
        // SAFETY: We don't know the actual callable type, but we do know that
        // the pointer refers to an instance of `FunctionData<Args, R, F>` for some
        // specific `F` (guaranteed by the caller). Since `FunctionData` is
        // `#[repr(C)]`, that means that it's safe to create pointers to the
        // fields before the actual callable.
        //
        // We need to take care to avoid creating an actual reference to the
        // `FunctionData` itself though, as that would still be undefined behavior
        // since we don't have the right type.
        let vtable_ptr: *const &'static FunctionVtable<Args, R> =
            unsafe { &raw const (*ptr).vtable };

        // SAFETY: Dereferencing the pointer and getting out the `&'static
        // FunctionVtable` is valid for the same reasons
        unsafe { *vtable_ptr }
    }
}
