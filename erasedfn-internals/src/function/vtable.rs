//! Vtable for type-erased callable operations.
//!
//! This module contains the [`FunctionVtable`] which enables invoking, cloning,
//! relocating and destroying a payload when its concrete callable type `F`
//! has been erased. The vtable stores function pointers that dispatch to the
//! correct typed implementations.
//!
//! This module encapsulates the fields of [`FunctionVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameters must match the actual callable
//! type stored in the [`FunctionData`]**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`FunctionVtable::new`], which pairs the function pointers
//! with a specific type `F` at compile time.
//!
//! None of the operations below know or care whether the payload lives in an
//! inline arena or in a heap allocation. Allocation and deallocation are the
//! business of [`RawFunction`](crate::RawFunction); the vtable only reports the
//! [`Layout`] to use.

use core::{alloc::Layout, any::TypeId, ptr::NonNull};

use crate::{function::data::FunctionData, invoke::Invoke, util::Erased};

/// Vtable for type-erased callable operations.
///
/// Contains function pointers for performing operations on payloads without
/// knowing their concrete callable type at compile time.
///
/// # Safety Invariant
///
/// The fields `layout`, `invoke`, `clone_into`, `relocate_into` and
/// `drop_in_place` are guaranteed to describe or point to the functions
/// defined below instantiated with the callable type `F` that was used to
/// create this [`FunctionVtable`].
pub(crate) struct FunctionVtable<Args: 'static, R: 'static> {
    /// Gets the [`TypeId`] of the callable type that was used to create this
    /// [`FunctionVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the callable type that was used to
    /// create this [`FunctionVtable`].
    type_name: fn() -> &'static str,
    /// The layout of the whole `FunctionData<Args, R, F>`.
    layout: Layout,
    /// Calls the callable with an argument tuple.
    invoke: unsafe fn(NonNull<FunctionData<Args, R, Erased>>, Args) -> R,
    /// Clones the payload into uninitialized memory.
    clone_into: unsafe fn(
        NonNull<FunctionData<Args, R, Erased>>,
        NonNull<FunctionData<Args, R, Erased>>,
    ),
    /// Moves the payload into uninitialized memory.
    relocate_into:
        unsafe fn(NonNull<FunctionData<Args, R, Erased>>, NonNull<FunctionData<Args, R, Erased>>),
    /// Runs the destructor of the payload in place.
    drop_in_place: unsafe fn(NonNull<FunctionData<Args, R, Erased>>),
}

impl<Args: 'static, R: 'static> FunctionVtable<Args, R> {
    /// Creates a new [`FunctionVtable`] for the callable type `F`.
    pub(super) const fn new<F>() -> &'static Self
    where
        F: Invoke<Args, R> + Clone + 'static,
    {
        const {
            &Self {
                type_id: TypeId::of::<F>,
                type_name: core::any::type_name::<F>,
                layout: Layout::new::<FunctionData<Args, R, F>>(),
                invoke: invoke::<Args, R, F>,
                clone_into: clone_into::<Args, R, F>,
                relocate_into: relocate_into::<Args, R, F>,
                drop_in_place: drop_in_place::<Args, R, F>,
            }
        }
    }

    /// Gets the [`TypeId`] of the callable type that was used to create this
    /// [`FunctionVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the callable type that was used to
    /// create this [`FunctionVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Gets the [`Layout`] of the `FunctionData<Args, R, F>` described by this
    /// [`FunctionVtable`]. Its size is never zero.
    #[inline]
    pub(super) fn layout(&self) -> Layout {
        self.layout
    }

    /// Calls the callable with the given arguments.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized payload whose callable type matches
    ///    this [`FunctionVtable`].
    /// 2. `ptr` is valid for exclusive access for the duration of the call.
    #[inline]
    pub(super) unsafe fn invoke(
        &self,
        ptr: NonNull<FunctionData<Args, R, Erased>>,
        args: Args,
    ) -> R {
        // SAFETY: We know that `self.invoke` points to the function
        // `invoke::<Args, R, F>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.invoke)(ptr, args) }
    }

    /// Clones the payload at `source` into `destination`.
    ///
    /// If cloning the callable panics, `destination` is left uninitialized and
    /// `source` is untouched.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `source` points to an initialized payload whose callable type
    ///    matches this [`FunctionVtable`], valid for shared access.
    /// 2. `destination` is valid for writes of [`Self::layout`], properly
    ///    aligned for it, and does not currently hold a live payload.
    #[inline]
    pub(super) unsafe fn clone_into(
        &self,
        source: NonNull<FunctionData<Args, R, Erased>>,
        destination: NonNull<FunctionData<Args, R, Erased>>,
    ) {
        // SAFETY: We know that `self.clone_into` points to the function
        // `clone_into::<Args, R, F>` below. That function's safety requirements
        // are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.clone_into)(source, destination) }
    }

    /// Moves the payload at `source` into `destination`.
    ///
    /// This never panics. Afterwards `destination` holds the payload and
    /// `source` must be treated as uninitialized memory.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `source` points to an initialized payload whose callable type
    ///    matches this [`FunctionVtable`], valid for exclusive access.
    /// 2. `destination` is valid for writes of [`Self::layout`], properly
    ///    aligned for it, does not overlap `source`, and does not currently
    ///    hold a live payload.
    /// 3. Nothing uses or drops the payload at `source` afterwards.
    #[inline]
    pub(super) unsafe fn relocate_into(
        &self,
        source: NonNull<FunctionData<Args, R, Erased>>,
        destination: NonNull<FunctionData<Args, R, Erased>>,
    ) {
        // SAFETY: We know that `self.relocate_into` points to the function
        // `relocate_into::<Args, R, F>` below. That function's safety
        // requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe { (self.relocate_into)(source, destination) }
    }

    /// Runs the destructor of the payload at `ptr` without releasing its
    /// memory.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized payload whose callable type matches
    ///    this [`FunctionVtable`], valid for exclusive access.
    /// 2. The payload is not used or dropped again afterwards, even if the
    ///    destructor panics.
    #[inline]
    pub(super) unsafe fn drop_in_place(&self, ptr: NonNull<FunctionData<Args, R, Erased>>) {
        // SAFETY: We know that `self.drop_in_place` points to the function
        // `drop_in_place::<Args, R, F>` below. That function's safety
        // requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.drop_in_place)(ptr) }
    }
}

/// Calls the callable stored in the payload.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `FunctionData<Args, R, F>`.
/// 2. `ptr` is valid for exclusive access for the duration of the call.
unsafe fn invoke<Args: 'static, R: 'static, F: Invoke<Args, R> + 'static>(
    ptr: NonNull<FunctionData<Args, R, Erased>>,
    args: Args,
) -> R {
    let mut ptr: NonNull<FunctionData<Args, R, F>> = ptr.cast();
    // SAFETY: The pointer has the correct type and is initialized (1), and we
    // have exclusive access to it (2).
    let data: &mut FunctionData<Args, R, F> = unsafe { ptr.as_mut() };
    data.callable_mut().invoke(args)
}

/// Clones the payload at `source` into `destination`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `source` points to an initialized `FunctionData<Args, R, F>`, valid for
///    shared access.
/// 2. `destination` is valid for writes of a `FunctionData<Args, R, F>` and
///    properly aligned for it.
unsafe fn clone_into<Args: 'static, R: 'static, F: Clone + 'static>(
    source: NonNull<FunctionData<Args, R, Erased>>,
    destination: NonNull<FunctionData<Args, R, Erased>>,
) {
    let source: NonNull<FunctionData<Args, R, F>> = source.cast();
    let destination: NonNull<FunctionData<Args, R, F>> = destination.cast();
    // SAFETY: The pointer has the correct type and is initialized (1).
    let source: &FunctionData<Args, R, F> = unsafe { source.as_ref() };
    let cloned = source.duplicate();
    // SAFETY: The destination is writable and aligned for this type (2).
    unsafe { destination.write(cloned) };
}

/// Moves the payload at `source` into `destination`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `source` points to an initialized `FunctionData<Args, R, F>`, and the
///    value there is treated as moved-out afterwards.
/// 2. `destination` is valid for writes of a `FunctionData<Args, R, F>`,
///    properly aligned for it and does not overlap `source`.
unsafe fn relocate_into<Args: 'static, R: 'static, F: 'static>(
    source: NonNull<FunctionData<Args, R, Erased>>,
    destination: NonNull<FunctionData<Args, R, Erased>>,
) {
    let source: NonNull<FunctionData<Args, R, F>> = source.cast();
    let destination: NonNull<FunctionData<Args, R, F>> = destination.cast();
    // SAFETY: The pointer has the correct type and is initialized (1).
    let value: FunctionData<Args, R, F> = unsafe { source.read() };
    // SAFETY: The destination is writable, aligned and disjoint (2).
    unsafe { destination.write(value) };
}

/// Runs the destructor of the payload at `ptr`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `FunctionData<Args, R, F>`, valid for
///    exclusive access, which is never used again afterwards.
unsafe fn drop_in_place<Args: 'static, R: 'static, F: 'static>(
    ptr: NonNull<FunctionData<Args, R, Erased>>,
) {
    let ptr: NonNull<FunctionData<Args, R, F>> = ptr.cast();
    // SAFETY: The pointer has the correct type, is initialized and is never
    // used again (1).
    unsafe { ptr.drop_in_place() };
}
