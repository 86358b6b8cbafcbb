//! Type-erased callable storage.
//!
//! This module encapsulates the `storage` field of [`RawFunction`], ensuring
//! it is only visible within this module. This visibility restriction
//! guarantees the safety invariant: **the storage tag always matches where a
//! live payload is constructed**.
//!
//! # Safety Invariant
//!
//! A [`RawFunction`] is in exactly one of three states:
//!
//! - `Empty`: no payload exists.
//! - `Inline`: the inline arena holds an initialized `FunctionData<Args, R, F>`
//!   for some `F` that [`Placement::of`] classified as inline, or that is
//!   otherwise known to fit the arena.
//! - `Heap`: the pointer was allocated with the global allocator using the
//!   [`Layout`] reported by the payload's vtable, and points to an initialized
//!   `FunctionData<Args, R, F>` for some `F`. The allocation is owned by this
//!   [`RawFunction`] alone.
//!
//! Every transition between these states happens inside this module and goes
//! through the payload's [`FunctionVtable`]. Payloads are never moved between
//! two live [`RawFunction`]s by copying the arena wholesale; they are moved
//! with the vtable's `relocate_into`, which moves exactly one value of the
//! concrete callable type.

use core::{alloc::Layout, any::TypeId, ptr::NonNull};

use crate::{
    function::{data::FunctionData, inline::InlineBuffer, vtable::FunctionVtable},
    invoke::Invoke,
    placement::Placement,
    util::Erased,
};

/// Where the payload of a [`RawFunction`] currently lives.
enum Storage<Args: 'static, R: 'static> {
    /// No payload.
    Empty,
    /// The payload is constructed inside the arena.
    Inline(InlineBuffer),
    /// The payload is constructed inside an owned heap allocation.
    Heap(NonNull<FunctionData<Args, R, Erased>>),
}

/// Owned, type-erased storage for a callable with the call shape `Args -> R`.
///
/// Small callables are stored inline, larger ones in a heap allocation, as
/// decided by [`Placement::of`]. The concrete callable type is only known at
/// construction; every later operation dispatches through the vtable stored
/// alongside the callable.
///
/// Cloning a [`RawFunction`] deep-copies the callable. No two
/// [`RawFunction`]s ever share a payload.
pub struct RawFunction<Args: 'static, R: 'static> {
    /// The current payload location
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `Storage::Inline` holds an initialized `FunctionData<Args, R, F>`
    ///    for some `F` at the start of the arena.
    /// 2. `Storage::Heap` holds a pointer obtained from the global allocator
    ///    with the layout of its vtable, pointing to an initialized
    ///    `FunctionData<Args, R, F>` for some `F`, that no other value owns.
    /// 3. The payload may only be uninitialized during the execution of a
    ///    method of this type, and never while a panic can escape it.
    storage: Storage<Args, R>,
}

impl<Args: 'static, R: 'static> RawFunction<Args, R> {
    /// Creates a [`RawFunction`] that holds no callable.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            storage: Storage::Empty,
        }
    }

    /// Creates a new [`RawFunction`] holding the callable.
    ///
    /// The callable is stored inline when [`Placement::of`] allows it, and on
    /// the heap otherwise. Allocation failure is reported through
    /// [`alloc::alloc::handle_alloc_error`].
    #[inline]
    #[must_use]
    pub fn new<F>(callable: F) -> Self
    where
        F: Invoke<Args, R> + Clone + 'static,
    {
        match const { Placement::of::<Args, R, F>() } {
            Placement::Inline => Self::new_inline(callable),
            Placement::Heap => Self::new_heap(callable),
        }
    }

    /// Creates a new [`RawFunction`] holding the callable, returning the
    /// layout that could not be allocated on allocation failure.
    ///
    /// Callables that are stored inline never fail.
    #[inline]
    pub fn try_new<F>(callable: F) -> Result<Self, Layout>
    where
        F: Invoke<Args, R> + Clone + 'static,
    {
        match const { Placement::of::<Args, R, F>() } {
            Placement::Inline => Ok(Self::new_inline(callable)),
            Placement::Heap => Self::try_new_heap(callable),
        }
    }

    /// Creates a new [`RawFunction`] holding the callable in a heap
    /// allocation, regardless of its size.
    ///
    /// This is the placement to use for callables that need a stable address
    /// for their whole lifetime.
    #[inline]
    #[must_use]
    pub fn new_heap<F>(callable: F) -> Self
    where
        F: Invoke<Args, R> + Clone + 'static,
    {
        match Self::try_new_heap(callable) {
            Ok(this) => this,
            Err(layout) => alloc::alloc::handle_alloc_error(layout),
        }
    }

    /// Fallible version of [`RawFunction::new_heap`].
    pub fn try_new_heap<F>(callable: F) -> Result<Self, Layout>
    where
        F: Invoke<Args, R> + Clone + 'static,
    {
        let data = FunctionData::<Args, R, F>::new(callable);
        let ptr = allocate::<Args, R>(Layout::new::<FunctionData<Args, R, F>>())?;

        // SAFETY: The allocation was made with the layout of
        // `FunctionData<Args, R, F>`, so it is valid for writes and properly
        // aligned for it.
        unsafe { ptr.cast::<FunctionData<Args, R, F>>().write(data) };

        Ok(Self {
            // SAFETY:
            // 2. We just allocated the pointer with the layout that the vtable
            //    of `data` reports, and initialized it. Nobody else has it.
            storage: Storage::Heap(ptr),
        })
    }

    /// Constructs the callable inside a fresh arena.
    ///
    /// Only called when [`Placement::of`] reported [`Placement::Inline`].
    #[inline]
    fn new_inline<F>(callable: F) -> Self
    where
        F: Invoke<Args, R> + Clone + 'static,
    {
        debug_assert!(Placement::of::<Args, R, F>().is_inline());

        let mut buffer = InlineBuffer::uninit();
        let ptr = buffer.payload_mut::<Args, R>().cast::<FunctionData<Args, R, F>>();

        // SAFETY: The classifier guarantees that `FunctionData<Args, R, F>` is
        // no larger and no more aligned than the arena.
        unsafe { ptr.write(FunctionData::new(callable)) };

        Self {
            // SAFETY:
            // 1. We just initialized the payload at the start of the arena.
            storage: Storage::Inline(buffer),
        }
    }

    /// Returns `true` if no callable is held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.storage, Storage::Empty)
    }

    /// Returns where the callable is stored, or `None` if no callable is held.
    #[inline]
    #[must_use]
    pub fn placement(&self) -> Option<Placement> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Inline(_) => Some(Placement::Inline),
            Storage::Heap(_) => Some(Placement::Heap),
        }
    }

    /// Returns a pointer to the payload, valid for shared access.
    #[inline]
    fn payload(&self) -> Option<NonNull<FunctionData<Args, R, Erased>>> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Inline(buffer) => Some(buffer.payload()),
            Storage::Heap(ptr) => Some(*ptr),
        }
    }

    /// Returns a pointer to the payload, valid for exclusive access.
    #[inline]
    fn payload_mut(&mut self) -> Option<NonNull<FunctionData<Args, R, Erased>>> {
        match &mut self.storage {
            Storage::Empty => None,
            Storage::Inline(buffer) => Some(buffer.payload_mut()),
            Storage::Heap(ptr) => Some(*ptr),
        }
    }

    /// Returns the vtable of the payload, or `None` if no callable is held.
    #[inline]
    fn vtable(&self) -> Option<&'static FunctionVtable<Args, R>> {
        let ptr = self.payload()?;
        // SAFETY:
        // 1. The invariants of `storage` guarantee that the payload is initialized.
        Some(unsafe { FunctionData::vtable(ptr) })
    }

    /// Returns the [`TypeId`] of the held callable.
    #[inline]
    #[must_use]
    pub fn callable_type_id(&self) -> Option<TypeId> {
        self.vtable().map(FunctionVtable::type_id)
    }

    /// Returns the [`core::any::type_name`] of the held callable.
    #[inline]
    #[must_use]
    pub fn callable_type_name(&self) -> Option<&'static str> {
        self.vtable().map(FunctionVtable::type_name)
    }

    /// Returns a reference to the held callable if it has type `F`.
    #[must_use]
    pub fn downcast_ref<F: 'static>(&self) -> Option<&F> {
        let ptr = self.payload()?;
        // SAFETY:
        // 1. The invariants of `storage` guarantee that the payload is initialized.
        let vtable = unsafe { FunctionData::vtable(ptr) };
        if vtable.type_id() != TypeId::of::<F>() {
            return None;
        }

        let ptr = ptr.cast::<FunctionData<Args, R, F>>();
        // SAFETY: We just checked that the payload holds an `F`, it is
        // initialized, and the returned reference borrows `self` immutably.
        let data: &FunctionData<Args, R, F> = unsafe { ptr.as_ref() };
        Some(data.callable())
    }

    /// Returns a mutable reference to the held callable if it has type `F`.
    #[must_use]
    pub fn downcast_mut<F: 'static>(&mut self) -> Option<&mut F> {
        let ptr = self.payload_mut()?;
        // SAFETY:
        // 1. The invariants of `storage` guarantee that the payload is initialized.
        let vtable = unsafe { FunctionData::vtable(ptr) };
        if vtable.type_id() != TypeId::of::<F>() {
            return None;
        }

        let mut ptr = ptr.cast::<FunctionData<Args, R, F>>();
        // SAFETY: We just checked that the payload holds an `F`, it is
        // initialized, and the returned reference borrows `self` mutably.
        let data: &mut FunctionData<Args, R, F> = unsafe { ptr.as_mut() };
        Some(data.callable_mut())
    }

    /// Invokes the held callable, or returns `None` without touching `args`'
    /// contents if no callable is held.
    ///
    /// Panics raised by the callable propagate unchanged. The callable stays
    /// in place afterwards.
    #[inline]
    pub fn invoke(&mut self, args: Args) -> Option<R> {
        let ptr = self.payload_mut()?;
        // SAFETY:
        // 1. The invariants of `storage` guarantee that the payload is initialized.
        let vtable = unsafe { FunctionData::vtable(ptr) };

        // SAFETY:
        // 1. The vtable was read from the payload itself, so it matches.
        // 2. We hold `&mut self`, so access to the payload is exclusive.
        Some(unsafe { vtable.invoke(ptr, args) })
    }

    /// Deep-copies the held callable into a new [`RawFunction`] with the same
    /// placement, returning the layout that could not be allocated on
    /// allocation failure.
    ///
    /// If cloning the callable panics, nothing is leaked and `self` is
    /// unchanged.
    pub fn try_clone(&self) -> Result<Self, Layout> {
        match &self.storage {
            Storage::Empty => Ok(Self::empty()),
            Storage::Inline(buffer) => {
                let source = buffer.payload::<Args, R>();
                // SAFETY:
                // 1. The payload in the arena is initialized.
                let vtable = unsafe { FunctionData::vtable(source) };

                let mut target = InlineBuffer::uninit();
                // SAFETY:
                // 1. The source payload is initialized and matches its own vtable.
                // 2. The target is a fresh arena of the same size and alignment as
                //    the one the source payload already lives in.
                unsafe { vtable.clone_into(source, target.payload_mut()) };

                Ok(Self {
                    // SAFETY:
                    // 1. `clone_into` returned normally, so the arena is initialized.
                    storage: Storage::Inline(target),
                })
            }
            Storage::Heap(source) => {
                let source = *source;
                // SAFETY:
                // 1. The heap payload is initialized.
                let vtable = unsafe { FunctionData::vtable(source) };
                let layout = vtable.layout();
                let target = allocate::<Args, R>(layout)?;
                let guard = DeallocGuard {
                    ptr: target.cast(),
                    layout,
                };

                // SAFETY:
                // 1. The source payload is initialized and matches its own vtable.
                // 2. The target was just allocated with the layout of the vtable.
                unsafe { vtable.clone_into(source, target) };
                core::mem::forget(guard);

                Ok(Self {
                    // SAFETY:
                    // 2. Allocated with the vtable's layout, initialized by
                    //    `clone_into`, and owned by nobody else.
                    storage: Storage::Heap(target),
                })
            }
        }
    }

    /// Moves the payload of `source` into `self`, leaving `source` empty.
    ///
    /// `self` must be empty. Never panics.
    fn relocate_from(&mut self, source: &mut Self) {
        debug_assert!(self.is_empty());

        match &mut source.storage {
            Storage::Empty => {}
            Storage::Heap(ptr) => {
                // SAFETY:
                // 2. Ownership of the allocation moves to `self`; `source` is
                //    emptied below.
                self.storage = Storage::Heap(*ptr);
            }
            Storage::Inline(buffer) => {
                let from = buffer.payload_mut::<Args, R>();
                // SAFETY:
                // 1. The payload in the arena is initialized.
                let vtable = unsafe { FunctionData::vtable(from) };

                self.storage = Storage::Inline(InlineBuffer::uninit());
                if let Storage::Inline(target) = &mut self.storage {
                    // SAFETY:
                    // 1. The source payload is initialized, matches its vtable and
                    //    is exclusively borrowed.
                    // 2. The target is a different arena of the same shape.
                    // 3. `source` is emptied below and never reads the old payload.
                    unsafe { vtable.relocate_into(from, target.payload_mut()) };
                }
            }
        }

        source.storage = Storage::Empty;
    }

    /// Moves the callable out into a new [`RawFunction`], leaving `self`
    /// empty.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        let mut taken = Self::empty();
        taken.relocate_from(self);
        taken
    }

    /// Exchanges the callables of `self` and `other`.
    ///
    /// Two heap payloads swap their owning pointers. In every other
    /// combination the payloads are relocated through a temporary arena, so
    /// an inline payload always lands in an arena and a heap pointer always
    /// stays a heap pointer. Never panics.
    pub fn swap(&mut self, other: &mut Self) {
        if let (Storage::Heap(ours), Storage::Heap(theirs)) =
            (&mut self.storage, &mut other.storage)
        {
            core::mem::swap(ours, theirs);
            return;
        }

        let mut temporary = Self::empty();
        temporary.relocate_from(self);
        self.relocate_from(other);
        other.relocate_from(&mut temporary);
    }

    /// Destroys the held callable, leaving `self` empty.
    ///
    /// `self` is already empty when the callable's destructor runs, so a
    /// panicking destructor cannot cause a second drop.
    pub fn clear(&mut self) {
        match core::mem::replace(&mut self.storage, Storage::Empty) {
            Storage::Empty => {}
            Storage::Inline(mut buffer) => {
                let ptr = buffer.payload_mut::<Args, R>();
                // SAFETY:
                // 1. The payload in the arena is initialized.
                let vtable = unsafe { FunctionData::vtable(ptr) };
                // SAFETY:
                // 1. The payload is initialized and matches its vtable.
                // 2. The arena is a local that is discarded afterwards.
                unsafe { vtable.drop_in_place(ptr) };
            }
            Storage::Heap(ptr) => {
                // SAFETY:
                // 1. The heap payload is initialized.
                let vtable = unsafe { FunctionData::vtable(ptr) };
                let _guard = DeallocGuard {
                    ptr: ptr.cast(),
                    layout: vtable.layout(),
                };
                // SAFETY:
                // 1. The payload is initialized and matches its vtable.
                // 2. `self` no longer refers to the allocation, which the guard
                //    releases when this scope ends.
                unsafe { vtable.drop_in_place(ptr) };
            }
        }
    }
}

impl<Args: 'static, R: 'static> Default for RawFunction<Args, R> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args: 'static, R: 'static> Clone for RawFunction<Args, R> {
    #[inline]
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(cloned) => cloned,
            Err(layout) => alloc::alloc::handle_alloc_error(layout),
        }
    }

    /// Replaces the callable with a copy of `source`'s.
    ///
    /// The copy is completed before the old callable is destroyed, so if
    /// cloning panics `self` is left as it was.
    fn clone_from(&mut self, source: &Self) {
        let mut cloned = source.clone();
        self.swap(&mut cloned);
    }
}

impl<Args: 'static, R: 'static> core::ops::Drop for RawFunction<Args, R> {
    #[inline]
    fn drop(&mut self) {
        self.clear();
    }
}

/// Allocates memory for a payload with the given layout.
#[inline]
fn allocate<Args: 'static, R: 'static>(
    layout: Layout,
) -> Result<NonNull<FunctionData<Args, R, Erased>>, Layout> {
    debug_assert_ne!(layout.size(), 0);
    // SAFETY: Every payload starts with a vtable reference, so the layout is
    // never zero-sized.
    let ptr = unsafe { alloc::alloc::alloc(layout) };
    NonNull::new(ptr).map(NonNull::cast).ok_or(layout)
}

/// Releases a payload allocation when dropped.
///
/// Used to free the memory when cloning into it or dropping the payload inside
/// it panics.
struct DeallocGuard {
    /// Start of the allocation
    ptr: NonNull<u8>,
    /// Layout the allocation was made with
    layout: Layout,
}

impl Drop for DeallocGuard {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: The guard is only created for memory obtained from
        // `allocate` with this exact layout, and the memory holds no live
        // payload whenever the guard is dropped.
        unsafe { alloc::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
