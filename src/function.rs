//! The [`Function`] callable wrapper.

use core::{any::TypeId, fmt};

use erasedfn_internals::{RawFunction, invoke::Invoke, placement::Placement};

use crate::{
    error::{ConstructionFailure, EmptyInvocation, Signature},
    markers::{CallableMarkerFor, Local, SendSync},
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use erasedfn_internals::RawFunction;

    use crate::markers::SendSync;

    /// A type-erased, cloneable callable with the call shape `Args -> R`.
    ///
    /// `Args` is the tuple of parameter types and `R` the return type, so
    /// `Function<(i32, i32), i32>` holds anything that can be called as
    /// `fn(i32, i32) -> i32`: functions, function pointers, closures and
    /// structs implementing [`Invoke`](crate::invoke::Invoke).
    ///
    /// Callables of up to 32 bytes (including one pointer of bookkeeping) are
    /// stored inline, larger or more strictly aligned ones in a heap
    /// allocation. See [`Placement`](crate::Placement).
    ///
    /// # Type Parameters
    /// - `Args`: The argument tuple of the call shape.
    /// - `R`: The return type of the call shape.
    /// - `ThreadSafety`: The thread safety marker for the wrapper. This can
    ///   either be [`SendSync`] or [`Local`](crate::markers::Local).
    ///
    /// # Examples
    ///
    /// ```
    /// use erasedfn::Function;
    ///
    /// fn four() -> i32 {
    ///     4
    /// }
    ///
    /// let mut f: Function<(), i32> = Function::new(four);
    /// let mut copy = f.clone();
    /// assert_eq!(f.call(()), Ok(4));
    /// assert_eq!(copy.call(()), Ok(4));
    ///
    /// let mut moved = f.take();
    /// assert!(f.is_empty());
    /// assert_eq!(moved.call(()), Ok(4));
    /// ```
    #[repr(transparent)]
    pub struct Function<Args: 'static, R: 'static, ThreadSafety: 'static = SendSync> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. If `ThreadSafety = SendSync`: The callable embedded in the
        ///    [`RawFunction`], if any, must be `Send + Sync`.
        raw: RawFunction<Args, R>,
        _thread_safety: PhantomData<ThreadSafety>,
    }

    impl<Args: 'static, R: 'static, T> Function<Args, R, T> {
        /// Creates a new [`Function`] from a [`RawFunction`]
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. If `T = SendSync`: The callable embedded in the [`RawFunction`],
        ///    if any, must be `Send + Sync`.
        #[must_use]
        pub(crate) const unsafe fn from_raw(raw: RawFunction<Args, R>) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by caller
            Function {
                raw,
                _thread_safety: PhantomData,
            }
        }

        /// Consumes the [`Function`] and returns the inner [`RawFunction`].
        #[must_use]
        pub(crate) fn into_raw(self) -> RawFunction<Args, R> {
            // SAFETY: We are destroying `self`, so we no longer
            // need to uphold any safety invariants.
            self.raw
        }

        /// Returns a reference to the inner [`RawFunction`].
        #[must_use]
        pub(crate) fn as_raw(&self) -> &RawFunction<Args, R> {
            // SAFETY: No mutation is possible through a shared reference to
            // the `RawFunction`, so the invariants cannot be broken.
            &self.raw
        }

        /// Returns a mutable reference to the inner [`RawFunction`].
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. If `T = SendSync`: no callable that is not `Send + Sync` is
        ///    moved into the [`RawFunction`] through the returned reference.
        #[must_use]
        pub(crate) unsafe fn as_raw_mut(&mut self) -> &mut RawFunction<Args, R> {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by caller
            &mut self.raw
        }
    }
}
pub use limit_field_access::Function;

impl<Args: 'static, R: 'static, T> Function<Args, R, T> {
    /// Creates a [`Function`] that holds no callable.
    ///
    /// Calling it fails with [`EmptyInvocation`].
    ///
    /// # Examples
    /// ```
    /// use erasedfn::Function;
    ///
    /// let mut f = Function::<(), ()>::empty();
    /// assert!(f.is_empty());
    /// assert!(f.call(()).is_err());
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        let raw = RawFunction::empty();

        // SAFETY:
        // 1. There is no callable, so this is trivially true.
        unsafe { Function::from_raw(raw) }
    }

    /// Creates a [`Function`] holding the callable.
    ///
    /// The callable is stored inline when it fits, and in a heap allocation
    /// otherwise. Allocation failure aborts through
    /// [`handle_alloc_error`](alloc::alloc::handle_alloc_error), like
    /// [`Box::new`](alloc::boxed::Box::new); use [`Function::try_new`] to
    /// handle it instead.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::Function;
    ///
    /// let offset = 10;
    /// let mut f: Function<(i32,), i32> = Function::new(move |x: i32| x + offset);
    /// assert_eq!(f.call((5,)), Ok(15));
    /// ```
    #[must_use]
    pub fn new<F>(callable: F) -> Self
    where
        F: Invoke<Args, R> + Clone + CallableMarkerFor<T>,
    {
        let raw = RawFunction::new(callable);
        trace_bound::<Args, R>(&raw);

        // SAFETY:
        // 1. If `T = SendSync`, the bound `F: CallableMarkerFor<SendSync>`
        //    guarantees that the callable is `Send + Sync`.
        unsafe {
            // @add-unsafe-context: markers::CallableMarkerFor
            Function::from_raw(raw)
        }
    }

    /// Creates a [`Function`] holding the callable, reporting allocation
    /// failure as a [`ConstructionFailure`] instead of aborting.
    ///
    /// Callables that are stored inline never fail.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::Function;
    ///
    /// let table = [7u64; 32];
    /// let mut f: Function<(usize,), u64> = Function::try_new(move |i: usize| table[i])?;
    /// assert_eq!(f.call((3,)), Ok(7));
    /// # Ok::<(), erasedfn::error::ConstructionFailure>(())
    /// ```
    pub fn try_new<F>(callable: F) -> Result<Self, ConstructionFailure>
    where
        F: Invoke<Args, R> + Clone + CallableMarkerFor<T>,
    {
        let raw = RawFunction::try_new(callable)
            .map_err(|layout| construction_failure(core::any::type_name::<F>(), layout))?;
        trace_bound::<Args, R>(&raw);

        // SAFETY:
        // 1. If `T = SendSync`, the bound `F: CallableMarkerFor<SendSync>`
        //    guarantees that the callable is `Send + Sync`.
        Ok(unsafe {
            // @add-unsafe-context: markers::CallableMarkerFor
            Function::from_raw(raw)
        })
    }

    /// Creates a [`Function`] holding the callable in a heap allocation, no
    /// matter how small it is.
    ///
    /// Inline callables move together with their wrapper. A callable that
    /// hands out raw pointers into itself must keep a stable address, and
    /// should be bound with this constructor.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::{Function, Placement};
    ///
    /// let f: Function<(), i32> = Function::new_boxed(|| 4);
    /// assert_eq!(f.placement(), Some(Placement::Heap));
    /// ```
    #[must_use]
    pub fn new_boxed<F>(callable: F) -> Self
    where
        F: Invoke<Args, R> + Clone + CallableMarkerFor<T>,
    {
        let raw = RawFunction::new_heap(callable);
        trace_bound::<Args, R>(&raw);

        // SAFETY:
        // 1. If `T = SendSync`, the bound `F: CallableMarkerFor<SendSync>`
        //    guarantees that the callable is `Send + Sync`.
        unsafe {
            // @add-unsafe-context: markers::CallableMarkerFor
            Function::from_raw(raw)
        }
    }

    /// Returns the signature this [`Function`] is bound to.
    #[must_use]
    pub fn signature() -> Signature {
        Signature::of::<Args, R>()
    }

    /// Invokes the held callable with the argument tuple.
    ///
    /// The callable's output is returned as is. If the callable itself
    /// returns a `Result`, its error is part of the `Ok` value and never
    /// mixed up with [`EmptyInvocation`]. A panic inside the callable unwinds
    /// through this method and leaves the callable in place.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyInvocation`] if no callable is held.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::Function;
    ///
    /// let mut parse: Function<(&'static str,), Result<i32, core::num::ParseIntError>> =
    ///     Function::new(|s: &'static str| s.parse::<i32>());
    ///
    /// assert_eq!(parse.call(("4",)), Ok(Ok(4)));
    /// assert!(matches!(parse.call(("four",)), Ok(Err(_))));
    /// ```
    #[inline]
    pub fn call(&mut self, args: Args) -> Result<R, EmptyInvocation> {
        // SAFETY:
        // 1. Invoking the callable never moves a different callable into the
        //    `RawFunction`.
        let raw = unsafe { self.as_raw_mut() };
        match raw.invoke(args) {
            Some(output) => Ok(output),
            None => {
                let signature = Self::signature();
                #[cfg(feature = "tracing")]
                tracing::debug!(%signature, "called an empty Function");
                Err(EmptyInvocation { signature })
            }
        }
    }

    /// Returns `true` if no callable is held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_raw().is_empty()
    }

    /// Returns `true` if a callable is held.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.is_empty()
    }

    /// Returns where the callable is stored, or `None` if no callable is held.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::{Function, Placement};
    ///
    /// let small: Function<(), u8> = Function::new(|| 1);
    /// let large_capture = [0u8; 64];
    /// let large: Function<(), u8> = Function::new(move || large_capture[0]);
    ///
    /// assert_eq!(small.placement(), Some(Placement::Inline));
    /// assert_eq!(large.placement(), Some(Placement::Heap));
    /// assert_eq!(Function::<(), u8>::empty().placement(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn placement(&self) -> Option<Placement> {
        self.as_raw().placement()
    }

    /// Moves the callable out into a new [`Function`], leaving `self` empty.
    ///
    /// This is the same as [`core::mem::take`].
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        // SAFETY:
        // 1. Taking only ever moves callables out of the `RawFunction`.
        let raw = unsafe { self.as_raw_mut() }.take();

        // SAFETY:
        // 1. The callable came from `self`, which has the same marker.
        unsafe { Function::from_raw(raw) }
    }

    /// Exchanges the callables of `self` and `other`.
    ///
    /// Works for every combination of empty, inline and heap storage, and
    /// never panics.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        // SAFETY:
        // 1. The only callable moved into `self` comes from `other`, which has
        //    the same thread-safety marker.
        let ours = unsafe { self.as_raw_mut() };
        // SAFETY:
        // 1. The only callable moved into `other` comes from `self`, which has
        //    the same thread-safety marker.
        let theirs = unsafe { other.as_raw_mut() };
        ours.swap(theirs);
    }

    /// Destroys the held callable, leaving `self` empty.
    #[inline]
    pub fn clear(&mut self) {
        // SAFETY:
        // 1. Clearing never moves a callable into the `RawFunction`.
        unsafe { self.as_raw_mut() }.clear();
    }

    /// Deep-copies the held callable, reporting allocation failure as a
    /// [`ConstructionFailure`] instead of aborting.
    ///
    /// The copy uses the same placement as `self`.
    pub fn try_clone(&self) -> Result<Self, ConstructionFailure> {
        let raw = self.as_raw().try_clone().map_err(|layout| {
            construction_failure(self.target_type_name().unwrap_or_default(), layout)
        })?;

        // SAFETY:
        // 1. The callable is a clone of the one held by `self`, of the same
        //    type, and `self` has the same marker.
        Ok(unsafe { Function::from_raw(raw) })
    }

    /// Returns a reference to the held callable if it has type `F`.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::Function;
    ///
    /// fn four() -> i32 {
    ///     4
    /// }
    ///
    /// let f: Function<(), i32> = Function::new(four as fn() -> i32);
    /// assert!(f.target::<fn() -> i32>().is_some());
    /// assert!(f.target::<fn() -> u8>().is_none());
    /// ```
    #[inline]
    #[must_use]
    pub fn target<F: 'static>(&self) -> Option<&F> {
        self.as_raw().downcast_ref()
    }

    /// Returns a mutable reference to the held callable if it has type `F`.
    #[inline]
    #[must_use]
    pub fn target_mut<F: 'static>(&mut self) -> Option<&mut F> {
        // SAFETY:
        // 1. The returned reference has the exact type of the held callable,
        //    so it can only replace the callable with another value of the
        //    same type, which satisfies the same bounds.
        unsafe { self.as_raw_mut() }.downcast_mut()
    }

    /// Returns the [`TypeId`] of the held callable.
    #[inline]
    #[must_use]
    pub fn target_type_id(&self) -> Option<TypeId> {
        self.as_raw().callable_type_id()
    }

    /// Returns the type name of the held callable.
    #[inline]
    #[must_use]
    pub fn target_type_name(&self) -> Option<&'static str> {
        self.as_raw().callable_type_name()
    }
}

impl<Args: 'static, R: 'static> Function<Args, R, SendSync> {
    /// Converts the [`Function`] into one that is not `Send` or `Sync`.
    ///
    /// Calling this method is equivalent to calling `function.into()`.
    #[must_use]
    pub fn into_local(self) -> Function<Args, R, Local> {
        let raw = self.into_raw();

        // SAFETY:
        // 1. `T = Local`, so this is trivially true.
        unsafe { Function::from_raw(raw) }
    }
}

impl<Args: 'static, R: 'static, T> Default for Function<Args, R, T> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args: 'static, R: 'static, T> Clone for Function<Args, R, T> {
    fn clone(&self) -> Self {
        let raw = self.as_raw().clone();

        // SAFETY:
        // 1. The callable is a clone of the one held by `self`, of the same
        //    type, and `self` has the same marker.
        unsafe { Function::from_raw(raw) }
    }

    /// Replaces the callable with a copy of `source`'s.
    ///
    /// If cloning panics, `self` keeps its old callable.
    fn clone_from(&mut self, source: &Self) {
        // SAFETY:
        // 1. The callable moved in is a clone of the one held by `source`,
        //    which has the same thread-safety marker.
        unsafe { self.as_raw_mut() }.clone_from(source.as_raw());
    }
}

impl<Args: 'static, R: 'static, T> fmt::Debug for Function<Args, R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = Self::signature();
        let mut debug = f.debug_struct("Function");
        debug.field("signature", &format_args!("{signature}"));
        match (self.placement(), self.target_type_name()) {
            (Some(placement), Some(callable)) => debug
                .field("placement", &placement)
                .field("callable", &callable)
                .finish(),
            _ => debug.field("callable", &format_args!("None")).finish(),
        }
    }
}

impl<Args: 'static, R: 'static, T, F> From<Option<F>> for Function<Args, R, T>
where
    F: Invoke<Args, R> + Clone + CallableMarkerFor<T>,
{
    /// Binds the callable, with `None` standing for the null callable.
    ///
    /// # Examples
    /// ```
    /// use erasedfn::Function;
    ///
    /// let none: Option<fn() -> i32> = None;
    /// assert!(Function::<(), i32>::from(none).is_empty());
    /// assert!(Function::<(), i32>::from(Some(|| 4)).is_bound());
    /// ```
    fn from(callable: Option<F>) -> Self {
        match callable {
            Some(callable) => Self::new(callable),
            None => Self::empty(),
        }
    }
}

impl<Args: 'static, R: 'static> From<Function<Args, R, SendSync>> for Function<Args, R, Local> {
    #[inline(always)]
    fn from(function: Function<Args, R, SendSync>) -> Self {
        function.into_local()
    }
}

// SAFETY: The `SendSync` marker indicates that the held callable is
// `Send + Sync`. The wrapper owns the callable exclusively, so it is safe to
// implement `Send`.
unsafe impl<Args: 'static, R: 'static> Send for Function<Args, R, SendSync> {}

// SAFETY: The `SendSync` marker indicates that the held callable is
// `Send + Sync`. A shared reference only gives shared access to the callable,
// so it is safe to implement `Sync`.
unsafe impl<Args: 'static, R: 'static> Sync for Function<Args, R, SendSync> {}

/// Builds the error for a failed allocation and reports it.
#[cold]
fn construction_failure(
    callable: &'static str,
    layout: core::alloc::Layout,
) -> ConstructionFailure {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        callable,
        size = layout.size(),
        align = layout.align(),
        "failed to allocate callable storage"
    );
    ConstructionFailure { callable, layout }
}

/// Reports a freshly bound callable.
#[inline]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn trace_bound<Args: 'static, R: 'static>(raw: &RawFunction<Args, R>) {
    #[cfg(feature = "tracing")]
    tracing::trace!(
        signature = %Signature::of::<Args, R>(),
        callable = raw.callable_type_name().unwrap_or_default(),
        placement = ?raw.placement(),
        "bound callable"
    );
}
