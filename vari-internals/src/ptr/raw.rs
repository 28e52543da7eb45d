//! The type-erased `(index, address)` pointer core.
//!
//! This module encapsulates the `index` and `ptr` fields of [`RawPtr`],
//! ensuring they are only visible within this module. The safe constructors
//! compute the index from [`Member`] and [`Remap`], so the safety invariant
//! below is established in this file alone.
//!
//! # Safety Invariant
//!
//! If the tagged index of a [`RawPtr<S>`] is `k != 0`, the address was
//! produced from a `NonNull<T>` where `T` is member `k - 1` of `S`. Whether the
//! pointee is still *live* is not tracked here: that is the responsibility of
//! the borrowing or owning container wrapping the core, which is why every
//! operation reading through the address is `unsafe`.

use core::{fmt, marker::PhantomData, ptr::NonNull};

use crate::{
    handlers::{Arms, NullableArms, Wrap},
    typelist::{CAPACITY, Member, RawFn, Remap, Subset, TypeSet},
    util::Erased,
};

/// A tagged, type-erased pointer to one member of the type set `S`.
///
/// Tagged index `0` is the empty state, tagged index `k` means the address
/// points to member `k - 1` of `S`.
///
/// This is a plain `Copy` value with no lifetime and no ownership. The `vari`
/// crate wraps it into borrowing (`VPtr`, `VRef`, `VMut`) and owning
/// (`UvPtr`, `UvRef`) containers.
pub struct RawPtr<S> {
    /// Tagged index of the active member.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `index <= S::LEN`.
    /// 2. If `index != 0`, `ptr` was created from a `NonNull<T>` where `T` is
    ///    member `index - 1` of `S`.
    index: u8,

    /// Type-erased address of the active member. Dangling when empty.
    ptr: NonNull<Erased>,

    /// Marker for the type set.
    _set: PhantomData<fn() -> S>,
}

impl<S> Clone for RawPtr<S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for RawPtr<S> {}

impl<S: TypeSet> RawPtr<S> {
    /// Creates an empty pointer.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            index: 0,
            ptr: NonNull::dangling(),
            _set: PhantomData,
        }
    }

    /// Creates a pointer to a member of type `T`.
    #[inline]
    pub fn new<T, I>(ptr: NonNull<T>) -> Self
    where
        S: Member<T, I>,
    {
        const { assert!(S::LEN < CAPACITY, "type sets hold at most 255 members") };
        Self {
            index: (<S as Member<T, I>>::INDEX + 1) as u8,
            ptr: ptr.cast::<Erased>(),
            _set: PhantomData,
        }
    }

    /// Creates a pointer from a tagged index and a type-erased address.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `tagged <= S::LEN`.
    /// 2. If `tagged != 0`, `ptr` was created from a `NonNull<T>` where `T`
    ///    is member `tagged - 1` of `S`.
    #[inline]
    pub unsafe fn from_parts(tagged: usize, ptr: NonNull<Erased>) -> Self {
        debug_assert!(tagged <= S::LEN);
        Self {
            index: tagged as u8,
            ptr,
            _set: PhantomData,
        }
    }

    /// Returns the tagged index: `0` when empty, `k` when member `k - 1` is
    /// active.
    #[inline]
    pub fn tagged_index(self) -> usize {
        usize::from(self.index)
    }

    /// Returns `true` if no member is active.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.index == 0
    }

    /// Returns the address of the active member, or `None` when empty.
    #[inline]
    pub fn address(self) -> Option<NonNull<Erased>> {
        (!self.is_empty()).then_some(self.ptr)
    }

    /// Returns the stored address without checking for the empty state.
    ///
    /// The address is dangling when the pointer is empty.
    #[inline]
    pub fn address_or_dangling(self) -> NonNull<Erased> {
        self.ptr
    }

    /// Returns the address of the active member if it is of type `T`.
    #[inline]
    pub fn downcast<T, I>(self) -> Option<NonNull<T>>
    where
        S: Member<T, I>,
    {
        (self.tagged_index() == <S as Member<T, I>>::INDEX + 1).then(|| self.ptr.cast::<T>())
    }

    /// Re-indexes the pointer for a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> RawPtr<Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        RawPtr {
            index: Remap::<S, Super, I>::WIDEN[self.tagged_index()],
            ptr: self.ptr,
            _set: PhantomData,
        }
    }

    /// Re-indexes the pointer for a subset of `S`.
    ///
    /// Returns `None` if the active member is not part of `Sub`. An empty
    /// pointer narrows to an empty pointer.
    #[inline]
    pub fn narrow<Sub, I>(self) -> Option<RawPtr<Sub>>
    where
        Sub: Subset<S, I>,
    {
        let index = Remap::<Sub, S, I>::NARROW[self.tagged_index()];
        (index != 0 || self.is_empty()).then_some(RawPtr {
            index,
            ptr: self.ptr,
            _set: PhantomData,
        })
    }

    /// Calls the handler of the active member, wrapping its address with
    /// `wrap`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer is not empty.
    /// 2. The pointee is live and the requirements of [`Wrap::wrap`] hold for
    ///    it.
    #[inline]
    pub unsafe fn visit<'a, W, A, R>(self, arms: A, wrap: W) -> R
    where
        W: Wrap<'a>,
        A: Arms<'a, S, W, R>,
    {
        debug_assert!(!self.is_empty(), "visited an empty pointer");
        // SAFETY:
        // 1. The pointer is not empty (guaranteed by the caller), so
        //    `index - 1 < S::LEN` by the invariants of this type.
        // 2. `ptr` was created from a pointer to member `index - 1` (type
        //    invariant), and the pointee is live with valid access (guaranteed
        //    by the caller).
        unsafe { arms.call(self.tagged_index() - 1, self.ptr, wrap) }
    }

    /// Calls the handler of the empty case, or of the active member.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. If the pointer is not empty, the pointee is live and the
    ///    requirements of [`Wrap::wrap`] hold for it.
    #[inline]
    pub unsafe fn visit_nullable<'a, W, A, R>(self, arms: A, wrap: W) -> R
    where
        W: Wrap<'a>,
        A: NullableArms<'a, S, W, R>,
    {
        // SAFETY:
        // 1. `index <= S::LEN` by the invariants of this type.
        // 2. If the pointer is not empty, the requirements of `Arms::call` hold
        //    as argued in `visit`.
        unsafe { arms.call_tagged(self.tagged_index(), self.ptr, wrap) }
    }

    /// Calls `f` with the address of the active member cast to its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer is not empty.
    /// 2. The requirements of [`RawFn::call`] hold for the active member.
    #[inline]
    pub unsafe fn dispatch<F: RawFn>(self, f: F) -> F::Output {
        debug_assert!(!self.is_empty(), "dispatched an empty pointer");
        // SAFETY:
        // 1. `index - 1 < S::LEN` since the pointer is not empty.
        // 2. `ptr` points to member `index - 1` (type invariant) and the
        //    requirements of `f` are guaranteed by the caller.
        unsafe { S::dispatch(self.tagged_index() - 1, self.ptr, f) }
    }
}

impl<S> fmt::Debug for RawPtr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPtr")
            .field("index", &self.index)
            .field("ptr", &self.ptr)
            .finish()
    }
}
