use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ptr::NonNull,
};

use vari_internals::{
    DebugSet, RawPtr,
    typelist::{Member, Subset, TypeSet},
};

use crate::{
    NarrowError, VRef,
    handlers::{Narrowed, NullableArms, Shared},
    util,
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use vari_internals::{RawPtr, typelist::TypeSet};

    /// A nullable shared pointer to one member of the type set `S`.
    ///
    /// [`VPtr`] behaves like `Option<&'a T>` for a `T` chosen at runtime among
    /// the members of `S`. Its visits take an extra first handler for the
    /// empty state, receiving [`Empty`](crate::markers::Empty).
    ///
    /// Pointers compare, order and hash by the identity of the pointee, not
    /// by its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// type Set = types![i32, String];
    ///
    /// fn describe(ptr: VPtr<'_, Set>) -> String {
    ///     ptr.visit(handlers![
    ///         |_: Empty| "empty".to_string(),
    ///         |i: &i32| format!("int {i}"),
    ///         |s: &String| format!("string {s}"),
    ///     ])
    /// }
    ///
    /// let mut ptr = VPtr::<Set>::empty();
    /// assert_eq!(describe(ptr), "empty");
    ///
    /// let number = 42;
    /// ptr.set(&number);
    /// assert_eq!(describe(ptr), "int 42");
    /// ```
    // # Safety invariants
    //
    // When not empty, this pointer behaves like a `&'a T` for the member `T`
    // selected by the index:
    //
    // 1. The pointee is properly initialized for the entire lifetime `'a`.
    // 2. The pointee is not mutated for the entire lifetime `'a`.
    pub struct VPtr<'a, S> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. If `raw` is not empty, its pointee is live and shared for `'a`.
        raw: RawPtr<S>,
        _lifetime: PhantomData<&'a S>,
    }

    impl<'a, S: TypeSet> VPtr<'a, S> {
        /// Creates a pointer from a pointer core.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. If `raw` is not empty, its pointee is live and shared for `'a`.
        #[inline]
        pub(crate) const unsafe fn from_raw(raw: RawPtr<S>) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            Self {
                raw,
                _lifetime: PhantomData,
            }
        }

        /// Returns the underlying pointer core.
        #[inline]
        pub(crate) fn as_raw(self) -> RawPtr<S> {
            self.raw
        }
    }

    impl<S> Clone for VPtr<'_, S> {
        #[inline]
        fn clone(&self) -> Self {
            *self
        }
    }

    // SAFETY: We must uphold the safety invariants of the raw field for both the
    // original and the copy:
    // 1. Shared access may be duplicated
    impl<S> Copy for VPtr<'_, S> {}
}
pub use limit_field_access::VPtr;

// SAFETY: A `VPtr` gives the same access as an `Option<&T>` to one member,
// which is `Send` when `T` is `Sync`. The union is `Sync` exactly when every
// member is.
unsafe impl<S: TypeSet> Send for VPtr<'_, S> where S::Union: Sync {}

// SAFETY: Same as above, `&T` is `Sync` when `T` is `Sync`.
unsafe impl<S: TypeSet> Sync for VPtr<'_, S> where S::Union: Sync {}

impl<'a, S: TypeSet> VPtr<'a, S> {
    /// Creates an empty pointer.
    #[inline]
    pub const fn empty() -> Self {
        // SAFETY: The pointer is empty.
        unsafe { Self::from_raw(RawPtr::empty()) }
    }

    /// Creates a pointer to `value`.
    #[inline]
    pub fn new<T, I>(value: &'a T) -> Self
    where
        S: Member<T, I>,
    {
        VRef::<S>::new::<T, I>(value).as_ptr()
    }

    /// Points the pointer at `value`.
    #[inline]
    pub fn set<T, I>(&mut self, value: &'a T)
    where
        S: Member<T, I>,
    {
        *self = Self::new(value);
    }

    /// Returns `true` if the pointer is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.as_raw().is_empty()
    }

    /// Returns the position of the active member in `S`, or `None` if the
    /// pointer is empty.
    #[inline]
    pub fn index(self) -> Option<usize> {
        self.as_raw().tagged_index().checked_sub(1)
    }

    /// Returns the address of the pointee, or `None` if the pointer is empty.
    #[inline]
    pub fn address(self) -> Option<NonNull<()>> {
        self.as_raw().address().map(NonNull::cast)
    }

    /// Calls the handler of the empty state or of the active member.
    ///
    /// `arms` needs a handler taking [`Empty`](crate::markers::Empty),
    /// followed by exactly one handler per member of `S` taking `&T`.
    #[inline]
    pub fn visit<A, R>(self, arms: A) -> R
    where
        A: NullableArms<'a, S, Shared<'a>, R>,
    {
        // SAFETY:
        // 1. If the pointer is not empty, the pointee is live and shared for
        //    `'a` (invariant 1 of `VPtr`).
        unsafe { self.as_raw().visit_nullable(arms, Shared::new()) }
    }

    /// Like [`visit`](Self::visit), but member handlers receive a [`VRef`]
    /// over the single-member set of the active member.
    #[inline]
    pub fn visit_narrowed<A, R>(self, arms: A) -> R
    where
        A: NullableArms<'a, S, Narrowed<'a>, R>,
    {
        // SAFETY: Same as `visit`, `Narrowed` only needs shared access.
        unsafe { self.as_raw().visit_nullable(arms, Narrowed::new()) }
    }

    /// Returns a reference to the active member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(self) -> Option<&'a T>
    where
        S: Member<T, I>,
    {
        self.as_ref()?.get::<T, I>()
    }

    /// Returns the pointer as a non-empty [`VRef`], or `None` if it is empty.
    #[inline]
    pub fn as_ref(self) -> Option<VRef<'a, S>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. The pointee is live and shared for `'a` (invariant 1 of `VPtr`).
        Some(unsafe { VRef::from_raw(self.as_raw()) })
    }

    /// Converts the pointer to a superset of `S`. An empty pointer stays
    /// empty.
    #[inline]
    pub fn widen<Super, I>(self) -> VPtr<'a, Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        // SAFETY: The pointee is unchanged.
        unsafe { VPtr::from_raw(self.as_raw().widen::<Super, I>()) }
    }

    /// Converts the pointer to a subset of `S`. An empty pointer narrows to
    /// an empty pointer.
    ///
    /// # Errors
    ///
    /// Fails if the active member is not part of `Sub`. The error holds the
    /// original pointer.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<VPtr<'a, Sub>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        match self.as_raw().narrow::<Sub, I>() {
            // SAFETY: The pointee is unchanged.
            Some(raw) => Ok(unsafe { VPtr::from_raw(raw) }),
            None => Err(NarrowError::new(self)),
        }
    }
}

impl<S: TypeSet> Default for VPtr<'_, S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, S: TypeSet> From<VRef<'a, S>> for VPtr<'a, S> {
    #[inline]
    fn from(value: VRef<'a, S>) -> Self {
        // SAFETY: The pointee of a `VRef` is live and shared for `'a`.
        unsafe { VPtr::from_raw(value.as_raw()) }
    }
}

impl<S: TypeSet> PartialEq for VPtr<'_, S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        util::identity(self.as_raw()) == util::identity(other.as_raw())
    }
}

impl<S: TypeSet> Eq for VPtr<'_, S> {}

impl<S: TypeSet> PartialOrd for VPtr<'_, S> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: TypeSet> Ord for VPtr<'_, S> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        util::identity(self.as_raw()).cmp(&util::identity(other.as_raw()))
    }
}

impl<S: TypeSet> Hash for VPtr<'_, S> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        util::identity(self.as_raw()).hash(state);
    }
}

impl<S: DebugSet> fmt::Debug for VPtr<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: If not empty, the pointee is live and shared for the
        // lifetime of `self`.
        unsafe { util::fmt_member(self.as_raw(), f) }
    }
}
