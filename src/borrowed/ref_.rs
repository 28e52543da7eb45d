use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

use vari_internals::{
    DebugSet,
    typelist::{Leaf, Member, Subset, TypeSet},
};

use crate::{
    NarrowError, VPtr,
    handlers::{Arms, Narrowed, Shared},
    util,
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use vari_internals::{RawPtr, typelist::TypeSet};

    /// A shared reference to one member of the type set `S`.
    ///
    /// [`VRef`] behaves like `&'a T` for a `T` chosen at runtime among the
    /// members of `S`. It is never empty and always `Copy`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let text = String::from("hello");
    /// let r: VRef<'_, types![u32, String]> = VRef::new(&text);
    ///
    /// assert_eq!(r.index(), 1);
    /// assert_eq!(r.get::<String, _>(), Some(&text));
    /// let len = r.visit(handlers![|n: &u32| *n as usize, |s: &String| s.len()]);
    /// assert_eq!(len, 5);
    /// ```
    // # Safety invariants
    //
    // This reference behaves like a `&'a T` for the member `T` selected by the
    // index, and upholds the usual safety invariants of shared references:
    //
    // 1. The pointee is properly initialized for the entire lifetime `'a`.
    // 2. The pointee is not mutated for the entire lifetime `'a`.
    pub struct VRef<'a, S> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. `raw` is not empty.
        /// 2. The pointee of `raw` is live and shared for `'a`.
        raw: RawPtr<S>,
        _lifetime: PhantomData<&'a S>,
    }

    impl<'a, S: TypeSet> VRef<'a, S> {
        /// Creates a reference from a pointer core.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `raw` is not empty.
        /// 2. The pointee of `raw` is live and shared for `'a`.
        #[inline]
        pub(crate) unsafe fn from_raw(raw: RawPtr<S>) -> Self {
            debug_assert!(!raw.is_empty());
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
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

    impl<S> Clone for VRef<'_, S> {
        #[inline]
        fn clone(&self) -> Self {
            *self
        }
    }

    // SAFETY: We must uphold the safety invariants of the raw field for both the
    // original and the copy:
    // 1. This remains true for both the original and the copy
    // 2. Shared access may be duplicated
    impl<S> Copy for VRef<'_, S> {}
}
pub use limit_field_access::VRef;

// SAFETY: A `VRef` gives the same access as a `&T` to one member. `&T` is
// `Send` when `T` is `Sync`, and the union is `Sync` exactly when every member
// is.
unsafe impl<S: TypeSet> Send for VRef<'_, S> where S::Union: Sync {}

// SAFETY: Same as above, `&T` is `Sync` when `T` is `Sync`.
unsafe impl<S: TypeSet> Sync for VRef<'_, S> where S::Union: Sync {}

impl<'a, S: TypeSet> VRef<'a, S> {
    /// Creates a reference to `value`.
    #[inline]
    pub fn new<T, I>(value: &'a T) -> Self
    where
        S: Member<T, I>,
    {
        let raw = vari_internals::RawPtr::new::<T, I>(value.into());
        // SAFETY:
        // 1. `raw` was created from a member, so it is not empty.
        // 2. The pointee is `value`, which is shared for `'a`.
        unsafe { Self::from_raw(raw) }
    }

    /// Returns the position of the active member in `S`.
    #[inline]
    pub fn index(self) -> usize {
        self.as_raw().tagged_index() - 1
    }

    /// Calls the handler of the active member with a `&T` to it.
    ///
    /// `arms` needs exactly one handler per member of `S`, in member order.
    #[inline]
    pub fn visit<A, R>(self, arms: A) -> R
    where
        A: Arms<'a, S, Shared<'a>, R>,
    {
        // SAFETY:
        // 1. The pointer is not empty (invariant 1 of `VRef`).
        // 2. The pointee is live and shared for `'a` (invariant 2 of `VRef`).
        unsafe { self.as_raw().visit(arms, Shared::new()) }
    }

    /// Calls the handler of the active member with a [`VRef`] over the
    /// single-member set of the active member.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let value = 3u8;
    /// let r: VRef<'_, types![u8, char]> = VRef::new(&value);
    /// let doubled = r.visit_narrowed(handlers![
    ///     |n: VRef<'_, types![u8]>| u32::from(*n) * 2,
    ///     |c: VRef<'_, types![char]>| u32::from(*c),
    /// ]);
    /// assert_eq!(doubled, 6);
    /// ```
    #[inline]
    pub fn visit_narrowed<A, R>(self, arms: A) -> R
    where
        A: Arms<'a, S, Narrowed<'a>, R>,
    {
        // SAFETY: Same as `visit`, `Narrowed` only needs shared access.
        unsafe { self.as_raw().visit(arms, Narrowed::new()) }
    }

    /// Returns a reference to the active member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(self) -> Option<&'a T>
    where
        S: Member<T, I>,
    {
        let ptr = self.as_raw().downcast::<T, I>()?;
        // SAFETY: The pointee is a `T`, live and shared for `'a`.
        Some(unsafe { ptr.as_ref() })
    }

    /// Returns `true` if the active member is of type `T`.
    #[inline]
    pub fn holds<T, I>(self) -> bool
    where
        S: Member<T, I>,
    {
        self.as_raw().downcast::<T, I>().is_some()
    }

    /// Converts the reference to a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> VRef<'a, Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        // SAFETY:
        // 1. Widening maps every non-empty index to a non-empty index.
        // 2. The pointee is unchanged.
        unsafe { VRef::from_raw(self.as_raw().widen::<Super, I>()) }
    }

    /// Converts the reference to a subset of `S`.
    ///
    /// # Errors
    ///
    /// Fails if the active member is not part of `Sub`. The error holds the
    /// original reference.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<VRef<'a, Sub>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        match self.as_raw().narrow::<Sub, I>() {
            // SAFETY:
            // 1. `self` is not empty, so a successful narrowing is not empty.
            // 2. The pointee is unchanged.
            Some(raw) => Ok(unsafe { VRef::from_raw(raw) }),
            None => Err(NarrowError::new(self)),
        }
    }

    /// Converts the reference into a pointer that is known to be non-empty.
    #[inline]
    pub fn as_ptr(self) -> VPtr<'a, S> {
        VPtr::from(self)
    }
}

impl<'a, T> VRef<'a, Leaf<T>> {
    /// Returns the member of a single-member reference.
    #[inline]
    pub fn into_inner(self) -> &'a T {
        let ptr = self.as_raw().address_or_dangling().cast::<T>();
        // SAFETY: The reference is not empty and `T` is the only member, so
        // the address points to a `T`, live and shared for `'a`.
        unsafe { ptr.as_ref() }
    }
}

impl<T> Deref for VRef<'_, Leaf<T>> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.into_inner()
    }
}

impl<S: TypeSet> PartialEq for VRef<'_, S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        util::identity(self.as_raw()) == util::identity(other.as_raw())
    }
}

impl<S: TypeSet> Eq for VRef<'_, S> {}

impl<S: TypeSet> PartialOrd for VRef<'_, S> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: TypeSet> Ord for VRef<'_, S> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        util::identity(self.as_raw()).cmp(&util::identity(other.as_raw()))
    }
}

impl<S: TypeSet> Hash for VRef<'_, S> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        util::identity(self.as_raw()).hash(state);
    }
}

impl<S: DebugSet> fmt::Debug for VRef<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: The pointee is live and shared for the lifetime of `self`.
        unsafe { util::fmt_member(self.as_raw(), f) }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{collections::BTreeSet, string::String};
    use core::cell::Cell;

    use super::*;

    type Set = types![i32, String];

    #[test]
    fn test_vref_send_sync() {
        static_assertions::assert_impl_all!(VRef<'static, Set>: Send, Sync, Copy, Unpin);
        static_assertions::assert_not_impl_any!(VRef<'static, types![i32, Cell<u8>]>: Send, Sync);
        static_assertions::assert_impl_all!(VRef<'static, types![i32, core::sync::atomic::AtomicU8]>: Send, Sync);
    }

    #[test]
    fn test_vref_size() {
        assert_eq!(
            core::mem::size_of::<VRef<'static, Set>>(),
            2 * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_visit_reaches_original_type_once() {
        let calls = Cell::new(0);
        let text = String::from("abc");
        let r = VRef::<Set>::new(&text);
        let seen = r.visit(handlers![
            |_: &i32| {
                calls.set(calls.get() + 10);
                "int"
            },
            |s: &String| {
                calls.set(calls.get() + 1);
                assert_eq!(s, "abc");
                "string"
            },
        ]);
        assert_eq!(seen, "string");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_widen_and_narrow() {
        let number = 42i32;
        let r = VRef::<Set>::new(&number);
        let wide: VRef<'_, types![f32, String, i32]> = r.widen();
        assert_eq!(wide.index(), 2);
        assert_eq!(wide.get::<i32, _>(), Some(&42));

        let narrow = wide.try_narrow::<types![i32], _>().unwrap();
        assert_eq!(*narrow, 42);

        let fails = wide.try_narrow::<types![f32, String], _>().unwrap_err();
        assert_eq!(fails.into_inner(), wide);
    }

    #[test]
    fn test_identity_comparison() {
        let a = 1i32;
        let b = 1i32;
        let ra = VRef::<Set>::new(&a);
        let rb = VRef::<Set>::new(&b);
        assert_eq!(ra, VRef::<Set>::new(&a));
        assert_ne!(ra, rb);

        let mut set = BTreeSet::new();
        set.insert(ra);
        set.insert(rb);
        set.insert(ra);
        assert_eq!(set.len(), 2);

        let mut hashed = hashbrown::HashSet::new();
        hashed.insert(ra);
        assert!(hashed.contains(&VRef::<Set>::new(&a)));
        assert!(!hashed.contains(&rb));
    }

    #[test]
    fn test_debug() {
        use alloc::format;

        let text = String::from("x");
        assert_eq!(format!("{:?}", VRef::<Set>::new(&text)), "\"x\"");
    }
}
