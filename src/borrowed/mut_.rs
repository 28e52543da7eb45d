use core::{
    fmt,
    ops::{Deref, DerefMut},
};

use vari_internals::{
    DebugSet,
    typelist::{Leaf, Member, Subset, TypeSet},
};

use crate::{
    NarrowError, VRef,
    handlers::{Arms, Exclusive, Narrowed, NarrowedMut, Shared},
    util,
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use vari_internals::{RawPtr, typelist::TypeSet};

    /// An exclusive reference to one member of the type set `S`.
    ///
    /// [`VMut`] behaves like `&'a mut T` for a `T` chosen at runtime among the
    /// members of `S`. It is never empty. Use [`VMut::reborrow`] to visit it
    /// without giving it up, and [`VMut::as_ref`] for shared access.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let mut count = 1u32;
    /// let mut m: VMut<'_, types![u32, String]> = VMut::new(&mut count);
    /// m.reborrow().visit(handlers![|n: &mut u32| *n += 1, |s: &mut String| s.push('!')]);
    /// assert_eq!(m.get::<u32, _>(), Some(&2));
    /// ```
    // # Safety invariants
    //
    // This reference behaves like a `&'a mut T` for the member `T` selected by
    // the index, and upholds the usual safety invariants of mutable
    // references:
    //
    // 1. The pointee is properly initialized for the entire lifetime `'a`.
    // 2. The pointee is not aliased for the entire lifetime `'a`.
    pub struct VMut<'a, S> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. `raw` is not empty.
        /// 2. The pointee of `raw` is live and exclusively borrowed for `'a`.
        raw: RawPtr<S>,
        _lifetime: PhantomData<&'a mut S>,
    }

    impl<'a, S: TypeSet> VMut<'a, S> {
        /// Creates a reference from a pointer core.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `raw` is not empty.
        /// 2. The pointee of `raw` is live and exclusively borrowed for `'a`.
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

        /// Returns the underlying pointer core, for shared access.
        #[inline]
        pub(crate) fn as_raw(&self) -> RawPtr<S> {
            self.raw
        }

        /// Consumes the reference and returns the underlying pointer core.
        #[inline]
        pub(crate) fn into_raw(self) -> RawPtr<S> {
            // SAFETY: We are destroying `self`, so we no longer need to uphold
            // any safety invariants.
            self.raw
        }
    }
}
pub use limit_field_access::VMut;

// SAFETY: A `VMut` gives the same access as a `&mut T` to one member, which is
// `Send` when `T` is `Send`. The union is `Send` exactly when every member is.
unsafe impl<S: TypeSet> Send for VMut<'_, S> where S::Union: Send {}

// SAFETY: `&mut T` is `Sync` when `T` is `Sync`.
unsafe impl<S: TypeSet> Sync for VMut<'_, S> where S::Union: Sync {}

impl<'a, S: TypeSet> VMut<'a, S> {
    /// Creates a reference to `value`.
    #[inline]
    pub fn new<T, I>(value: &'a mut T) -> Self
    where
        S: Member<T, I>,
    {
        let raw = vari_internals::RawPtr::new::<T, I>(value.into());
        // SAFETY:
        // 1. `raw` was created from a member, so it is not empty.
        // 2. The pointee is `value`, which is exclusively borrowed for `'a`.
        unsafe { Self::from_raw(raw) }
    }

    /// Returns the position of the active member in `S`.
    #[inline]
    pub fn index(&self) -> usize {
        self.as_raw().tagged_index() - 1
    }

    /// Reborrows the reference for a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> VMut<'_, S> {
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. `self` is exclusively borrowed for the returned lifetime, so the
        //    pointee is not aliased during it.
        unsafe { VMut::from_raw(self.as_raw()) }
    }

    /// Returns a shared reference to the active member.
    #[inline]
    pub fn as_ref(&self) -> VRef<'_, S> {
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. `self` is borrowed for the returned lifetime, so the pointee is
        //    not mutated during it.
        unsafe { VRef::from_raw(self.as_raw()) }
    }

    /// Converts the reference into a shared reference for the whole lifetime
    /// `'a`.
    #[inline]
    pub fn into_ref(self) -> VRef<'a, S> {
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. `self` is consumed, so no exclusive access remains.
        unsafe { VRef::from_raw(self.into_raw()) }
    }

    /// Calls the handler of the active member with a `&mut T` to it.
    #[inline]
    pub fn visit<A, R>(self, arms: A) -> R
    where
        A: Arms<'a, S, Exclusive<'a>, R>,
    {
        // SAFETY:
        // 1. The pointer is not empty (invariant 1 of `VMut`).
        // 2. The pointee is live and exclusively borrowed for `'a`, and `self`
        //    is consumed.
        unsafe { self.into_raw().visit(arms, Exclusive::new()) }
    }

    /// Calls the handler of the active member with a [`VMut`] over the
    /// single-member set of the active member.
    #[inline]
    pub fn visit_narrowed<A, R>(self, arms: A) -> R
    where
        A: Arms<'a, S, NarrowedMut<'a>, R>,
    {
        // SAFETY: Same as `visit`.
        unsafe { self.into_raw().visit(arms, NarrowedMut::new()) }
    }

    /// Calls the handler of the active member with a `&T` to it.
    #[inline]
    pub fn visit_ref<'b, A, R>(&'b self, arms: A) -> R
    where
        A: Arms<'b, S, Shared<'b>, R>,
    {
        self.as_ref().visit(arms)
    }

    /// Like [`visit_ref`](Self::visit_ref), with [`Narrowed`] arguments.
    #[inline]
    pub fn visit_ref_narrowed<'b, A, R>(&'b self, arms: A) -> R
    where
        A: Arms<'b, S, Narrowed<'b>, R>,
    {
        self.as_ref().visit_narrowed(arms)
    }

    /// Returns a reference to the active member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        S: Member<T, I>,
    {
        self.as_ref().get::<T, I>()
    }

    /// Returns a mutable reference to the active member if it is of type `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Member<T, I>,
    {
        let mut ptr = self.as_raw().downcast::<T, I>()?;
        // SAFETY: The pointee is a live `T`, and `self` is exclusively
        // borrowed for the returned lifetime.
        Some(unsafe { ptr.as_mut() })
    }

    /// Converts the reference into a `&'a mut T` if the active member is of
    /// type `T`, or gives it back otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` if the active member is not a `T`.
    #[inline]
    pub fn downcast<T, I>(self) -> Result<&'a mut T, Self>
    where
        S: Member<T, I>,
    {
        match self.as_raw().downcast::<T, I>() {
            // SAFETY: The pointee is a live `T`, exclusively borrowed for
            // `'a`, and `self` is consumed.
            Some(mut ptr) => Ok(unsafe { ptr.as_mut() }),
            None => Err(self),
        }
    }

    /// Converts the reference to a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> VMut<'a, Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        // SAFETY:
        // 1. Widening maps every non-empty index to a non-empty index.
        // 2. The pointee is unchanged and `self` is consumed.
        unsafe { VMut::from_raw(self.into_raw().widen::<Super, I>()) }
    }

    /// Converts the reference to a subset of `S`.
    ///
    /// # Errors
    ///
    /// Fails if the active member is not part of `Sub`. The error holds the
    /// original reference.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<VMut<'a, Sub>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        match self.as_raw().narrow::<Sub, I>() {
            // SAFETY:
            // 1. `self` is not empty, so a successful narrowing is not empty.
            // 2. The pointee is unchanged and `self` is consumed.
            Some(raw) => Ok(unsafe { VMut::from_raw(raw) }),
            None => Err(NarrowError::new(self)),
        }
    }
}

impl<'a, T> VMut<'a, Leaf<T>> {
    /// Returns the member of a single-member reference.
    #[inline]
    pub fn into_inner(self) -> &'a mut T {
        let mut ptr = self.into_raw().address_or_dangling().cast::<T>();
        // SAFETY: The reference is not empty and `T` is the only member, so
        // the address points to a live `T`, exclusively borrowed for `'a`.
        unsafe { ptr.as_mut() }
    }
}

impl<T> Deref for VMut<'_, Leaf<T>> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.as_ref().into_inner()
    }
}

impl<T> DerefMut for VMut<'_, Leaf<T>> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.reborrow().into_inner()
    }
}

impl<'a, S: TypeSet> From<VMut<'a, S>> for VRef<'a, S> {
    #[inline]
    fn from(value: VMut<'a, S>) -> Self {
        value.into_ref()
    }
}

impl<S: DebugSet> fmt::Debug for VMut<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: The pointee is live and `self` is borrowed for the duration
        // of the call.
        unsafe { util::fmt_member(self.as_raw(), f) }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String};
    use core::cell::Cell;

    use super::*;

    type Set = types![i32, String];

    #[test]
    fn test_vmut_send_sync() {
        static_assertions::assert_impl_all!(VMut<'static, Set>: Send, Sync, Unpin);
        static_assertions::assert_not_impl_any!(VMut<'static, Set>: Copy, Clone);
        static_assertions::assert_impl_all!(VMut<'static, types![Cell<u8>]>: Send);
        static_assertions::assert_not_impl_any!(VMut<'static, types![Cell<u8>]>: Sync);
        static_assertions::assert_not_impl_any!(VMut<'static, types![Rc<u8>]>: Send, Sync);
    }

    #[test]
    fn test_visit_mutates() {
        let mut text = String::from("wolo");
        let mut m = VMut::<Set>::new(&mut text);
        m.reborrow().visit(handlers![|n: &mut i32| *n += 1, |s: &mut String| s.push_str("lo")]);
        let len = m.visit_ref(handlers![|_: &i32| 0, |s: &String| s.len()]);
        assert_eq!(len, 6);
        drop(m);
        assert_eq!(text, "wololo");
    }

    #[test]
    fn test_narrowed_deref_mut() {
        let mut number = 41i32;
        VMut::<Set>::new(&mut number).visit_narrowed(handlers![
            |mut n: VMut<'_, types![i32]>| *n += 1,
            |mut s: VMut<'_, types![String]>| s.clear(),
        ]);
        assert_eq!(number, 42);
    }

    #[test]
    fn test_widen_narrow_downcast() {
        let mut number = 7i32;
        let m = VMut::<Set>::new(&mut number);
        let wide: VMut<'_, types![u8, String, i32]> = m.widen();
        assert_eq!(wide.index(), 2);
        let wide = wide.try_narrow::<types![u8], _>().unwrap_err().into_inner();
        let back = wide.try_narrow::<Set, _>().unwrap();
        let back = back.downcast::<String, _>().unwrap_err();
        *back.downcast::<i32, _>().unwrap() = 8;
        assert_eq!(number, 8);
    }
}
