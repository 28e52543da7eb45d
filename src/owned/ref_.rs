use alloc::boxed::Box;
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

use vari_internals::{
    DebugSet, RawPtr,
    typelist::{Leaf, Member, Subset, TypeSet},
};

use crate::{
    NarrowError, VMut, VRef,
    deleter::{Destroy, DestroysBox},
    handlers::{Arms, Exclusive, Narrowed, Owning, Shared},
    owned::DestroyWith,
    util::{self, trace_ownership},
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::{mem::ManuallyDrop, ptr};

    use vari_internals::{RawPtr, typelist::TypeSet};

    use crate::{
        deleter::{BoxDelete, Destroy},
        owned::DestroyWith,
        util::trace_ownership,
    };

    /// An owning reference to one member of the type set `S`.
    ///
    /// [`UvRef`] behaves like `Box<T>` for a `T` chosen at runtime among the
    /// members of `S`, released through the deleter `D`. Unlike
    /// [`UvPtr`](crate::UvPtr) it is never empty, so its visits need no
    /// handler for the empty state, and [`take`](UvRef::take) always hands
    /// the member to a member handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let mut owned: UvRef<types![Vec<u8>, String]> = UvRef::new(vec![1, 2]);
    /// owned.visit_mut(handlers![|v: &mut Vec<u8>| v.push(3), |s: &mut String| s.push('3')]);
    ///
    /// let len = owned.visit(handlers![|v: &Vec<u8>| v.len(), |s: &String| s.len()]);
    /// assert_eq!(len, 3);
    /// ```
    pub struct UvRef<S: TypeSet, D: Destroy = BoxDelete> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. `raw` is not empty.
        /// 2. The pointee of `raw` is live and owned by this container:
        ///    nothing else reads, writes or releases it.
        /// 3. The pointee of `raw` can be released by `deleter`.
        raw: RawPtr<S>,
        deleter: D,
    }

    impl<S: TypeSet, D: Destroy> UvRef<S, D> {
        /// Creates a reference from a pointer core and a deleter.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `raw` is not empty.
        /// 2. Ownership of the pointee of `raw` is transferred to the new
        ///    container.
        /// 3. The pointee of `raw` can be released by `deleter`.
        #[inline]
        pub unsafe fn from_raw_parts(raw: RawPtr<S>, deleter: D) -> Self {
            debug_assert!(!raw.is_empty());
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            // 3. Guaranteed by the caller
            Self { raw, deleter }
        }

        /// Returns the underlying pointer core.
        #[inline]
        pub(crate) fn as_raw(&self) -> RawPtr<S> {
            self.raw
        }

        /// Returns the deleter.
        #[inline]
        pub fn deleter(&self) -> &D {
            &self.deleter
        }

        /// Returns the deleter mutably.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. After any change made through the returned reference, the
        ///    deleter can still release the owned member.
        #[inline]
        pub unsafe fn deleter_mut(&mut self) -> &mut D {
            // SAFETY: Invariant 3 is guaranteed by the caller.
            &mut self.deleter
        }

        /// Splits the reference into its pointer core and deleter, giving up
        /// ownership of the member without releasing it.
        #[inline]
        pub fn into_raw_parts(self) -> (RawPtr<S>, D) {
            let this = ManuallyDrop::new(self);
            // SAFETY: `this` is never dropped or used again, so the deleter is
            // moved out exactly once.
            let deleter = unsafe { ptr::read(&this.deleter) };
            (this.raw, deleter)
        }

        /// Replaces the pointer core, returning the previous one.
        ///
        /// Ownership of the previous pointee moves to the caller.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `raw` is not empty.
        /// 2. Ownership of the pointee of `raw` is transferred to this
        ///    container.
        /// 3. The pointee of `raw` can be released by the deleter of this
        ///    container.
        #[inline]
        pub(crate) unsafe fn replace_raw(&mut self, raw: RawPtr<S>) -> RawPtr<S> {
            debug_assert!(!raw.is_empty());
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            // 3. Guaranteed by the caller
            core::mem::replace(&mut self.raw, raw)
        }
    }

    impl<S: TypeSet, D: Destroy> Drop for UvRef<S, D> {
        fn drop(&mut self) {
            trace_ownership!("destroy", "UvRef", self.raw.tagged_index());
            let deleter = &self.deleter;
            // SAFETY:
            // 1. The pointer is not empty (invariant 1).
            // 2. The pointee is live, owned by us and releasable by `deleter`
            //    (invariants 2 and 3). It is never used again since `self` is
            //    being dropped.
            unsafe {
                self.raw.dispatch(DestroyWith { deleter });
            }
        }
    }
}
pub use limit_field_access::UvRef;

// SAFETY: A `UvRef` owns one member and its deleter, like a `(Box<T>, D)`
// would. The union is `Send` exactly when every member is.
unsafe impl<S: TypeSet, D: Destroy + Send> Send for UvRef<S, D> where S::Union: Send {}

// SAFETY: Shared access to a `UvRef` only gives shared access to the member
// and the deleter.
unsafe impl<S: TypeSet, D: Destroy + Sync> Sync for UvRef<S, D> where S::Union: Sync {}

impl<S: TypeSet, D: DestroysBox + Default> UvRef<S, D> {
    /// Moves `value` to the heap and creates a reference owning it.
    #[inline]
    pub fn new<T, I>(value: T) -> Self
    where
        S: Member<T, I>,
    {
        Self::new_in(value, D::default())
    }

    /// Creates a reference owning a boxed member.
    #[inline]
    pub fn from_box<T, I>(boxed: Box<T>) -> Self
    where
        S: Member<T, I>,
    {
        Self::from_box_in(boxed, D::default())
    }
}

impl<S: TypeSet, D: Destroy> UvRef<S, D> {
    /// Moves `value` to the heap and creates a reference owning it, released
    /// by `deleter`.
    #[inline]
    pub fn new_in<T, I>(value: T, deleter: D) -> Self
    where
        S: Member<T, I>,
        D: DestroysBox,
    {
        Self::from_box_in(Box::new(value), deleter)
    }

    /// Creates a reference owning a boxed member, released by `deleter`.
    #[inline]
    pub fn from_box_in<T, I>(boxed: Box<T>, deleter: D) -> Self
    where
        S: Member<T, I>,
        D: DestroysBox,
    {
        // SAFETY:
        // 1. The box was leaked, so we are the only owner of its contents.
        // 2. `D` releases boxes.
        unsafe { Self::from_non_null_in::<T, I>(NonNull::from(Box::leak(boxed)), deleter) }
    }

    /// Creates a reference taking ownership of `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live `T` whose ownership is transferred to the
    ///    new container.
    /// 2. `ptr` can be released by `deleter`. If `D` implements
    ///    [`DestroysBox`], it was allocated with [`Box`].
    #[inline]
    pub unsafe fn from_non_null_in<T, I>(ptr: NonNull<T>, deleter: D) -> Self
    where
        S: Member<T, I>,
    {
        // SAFETY:
        // 1. A pointer core created from a member is not empty.
        // 2. Guaranteed by the caller.
        // 3. Guaranteed by the caller.
        unsafe { Self::from_raw_parts(RawPtr::new::<T, I>(ptr), deleter) }
    }

    /// Returns the position of the active member in `S`.
    #[inline]
    pub fn index(&self) -> usize {
        self.as_raw().tagged_index() - 1
    }

    /// Returns a shared reference to the owned member.
    #[inline]
    pub fn as_ref(&self) -> VRef<'_, S> {
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. The pointee is live while `self` is borrowed, and only mutated
        //    through `&mut self`.
        unsafe { VRef::from_raw(self.as_raw()) }
    }

    /// Returns an exclusive reference to the owned member.
    #[inline]
    pub fn as_mut(&mut self) -> VMut<'_, S> {
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. The pointee is owned by `self`, which is exclusively borrowed for
        //    the returned lifetime.
        unsafe { VMut::from_raw(self.as_raw()) }
    }

    /// Returns a reference to the owned member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        S: Member<T, I>,
    {
        self.as_ref().get::<T, I>()
    }

    /// Returns a mutable reference to the owned member if it is of type `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Member<T, I>,
    {
        self.as_mut().downcast::<T, I>().ok()
    }

    /// Calls the handler of the owned member with a `&T` to it.
    #[inline]
    pub fn visit<'a, A, R>(&'a self, arms: A) -> R
    where
        A: Arms<'a, S, Shared<'a>, R>,
    {
        self.as_ref().visit(arms)
    }

    /// Like [`visit`](Self::visit), with [`Narrowed`] arguments.
    #[inline]
    pub fn visit_narrowed<'a, A, R>(&'a self, arms: A) -> R
    where
        A: Arms<'a, S, Narrowed<'a>, R>,
    {
        self.as_ref().visit_narrowed(arms)
    }

    /// Calls the handler of the owned member with a `&mut T` to it.
    #[inline]
    pub fn visit_mut<'a, A, R>(&'a mut self, arms: A) -> R
    where
        A: Arms<'a, S, Exclusive<'a>, R>,
    {
        self.as_mut().visit(arms)
    }

    /// Consumes the reference and hands the owned member to its handler, as
    /// a [`UvRef`] over its single-member set.
    #[inline]
    pub fn take<'a, A, R>(self, arms: A) -> R
    where
        A: Arms<'a, S, Owning<D>, R>,
    {
        let (raw, deleter) = self.into_raw_parts();
        trace_ownership!("take", "UvRef", raw.tagged_index());
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. The pointee is live and its ownership moves to the `UvRef` built
        //    by `Owning`, together with the deleter able to release it. We
        //    gave up ownership through `into_raw_parts`.
        unsafe { raw.visit(arms, Owning::new(deleter)) }
    }

    /// Releases the owned member, then takes ownership of `boxed`.
    #[inline]
    pub fn set<T, I>(&mut self, boxed: Box<T>)
    where
        S: Member<T, I>,
        D: DestroysBox,
    {
        let raw = RawPtr::new::<T, I>(NonNull::from(Box::leak(boxed)));
        // SAFETY:
        // 1. A pointer core created from a member is not empty.
        // 2. The box was leaked, so we are the only owner of its contents.
        // 3. `D` releases boxes.
        let previous = unsafe { self.replace_raw(raw) };
        trace_ownership!("reset", "UvRef", previous.tagged_index());
        let deleter = self.deleter();
        // SAFETY:
        // 1. `previous` is not empty.
        // 2. We owned its pointee, and `self` no longer refers to it.
        unsafe {
            previous.dispatch(DestroyWith { deleter });
        }
    }

    /// Converts the reference to a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> UvRef<Super, D>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        let (raw, deleter) = self.into_raw_parts();
        // SAFETY:
        // 1. Widening maps every non-empty index to a non-empty index.
        // 2. Ownership of the pointee and its deleter moves from `self`.
        unsafe { UvRef::from_raw_parts(raw.widen::<Super, I>(), deleter) }
    }

    /// Converts the reference to a subset of `S`.
    ///
    /// # Errors
    ///
    /// Fails if the active member is not part of `Sub`. The error holds the
    /// original reference, which still owns the member.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<UvRef<Sub, D>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        let Some(narrowed) = self.as_raw().narrow::<Sub, I>() else {
            return Err(NarrowError::new(self));
        };
        let (_, deleter) = self.into_raw_parts();
        // SAFETY:
        // 1. `self` is not empty, so a successful narrowing is not empty.
        // 2. Ownership of the pointee and its deleter moves from `self`.
        Ok(unsafe { UvRef::from_raw_parts(narrowed, deleter) })
    }

    /// Converts the deleter into another deleter type.
    #[inline]
    pub fn convert<D2>(self) -> UvRef<S, D2>
    where
        D: DestroysBox,
        D2: DestroysBox + From<D>,
    {
        let (raw, deleter) = self.into_raw_parts();
        // SAFETY:
        // 1. `raw` is not empty.
        // 2. Ownership of the pointee moves from `self`.
        // 3. `D` releases boxes, so the member is boxed, and `D2` releases
        //    boxes as well.
        unsafe { UvRef::from_raw_parts(raw, D2::from(deleter)) }
    }

    /// Swaps the members and deleters of two references.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }
}

impl<T, D: Destroy> UvRef<Leaf<T>, D> {
    /// Returns the owned member of a single-member reference.
    #[inline]
    fn member_ptr(&self) -> NonNull<T> {
        self.as_raw().address_or_dangling().cast::<T>()
    }

    /// Converts a single-member reference back into a [`Box`].
    #[inline]
    pub fn into_box(self) -> Box<T>
    where
        D: DestroysBox,
    {
        let (raw, _deleter) = self.into_raw_parts();
        let ptr = raw.address_or_dangling().cast::<T>();
        // SAFETY: `D` releases boxes, so the member was allocated with `Box`,
        // and `into_raw_parts` gave up ownership of it.
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    /// Moves the member of a single-member reference out of its allocation.
    #[inline]
    pub fn into_inner(self) -> T
    where
        D: DestroysBox,
    {
        *self.into_box()
    }
}

impl<T, D: Destroy> Deref for UvRef<Leaf<T>, D> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: `T` is the only member, so the pointee is a live `T`, and it
        // is only mutated through `&mut self`.
        unsafe { self.member_ptr().as_ref() }
    }
}

impl<T, D: Destroy> DerefMut for UvRef<Leaf<T>, D> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        let mut ptr = self.member_ptr();
        // SAFETY: `T` is the only member, so the pointee is a live `T` owned
        // by `self`, which is exclusively borrowed.
        unsafe { ptr.as_mut() }
    }
}

impl<S: TypeSet, D: Destroy> PartialEq for UvRef<S, D> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        util::identity(self.as_raw()) == util::identity(other.as_raw())
    }
}

impl<S: TypeSet, D: Destroy> Eq for UvRef<S, D> {}

impl<S: TypeSet, D: Destroy> PartialOrd for UvRef<S, D> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: TypeSet, D: Destroy> Ord for UvRef<S, D> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        util::identity(self.as_raw()).cmp(&util::identity(other.as_raw()))
    }
}

impl<S: TypeSet, D: Destroy> Hash for UvRef<S, D> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        util::identity(self.as_raw()).hash(state);
    }
}

impl<S: DebugSet, D: Destroy> fmt::Debug for UvRef<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String};
    use core::cell::Cell;

    use super::*;
    use crate::{UvPtr, deleter::BoxDelete};

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    type Tracked = types![u8, Counted];

    #[test]
    fn test_uvref_send_sync() {
        static_assertions::assert_impl_all!(UvRef<types![u8, String]>: Send, Sync, Unpin);
        static_assertions::assert_not_impl_any!(UvRef<types![u8, String]>: Copy, Clone, Default);
        static_assertions::assert_not_impl_any!(UvRef<types![Rc<u8>]>: Send, Sync);
    }

    #[test]
    fn test_take_always_reaches_a_member() {
        let drops = Rc::new(Cell::new(0));
        let owned = UvRef::<Tracked>::new(Counted(drops.clone()));
        let moved_out = owned.take(handlers![
            |_: UvRef<types![u8]>| None,
            |c: UvRef<types![Counted]>| Some(c.into_inner()),
        ]);
        assert_eq!(drops.get(), 0);
        drop(moved_out);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_set_replaces_member() {
        let drops = Rc::new(Cell::new(0));
        let mut owned = UvRef::<Tracked>::new(Counted(drops.clone()));
        owned.set(Box::new(9u8));
        assert_eq!(drops.get(), 1);
        assert_eq!(owned.get::<u8, _>(), Some(&9));
        *owned.get_mut::<u8, _>().unwrap() += 1;
        assert_eq!(owned.index(), 0);
        assert_eq!(owned.get::<u8, _>(), Some(&10));
    }

    #[test]
    fn test_single_member_deref() {
        let mut owned = UvRef::<types![String]>::new(String::from("de"));
        owned.push_str("ref");
        assert_eq!(&*owned, "deref");
        assert_eq!(*owned.into_box(), "deref");
    }

    #[test]
    fn test_narrow_and_into_ptr() {
        let drops = Rc::new(Cell::new(0));
        let owned = UvRef::<types![Counted]>::new(Counted(drops.clone()));
        let wide: UvRef<Tracked> = owned.widen();
        let wide = wide.try_narrow::<types![u8], _>().unwrap_err().into_inner();
        let ptr: UvPtr<Tracked> = wide.into();
        assert_eq!(ptr.index(), Some(1));
        assert_eq!(drops.get(), 0);
        drop(ptr);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_convert_to_shared_deleter() {
        let owned = UvRef::<types![u8, String], BoxDelete>::new(4u8);
        let shared: UvRef<types![u8, String], triomphe::Arc<BoxDelete>> = owned.convert();
        assert_eq!(shared.get::<u8, _>(), Some(&4));
        assert_eq!(**shared.deleter(), BoxDelete);
    }

    #[test]
    fn test_identity_keys() {
        let a = UvRef::<types![u8, String]>::new(1u8);
        let b = UvRef::<types![u8, String]>::new(1u8);
        assert_ne!(a, b);
        assert_eq!(a.as_ref(), a.as_ref());

        let mut set = hashbrown::HashSet::new();
        set.insert(a.as_ref());
        set.insert(b.as_ref());
        set.insert(a.as_ref());
        assert_eq!(set.len(), 2);
    }
}
