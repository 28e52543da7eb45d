use alloc::boxed::Box;
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
    NarrowError, UvRef, VMut, VPtr,
    deleter::{Destroy, DestroysBox},
    handlers::{Exclusive, Narrowed, NullableArms, Owning, Shared},
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

    /// A nullable owning pointer to one member of the type set `S`.
    ///
    /// [`UvPtr`] behaves like `Option<Box<T>>` for a `T` chosen at runtime
    /// among the members of `S`, except that the member is released through
    /// the deleter `D` instead of always being a [`Box`](alloc::boxed::Box).
    ///
    /// It is move-only. Ownership leaves it through [`take`], [`release`] or
    /// [`into_raw_parts`], each of which leaves nothing behind to destroy a
    /// second time.
    ///
    /// Pointers compare, order and hash by the identity of the owned member.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let owned: UvPtr<types![i32, String]> = UvPtr::new(String::from("heap"));
    ///
    /// let len = owned.take(handlers![
    ///     |_: Empty| 0,
    ///     |i: UvRef<types![i32]>| i.into_inner() as usize,
    ///     |s: UvRef<types![String]>| s.into_inner().len(),
    /// ]);
    /// assert_eq!(len, 4);
    /// ```
    ///
    /// [`take`]: UvPtr::take
    /// [`release`]: UvPtr::release
    /// [`into_raw_parts`]: UvPtr::into_raw_parts
    pub struct UvPtr<S: TypeSet, D: Destroy = BoxDelete> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. If `raw` is not empty, its pointee is live and owned by this
        ///    container: nothing else reads, writes or releases it.
        /// 2. If `raw` is not empty, its pointee can be released by
        ///    `deleter`.
        raw: RawPtr<S>,
        deleter: D,
    }

    impl<S: TypeSet, D: Destroy> UvPtr<S, D> {
        /// Creates a pointer from a pointer core and a deleter.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. If `raw` is not empty, ownership of its pointee is transferred to
        ///    the new container.
        /// 2. If `raw` is not empty, its pointee can be released by `deleter`.
        #[inline]
        pub unsafe fn from_raw_parts(raw: RawPtr<S>, deleter: D) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
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
            // SAFETY: Invariant 2 is guaranteed by the caller.
            &mut self.deleter
        }

        /// Splits the pointer into its pointer core and deleter, giving up
        /// ownership of the member without releasing it.
        #[inline]
        pub fn into_raw_parts(self) -> (RawPtr<S>, D) {
            let this = ManuallyDrop::new(self);
            // SAFETY: `this` is never dropped or used again, so the deleter is
            // moved out exactly once.
            let deleter = unsafe { ptr::read(&this.deleter) };
            (this.raw, deleter)
        }

        /// Gives up ownership of the member without releasing it, leaving the
        /// pointer empty.
        ///
        /// The returned pointer core refers to the member that was owned. The
        /// caller becomes responsible for releasing it.
        #[inline]
        pub fn release(&mut self) -> RawPtr<S> {
            trace_ownership!("release", "UvPtr", self.raw.tagged_index());
            // SAFETY: An empty pointer core trivially upholds the invariants.
            unsafe { self.replace_raw(RawPtr::empty()) }
        }

        /// Replaces the pointer core, returning the previous one.
        ///
        /// Ownership of the previous pointee, if any, moves to the caller.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. If `raw` is not empty, ownership of its pointee is transferred to
        ///    this container.
        /// 2. If `raw` is not empty, its pointee can be released by the
        ///    deleter of this container.
        #[inline]
        pub(crate) unsafe fn replace_raw(&mut self, raw: RawPtr<S>) -> RawPtr<S> {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            core::mem::replace(&mut self.raw, raw)
        }
    }

    impl<S: TypeSet, D: Destroy> Drop for UvPtr<S, D> {
        fn drop(&mut self) {
            if self.raw.is_empty() {
                return;
            }
            trace_ownership!("destroy", "UvPtr", self.raw.tagged_index());
            let deleter = &self.deleter;
            // SAFETY:
            // 1. The pointer is not empty.
            // 2. The pointee is live, owned by us and releasable by `deleter`
            //    (invariants 1 and 2). It is never used again since `self` is
            //    being dropped.
            unsafe {
                self.raw.dispatch(DestroyWith { deleter });
            }
        }
    }
}
pub use limit_field_access::UvPtr;

// SAFETY: A `UvPtr` owns one member and its deleter, like an
// `(Option<Box<T>>, D)` would. The union is `Send` exactly when every member
// is.
unsafe impl<S: TypeSet, D: Destroy + Send> Send for UvPtr<S, D> where S::Union: Send {}

// SAFETY: Shared access to a `UvPtr` only gives shared access to the member
// and the deleter.
unsafe impl<S: TypeSet, D: Destroy + Sync> Sync for UvPtr<S, D> where S::Union: Sync {}

impl<S: TypeSet, D: Destroy + Default> UvPtr<S, D> {
    /// Creates an empty pointer.
    #[inline]
    pub fn empty() -> Self {
        Self::empty_in(D::default())
    }
}

impl<S: TypeSet, D: DestroysBox + Default> UvPtr<S, D> {
    /// Moves `value` to the heap and creates a pointer owning it.
    #[inline]
    pub fn new<T, I>(value: T) -> Self
    where
        S: Member<T, I>,
    {
        Self::new_in(value, D::default())
    }

    /// Creates a pointer owning a boxed member.
    #[inline]
    pub fn from_box<T, I>(boxed: Box<T>) -> Self
    where
        S: Member<T, I>,
    {
        Self::from_box_in(boxed, D::default())
    }
}

impl<S: TypeSet, D: Destroy> UvPtr<S, D> {
    /// Creates an empty pointer with the given deleter.
    #[inline]
    pub fn empty_in(deleter: D) -> Self {
        // SAFETY: The pointer is empty.
        unsafe { Self::from_raw_parts(RawPtr::empty(), deleter) }
    }

    /// Moves `value` to the heap and creates a pointer owning it, released
    /// by `deleter`.
    #[inline]
    pub fn new_in<T, I>(value: T, deleter: D) -> Self
    where
        S: Member<T, I>,
        D: DestroysBox,
    {
        Self::from_box_in(Box::new(value), deleter)
    }

    /// Creates a pointer owning a boxed member, released by `deleter`.
    #[inline]
    pub fn from_box_in<T, I>(boxed: Box<T>, deleter: D) -> Self
    where
        S: Member<T, I>,
        D: DestroysBox,
    {
        let raw = RawPtr::new::<T, I>(NonNull::from(Box::leak(boxed)));
        // SAFETY:
        // 1. The box was leaked, so we are the only owner of its contents.
        // 2. `D` releases boxes.
        unsafe { Self::from_raw_parts(raw, deleter) }
    }

    /// Creates a pointer taking ownership of `ptr`. A null `ptr` creates an
    /// empty pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. If `ptr` is not null, it points to a live `T` whose ownership is
    ///    transferred to the new container.
    /// 2. If `ptr` is not null, it can be released by `deleter`. If `D`
    ///    implements [`DestroysBox`], it was allocated with [`Box`].
    #[inline]
    pub unsafe fn from_raw_in<T, I>(ptr: *mut T, deleter: D) -> Self
    where
        S: Member<T, I>,
    {
        let raw = NonNull::new(ptr).map_or_else(RawPtr::<S>::empty, RawPtr::<S>::new::<T, I>);
        // SAFETY: Guaranteed by the caller.
        unsafe { Self::from_raw_parts(raw, deleter) }
    }

    /// Returns `true` if the pointer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_raw().is_empty()
    }

    /// Returns the position of the active member in `S`, or `None` if the
    /// pointer is empty.
    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.as_raw().tagged_index().checked_sub(1)
    }

    /// Returns a non-owning pointer to the owned member.
    #[inline]
    pub fn as_ptr(&self) -> VPtr<'_, S> {
        // SAFETY:
        // 1. If not empty, the pointee is live while `self` is borrowed, and
        //    only mutated through `&mut self`.
        unsafe { VPtr::from_raw(self.as_raw()) }
    }

    /// Returns an exclusive reference to the owned member, or `None` if the
    /// pointer is empty.
    #[inline]
    pub fn as_mut(&mut self) -> Option<VMut<'_, S>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY:
        // 1. The pointer is not empty.
        // 2. The pointee is owned by `self`, which is exclusively borrowed
        //    for the returned lifetime.
        Some(unsafe { VMut::from_raw(self.as_raw()) })
    }

    /// Returns a reference to the owned member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        S: Member<T, I>,
    {
        self.as_ptr().get::<T, I>()
    }

    /// Returns a mutable reference to the owned member if it is of type `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Member<T, I>,
    {
        self.as_mut()?.downcast::<T, I>().ok()
    }

    /// Calls the handler of the empty state or of the owned member, with a
    /// `&T` to it.
    #[inline]
    pub fn visit<'a, A, R>(&'a self, arms: A) -> R
    where
        A: NullableArms<'a, S, Shared<'a>, R>,
    {
        self.as_ptr().visit(arms)
    }

    /// Like [`visit`](Self::visit), with [`Narrowed`] arguments.
    #[inline]
    pub fn visit_narrowed<'a, A, R>(&'a self, arms: A) -> R
    where
        A: NullableArms<'a, S, Narrowed<'a>, R>,
    {
        self.as_ptr().visit_narrowed(arms)
    }

    /// Calls the handler of the empty state or of the owned member, with a
    /// `&mut T` to it.
    #[inline]
    pub fn visit_mut<'a, A, R>(&'a mut self, arms: A) -> R
    where
        A: NullableArms<'a, S, Exclusive<'a>, R>,
    {
        // SAFETY:
        // 1. If not empty, the pointee is live and owned by `self`, which is
        //    exclusively borrowed for `'a`.
        unsafe { self.as_raw().visit_nullable(arms, Exclusive::new()) }
    }

    /// Consumes the pointer and hands the owned member to its handler, as a
    /// [`UvRef`] over its single-member set. Calls the handler of the empty
    /// state instead if the pointer is empty.
    ///
    /// Exactly one handler is called, and the member is released exactly
    /// once: by the handler's [`UvRef`] when it is dropped.
    #[inline]
    pub fn take<'a, A, R>(self, arms: A) -> R
    where
        A: NullableArms<'a, S, Owning<D>, R>,
    {
        let (raw, deleter) = self.into_raw_parts();
        trace_ownership!("take", "UvPtr", raw.tagged_index());
        // SAFETY:
        // 1. If not empty, the pointee is live and its ownership moves to the
        //    `UvRef` built by `Owning`, together with the deleter able to
        //    release it. We gave up ownership through `into_raw_parts`.
        unsafe { raw.visit_nullable(arms, Owning::new(deleter)) }
    }

    /// Releases the owned member, leaving the pointer empty.
    #[inline]
    pub fn reset(&mut self) {
        let raw = self.release();
        if raw.is_empty() {
            return;
        }
        trace_ownership!("reset", "UvPtr", raw.tagged_index());
        let deleter = self.deleter();
        // SAFETY:
        // 1. `raw` is not empty.
        // 2. We owned the pointee, and `release` gave up that ownership
        //    without releasing it. `self` no longer refers to it.
        unsafe {
            raw.dispatch(DestroyWith { deleter });
        }
    }

    /// Releases the owned member, then takes ownership of `boxed`.
    #[inline]
    pub fn set<T, I>(&mut self, boxed: Box<T>)
    where
        S: Member<T, I>,
        D: DestroysBox,
    {
        self.reset();
        let raw = RawPtr::new::<T, I>(NonNull::from(Box::leak(boxed)));
        // SAFETY:
        // 1. The box was leaked, so we are the only owner of its contents.
        // 2. `D` releases boxes.
        let previous = unsafe { self.replace_raw(raw) };
        debug_assert!(previous.is_empty());
    }

    /// Converts the pointer into a [`UvRef`], or returns `None` if it is
    /// empty.
    #[inline]
    pub fn into_ref(self) -> Option<UvRef<S, D>> {
        let (raw, deleter) = self.into_raw_parts();
        if raw.is_empty() {
            return None;
        }
        // SAFETY:
        // 1. `raw` is not empty.
        // 2. Ownership of the pointee and its deleter moves from `self`.
        Some(unsafe { UvRef::from_raw_parts(raw, deleter) })
    }

    /// Converts the pointer to a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> UvPtr<Super, D>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        let (raw, deleter) = self.into_raw_parts();
        // SAFETY: Ownership of the pointee and its deleter moves from `self`.
        unsafe { UvPtr::from_raw_parts(raw.widen::<Super, I>(), deleter) }
    }

    /// Converts the pointer to a subset of `S`. An empty pointer narrows to
    /// an empty pointer.
    ///
    /// # Errors
    ///
    /// Fails if the active member is not part of `Sub`. The error holds the
    /// original pointer, which still owns the member.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<UvPtr<Sub, D>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        let Some(narrowed) = self.as_raw().narrow::<Sub, I>() else {
            return Err(NarrowError::new(self));
        };
        let (_, deleter) = self.into_raw_parts();
        // SAFETY: Ownership of the pointee and its deleter moves from `self`.
        Ok(unsafe { UvPtr::from_raw_parts(narrowed, deleter) })
    }

    /// Converts the deleter into another deleter type.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::{deleter::BoxDelete, prelude::*};
    ///
    /// let owned: UvPtr<types![u8, char]> = UvPtr::new('v');
    /// let shared: UvPtr<types![u8, char], triomphe::Arc<BoxDelete>> = owned.convert();
    /// assert_eq!(shared.get::<char, _>(), Some(&'v'));
    /// ```
    #[inline]
    pub fn convert<D2>(self) -> UvPtr<S, D2>
    where
        D: DestroysBox,
        D2: DestroysBox + From<D>,
    {
        let (raw, deleter) = self.into_raw_parts();
        // SAFETY:
        // 1. Ownership of the pointee moves from `self`.
        // 2. `D` releases boxes, so the member is boxed, and `D2` releases
        //    boxes as well.
        unsafe { UvPtr::from_raw_parts(raw, D2::from(deleter)) }
    }

    /// Swaps the members and deleters of two pointers.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }
}

impl<S: TypeSet, D: Destroy + Default> Default for UvPtr<S, D> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: TypeSet, D: Destroy> From<UvRef<S, D>> for UvPtr<S, D> {
    #[inline]
    fn from(value: UvRef<S, D>) -> Self {
        let (raw, deleter) = value.into_raw_parts();
        // SAFETY: Ownership of the pointee and its deleter moves from `value`.
        unsafe { UvPtr::from_raw_parts(raw, deleter) }
    }
}

impl<S: TypeSet, D: Destroy> PartialEq for UvPtr<S, D> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        util::identity(self.as_raw()) == util::identity(other.as_raw())
    }
}

impl<S: TypeSet, D: Destroy> Eq for UvPtr<S, D> {}

impl<S: TypeSet, D: Destroy> PartialOrd for UvPtr<S, D> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: TypeSet, D: Destroy> Ord for UvPtr<S, D> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        util::identity(self.as_raw()).cmp(&util::identity(other.as_raw()))
    }
}

impl<S: TypeSet, D: Destroy> Hash for UvPtr<S, D> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        util::identity(self.as_raw()).hash(state);
    }
}

impl<S: DebugSet, D: Destroy> fmt::Debug for UvPtr<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_ptr(), f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String, vec::Vec};
    use core::cell::Cell;

    use super::*;
    use crate::{deleter::BoxDelete, markers::Empty};

    type Set = types![i32, String];

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    type Tracked = types![u8, Counted];

    #[derive(Default)]
    struct CountingDelete(Cell<usize>);

    impl Destroy for CountingDelete {
        unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
            self.0.set(self.0.get() + 1);
            // SAFETY: Forwarded from our caller.
            unsafe { BoxDelete.destroy(ptr) }
        }
    }

    // SAFETY: Releases members through `BoxDelete`.
    unsafe impl DestroysBox for CountingDelete {}

    #[test]
    fn test_uvptr_send_sync() {
        static_assertions::assert_impl_all!(UvPtr<Set>: Send, Sync, Unpin, Default);
        static_assertions::assert_not_impl_any!(UvPtr<Set>: Copy, Clone);
        static_assertions::assert_not_impl_any!(UvPtr<types![Rc<u8>]>: Send, Sync);
        static_assertions::assert_impl_all!(UvPtr<types![Cell<u8>]>: Send);
        static_assertions::assert_not_impl_any!(UvPtr<types![Cell<u8>]>: Sync);
        static_assertions::assert_not_impl_any!(UvPtr<Set, &'static CountingDelete>: Send, Sync);
    }

    #[test]
    fn test_uvptr_size() {
        assert_eq!(
            core::mem::size_of::<UvPtr<Set>>(),
            2 * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_drop_releases_once() {
        let drops = Rc::new(Cell::new(0));
        let owned = UvPtr::<Tracked>::new(Counted(drops.clone()));
        assert_eq!(owned.index(), Some(1));
        drop(owned);
        assert_eq!(drops.get(), 1);

        let empty = UvPtr::<Tracked>::empty();
        drop(empty);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_take_transfers_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        let owned = UvPtr::<Tracked>::new(Counted(drops.clone()));
        let kept = owned.take(handlers![
            |_: Empty| None,
            |_: UvRef<types![u8]>| None,
            |c: UvRef<types![Counted]>| Some(c),
        ]);
        assert_eq!(drops.get(), 0);
        drop(kept);
        assert_eq!(drops.get(), 1);

        let empty_taken = UvPtr::<Tracked>::empty().take(handlers![
            |_: Empty| true,
            |_: UvRef<types![u8]>| false,
            |_: UvRef<types![Counted]>| false,
        ]);
        assert!(empty_taken);
    }

    #[test]
    fn test_release_gives_up_ownership() {
        let drops = Rc::new(Cell::new(0));
        let mut owned = UvPtr::<Tracked>::new(Counted(drops.clone()));
        let raw = owned.release();
        assert!(owned.is_empty());
        drop(owned);
        assert_eq!(drops.get(), 0);

        // SAFETY: `raw` owns a boxed member that nothing else owns.
        let owned = unsafe { UvPtr::from_raw_parts(raw, BoxDelete) };
        assert_eq!(owned.index(), Some(1));
        drop(owned);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_reset_and_set() {
        let drops = Rc::new(Cell::new(0));
        let mut owned = UvPtr::<Tracked>::new(Counted(drops.clone()));
        owned.set(Box::new(3u8));
        assert_eq!(drops.get(), 1);
        assert_eq!(owned.get::<u8, _>(), Some(&3));
        owned.set(Box::new(Counted(drops.clone())));
        owned.reset();
        assert_eq!(drops.get(), 2);
        assert!(owned.is_empty());
        owned.reset();
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_null_raw_pointer_is_empty() {
        // SAFETY: A null pointer transfers nothing.
        let owned = unsafe { UvPtr::<Set>::from_raw_in(core::ptr::null_mut::<i32>(), BoxDelete) };
        assert!(owned.is_empty());

        let raw = Box::into_raw(Box::new(5i32));
        // SAFETY: `raw` comes from a box that nothing else owns.
        let owned = unsafe { UvPtr::<Set>::from_raw_in(raw, BoxDelete) };
        assert_eq!(owned.get::<i32, _>(), Some(&5));
    }

    #[test]
    fn test_widen_narrow_keep_member() {
        let drops = Rc::new(Cell::new(0));
        let owned = UvPtr::<types![Counted]>::new(Counted(drops.clone()));
        let wide: UvPtr<Tracked> = owned.widen();
        assert_eq!(wide.index(), Some(1));
        let wide = wide.try_narrow::<types![u8], _>().unwrap_err().into_inner();
        assert_eq!(drops.get(), 0);
        let back = wide.try_narrow::<types![Counted], _>().unwrap();
        assert_eq!(back.index(), Some(0));
        drop(back);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_borrowed_deleter() {
        let deleter = CountingDelete::default();
        {
            let mut a = UvPtr::<Set, &CountingDelete>::new_in(1i32, &deleter);
            let mut b = UvPtr::<Set, &CountingDelete>::empty_in(&deleter);
            a.swap(&mut b);
            assert!(a.is_empty());
            assert_eq!(b.get::<i32, _>(), Some(&1));
            b.visit_mut(handlers![|_: Empty| (), |i: &mut i32| *i += 1, |_: &mut String| ()]);
            assert_eq!(b.get::<i32, _>(), Some(&2));
        }
        assert_eq!(deleter.0.get(), 1);
    }

    #[test]
    fn test_shared_deleter_conversion() {
        let deleter = triomphe::Arc::new(CountingDelete::default());
        let owned = UvPtr::<Set, _>::new_in(String::from("arc"), deleter.clone());
        let as_ref = owned.into_ref().unwrap();
        let back: UvPtr<Set, _> = as_ref.into();
        drop(back);
        assert_eq!(deleter.0.get(), 1);
    }

    #[test]
    fn test_identity_keys() {
        let mut owned: Vec<UvPtr<Set>> = Vec::new();
        owned.push(UvPtr::new(1i32));
        owned.push(UvPtr::new(1i32));
        owned.push(UvPtr::empty());

        let mut set = indexmap::IndexSet::new();
        for ptr in &owned {
            set.insert(ptr.as_ptr());
        }
        assert_eq!(set.len(), 3);
        assert_ne!(owned[0], owned[1]);
        assert!(owned[2] < owned[0]);
    }
}
