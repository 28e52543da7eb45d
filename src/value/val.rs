use core::{
    fmt,
    hash::{Hash, Hasher},
    ops::{Deref, DerefMut},
};

use vari_internals::{
    CloneSet, DebugSet, EqSet, HashableSet, OrdSet, PartialEqSet, PartialOrdSet, RawPtr, RawVal,
    typelist::{Leaf, Member, Subset, TypeSet},
};

use crate::{
    NarrowError, UvRef, VMut, VRef,
    deleter::BoxDelete,
    handlers::{Arms, ByValue, Exclusive, Narrowed, Shared},
    value::BoxIt,
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use vari_internals::{RawVal, typelist::TypeSet};

    /// An inline value holding one member of the type set `S`.
    ///
    /// [`VVal`] is what a Rust `enum` with one tuple variant per member would
    /// be, with the members listed by type. It is never empty, and derives
    /// its standard traits from its members: it is [`Clone`] when every
    /// member is, [`Ord`] when every member is, and so on.
    ///
    /// Values holding different members compare by member position, so
    /// `VVal<types![i32, String]>` orders every `i32` before every `String`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// type Token = types![u64, char, String];
    ///
    /// let mut tokens: Vec<VVal<Token>> = vec![
    ///     VVal::new(String::from("let")),
    ///     VVal::new('='),
    ///     VVal::new(42u64),
    /// ];
    /// tokens.sort();
    ///
    /// let kinds: Vec<usize> = tokens.iter().map(VVal::index).collect();
    /// assert_eq!(kinds, [0, 1, 2]);
    /// ```
    pub struct VVal<S: TypeSet> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. `raw` is not empty.
        raw: RawVal<S>,
    }

    impl<S: TypeSet> VVal<S> {
        /// Creates a value from an inline core.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `raw` is not empty.
        #[inline]
        pub(crate) unsafe fn from_raw(raw: RawVal<S>) -> Self {
            debug_assert!(!raw.is_empty());
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            Self { raw }
        }

        /// Returns the underlying inline core.
        #[inline]
        pub(crate) fn as_raw(&self) -> &RawVal<S> {
            &self.raw
        }

        /// Returns the underlying inline core mutably.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. The core is not empty when the returned borrow ends.
        #[inline]
        pub(crate) unsafe fn as_raw_mut(&mut self) -> &mut RawVal<S> {
            &mut self.raw
        }

        /// Consumes the value and returns the underlying inline core.
        #[inline]
        pub(crate) fn into_raw(self) -> RawVal<S> {
            // SAFETY: We are destroying `self`, so we no longer need to uphold
            // any safety invariants.
            self.raw
        }
    }
}
pub use limit_field_access::VVal;

impl<S: TypeSet> VVal<S> {
    /// Creates a value holding `value`.
    #[inline]
    pub fn new<T, I>(value: T) -> Self
    where
        S: Member<T, I>,
    {
        // SAFETY: A core created from a member is not empty.
        unsafe { Self::from_raw(RawVal::new::<T, I>(value)) }
    }

    /// Replaces the held member with `value`, dropping the previous one.
    #[inline]
    pub fn set<T, I>(&mut self, value: T)
    where
        S: Member<T, I>,
    {
        // The new member is in place before the old one is dropped, so a
        // panicking destructor cannot leave `self` empty.
        let previous = core::mem::replace(self, Self::new::<T, I>(value));
        drop(previous);
    }

    /// Returns the position of the held member in `S`.
    #[inline]
    pub fn index(&self) -> usize {
        self.as_raw().tagged_index() - 1
    }

    /// Returns a shared reference to the held member.
    #[inline]
    pub fn as_ref(&self) -> VRef<'_, S> {
        // SAFETY:
        // 1. The core is not empty.
        // 2. The member is live while `self` is borrowed, and only mutated
        //    through `&mut self`.
        unsafe { VRef::from_raw(self.as_raw().as_ptr()) }
    }

    /// Returns an exclusive reference to the held member.
    #[inline]
    pub fn as_mut(&mut self) -> VMut<'_, S> {
        // SAFETY: Only a pointer to the member is created, the core is not
        // emptied.
        let raw = unsafe { self.as_raw_mut() }.as_mut_ptr();
        // SAFETY:
        // 1. The core is not empty.
        // 2. The member is owned by `self`, which is exclusively borrowed for
        //    the returned lifetime.
        unsafe { VMut::from_raw(raw) }
    }

    /// Returns a reference to the held member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        S: Member<T, I>,
    {
        self.as_raw().get::<T, I>()
    }

    /// Returns a mutable reference to the held member if it is of type `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Member<T, I>,
    {
        // SAFETY: Borrowing the member does not empty the core.
        unsafe { self.as_raw_mut() }.get_mut::<T, I>()
    }

    /// Calls the handler of the held member with a `&T` to it.
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

    /// Calls the handler of the held member with a `&mut T` to it.
    #[inline]
    pub fn visit_mut<'a, A, R>(&'a mut self, arms: A) -> R
    where
        A: Arms<'a, S, Exclusive<'a>, R>,
    {
        self.as_mut().visit(arms)
    }

    /// Consumes the value and moves the held member into its handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let value: VVal<types![Vec<u8>, String]> = VVal::new(String::from("abc"));
    /// let bytes: Vec<u8> = value.take(handlers![|v: Vec<u8>| v, |s: String| s.into_bytes()]);
    /// assert_eq!(bytes, b"abc");
    /// ```
    #[inline]
    pub fn take<'a, A, R>(self, arms: A) -> R
    where
        A: Arms<'a, S, ByValue, R>,
    {
        let mut raw = self.into_raw();
        let ptr = raw.release();
        // SAFETY:
        // 1. The core was not empty.
        // 2. `release` gave up ownership of the member without dropping it,
        //    and `raw` stays in place until the member has been moved out.
        unsafe { ptr.visit(arms, ByValue) }
    }

    /// Moves the held member out if it is of type `T`.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if the held member is not a `T`.
    #[inline]
    pub fn downcast<T, I>(self) -> Result<T, Self>
    where
        S: Member<T, I>,
    {
        let mut raw = self.into_raw();
        match raw.take::<T, I>() {
            Some(value) => Ok(value),
            // SAFETY: A failed `take` leaves the core unchanged, so it is not
            // empty.
            None => Err(unsafe { Self::from_raw(raw) }),
        }
    }

    /// Moves the value into a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> VVal<Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        // SAFETY: Widening maps every non-empty index to a non-empty index.
        unsafe { VVal::from_raw(self.into_raw().widen::<Super, I>()) }
    }

    /// Clones the value into a superset of `S`.
    #[inline]
    pub fn widen_cloned<Super, I>(&self) -> VVal<Super>
    where
        S: CloneSet + Subset<Super, I>,
        Super: TypeSet,
    {
        // SAFETY: Widening maps every non-empty index to a non-empty index.
        unsafe { VVal::from_raw(self.as_raw().clone_widen::<Super, I>()) }
    }

    /// Moves the value into a subset of `S`.
    ///
    /// # Errors
    ///
    /// Fails if the held member is not part of `Sub`. The error holds the
    /// original value.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<VVal<Sub>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        match self.into_raw().narrow::<Sub, I>() {
            // SAFETY: A non-empty core narrows to a non-empty core.
            Ok(raw) => Ok(unsafe { VVal::from_raw(raw) }),
            // SAFETY: The core is returned unchanged, so it is not empty.
            Err(raw) => Err(NarrowError::new(unsafe { VVal::from_raw(raw) })),
        }
    }

    /// Swaps the members of two values.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Moves the held member to the heap.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::prelude::*;
    ///
    /// let value: VVal<types![u8, [u64; 32]]> = VVal::new([7u64; 32]);
    /// let boxed: UvRef<types![u8, [u64; 32]]> = value.into_uvref();
    /// assert_eq!(boxed.get::<[u64; 32], _>().map(|a| a[31]), Some(7));
    /// ```
    #[inline]
    pub fn into_uvref(self) -> UvRef<S, BoxDelete> {
        let mut raw = self.into_raw();
        let ptr = raw.release();
        let tagged = ptr.tagged_index();
        // SAFETY:
        // 1. The core was not empty.
        // 2. `release` gave up ownership of the member without dropping it,
        //    so it is moved into the box exactly once.
        let boxed = unsafe { ptr.dispatch(BoxIt) };
        // SAFETY:
        // 1. `tagged` is not zero and at most `S::LEN`.
        // 2. `boxed` points to a box holding member `tagged - 1`.
        let moved = unsafe { RawPtr::<S>::from_parts(tagged, boxed) };
        // SAFETY:
        // 1. `moved` is not empty.
        // 2. The box is owned by nobody else.
        // 3. `BoxDelete` releases boxes.
        unsafe { UvRef::from_raw_parts(moved, BoxDelete) }
    }
}

impl<T> VVal<Leaf<T>> {
    /// Moves the member out of a single-member value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.take(crate::handlers![|value: T| value])
    }
}

impl<T> Deref for VVal<Leaf<T>> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.as_ref().into_inner()
    }
}

impl<T> DerefMut for VVal<Leaf<T>> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.as_mut().into_inner()
    }
}

impl<S: CloneSet> Clone for VVal<S> {
    #[inline]
    fn clone(&self) -> Self {
        // SAFETY: Cloning a non-empty core produces a non-empty core.
        unsafe { Self::from_raw(self.as_raw().clone()) }
    }
}

impl<S: PartialEqSet> PartialEq for VVal<S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_raw() == other.as_raw()
    }
}

impl<S: EqSet> Eq for VVal<S> {}

impl<S: PartialOrdSet> PartialOrd for VVal<S> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        self.as_raw().partial_cmp(other.as_raw())
    }
}

impl<S: OrdSet> Ord for VVal<S> {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.as_raw().cmp(other.as_raw())
    }
}

impl<S: HashableSet> Hash for VVal<S> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_raw().hash(state);
    }
}

impl<S: DebugSet> fmt::Debug for VVal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_raw(), f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{
        collections::BTreeSet,
        rc::Rc,
        string::{String, ToString},
    };
    use core::cell::Cell;

    use super::*;

    type Set = types![i32, String];

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_vval_auto_traits() {
        static_assertions::assert_impl_all!(VVal<Set>: Send, Sync, Unpin, Clone, Ord, Hash);
        static_assertions::assert_not_impl_any!(VVal<Set>: Copy, Default);
        static_assertions::assert_not_impl_any!(VVal<types![i32, Rc<u8>]>: Send, Sync);
        static_assertions::assert_not_impl_any!(VVal<types![i32, f32]>: Eq, Hash);
        static_assertions::assert_impl_all!(VVal<types![i32, f32]>: PartialOrd);
    }

    #[test]
    fn test_vval_layout() {
        assert_eq!(
            core::mem::size_of::<VVal<types![u8, u16]>>(),
            2 * core::mem::size_of::<u16>()
        );
        assert_eq!(
            core::mem::align_of::<VVal<types![u8, u64]>>(),
            core::mem::align_of::<u64>()
        );
    }

    #[test]
    fn test_set_and_visit() {
        let mut value = VVal::<Set>::new(1i32);
        value.visit_mut(handlers![|i: &mut i32| *i *= 5, |s: &mut String| s.clear()]);
        assert_eq!(value.get::<i32, _>(), Some(&5));

        value.set(String::from("replaced"));
        assert_eq!(value.index(), 1);
        let text = value.visit(handlers![|i: &i32| i.to_string(), |s: &String| s.clone()]);
        assert_eq!(text, "replaced");
    }

    #[test]
    fn test_swap_different_members() {
        let drops = Rc::new(Cell::new(0));
        type Tracked = types![i32, Counted];

        let mut a = VVal::<Tracked>::new(3i32);
        let mut b = VVal::<Tracked>::new(Counted(drops.clone()));
        a.swap(&mut b);
        assert_eq!(a.index(), 1);
        assert_eq!(b.get::<i32, _>(), Some(&3));
        assert_eq!(drops.get(), 0);
        drop(a);
        drop(b);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_take_moves_out_once() {
        let drops = Rc::new(Cell::new(0));
        let value = VVal::<types![u8, Counted]>::new(Counted(drops.clone()));
        let counted = value.take(handlers![|_: u8| None, |c: Counted| Some(c)]);
        assert_eq!(drops.get(), 0);
        drop(counted);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_downcast() {
        let value = VVal::<Set>::new(String::from("inner"));
        let value = value.downcast::<i32, _>().unwrap_err();
        assert_eq!(value.downcast::<String, _>().unwrap(), "inner");
    }

    #[test]
    fn test_conversions() {
        let value = VVal::<Set>::new(9i32);
        let wide: VVal<types![String, f64, i32]> = value.widen_cloned();
        assert_eq!(wide.index(), 2);

        let wide = wide.try_narrow::<types![f64], _>().unwrap_err().into_inner();
        let back = wide.try_narrow::<Set, _>().unwrap();
        assert_eq!(back, value);

        let only = back.try_narrow::<types![i32], _>().unwrap();
        assert_eq!(*only, 9);
        assert_eq!(only.into_inner(), 9);
    }

    #[test]
    fn test_into_uvref_moves_once() {
        let drops = Rc::new(Cell::new(0));
        let value = VVal::<types![u8, Counted]>::new(Counted(drops.clone()));
        let boxed = value.into_uvref();
        assert_eq!(boxed.index(), 1);
        assert_eq!(drops.get(), 0);
        drop(boxed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_structural_keys() {
        let values = [
            VVal::<Set>::new(String::from("b")),
            VVal::new(2i32),
            VVal::new(String::from("a")),
            VVal::new(1i32),
            VVal::new(2i32),
        ];

        let sorted: BTreeSet<_> = values.iter().cloned().collect();
        let debug: alloc::vec::Vec<String> = sorted.iter().map(|v| alloc::format!("{v:?}")).collect();
        assert_eq!(debug, ["1", "2", "\"a\"", "\"b\""]);

        let hashed: hashbrown::HashSet<_> = values.iter().cloned().collect();
        assert_eq!(hashed.len(), 4);
        assert!(hashed.contains(&VVal::<Set>::new(1i32)));

        let mut fx: hashbrown::HashMap<_, _, rustc_hash::FxBuildHasher> = Default::default();
        for (n, value) in values.iter().enumerate() {
            fx.insert(value.clone(), n);
        }
        assert_eq!(fx[&VVal::<Set>::new(2i32)], 4);

        let indexed: indexmap::IndexSet<_> = values.into_iter().collect();
        assert_eq!(indexed.get_index_of(&VVal::<Set>::new(String::from("a"))), Some(2));
    }
}
