//! Standard trait operations applied to the member at a runtime index.
//!
//! Each trait here is implemented for a type set exactly when every member
//! implements the corresponding standard trait. The methods take a runtime
//! index and type-erased addresses, walk down the set's tree to the leaf at
//! that index, and forward to the member's own implementation.

use core::{cmp::Ordering, fmt, hash::Hasher, ptr::NonNull};

use crate::{
    typelist::{Leaf, Nil, Node, Quarter, TypeSet},
    util::Erased,
};

/// Every member of the set implements [`Clone`].
pub trait CloneSet: TypeSet {
    /// Clones the member at `index` from `src` into `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index < Self::LEN`.
    /// 2. `src` points to a live value of the member at `index`.
    /// 3. `dst` is valid for writes of the member at `index`.
    unsafe fn clone_at(index: usize, src: NonNull<Erased>, dst: NonNull<Erased>);
}

/// Every member of the set implements [`PartialEq`].
pub trait PartialEqSet: TypeSet {
    /// Compares two values of the member at `index`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index < Self::LEN`.
    /// 2. `lhs` and `rhs` point to live values of the member at `index`.
    unsafe fn eq_at(index: usize, lhs: NonNull<Erased>, rhs: NonNull<Erased>) -> bool;
}

/// Every member of the set implements [`Eq`].
pub trait EqSet: PartialEqSet {}

/// Every member of the set implements [`PartialOrd`].
pub trait PartialOrdSet: PartialEqSet {
    /// Compares two values of the member at `index`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`PartialEqSet::eq_at`].
    unsafe fn partial_cmp_at(
        index: usize,
        lhs: NonNull<Erased>,
        rhs: NonNull<Erased>,
    ) -> Option<Ordering>;
}

/// Every member of the set implements [`Ord`].
pub trait OrdSet: EqSet + PartialOrdSet {
    /// Compares two values of the member at `index`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`PartialEqSet::eq_at`].
    unsafe fn cmp_at(index: usize, lhs: NonNull<Erased>, rhs: NonNull<Erased>) -> Ordering;
}

/// Every member of the set implements [`Hash`](core::hash::Hash).
pub trait HashableSet: TypeSet {
    /// Hashes the value of the member at `index`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index < Self::LEN`.
    /// 2. `ptr` points to a live value of the member at `index`.
    unsafe fn hash_at<H: Hasher>(index: usize, ptr: NonNull<Erased>, state: &mut H);
}

/// Every member of the set implements [`Debug`](fmt::Debug).
pub trait DebugSet: TypeSet {
    /// Formats the value of the member at `index`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`HashableSet::hash_at`].
    unsafe fn fmt_at(index: usize, ptr: NonNull<Erased>, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Implements the traits of this module for [`Nil`], where every method is
/// unreachable.
macro_rules! unreachable_for_nil {
    () => {
        // SAFETY: The caller guarantees `index < Nil::LEN`, which is
        // impossible.
        unsafe { core::hint::unreachable_unchecked() }
    };
}

impl CloneSet for Nil {
    unsafe fn clone_at(_index: usize, _src: NonNull<Erased>, _dst: NonNull<Erased>) {
        unreachable_for_nil!()
    }
}

impl PartialEqSet for Nil {
    unsafe fn eq_at(_index: usize, _lhs: NonNull<Erased>, _rhs: NonNull<Erased>) -> bool {
        unreachable_for_nil!()
    }
}

impl EqSet for Nil {}

impl PartialOrdSet for Nil {
    unsafe fn partial_cmp_at(
        _index: usize,
        _lhs: NonNull<Erased>,
        _rhs: NonNull<Erased>,
    ) -> Option<Ordering> {
        unreachable_for_nil!()
    }
}

impl OrdSet for Nil {
    unsafe fn cmp_at(_index: usize, _lhs: NonNull<Erased>, _rhs: NonNull<Erased>) -> Ordering {
        unreachable_for_nil!()
    }
}

impl HashableSet for Nil {
    unsafe fn hash_at<H: Hasher>(_index: usize, _ptr: NonNull<Erased>, _state: &mut H) {
        unreachable_for_nil!()
    }
}

impl DebugSet for Nil {
    unsafe fn fmt_at(
        _index: usize,
        _ptr: NonNull<Erased>,
        _f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        unreachable_for_nil!()
    }
}

/// Forwards a method call on a [`Node`] to the branch holding `index`.
macro_rules! route {
    ($index:expr, $trait:ident :: $method:ident ($($arg:expr),*)) => {
        match Quarter::locate::<A, B, C>($index) {
            // SAFETY: Member `i` of `A` is member `index` of the set.
            Quarter::A(i) => unsafe { <A as $trait>::$method(i, $($arg),*) },
            // SAFETY: Member `i` of `B` is member `index` of the set.
            Quarter::B(i) => unsafe { <B as $trait>::$method(i, $($arg),*) },
            // SAFETY: Member `i` of `C` is member `index` of the set.
            Quarter::C(i) => unsafe { <C as $trait>::$method(i, $($arg),*) },
            // SAFETY: The caller guarantees `index < Self::LEN`, so member `i`
            // of `D` is member `index` of the set.
            Quarter::D(i) => unsafe { <D as $trait>::$method(i, $($arg),*) },
        }
    };
}

impl<T: Clone> CloneSet for Leaf<T> {
    #[inline]
    unsafe fn clone_at(_index: usize, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: The only member is `T`, and the caller guarantees `src`
        // points to a live value of it.
        let value = unsafe { src.cast::<T>().as_ref() }.clone();
        // SAFETY: The caller guarantees `dst` is valid for writes of `T`.
        unsafe {
            dst.cast::<T>().write(value);
        }
    }
}

impl<A: CloneSet, B: CloneSet, C: CloneSet, D: CloneSet> CloneSet for Node<A, B, C, D> {
    #[inline]
    unsafe fn clone_at(index: usize, src: NonNull<Erased>, dst: NonNull<Erased>) {
        route!(index, CloneSet::clone_at(src, dst))
    }
}

impl<T: PartialEq> PartialEqSet for Leaf<T> {
    #[inline]
    unsafe fn eq_at(_index: usize, lhs: NonNull<Erased>, rhs: NonNull<Erased>) -> bool {
        // SAFETY: Both pointers point to live values of `T`.
        let lhs = unsafe { lhs.cast::<T>().as_ref() };
        // SAFETY: Same as above.
        let rhs = unsafe { rhs.cast::<T>().as_ref() };
        lhs == rhs
    }
}

impl<A, B, C, D> PartialEqSet for Node<A, B, C, D>
where
    A: PartialEqSet,
    B: PartialEqSet,
    C: PartialEqSet,
    D: PartialEqSet,
{
    #[inline]
    unsafe fn eq_at(index: usize, lhs: NonNull<Erased>, rhs: NonNull<Erased>) -> bool {
        route!(index, PartialEqSet::eq_at(lhs, rhs))
    }
}

impl<T: Eq> EqSet for Leaf<T> {}

impl<A: EqSet, B: EqSet, C: EqSet, D: EqSet> EqSet for Node<A, B, C, D> {}

impl<T: PartialOrd> PartialOrdSet for Leaf<T> {
    #[inline]
    unsafe fn partial_cmp_at(
        _index: usize,
        lhs: NonNull<Erased>,
        rhs: NonNull<Erased>,
    ) -> Option<Ordering> {
        // SAFETY: Both pointers point to live values of `T`.
        let lhs = unsafe { lhs.cast::<T>().as_ref() };
        // SAFETY: Same as above.
        let rhs = unsafe { rhs.cast::<T>().as_ref() };
        lhs.partial_cmp(rhs)
    }
}

impl<A, B, C, D> PartialOrdSet for Node<A, B, C, D>
where
    A: PartialOrdSet,
    B: PartialOrdSet,
    C: PartialOrdSet,
    D: PartialOrdSet,
{
    #[inline]
    unsafe fn partial_cmp_at(
        index: usize,
        lhs: NonNull<Erased>,
        rhs: NonNull<Erased>,
    ) -> Option<Ordering> {
        route!(index, PartialOrdSet::partial_cmp_at(lhs, rhs))
    }
}

impl<T: Ord> OrdSet for Leaf<T> {
    #[inline]
    unsafe fn cmp_at(_index: usize, lhs: NonNull<Erased>, rhs: NonNull<Erased>) -> Ordering {
        // SAFETY: Both pointers point to live values of `T`.
        let lhs = unsafe { lhs.cast::<T>().as_ref() };
        // SAFETY: Same as above.
        let rhs = unsafe { rhs.cast::<T>().as_ref() };
        lhs.cmp(rhs)
    }
}

impl<A: OrdSet, B: OrdSet, C: OrdSet, D: OrdSet> OrdSet for Node<A, B, C, D> {
    #[inline]
    unsafe fn cmp_at(index: usize, lhs: NonNull<Erased>, rhs: NonNull<Erased>) -> Ordering {
        route!(index, OrdSet::cmp_at(lhs, rhs))
    }
}

impl<T: core::hash::Hash> HashableSet for Leaf<T> {
    #[inline]
    unsafe fn hash_at<H: Hasher>(_index: usize, ptr: NonNull<Erased>, state: &mut H) {
        // SAFETY: The caller guarantees `ptr` points to a live `T`.
        let value = unsafe { ptr.cast::<T>().as_ref() };
        core::hash::Hash::hash(value, state);
    }
}

impl<A, B, C, D> HashableSet for Node<A, B, C, D>
where
    A: HashableSet,
    B: HashableSet,
    C: HashableSet,
    D: HashableSet,
{
    #[inline]
    unsafe fn hash_at<H: Hasher>(index: usize, ptr: NonNull<Erased>, state: &mut H) {
        route!(index, HashableSet::hash_at(ptr, state))
    }
}

impl<T: fmt::Debug> DebugSet for Leaf<T> {
    unsafe fn fmt_at(_index: usize, ptr: NonNull<Erased>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: The caller guarantees `ptr` points to a live `T`.
        let value = unsafe { ptr.cast::<T>().as_ref() };
        fmt::Debug::fmt(value, f)
    }
}

impl<A: DebugSet, B: DebugSet, C: DebugSet, D: DebugSet> DebugSet for Node<A, B, C, D> {
    unsafe fn fmt_at(index: usize, ptr: NonNull<Erased>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        route!(index, DebugSet::fmt_at(ptr, f))
    }
}
