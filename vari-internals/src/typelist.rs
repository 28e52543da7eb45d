//! Compile-time type sets.
//!
//! A type set is an ordered list of member types stored as a balanced tree
//! with four branches per node. [`Nil`] is the empty set, [`Leaf<T>`] is the
//! set `{T}` and [`Node<A, B, C, D>`] holds the members of `A`, then those of
//! `B`, `C` and `D`. Only the order of the members matters: the tree shape is
//! an encoding detail chosen by [`type_set!`](crate::type_set), which groups
//! members four at a time so that a set of `N` members is about `log4(N)`
//! nodes deep.
//!
//! Everything in this module is pure type-level metadata. The only runtime
//! code is [`TypeSet::dispatch`], which walks down the tree from a runtime
//! index to the member type at that position.
//!
//! # Positions and witnesses
//!
//! Queries that search a set ([`Member`], [`Subset`], [`TypeAt`]) carry an
//! extra type parameter describing *where* the answer was found: [`Here`] for
//! a leaf, [`InA<I>`] to [`InD<I>`] for a position inside one of the four
//! branches of a node. Callers never write these witnesses; they are
//! inferred. Inference is also what rejects sets that contain the same type
//! twice: a duplicated member has two valid witnesses and the lookup fails
//! to compile as ambiguous.
//!
//! # Layout
//!
//! [`TypeSet::Union`] follows the tree: a node stores a `#[repr(C)]` [`Quad`]
//! union of its four branches, a leaf stores its member. Every field of every
//! union lives at offset zero, so the storage of any member is reached by a
//! plain pointer cast.

use core::{any::TypeId, marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use crate::util::Erased;

/// Size of every index table. A type set holds at most `CAPACITY - 1`
/// members, since tagged index `0` is reserved for "empty".
pub const CAPACITY: usize = 256;

/// The empty type set.
#[derive(Debug, Clone, Copy)]
pub enum Nil {}

/// The type set holding `T` alone.
///
/// This type is never instantiated. It only exists as a type parameter.
pub struct Leaf<T>(PhantomData<fn() -> T>);

/// The type set holding the members of `A`, `B`, `C` and `D`, in that order.
///
/// This type is never instantiated. It only exists as a type parameter.
pub struct Node<A, B, C, D>(PhantomData<fn() -> (A, B, C, D)>);

/// Position witness for the member of a [`Leaf`].
#[derive(Debug, Clone, Copy)]
pub enum Here {}

/// Position witness for position `I` inside the first branch of a [`Node`].
pub struct InA<I>(PhantomData<fn() -> I>);

/// Position witness for position `I` inside the second branch of a [`Node`].
pub struct InB<I>(PhantomData<fn() -> I>);

/// Position witness for position `I` inside the third branch of a [`Node`].
pub struct InC<I>(PhantomData<fn() -> I>);

/// Position witness for position `I` inside the fourth branch of a [`Node`].
pub struct InD<I>(PhantomData<fn() -> I>);

/// Storage layout of a [`Node`]: one slot shared by its four branches.
#[repr(C)]
#[allow(dead_code)]
pub union Quad<A, B, C, D> {
    /// Storage for the first branch.
    a: ManuallyDrop<A>,
    /// Storage for the second branch.
    b: ManuallyDrop<B>,
    /// Storage for the third branch.
    c: ManuallyDrop<C>,
    /// Storage for the fourth branch.
    d: ManuallyDrop<D>,
}

mod sealed {
    /// Restricts [`TypeSet`](super::TypeSet) to [`Nil`](super::Nil),
    /// [`Leaf`](super::Leaf) and [`Node`](super::Node).
    pub trait Sealed {}

    impl Sealed for super::Nil {}
    impl<T> Sealed for super::Leaf<T> {}
    impl<A: Sealed, B: Sealed, C: Sealed, D: Sealed> Sealed for super::Node<A, B, C, D> {}
}

/// The branch of a [`Node`] holding a member, with the position of the
/// member inside that branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    /// The member is in the first branch.
    A(usize),
    /// The member is in the second branch.
    B(usize),
    /// The member is in the third branch.
    C(usize),
    /// The member is in the fourth branch, or `index` is past the end.
    D(usize),
}

impl Quarter {
    /// Locates `index` among branches of lengths `A::LEN`, `B::LEN`,
    /// `C::LEN`, and whatever remains.
    #[inline]
    pub const fn locate<A: TypeSet, B: TypeSet, C: TypeSet>(index: usize) -> Self {
        let b = A::LEN;
        let c = b + B::LEN;
        let d = c + C::LEN;
        if index < b {
            Quarter::A(index)
        } else if index < c {
            Quarter::B(index - b)
        } else if index < d {
            Quarter::C(index - c)
        } else {
            Quarter::D(index - d)
        }
    }
}

/// A function that can be called with a pointer to any member of a set.
///
/// This is the lowest-level form of dispatch: the implementor is generic over
/// the member type, with no bounds. Higher level handlers are built on top of
/// it in [`handlers`](crate::handlers).
pub trait RawFn {
    /// The value returned by [`RawFn::call`].
    type Output;

    /// Calls the function for the member type `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live, properly aligned `T`, unless the
    ///    implementor documents a weaker requirement.
    /// 2. Any extra requirements of the implementor are upheld, such as
    ///    exclusive access or transfer of ownership.
    unsafe fn call<T>(self, ptr: NonNull<T>) -> Self::Output;
}

/// An ordered set of member types.
///
/// Implemented only by [`Nil`], [`Leaf`] and [`Node`]. Build sets with the
/// `types!` macro of the `vari` crate instead of spelling out the tree.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a type set",
    label = "expected a type set built with `types![...]`"
)]
pub trait TypeSet: sealed::Sealed {
    /// Number of members.
    const LEN: usize;

    /// Storage able to hold any single member.
    type Union;

    /// Calls `f` with `ptr` cast to the member at `index`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index < Self::LEN`.
    /// 2. The safety requirements of [`RawFn::call`] hold for the member type
    ///    at `index`.
    unsafe fn dispatch<F: RawFn>(index: usize, ptr: NonNull<Erased>, f: F) -> F::Output;
}

impl TypeSet for Nil {
    const LEN: usize = 0;
    type Union = ();

    #[inline]
    unsafe fn dispatch<F: RawFn>(_index: usize, _ptr: NonNull<Erased>, _f: F) -> F::Output {
        // SAFETY: The caller guarantees `index < LEN`, which is impossible for
        // an empty set.
        unsafe { core::hint::unreachable_unchecked() }
    }
}

impl<T> TypeSet for Leaf<T> {
    const LEN: usize = 1;
    type Union = T;

    #[inline]
    unsafe fn dispatch<F: RawFn>(_index: usize, ptr: NonNull<Erased>, f: F) -> F::Output {
        // SAFETY: The only valid index is `0`, which is `T`, so the caller's
        // guarantees for the member at `index` are guarantees for `T`.
        unsafe { f.call(ptr.cast::<T>()) }
    }
}

impl<A: TypeSet, B: TypeSet, C: TypeSet, D: TypeSet> TypeSet for Node<A, B, C, D> {
    const LEN: usize = A::LEN + B::LEN + C::LEN + D::LEN;
    type Union = Quad<A::Union, B::Union, C::Union, D::Union>;

    #[inline]
    unsafe fn dispatch<F: RawFn>(index: usize, ptr: NonNull<Erased>, f: F) -> F::Output {
        // The union of every branch starts at offset zero, so `ptr` is also
        // the address of the member inside its branch.
        match Quarter::locate::<A, B, C>(index) {
            // SAFETY: Member `i` of `A` is member `index` of the set.
            Quarter::A(i) => unsafe { A::dispatch(i, ptr, f) },
            // SAFETY: Member `i` of `B` is member `index` of the set.
            Quarter::B(i) => unsafe { B::dispatch(i, ptr, f) },
            // SAFETY: Member `i` of `C` is member `index` of the set.
            Quarter::C(i) => unsafe { C::dispatch(i, ptr, f) },
            // SAFETY: `index < Self::LEN`, so member `i` of `D` is member
            // `index` of the set.
            Quarter::D(i) => unsafe { D::dispatch(i, ptr, f) },
        }
    }
}

/// Builds a type set from a list of member types.
///
/// Members are listed in order. A member written as `..Set` splices the
/// members of another type set in its place. The `types!` macro of the
/// `vari` crate forwards here.
///
/// Members are first turned into leaves eight at a time, then grouped into
/// nodes of four, level by level, until a single set remains. Both passes
/// consume several members per expansion step, so large sets stay well within
/// the default macro recursion limit.
#[macro_export]
macro_rules! type_set {
    (@leaves [$($out:tt)*]) => {
        $crate::type_set!(@group [] $($out)*)
    };
    (@leaves [$($out:tt)*]
        $a:ty, $b:ty, $c:ty, $d:ty, $e:ty, $f:ty, $g:ty, $h:ty $(, $($rest:tt)*)?
    ) => {
        $crate::type_set!(@leaves [$($out)*
            {$crate::typelist::Leaf<$a>} {$crate::typelist::Leaf<$b>}
            {$crate::typelist::Leaf<$c>} {$crate::typelist::Leaf<$d>}
            {$crate::typelist::Leaf<$e>} {$crate::typelist::Leaf<$f>}
            {$crate::typelist::Leaf<$g>} {$crate::typelist::Leaf<$h>}
        ] $($($rest)*)?)
    };
    (@leaves [$($out:tt)*] .. $set:ty $(, $($rest:tt)*)?) => {
        $crate::type_set!(@leaves [$($out)* {$set}] $($($rest)*)?)
    };
    (@leaves [$($out:tt)*] $a:ty $(, $($rest:tt)*)?) => {
        $crate::type_set!(@leaves [$($out)* {$crate::typelist::Leaf<$a>}] $($($rest)*)?)
    };

    (@group [$($out:tt)*]
        {$($a:tt)*} {$($b:tt)*} {$($c:tt)*} {$($d:tt)*}
        {$($e:tt)*} {$($f:tt)*} {$($g:tt)*} {$($h:tt)*}
        {$($i:tt)*} {$($j:tt)*} {$($k:tt)*} {$($l:tt)*}
        {$($m:tt)*} {$($n:tt)*} {$($o:tt)*} {$($p:tt)*}
        $($rest:tt)*
    ) => {
        $crate::type_set!(@group [$($out)*
            {$crate::typelist::Node<$($a)*, $($b)*, $($c)*, $($d)*>}
            {$crate::typelist::Node<$($e)*, $($f)*, $($g)*, $($h)*>}
            {$crate::typelist::Node<$($i)*, $($j)*, $($k)*, $($l)*>}
            {$crate::typelist::Node<$($m)*, $($n)*, $($o)*, $($p)*>}
        ] $($rest)*)
    };
    (@group [$($out:tt)*] {$($a:tt)*} {$($b:tt)*} {$($c:tt)*} {$($d:tt)*} $($rest:tt)*) => {
        $crate::type_set!(@group [$($out)*
            {$crate::typelist::Node<$($a)*, $($b)*, $($c)*, $($d)*>}
        ] $($rest)*)
    };
    (@group [$($out:tt)*] {$($a:tt)*} {$($b:tt)*} {$($c:tt)*}) => {
        $crate::type_set!(@group [$($out)*
            {$crate::typelist::Node<$($a)*, $($b)*, $($c)*, $crate::typelist::Nil>}
        ])
    };
    (@group [$($out:tt)*] {$($a:tt)*} {$($b:tt)*}) => {
        $crate::type_set!(@group [$($out)*
            {$crate::typelist::Node<
                $($a)*, $($b)*, $crate::typelist::Nil, $crate::typelist::Nil
            >}
        ])
    };
    (@group [] {$($set:tt)*}) => {
        $($set)*
    };
    (@group [$($out:tt)+] {$($a:tt)*}) => {
        $crate::type_set!(@group [$($out)+ {$($a)*}])
    };
    (@group []) => {
        $crate::typelist::Nil
    };
    (@group [$($out:tt)+]) => {
        $crate::type_set!(@group [] $($out)+)
    };

    ($($items:tt)*) => {
        $crate::type_set!(@leaves [] $($items)*)
    };
}

/// `T` is a member of the set, found at position witness `I`.
#[diagnostic::on_unimplemented(
    message = "`{T}` is not a member of the type set `{Self}`",
    label = "`{T}` is not a member of this set",
    note = "a type may only be stored in a container whose type set lists it exactly once"
)]
pub trait Member<T, I>: TypeSet {
    /// Zero-based position of `T` in the set.
    const INDEX: usize;
}

impl<T> Member<T, Here> for Leaf<T> {
    const INDEX: usize = 0;
}

impl<T, I, A, B, C, D> Member<T, InA<I>> for Node<A, B, C, D>
where
    A: Member<T, I>,
    B: TypeSet,
    C: TypeSet,
    D: TypeSet,
{
    const INDEX: usize = <A as Member<T, I>>::INDEX;
}

impl<T, I, A, B, C, D> Member<T, InB<I>> for Node<A, B, C, D>
where
    A: TypeSet,
    B: Member<T, I>,
    C: TypeSet,
    D: TypeSet,
{
    const INDEX: usize = A::LEN + <B as Member<T, I>>::INDEX;
}

impl<T, I, A, B, C, D> Member<T, InC<I>> for Node<A, B, C, D>
where
    A: TypeSet,
    B: TypeSet,
    C: Member<T, I>,
    D: TypeSet,
{
    const INDEX: usize = A::LEN + B::LEN + <C as Member<T, I>>::INDEX;
}

impl<T, I, A, B, C, D> Member<T, InD<I>> for Node<A, B, C, D>
where
    A: TypeSet,
    B: TypeSet,
    C: TypeSet,
    D: Member<T, I>,
{
    const INDEX: usize = A::LEN + B::LEN + C::LEN + <D as Member<T, I>>::INDEX;
}

/// The member at position witness `I`.
pub trait TypeAt<I>: TypeSet {
    /// The member type.
    type Output;
}

impl<T> TypeAt<Here> for Leaf<T> {
    type Output = T;
}

impl<I, A: TypeAt<I>, B: TypeSet, C: TypeSet, D: TypeSet> TypeAt<InA<I>> for Node<A, B, C, D> {
    type Output = <A as TypeAt<I>>::Output;
}

impl<I, A: TypeSet, B: TypeAt<I>, C: TypeSet, D: TypeSet> TypeAt<InB<I>> for Node<A, B, C, D> {
    type Output = <B as TypeAt<I>>::Output;
}

impl<I, A: TypeSet, B: TypeSet, C: TypeAt<I>, D: TypeSet> TypeAt<InC<I>> for Node<A, B, C, D> {
    type Output = <C as TypeAt<I>>::Output;
}

impl<I, A: TypeSet, B: TypeSet, C: TypeSet, D: TypeAt<I>> TypeAt<InD<I>> for Node<A, B, C, D> {
    type Output = <D as TypeAt<I>>::Output;
}

/// Every member of `Self` is a member of `Super`.
///
/// `I` mirrors the tree of `Self`, holding one position witness per member.
/// Like the witness of [`Member`], it is always inferred.
#[diagnostic::on_unimplemented(
    message = "the type set `{Self}` is not convertible to `{Super}`",
    label = "some member of this set is missing from the target set",
    note = "every member of the source set must appear exactly once in the target set"
)]
pub trait Subset<Super: TypeSet, I>: TypeSet {
    /// `POSITIONS[k]` is the position in `Super` of member `k` of `Self`.
    /// Entries at `k >= Self::LEN` are unused.
    const POSITIONS: [u8; CAPACITY];
}

impl<Super: TypeSet> Subset<Super, ()> for Nil {
    const POSITIONS: [u8; CAPACITY] = [0; CAPACITY];
}

impl<T, Super, I> Subset<Super, I> for Leaf<T>
where
    Super: Member<T, I>,
{
    const POSITIONS: [u8; CAPACITY] = {
        let mut out = [0; CAPACITY];
        out[0] = <Super as Member<T, I>>::INDEX as u8;
        out
    };
}

/// Copies the first `len` entries of `from` into `out`, starting at `at`.
const fn splice(out: &mut [u8; CAPACITY], at: usize, from: &[u8; CAPACITY], len: usize) {
    let mut k = 0;
    while k < len {
        out[at + k] = from[k];
        k += 1;
    }
}

impl<A, B, C, D, Super, IA, IB, IC, ID> Subset<Super, (IA, IB, IC, ID)> for Node<A, B, C, D>
where
    Super: TypeSet,
    A: Subset<Super, IA>,
    B: Subset<Super, IB>,
    C: Subset<Super, IC>,
    D: Subset<Super, ID>,
{
    const POSITIONS: [u8; CAPACITY] = {
        let mut out = [0; CAPACITY];
        splice(&mut out, 0, &A::POSITIONS, A::LEN);
        splice(&mut out, A::LEN, &B::POSITIONS, B::LEN);
        splice(&mut out, A::LEN + B::LEN, &C::POSITIONS, C::LEN);
        splice(&mut out, A::LEN + B::LEN + C::LEN, &D::POSITIONS, D::LEN);
        out
    };
}

/// Tagged-index conversion tables between a set and one of its supersets.
///
/// Both tables are indexed by *tagged* index (`0` is empty, `k` is member
/// `k - 1`) and map `0` to `0`. Converting a container is a single lookup.
pub struct Remap<Sub, Super, I>(PhantomData<fn() -> (Sub, Super, I)>);

impl<Sub, Super, I> Remap<Sub, Super, I>
where
    Sub: Subset<Super, I>,
    Super: TypeSet,
{
    /// Maps a tagged index of `Sub` to the tagged index of the same member in
    /// `Super`.
    pub const WIDEN: [u8; CAPACITY] = {
        assert!(<Super as TypeSet>::LEN < CAPACITY, "type sets hold at most 255 members");
        let positions = <Sub as Subset<Super, I>>::POSITIONS;
        let mut out = [0; CAPACITY];
        let mut k = 0;
        while k < <Sub as TypeSet>::LEN {
            out[k + 1] = positions[k] + 1;
            k += 1;
        }
        out
    };

    /// Maps a tagged index of `Super` to the tagged index of the same member
    /// in `Sub`, or to `0` if `Sub` does not contain that member.
    pub const NARROW: [u8; CAPACITY] = {
        assert!(<Super as TypeSet>::LEN < CAPACITY, "type sets hold at most 255 members");
        let positions = <Sub as Subset<Super, I>>::POSITIONS;
        let mut out = [0; CAPACITY];
        let mut k = 0;
        while k < <Sub as TypeSet>::LEN {
            out[positions[k] as usize + 1] = (k + 1) as u8;
            k += 1;
        }
        out
    };
}

/// Runtime type information for sets whose members are all `'static`.
pub trait TypeIds: TypeSet {
    /// The [`TypeId`] of the member at `index`, if `index < Self::LEN`.
    fn type_id_at(index: usize) -> Option<TypeId>;

    /// The name of the member at `index`, as given by
    /// [`type_name`](core::any::type_name).
    fn type_name_at(index: usize) -> Option<&'static str>;

    /// The position of the member with the given [`TypeId`], if any.
    fn position_of(id: TypeId) -> Option<usize>;

    /// Returns `true` if `T` is a member of the set.
    #[inline]
    fn contains<T: 'static>() -> bool {
        Self::position_of(TypeId::of::<T>()).is_some()
    }

    /// Returns `true` if no type appears twice in the set.
    ///
    /// Duplicates are already rejected whenever a container looks up a
    /// member, so this is mostly useful in tests of set-building macros.
    fn is_unique() -> bool {
        (0..Self::LEN).all(|i| match Self::type_id_at(i) {
            Some(id) => Self::position_of(id) == Some(i),
            None => false,
        })
    }
}

impl TypeIds for Nil {
    #[inline]
    fn type_id_at(_index: usize) -> Option<TypeId> {
        None
    }

    #[inline]
    fn type_name_at(_index: usize) -> Option<&'static str> {
        None
    }

    #[inline]
    fn position_of(_id: TypeId) -> Option<usize> {
        None
    }
}

impl<T: 'static> TypeIds for Leaf<T> {
    #[inline]
    fn type_id_at(index: usize) -> Option<TypeId> {
        (index == 0).then(TypeId::of::<T>)
    }

    #[inline]
    fn type_name_at(index: usize) -> Option<&'static str> {
        (index == 0).then(core::any::type_name::<T>)
    }

    #[inline]
    fn position_of(id: TypeId) -> Option<usize> {
        (id == TypeId::of::<T>()).then_some(0)
    }
}

impl<A: TypeIds, B: TypeIds, C: TypeIds, D: TypeIds> TypeIds for Node<A, B, C, D> {
    fn type_id_at(index: usize) -> Option<TypeId> {
        match Quarter::locate::<A, B, C>(index) {
            Quarter::A(i) => A::type_id_at(i),
            Quarter::B(i) => B::type_id_at(i),
            Quarter::C(i) => C::type_id_at(i),
            Quarter::D(i) => D::type_id_at(i),
        }
    }

    fn type_name_at(index: usize) -> Option<&'static str> {
        match Quarter::locate::<A, B, C>(index) {
            Quarter::A(i) => A::type_name_at(i),
            Quarter::B(i) => B::type_name_at(i),
            Quarter::C(i) => C::type_name_at(i),
            Quarter::D(i) => D::type_name_at(i),
        }
    }

    fn position_of(id: TypeId) -> Option<usize> {
        A::position_of(id)
            .or_else(|| B::position_of(id).map(|k| A::LEN + k))
            .or_else(|| C::position_of(id).map(|k| A::LEN + B::LEN + k))
            .or_else(|| D::position_of(id).map(|k| A::LEN + B::LEN + C::LEN + k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Abc = crate::type_set![u8, u16, u32];
    type Ca = crate::type_set![u32, u8];

    #[test]
    fn test_macro_shapes() {
        static_assertions::assert_type_eq_all!(crate::type_set![], Nil);
        static_assertions::assert_type_eq_all!(crate::type_set![u8], Leaf<u8>);
        static_assertions::assert_type_eq_all!(crate::type_set![..Abc], Abc);
        static_assertions::assert_type_eq_all!(Abc, Node<Leaf<u8>, Leaf<u16>, Leaf<u32>, Nil>);
        static_assertions::assert_type_eq_all!(
            crate::type_set![i8, ..Ca, i16,],
            Node<Leaf<i8>, Ca, Leaf<i16>, Nil>
        );
        static_assertions::assert_type_eq_all!(
            crate::type_set![u8, u16, u32, u64, i8],
            Node<Node<Leaf<u8>, Leaf<u16>, Leaf<u32>, Leaf<u64>>, Leaf<i8>, Nil, Nil>
        );
    }

    #[test]
    fn test_len_and_index() {
        assert_eq!(<Nil as TypeSet>::LEN, 0);
        assert_eq!(<Abc as TypeSet>::LEN, 3);
        assert_eq!(<Abc as Member<u8, _>>::INDEX, 0);
        assert_eq!(<Abc as Member<u16, _>>::INDEX, 1);
        assert_eq!(<Abc as Member<u32, _>>::INDEX, 2);

        type Spliced = crate::type_set![i8, ..Ca, i16];
        assert_eq!(<Spliced as TypeSet>::LEN, 4);
        assert_eq!(<Spliced as Member<u8, _>>::INDEX, 2);
        assert_eq!(<Spliced as Member<i16, _>>::INDEX, 3);
    }

    #[test]
    fn test_locate() {
        type Two = crate::type_set![u8, u16];
        assert_eq!(Quarter::locate::<Two, Nil, Leaf<u32>>(1), Quarter::A(1));
        assert_eq!(Quarter::locate::<Two, Nil, Leaf<u32>>(2), Quarter::C(0));
        assert_eq!(Quarter::locate::<Two, Nil, Leaf<u32>>(3), Quarter::D(0));
    }

    #[test]
    fn test_type_at() {
        static_assertions::assert_type_eq_all!(<Abc as TypeAt<InA<Here>>>::Output, u8);
        static_assertions::assert_type_eq_all!(<Abc as TypeAt<InC<Here>>>::Output, u32);
    }

    #[test]
    fn test_remap_tables() {
        let widen = Remap::<Ca, Abc, _>::WIDEN;
        assert_eq!(&widen[..3], &[0, 3, 1]);
        assert!(widen[3..].iter().all(|&i| i == 0));

        let narrow = Remap::<Ca, Abc, _>::NARROW;
        assert_eq!(&narrow[..4], &[0, 2, 0, 1]);
    }

    #[test]
    fn test_type_ids() {
        assert!(<Abc as TypeIds>::contains::<u16>());
        assert!(!<Abc as TypeIds>::contains::<i16>());
        assert_eq!(<Abc as TypeIds>::type_id_at(2), Some(TypeId::of::<u32>()));
        assert_eq!(<Abc as TypeIds>::type_id_at(3), None);
        assert_eq!(<Abc as TypeIds>::type_name_at(1), Some("u16"));
        assert!(<Abc as TypeIds>::is_unique());
        assert!(!<crate::type_set![u8, u8] as TypeIds>::is_unique());
    }

    #[test]
    fn test_union_layout() {
        type Mixed = crate::type_set![u8, [u64; 3], u16];
        assert_eq!(
            core::mem::size_of::<<Mixed as TypeSet>::Union>(),
            core::mem::size_of::<[u64; 3]>()
        );
        assert_eq!(
            core::mem::align_of::<<Mixed as TypeSet>::Union>(),
            core::mem::align_of::<u64>()
        );
    }
}
