//! Handler sets and argument wrappers.
//!
//! Once a core has turned its runtime index into a member type, something has
//! to be called with that member. This module defines what that something is
//! and what it receives:
//!
//! - **Handler sets** ([`Arms`], [`NullableArms`]): either a positional list
//!   of closures with exactly one entry per member ([`HCons`]/[`HNil`]), or a
//!   single generic visitor ([`Poly`]) implementing [`Handle`] for every
//!   member.
//! - **Wrappers** ([`Wrap`]): turn the raw member pointer into the value the
//!   handler receives, such as `&T` ([`Shared`]), `&mut T` ([`Exclusive`]) or
//!   `T` itself ([`ByValue`]). The `vari` crate adds wrappers producing
//!   narrowed references and owning references.
//!
//! Coverage is checked by the type system: a handler list with a missing,
//! surplus or mistyped entry simply does not implement [`Arms`] for the set.
//!
//! Positional lists are flat while sets are trees, so a list is matched
//! against a set through [`Prefix`]: each branch of the set consumes as many
//! handlers from the front of the list as it has members, and the handlers
//! left over go to the next branch. The whole list must be consumed.

use core::{marker::PhantomData, ptr::NonNull};

use crate::{
    typelist::{Leaf, Nil, Node, Quarter, TypeSet},
    util::Erased,
};

/// Marker passed to the handler of the empty case of nullable containers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Empty;

/// The end of a positional handler list.
#[derive(Debug, Default, Clone, Copy)]
pub struct HNil;

/// A positional handler list: `head` handles the first remaining member,
/// `tail` handles the rest.
#[derive(Debug, Clone, Copy)]
pub struct HCons<H, T> {
    /// Handler for the first remaining member.
    pub head: H,
    /// Handlers for the remaining members.
    pub tail: T,
}

/// A single visitor handling every member through [`Handle`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Poly<V>(pub V);

/// A visitor able to handle arguments of type `Arg`.
///
/// Implement this generically (for example for every `&T` with `T: Display`)
/// and wrap the visitor in [`Poly`] to cover a whole type set at once.
pub trait Handle<Arg> {
    /// The value produced by the visitor.
    type Output;

    /// Handles `arg`.
    fn handle(self, arg: Arg) -> Self::Output;
}

/// Turns a pointer to the active member into the argument a handler receives.
pub trait Wrap<'a>: Sized {
    /// The argument produced for member type `T`.
    type Out<T: 'a>;

    /// Wraps `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live, properly aligned `T`.
    /// 2. The access the wrapper grants is valid: shared access for `'a` for
    ///    shared wrappers, exclusive access for `'a` for exclusive wrappers,
    ///    and ownership of the pointee for consuming wrappers.
    unsafe fn wrap<T: 'a>(self, ptr: NonNull<T>) -> Self::Out<T>;
}

/// Wrapper producing `&'a T`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Shared<'a>(PhantomData<&'a ()>);

impl Shared<'_> {
    /// Creates the wrapper.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<'a> Wrap<'a> for Shared<'a> {
    type Out<T: 'a> = &'a T;

    #[inline]
    unsafe fn wrap<T: 'a>(self, ptr: NonNull<T>) -> &'a T {
        // SAFETY: The caller guarantees the pointee is live and may be shared
        // for `'a`.
        unsafe { ptr.as_ref() }
    }
}

/// Wrapper producing `&'a mut T`.
#[derive(Debug, Default)]
pub struct Exclusive<'a>(PhantomData<&'a mut ()>);

impl Exclusive<'_> {
    /// Creates the wrapper.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<'a> Wrap<'a> for Exclusive<'a> {
    type Out<T: 'a> = &'a mut T;

    #[inline]
    unsafe fn wrap<T: 'a>(self, mut ptr: NonNull<T>) -> &'a mut T {
        // SAFETY: The caller guarantees the pointee is live and exclusively
        // borrowed for `'a`.
        unsafe { ptr.as_mut() }
    }
}

/// Wrapper moving the member out and producing `T` itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByValue;

impl<'a> Wrap<'a> for ByValue {
    type Out<T: 'a> = T;

    #[inline]
    unsafe fn wrap<T: 'a>(self, ptr: NonNull<T>) -> T {
        // SAFETY: The caller transfers ownership of the pointee to us and does
        // not use or drop it afterwards.
        unsafe { ptr.read() }
    }
}

/// A set of handlers covering every member of `S` exactly once.
#[diagnostic::on_unimplemented(
    message = "the handlers `{Self}` do not cover the type set `{S}`",
    label = "expected exactly one handler per member, in member order",
    note = "build handlers with `handlers![...]` or wrap a generic visitor in `Poly`"
)]
pub trait Arms<'a, S: TypeSet, W: Wrap<'a>, R> {
    /// Calls the handler of the member at `index`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index < S::LEN`.
    /// 2. `ptr` points to a live value of the member at `index`, and the
    ///    safety requirements of [`Wrap::wrap`] hold for it.
    unsafe fn call(self, index: usize, ptr: NonNull<Erased>, wrap: W) -> R;
}

/// A positional handler list whose first `S::LEN` handlers cover the members
/// of `S`, in order.
///
/// This is how a flat list lines up with the tree of a set: a [`Leaf`] takes
/// one handler, a [`Node`] lets its four branches take theirs one after the
/// other, and [`Nil`] takes none. Whatever is left is [`Prefix::Rest`].
pub trait Prefix<'a, S: TypeSet, W: Wrap<'a>, R>: Sized {
    /// The handlers following those covering `S`.
    type Rest;

    /// Calls the handler of the member of `S` at `index`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Arms::call`].
    unsafe fn call_prefix(self, index: usize, ptr: NonNull<Erased>, wrap: W) -> R;

    /// Drops the handlers covering `S`, keeping the rest.
    fn into_rest(self) -> Self::Rest;
}

/// The handlers of `L` left after covering the members of `S`.
pub type After<'a, L, S, W, R> = <L as Prefix<'a, S, W, R>>::Rest;

impl<'a, L, W: Wrap<'a>, R> Prefix<'a, Nil, W, R> for L {
    type Rest = L;

    #[inline]
    unsafe fn call_prefix(self, _index: usize, _ptr: NonNull<Erased>, _wrap: W) -> R {
        // SAFETY: The caller guarantees `index < Nil::LEN`, which is
        // impossible.
        unsafe { core::hint::unreachable_unchecked() }
    }

    #[inline]
    fn into_rest(self) -> L {
        self
    }
}

impl<'a, T, F, Tail, W, R> Prefix<'a, Leaf<T>, W, R> for HCons<F, Tail>
where
    T: 'a,
    W: Wrap<'a>,
    F: FnOnce(W::Out<T>) -> R,
{
    type Rest = Tail;

    #[inline]
    unsafe fn call_prefix(self, _index: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        // SAFETY: The only member is `T`, and the caller's guarantees for it
        // are forwarded unchanged.
        let arg = unsafe { wrap.wrap(ptr.cast::<T>()) };
        (self.head)(arg)
    }

    #[inline]
    fn into_rest(self) -> Tail {
        self.tail
    }
}

impl<'a, L, A, B, C, D, W, R> Prefix<'a, Node<A, B, C, D>, W, R> for L
where
    A: TypeSet,
    B: TypeSet,
    C: TypeSet,
    D: TypeSet,
    W: Wrap<'a>,
    L: Prefix<'a, A, W, R>,
    After<'a, L, A, W, R>: Prefix<'a, B, W, R>,
    After<'a, After<'a, L, A, W, R>, B, W, R>: Prefix<'a, C, W, R>,
    After<'a, After<'a, After<'a, L, A, W, R>, B, W, R>, C, W, R>: Prefix<'a, D, W, R>,
{
    type Rest =
        After<'a, After<'a, After<'a, After<'a, L, A, W, R>, B, W, R>, C, W, R>, D, W, R>;

    #[inline]
    unsafe fn call_prefix(self, index: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        match Quarter::locate::<A, B, C>(index) {
            // SAFETY: Member `i` of `A` is member `index` of the set.
            Quarter::A(i) => unsafe { <L as Prefix<'a, A, W, R>>::call_prefix(self, i, ptr, wrap) },
            Quarter::B(i) => {
                let rest = <L as Prefix<'a, A, W, R>>::into_rest(self);
                // SAFETY: Member `i` of `B` is member `index` of the set.
                unsafe { Prefix::<'a, B, W, R>::call_prefix(rest, i, ptr, wrap) }
            }
            Quarter::C(i) => {
                let rest = <L as Prefix<'a, A, W, R>>::into_rest(self);
                let rest = Prefix::<'a, B, W, R>::into_rest(rest);
                // SAFETY: Member `i` of `C` is member `index` of the set.
                unsafe { Prefix::<'a, C, W, R>::call_prefix(rest, i, ptr, wrap) }
            }
            Quarter::D(i) => {
                let rest = <L as Prefix<'a, A, W, R>>::into_rest(self);
                let rest = Prefix::<'a, B, W, R>::into_rest(rest);
                let rest = Prefix::<'a, C, W, R>::into_rest(rest);
                // SAFETY: The caller guarantees `index < Self::LEN`, so member
                // `i` of `D` is member `index` of the set.
                unsafe { Prefix::<'a, D, W, R>::call_prefix(rest, i, ptr, wrap) }
            }
        }
    }

    #[inline]
    fn into_rest(self) -> Self::Rest {
        let rest = <L as Prefix<'a, A, W, R>>::into_rest(self);
        let rest = Prefix::<'a, B, W, R>::into_rest(rest);
        let rest = Prefix::<'a, C, W, R>::into_rest(rest);
        Prefix::<'a, D, W, R>::into_rest(rest)
    }
}

impl<'a, S, W, R> Arms<'a, S, W, R> for HNil
where
    S: TypeSet,
    W: Wrap<'a>,
    HNil: Prefix<'a, S, W, R, Rest = HNil>,
{
    #[inline]
    unsafe fn call(self, index: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        // SAFETY: Forwarded from our caller.
        unsafe { <Self as Prefix<'a, S, W, R>>::call_prefix(self, index, ptr, wrap) }
    }
}

impl<'a, S, F, Tail, W, R> Arms<'a, S, W, R> for HCons<F, Tail>
where
    S: TypeSet,
    W: Wrap<'a>,
    HCons<F, Tail>: Prefix<'a, S, W, R, Rest = HNil>,
{
    #[inline]
    unsafe fn call(self, index: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        // SAFETY: Forwarded from our caller.
        unsafe { <Self as Prefix<'a, S, W, R>>::call_prefix(self, index, ptr, wrap) }
    }
}

impl<'a, V, W: Wrap<'a>, R> Arms<'a, Nil, W, R> for Poly<V> {
    #[inline]
    unsafe fn call(self, _index: usize, _ptr: NonNull<Erased>, _wrap: W) -> R {
        // SAFETY: The caller guarantees `index < Nil::LEN`, which is
        // impossible.
        unsafe { core::hint::unreachable_unchecked() }
    }
}

impl<'a, T, V, W, R> Arms<'a, Leaf<T>, W, R> for Poly<V>
where
    T: 'a,
    W: Wrap<'a>,
    V: Handle<W::Out<T>, Output = R>,
{
    #[inline]
    unsafe fn call(self, _index: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        // SAFETY: The only member is `T`, and the caller's guarantees for it
        // are forwarded unchanged.
        let arg = unsafe { wrap.wrap(ptr.cast::<T>()) };
        self.0.handle(arg)
    }
}

impl<'a, A, B, C, D, V, W, R> Arms<'a, Node<A, B, C, D>, W, R> for Poly<V>
where
    A: TypeSet,
    B: TypeSet,
    C: TypeSet,
    D: TypeSet,
    W: Wrap<'a>,
    Poly<V>: Arms<'a, A, W, R> + Arms<'a, B, W, R> + Arms<'a, C, W, R> + Arms<'a, D, W, R>,
{
    #[inline]
    unsafe fn call(self, index: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        match Quarter::locate::<A, B, C>(index) {
            // SAFETY: Member `i` of `A` is member `index` of the set.
            Quarter::A(i) => unsafe { <Self as Arms<'a, A, W, R>>::call(self, i, ptr, wrap) },
            // SAFETY: Member `i` of `B` is member `index` of the set.
            Quarter::B(i) => unsafe { <Self as Arms<'a, B, W, R>>::call(self, i, ptr, wrap) },
            // SAFETY: Member `i` of `C` is member `index` of the set.
            Quarter::C(i) => unsafe { <Self as Arms<'a, C, W, R>>::call(self, i, ptr, wrap) },
            // SAFETY: The caller guarantees `index < Self::LEN`, so member `i`
            // of `D` is member `index` of the set.
            Quarter::D(i) => unsafe { <Self as Arms<'a, D, W, R>>::call(self, i, ptr, wrap) },
        }
    }
}

/// A set of handlers covering the empty case followed by every member of `S`.
///
/// For a positional list the first handler receives [`Empty`].
#[diagnostic::on_unimplemented(
    message = "the handlers `{Self}` do not cover the empty case and the type set `{S}`",
    label = "expected a handler for `Empty` followed by exactly one handler per member",
    note = "nullable containers need a first handler taking `Empty`"
)]
pub trait NullableArms<'a, S: TypeSet, W: Wrap<'a>, R> {
    /// Calls the handler selected by the tagged index: `0` for the empty
    /// case, `k` for member `k - 1`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `tagged <= S::LEN`.
    /// 2. If `tagged != 0`, the requirements of [`Arms::call`] hold for
    ///    member `tagged - 1`.
    unsafe fn call_tagged(self, tagged: usize, ptr: NonNull<Erased>, wrap: W) -> R;
}

impl<'a, S, W, R, F, Tail> NullableArms<'a, S, W, R> for HCons<F, Tail>
where
    S: TypeSet,
    W: Wrap<'a>,
    F: FnOnce(Empty) -> R,
    Tail: Arms<'a, S, W, R>,
{
    #[inline]
    unsafe fn call_tagged(self, tagged: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        match tagged {
            0 => (self.head)(Empty),
            // SAFETY: Guaranteed by the caller.
            _ => unsafe { self.tail.call(tagged - 1, ptr, wrap) },
        }
    }
}

impl<'a, S, W, R, V> NullableArms<'a, S, W, R> for Poly<V>
where
    S: TypeSet,
    W: Wrap<'a>,
    V: Handle<Empty, Output = R>,
    Poly<V>: Arms<'a, S, W, R>,
{
    #[inline]
    unsafe fn call_tagged(self, tagged: usize, ptr: NonNull<Erased>, wrap: W) -> R {
        match tagged {
            0 => self.0.handle(Empty),
            // SAFETY: Guaranteed by the caller.
            _ => unsafe { <Self as Arms<'a, S, W, R>>::call(self, tagged - 1, ptr, wrap) },
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::fmt::Write;

    use super::*;

    type Set = crate::type_set![u32, &'static str];

    struct Describe<'w>(&'w mut String);

    impl<T: core::fmt::Debug> Handle<&T> for Describe<'_> {
        type Output = ();

        fn handle(self, arg: &T) {
            write!(self.0, "{arg:?}").unwrap();
        }
    }

    impl Handle<Empty> for Describe<'_> {
        type Output = ();

        fn handle(self, _: Empty) {
            self.0.push_str("empty");
        }
    }

    #[test]
    fn test_positional_arms() {
        let value: &'static str = "hello";
        let ptr = NonNull::from(&value).cast::<Erased>();
        let arms = HCons {
            head: |_: &u32| 0usize,
            tail: HCons {
                head: |s: &&str| s.len(),
                tail: HNil,
            },
        };
        // SAFETY: Index 1 is `&'static str` and `ptr` points to one.
        let len = unsafe { Arms::<Set, _, _>::call(arms, 1, ptr, Shared::new()) };
        assert_eq!(len, 5);
    }

    #[test]
    fn test_poly_nullable_arms() {
        let value = 7u32;
        let ptr = NonNull::from(&value).cast::<Erased>();

        let mut buf = String::new();
        // SAFETY: Tagged index 1 is `u32` and `ptr` points to one.
        unsafe {
            NullableArms::<Set, _, _>::call_tagged(Poly(Describe(&mut buf)), 1, ptr, Shared::new());
        }
        assert_eq!(buf, "7");

        let mut buf = String::new();
        // SAFETY: Tagged index 0 never touches the pointer.
        unsafe {
            NullableArms::<Set, _, _>::call_tagged(Poly(Describe(&mut buf)), 0, ptr, Shared::new());
        }
        assert_eq!(buf, "empty");
    }

    #[test]
    fn test_by_value_moves_out() {
        let value = core::mem::ManuallyDrop::new(41u32);
        let ptr = NonNull::from(&*value).cast::<Erased>();
        let arms = HCons {
            head: |n: u32| n + 1,
            tail: HCons {
                head: |_: &'static str| 0,
                tail: HNil,
            },
        };
        // SAFETY: Index 0 is `u32`, and the `ManuallyDrop` is never used again.
        let out = unsafe { Arms::<Set, _, _>::call(arms, 0, ptr, ByValue) };
        assert_eq!(out, 42);
    }

    #[test]
    fn test_positional_arms_follow_member_order_across_branches() {
        type Spliced = crate::type_set![u8, ..Set, char, i64, u16];

        let value = 'x';
        let ptr = NonNull::from(&value).cast::<Erased>();
        let arms = || HCons {
            head: |_: &u8| "u8",
            tail: HCons {
                head: |_: &u32| "u32",
                tail: HCons {
                    head: |_: &&str| "str",
                    tail: HCons {
                        head: |_: &char| "char",
                        tail: HCons {
                            head: |_: &i64| "i64",
                            tail: HCons {
                                head: |_: &u16| "u16",
                                tail: HNil,
                            },
                        },
                    },
                },
            },
        };
        // SAFETY: Index 3 is `char` and `ptr` points to one.
        let seen = unsafe { Arms::<Spliced, _, _>::call(arms(), 3, ptr, Shared::new()) };
        assert_eq!(seen, "char");

        let value = 9u16;
        let ptr = NonNull::from(&value).cast::<Erased>();
        // SAFETY: Index 5 is `u16` and `ptr` points to one.
        let seen = unsafe { Arms::<Spliced, _, _>::call(arms(), 5, ptr, Shared::new()) };
        assert_eq!(seen, "u16");
    }

    #[test]
    fn test_prefix_rest() {
        let list = HCons {
            head: |_: &u32| 1u8,
            tail: HCons {
                head: |_: &&'static str| 2u8,
                tail: HCons {
                    head: 3u8,
                    tail: HNil,
                },
            },
        };
        let rest = Prefix::<'_, Set, Shared<'_>, u8>::into_rest(list);
        assert_eq!(rest.head, 3);
    }
}
