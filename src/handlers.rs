//! Handler sets and the arguments handlers receive.
//!
//! A visit calls exactly one handler, chosen by the active member. The
//! handlers come as either:
//!
//! - a positional list built with [`handlers!`], one closure per member in
//!   member order (preceded by a closure taking [`Empty`] for containers that
//!   can be empty), or
//! - a single generic visitor implementing [`Handle`] for each argument type,
//!   wrapped in [`Poly`].
//!
//! What the chosen handler receives depends on the visit:
//!
//! | Visit                    | Wrapper         | Handler argument        |
//! |--------------------------|-----------------|-------------------------|
//! | `visit`                  | [`Shared`]      | `&T`                    |
//! | `visit_mut`              | [`Exclusive`]   | `&mut T`                |
//! | `visit_narrowed`         | [`Narrowed`]    | `VRef<'_, types![T]>`   |
//! | `VMut::visit_narrowed`   | [`NarrowedMut`] | `VMut<'_, types![T]>`   |
//! | `take` (heap forms)      | [`Owning`]      | `UvRef<types![T], D>`   |
//! | `take` (inline forms)    | [`ByValue`]     | `T`                     |
//!
//! # Generic visitors
//!
//! ```
//! use core::fmt::Display;
//!
//! use vari::{
//!     handlers::{Handle, Poly},
//!     prelude::*,
//! };
//!
//! struct Show;
//!
//! impl<T: Display> Handle<&T> for Show {
//!     type Output = String;
//!
//!     fn handle(self, value: &T) -> String {
//!         value.to_string()
//!     }
//! }
//!
//! let value: VVal<types![i32, &str, char]> = VVal::new('x');
//! assert_eq!(value.visit(Poly(Show)), "x");
//! ```
//!
//! [`handlers!`]: crate::handlers!
//! [`Empty`]: crate::markers::Empty

use core::{marker::PhantomData, ptr::NonNull};

pub use vari_internals::handlers::{
    Arms, ByValue, Exclusive, HCons, HNil, Handle, NullableArms, Poly, Shared, Wrap,
};
use vari_internals::typelist::{Here, Leaf};

use crate::{UvRef, VMut, VRef, deleter::Destroy};

/// Wrapper producing a [`VRef`] over the single-member set of the active
/// member.
///
/// This is the "match" form of a visit: the handler gets a reference that
/// still behaves like a `vari` container, and derefs to the member.
#[derive(Debug, Default, Clone, Copy)]
pub struct Narrowed<'a>(PhantomData<&'a ()>);

impl Narrowed<'_> {
    /// Creates the wrapper.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<'a> Wrap<'a> for Narrowed<'a> {
    type Out<T: 'a> = VRef<'a, Leaf<T>>;

    #[inline]
    unsafe fn wrap<T: 'a>(self, ptr: NonNull<T>) -> Self::Out<T> {
        // SAFETY: The caller guarantees the pointee is live and may be shared
        // for `'a`.
        let value = unsafe { ptr.as_ref() };
        VRef::new::<T, Here>(value)
    }
}

/// Wrapper producing a [`VMut`] over the single-member set of the active
/// member.
#[derive(Debug, Default)]
pub struct NarrowedMut<'a>(PhantomData<&'a mut ()>);

impl NarrowedMut<'_> {
    /// Creates the wrapper.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<'a> Wrap<'a> for NarrowedMut<'a> {
    type Out<T: 'a> = VMut<'a, Leaf<T>>;

    #[inline]
    unsafe fn wrap<T: 'a>(self, mut ptr: NonNull<T>) -> Self::Out<T> {
        // SAFETY: The caller guarantees the pointee is live and exclusively
        // borrowed for `'a`.
        let value = unsafe { ptr.as_mut() };
        VMut::new::<T, Here>(value)
    }
}

/// Wrapper handing ownership of the active member to the handler, as a
/// [`UvRef`] over its single-member set.
///
/// The wrapper carries the deleter of the container being consumed, which
/// moves into the produced reference.
#[derive(Debug)]
pub struct Owning<D> {
    /// Deleter moved into the produced reference.
    deleter: D,
}

impl<D: Destroy> Owning<D> {
    /// Creates the wrapper.
    #[inline]
    pub(crate) fn new(deleter: D) -> Self {
        Self { deleter }
    }
}

impl<'a, D: Destroy> Wrap<'a> for Owning<D> {
    type Out<T: 'a> = UvRef<Leaf<T>, D>;

    #[inline]
    unsafe fn wrap<T: 'a>(self, ptr: NonNull<T>) -> Self::Out<T> {
        // SAFETY: The caller transfers ownership of the pointee, which was
        // allocated the way `self.deleter` expects since it was owned by a
        // container using that deleter.
        unsafe { UvRef::from_non_null_in::<T, Here>(ptr, self.deleter) }
    }
}

/// Visitor converting any member into `R` through [`From`].
///
/// This is the visitor behind [`vcast`](crate::vcast). Wrapped in [`Poly`], it
/// covers a set whose members all convert into `R` from a shared reference.
///
/// # Examples
///
/// ```
/// use vari::{
///     handlers::{Cast, Poly},
///     prelude::*,
/// };
///
/// let value: VVal<types![u8, u16]> = VVal::new(300u16);
/// let wide: u32 = value.visit(Poly(Cast::new()));
/// assert_eq!(wide, 300);
/// ```
pub struct Cast<R>(PhantomData<fn() -> R>);

impl<R> Cast<R> {
    /// Creates the visitor.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for Cast<R> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Cast<R> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Cast<R> {}

impl<R> core::fmt::Debug for Cast<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Cast")
    }
}

impl<'a, T, R> Handle<&'a T> for Cast<R>
where
    R: From<&'a T>,
{
    type Output = R;

    #[inline]
    fn handle(self, value: &'a T) -> R {
        R::from(value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::VVal;

    #[derive(Debug, PartialEq)]
    struct Chars(usize);

    impl From<&String> for Chars {
        fn from(value: &String) -> Self {
            Chars(value.chars().count())
        }
    }

    impl From<&char> for Chars {
        fn from(_: &char) -> Self {
            Chars(1)
        }
    }

    #[test]
    fn test_cast_is_a_public_visitor() {
        static_assertions::assert_impl_all!(Cast<Chars>: Copy, Default, Send, Sync);

        let value: VVal<types![String, char]> = VVal::new(String::from("ümlaut"));
        assert_eq!(value.visit(Poly(Cast::<Chars>::new())), Chars(6));

        let value: VVal<types![String, char]> = VVal::new('x');
        assert_eq!(value.visit(Poly(Cast::<Chars>::default())), Chars(1));
    }
}
