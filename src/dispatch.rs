//! Runtime index dispatch.
//!
//! [`dispatch_index`] turns a runtime index into a const-generic one by
//! walking a chain of [`BLOCK`]-wide match blocks, up to [`MAX`] cases. The
//! two-stage [`dispatch`] additionally lets a [`Factory`] produce a value for
//! the selected index before a [`Route`] consumes it. [`MakeIdx`] is the
//! factory producing plain [`Idx`] markers.
//!
//! [`invoke`] is the static counterpart: it hands a value of a known member
//! type to the one handler of a handler list that accepts it.
//!
//! # Examples
//!
//! Building a lookup table over a dense index range:
//!
//! ```
//! use vari::{dispatch::{self, MakeIdx, Route}, markers::Idx};
//!
//! struct Square;
//!
//! impl Route<MakeIdx> for Square {
//!     type Output = usize;
//!
//!     fn route<const J: usize>(self, _: Idx<J>) -> usize {
//!         const { J * J }
//!     }
//! }
//!
//! let squares: Vec<usize> = (0..40).map(|i| dispatch::dispatch::<40, _, _>(i, MakeIdx, Square)).collect();
//! assert_eq!(squares[39], 39 * 39);
//! ```

pub use vari_internals::dispatch::{BLOCK, Factory, IndexFn, MAX, Route, dispatch, dispatch_index};
use vari_internals::typelist::{Member, TypeSet};

use crate::{
    VRef, VVal,
    handlers::{Arms, ByValue, Shared},
    markers::Idx,
};

/// A [`Factory`] producing [`Idx<J>`] for the selected index.
#[derive(Debug, Default, Clone, Copy)]
pub struct MakeIdx;

impl Factory for MakeIdx {
    type Out<const J: usize> = Idx<J>;

    #[inline]
    fn make<const J: usize>(&mut self) -> Idx<J> {
        Idx
    }
}

/// Calls the handler accepting `T` among the handlers for `S`, moving `value`
/// into it.
///
/// The handler is picked at compile time: `T` must be a member of `S`, and
/// `arms` must cover every member of `S` exactly once.
///
/// # Examples
///
/// ```
/// use vari::{dispatch::invoke, types, handlers};
///
/// type Num = types![u8, f64];
///
/// let arms = || handlers![|n: u8| u32::from(n), |f: f64| f as u32];
/// assert_eq!(invoke::<Num, _, _, _, _>(7u8, arms()), 7);
/// assert_eq!(invoke::<Num, _, _, _, _>(2.9f64, arms()), 2);
/// ```
#[inline]
pub fn invoke<'a, S, T, I, A, R>(value: T, arms: A) -> R
where
    S: TypeSet + Member<T, I>,
    A: Arms<'a, S, ByValue, R>,
{
    VVal::<S>::new::<T, I>(value).take(arms)
}

/// Like [`invoke`], passing `&T` to the handler.
///
/// # Examples
///
/// ```
/// use vari::{dispatch::invoke_ref, types, handlers};
///
/// let text = String::from("borrowed");
/// let len = invoke_ref::<types![u8, String], _, _, _, _>(
///     &text,
///     handlers![|_: &u8| 1, |s: &String| s.len()],
/// );
/// assert_eq!(len, 8);
/// ```
#[inline]
pub fn invoke_ref<'a, S, T, I, A, R>(value: &'a T, arms: A) -> R
where
    S: TypeSet + Member<T, I> + 'a,
    A: Arms<'a, S, Shared<'a>, R>,
{
    VRef::<S>::new::<T, I>(value).visit(arms)
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use super::*;
    use crate::handlers::{Handle, Poly};

    struct Label;

    impl Route<MakeIdx> for Label {
        type Output = (usize, &'static str);

        fn route<const J: usize>(self, _: Idx<J>) -> Self::Output {
            let parity = if J % 2 == 0 { "even" } else { "odd" };
            (Idx::<J>::VALUE + 1, parity)
        }
    }

    #[test]
    fn test_make_idx_reaches_every_block() {
        for i in [0, 31, 32, 63, 64, 200, 255] {
            let (value, parity) = dispatch::<MAX, _, _>(i, MakeIdx, Label);
            assert_eq!(value, i + 1);
            assert_eq!(parity, if i % 2 == 0 { "even" } else { "odd" });
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_dispatch_out_of_range() {
        dispatch::<3, _, _>(3, MakeIdx, Label);
    }

    struct Size;

    impl<T> Handle<T> for Size {
        type Output = usize;

        fn handle(self, _: T) -> usize {
            core::mem::size_of::<T>()
        }
    }

    #[test]
    fn test_invoke_picks_the_matching_handler() {
        type Set = types![u8, String, Vec<u8>];

        let picked = invoke::<Set, _, _, _, _>(
            Vec::from([1u8, 2]),
            handlers![|_: u8| "byte", |_: String| "string", |_: Vec<u8>| "bytes"],
        );
        assert_eq!(picked, "bytes");

        let size = invoke::<Set, _, _, _, _>(3u8, Poly(Size));
        assert_eq!(size, 1);

        let text = String::from("borrowed");
        let len = invoke_ref::<Set, _, _, _, _>(
            &text,
            handlers![|_: &u8| 0, |s: &String| s.len(), |v: &Vec<u8>| v.len()],
        );
        assert_eq!(len, 8);
        assert_eq!(text, "borrowed");
    }

    struct Prefix;

    impl<'a> Handle<&'a u8> for Prefix {
        type Output = &'a str;

        fn handle(self, _: &'a u8) -> &'a str {
            ""
        }
    }

    impl<'a> Handle<&'a String> for Prefix {
        type Output = &'a str;

        fn handle(self, text: &'a String) -> &'a str {
            &text[..3]
        }
    }

    impl<'a> Handle<&'a Vec<u8>> for Prefix {
        type Output = &'a str;

        fn handle(self, _: &'a Vec<u8>) -> &'a str {
            "bytes"
        }
    }

    #[test]
    fn test_invoke_ref_returns_borrows() {
        type Set = types![u8, String, Vec<u8>];

        let text = String::from("borrowed");
        let prefix = invoke_ref::<Set, _, _, _, _>(&text, Poly(Prefix));
        assert_eq!(prefix, "bor");
        assert_eq!(invoke_ref::<Set, _, _, _, _>(&7u8, Poly(Prefix)), "");

        let size = invoke_ref::<Set, _, _, _, _>(&7u8, Poly(Size));
        assert_eq!(size, core::mem::size_of::<&u8>());
    }
}
