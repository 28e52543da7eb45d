/// Builds a type set from a list of member types.
///
/// Members are listed in order. A member written as `..Set` splices the
/// members of another type set in its place, so nested sets flatten into a
/// single list.
///
/// The position of each member is its index: `types![A, B]` and
/// `types![B, A]` are different sets, and visits list their handlers in that
/// order.
///
/// # Examples
///
/// ```
/// use vari::{prelude::*, typelist::TypeSet};
///
/// type Numbers = types![i32, f64];
/// type Values = types![bool, ..Numbers, String];
///
/// assert_eq!(<Values as TypeSet>::LEN, 4);
///
/// let value: VVal<Values> = VVal::new(2.5f64);
/// assert_eq!(value.index(), 2);
/// ```
///
/// Storing a type the set does not list fails to compile:
///
/// ```compile_fail
/// use vari::prelude::*;
///
/// let value: VVal<types![i32, String]> = VVal::new(1.5f32);
/// ```
///
/// So does storing a type the set lists twice, since its position is
/// ambiguous:
///
/// ```compile_fail
/// use vari::prelude::*;
///
/// let value: VVal<types![i32, String, i32]> = VVal::new(1i32);
/// ```
///
/// # Large sets
///
/// A set may hold up to 255 members. The members are arranged in a balanced
/// tree with four branches per node (see [`typelist`](crate::typelist)), so
/// lookups, visits and the storage union only nest about `log4(N)` levels
/// deep, and sets of any supported size compile under the default
/// `recursion_limit`. Positional [`handlers!`] lists stay flat, so large sets
/// are best visited with a generic [`Poly`](crate::handlers::Poly) visitor.
#[macro_export]
macro_rules! types {
    ($($items:tt)*) => {
        $crate::__private::type_set![$($items)*]
    };
}

/// Builds a positional handler list.
///
/// Each handler is a closure (or any other `FnOnce`) taking the argument its
/// member is visited with. Handlers are matched to members by position: the
/// first handler handles the first member, and so on. Containers that can be
/// empty expect one extra handler in front, taking [`Empty`].
///
/// Closure arguments must be annotated, since the list is built before the
/// container knows which argument types it will pass.
///
/// [`Empty`]: crate::markers::Empty
///
/// # Examples
///
/// ```
/// use vari::prelude::*;
///
/// let value: VVal<types![u8, &str]> = VVal::new("seven");
/// let len = value.visit(handlers![|n: &u8| usize::from(*n), |s: &&str| s.len()]);
/// assert_eq!(len, 5);
/// ```
///
/// A missing handler fails to compile:
///
/// ```compile_fail
/// use vari::prelude::*;
///
/// let value: VVal<types![u8, &str]> = VVal::new("seven");
/// let len = value.visit(handlers![|n: &u8| usize::from(*n)]);
/// ```
///
/// So does a surplus one:
///
/// ```compile_fail
/// use vari::prelude::*;
///
/// let value: VVal<types![u8, &str]> = VVal::new("seven");
/// let len = value.visit(handlers![
///     |n: &u8| usize::from(*n),
///     |s: &&str| s.len(),
///     |f: &f32| 0usize,
/// ]);
/// ```
///
/// And so does forgetting the handler of the empty case:
///
/// ```compile_fail
/// use vari::prelude::*;
///
/// let value: VOpt<types![u8, &str]> = VOpt::new("seven");
/// let len = value.visit(handlers![|n: &u8| usize::from(*n), |s: &&str| s.len()]);
/// ```
#[macro_export]
macro_rules! handlers {
    () => {
        $crate::__private::HNil
    };
    ($a:expr, $b:expr, $c:expr, $d:expr $(, $($rest:tt)*)?) => {
        $crate::__private::HCons {
            head: $a,
            tail: $crate::__private::HCons {
                head: $b,
                tail: $crate::__private::HCons {
                    head: $c,
                    tail: $crate::__private::HCons {
                        head: $d,
                        tail: $crate::handlers![$($($rest)*)?],
                    },
                },
            },
        }
    };
    ($head:expr $(, $($rest:tt)*)?) => {
        $crate::__private::HCons {
            head: $head,
            tail: $crate::handlers![$($($rest)*)?],
        }
    };
}
