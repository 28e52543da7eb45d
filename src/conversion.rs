//! Narrowing failures and member conversion.

use core::fmt;

use vari_internals::typelist::TypeSet;

use crate::{
    VRef,
    handlers::{Arms, Cast, Poly, Shared},
};

/// Error returned when narrowing a container to a type set that does not
/// contain its active member.
///
/// The container is returned untouched and can be recovered with
/// [`NarrowError::into_inner`], so a failed narrowing never loses or drops
/// the member.
///
/// # Examples
///
/// ```
/// use vari::prelude::*;
///
/// let value: VVal<types![i32, String]> = VVal::new(String::from("text"));
/// let error = value.try_narrow::<types![i32], _>().unwrap_err();
/// assert_eq!(
///     error.to_string(),
///     "the active member is not part of the target type set"
/// );
///
/// let value = error.into_inner();
/// assert_eq!(value.get::<String, _>().map(String::as_str), Some("text"));
/// ```
#[derive(derive_more::Display)]
#[display("the active member is not part of the target type set")]
pub struct NarrowError<C> {
    /// The container that failed to narrow.
    source: C,
}

impl<C> NarrowError<C> {
    /// Wraps the container that failed to narrow.
    #[inline]
    pub(crate) fn new(source: C) -> Self {
        Self { source }
    }

    /// Returns the container that failed to narrow.
    #[inline]
    pub fn into_inner(self) -> C {
        self.source
    }

    /// Returns a reference to the container that failed to narrow.
    #[inline]
    pub fn inner(&self) -> &C {
        &self.source
    }
}

impl<C> fmt::Debug for NarrowError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrowError").finish_non_exhaustive()
    }
}

impl<C> core::error::Error for NarrowError<C> {}

/// Converts the member referenced by `value` into `R`.
///
/// Every member of the set must convert into `R` from a shared reference, as
/// required by [`Cast`].
/// Owning containers and inline values are converted through their
/// `as_ref` view.
///
/// # Examples
///
/// ```
/// use vari::{prelude::*, vcast};
///
/// struct Label(String);
///
/// impl From<&i32> for Label {
///     fn from(value: &i32) -> Self {
///         Label(format!("int {value}"))
///     }
/// }
///
/// impl From<&&str> for Label {
///     fn from(value: &&str) -> Self {
///         Label(format!("text {value}"))
///     }
/// }
///
/// let value: VVal<types![i32, &str]> = VVal::new(7i32);
/// let label: Label = vcast(value.as_ref());
/// assert_eq!(label.0, "int 7");
/// ```
#[inline]
pub fn vcast<'a, R, S>(value: VRef<'a, S>) -> R
where
    S: TypeSet,
    Poly<Cast<R>>: Arms<'a, S, Shared<'a>, R>,
{
    value.visit(Poly(Cast::new()))
}
