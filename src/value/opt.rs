use core::{
    fmt,
    hash::{Hash, Hasher},
};

use vari_internals::{
    CloneSet, DebugSet, EqSet, HashableSet, OrdSet, PartialEqSet, PartialOrdSet, RawVal,
    typelist::{Member, Subset, TypeSet},
};

use crate::{
    NarrowError, UvPtr, VMut, VPtr, VVal,
    handlers::{ByValue, Exclusive, Narrowed, NullableArms, Shared},
};

/// An inline value holding one member of the type set `S`, or nothing.
///
/// This is to [`VVal`] what `Option<T>` is to `T`, without spending an extra
/// discriminant: the empty state is tagged index `0` of the same index byte.
///
/// Visits take a handler for [`Empty`] first, followed by one handler per
/// member. Under comparison, the empty value orders before every member.
///
/// # Examples
///
/// ```
/// use vari::prelude::*;
///
/// let mut slot: VOpt<types![u32, String]> = VOpt::empty();
/// assert!(slot.is_empty());
///
/// slot.set(String::from("filled"));
/// let len = slot.visit(handlers![|_: Empty| 0, |n: &u32| *n as usize, |s: &String| s.len()]);
/// assert_eq!(len, 6);
///
/// assert_eq!(slot.take_value::<String, _>().as_deref(), Some("filled"));
/// assert!(slot.is_empty());
/// ```
///
/// [`Empty`]: crate::markers::Empty
pub struct VOpt<S: TypeSet> {
    raw: RawVal<S>,
}

impl<S: TypeSet> VOpt<S> {
    /// Creates an empty value.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            raw: RawVal::empty(),
        }
    }

    /// Creates a value holding `value`.
    #[inline]
    pub fn new<T, I>(value: T) -> Self
    where
        S: Member<T, I>,
    {
        Self {
            raw: RawVal::new::<T, I>(value),
        }
    }

    /// Replaces the held member with `value`, dropping the previous one.
    #[inline]
    pub fn set<T, I>(&mut self, value: T)
    where
        S: Member<T, I>,
    {
        let previous = core::mem::replace(self, Self::new::<T, I>(value));
        drop(previous);
    }

    /// Drops the held member, leaving the value empty.
    #[inline]
    pub fn reset(&mut self) {
        self.raw.destroy();
    }

    /// Returns `true` if no member is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the position of the held member in `S`, or `None` when empty.
    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.raw.tagged_index().checked_sub(1)
    }

    /// Returns a shared nullable reference to the held member.
    #[inline]
    pub fn as_ptr(&self) -> VPtr<'_, S> {
        // SAFETY: The member, if any, is live while `self` is borrowed and
        // only mutated through `&mut self`.
        unsafe { VPtr::from_raw(self.raw.as_ptr()) }
    }

    /// Returns an exclusive reference to the held member, or `None` when
    /// empty.
    #[inline]
    pub fn as_mut(&mut self) -> Option<VMut<'_, S>> {
        if self.is_empty() {
            return None;
        }
        let raw = self.raw.as_mut_ptr();
        // SAFETY:
        // 1. The core is not empty.
        // 2. The member is owned by `self`, which is exclusively borrowed for
        //    the returned lifetime.
        Some(unsafe { VMut::from_raw(raw) })
    }

    /// Returns a reference to the held member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        S: Member<T, I>,
    {
        self.raw.get::<T, I>()
    }

    /// Returns a mutable reference to the held member if it is of type `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Member<T, I>,
    {
        self.raw.get_mut::<T, I>()
    }

    /// Calls the [`Empty`](crate::markers::Empty) handler, or the handler of
    /// the held member with a `&T` to it.
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

    /// Calls the [`Empty`](crate::markers::Empty) handler, or the handler of
    /// the held member with a `&mut T` to it.
    #[inline]
    pub fn visit_mut<'a, A, R>(&'a mut self, arms: A) -> R
    where
        A: NullableArms<'a, S, Exclusive<'a>, R>,
    {
        let raw = self.raw.as_mut_ptr();
        // SAFETY: The member, if any, is owned by `self`, which is exclusively
        // borrowed for `'a`.
        unsafe { raw.visit_nullable(arms, Exclusive::new()) }
    }

    /// Consumes the value and moves the held member into its handler.
    #[inline]
    pub fn take<'a, A, R>(mut self, arms: A) -> R
    where
        A: NullableArms<'a, S, ByValue, R>,
    {
        let ptr = self.raw.release();
        // SAFETY: `release` gave up ownership of the member without dropping
        // it, and `self` stays in place until the member has been moved out.
        unsafe { ptr.visit_nullable(arms, ByValue) }
    }

    /// Moves the held member out if it is of type `T`, leaving the value
    /// empty.
    #[inline]
    pub fn take_value<T, I>(&mut self) -> Option<T>
    where
        S: Member<T, I>,
    {
        self.raw.take::<T, I>()
    }

    /// Converts into a [`VVal`], or `None` when empty.
    #[inline]
    pub fn into_val(self) -> Option<VVal<S>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: The core is not empty.
        Some(unsafe { VVal::from_raw(self.raw) })
    }

    /// Moves the held member to the heap.
    #[inline]
    pub fn into_uvptr(self) -> UvPtr<S> {
        self.into_val()
            .map_or_else(UvPtr::empty, |value| value.into_uvref().into())
    }

    /// Moves the value into a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> VOpt<Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        VOpt {
            raw: self.raw.widen::<Super, I>(),
        }
    }

    /// Clones the value into a superset of `S`.
    #[inline]
    pub fn widen_cloned<Super, I>(&self) -> VOpt<Super>
    where
        S: CloneSet + Subset<Super, I>,
        Super: TypeSet,
    {
        VOpt {
            raw: self.raw.clone_widen::<Super, I>(),
        }
    }

    /// Moves the value into a subset of `S`.
    ///
    /// An empty value narrows to an empty value.
    ///
    /// # Errors
    ///
    /// Fails if the held member is not part of `Sub`. The error holds the
    /// original value.
    #[inline]
    pub fn try_narrow<Sub, I>(self) -> Result<VOpt<Sub>, NarrowError<Self>>
    where
        Sub: Subset<S, I>,
    {
        self.raw
            .narrow::<Sub, I>()
            .map(|raw| VOpt { raw })
            .map_err(|raw| NarrowError::new(VOpt { raw }))
    }

    /// Swaps the members of two values.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }
}

impl<S: TypeSet> Default for VOpt<S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: TypeSet> From<VVal<S>> for VOpt<S> {
    #[inline]
    fn from(value: VVal<S>) -> Self {
        Self {
            raw: value.into_raw(),
        }
    }
}

impl<S: CloneSet> Clone for VOpt<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<S: PartialEqSet> PartialEq for VOpt<S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<S: EqSet> Eq for VOpt<S> {}

impl<S: PartialOrdSet> PartialOrd for VOpt<S> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        self.raw.partial_cmp(&other.raw)
    }
}

impl<S: OrdSet> Ord for VOpt<S> {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<S: HashableSet> Hash for VOpt<S> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<S: DebugSet> fmt::Debug for VOpt<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}
