//! The inline `(index, storage)` union core.
//!
//! This module encapsulates the `index` and `storage` fields of [`RawVal`].
//! The index is only written right after a member has been constructed in the
//! storage, or right before the member is destroyed or moved out, which keeps
//! the invariant below checkable in this file alone.
//!
//! # Safety Invariant
//!
//! If the tagged index of a [`RawVal<S>`] is `k != 0`, the storage holds a
//! live, fully constructed value of member `k - 1` of `S`. If it is `0`, the
//! storage holds nothing that needs dropping.
//!
//! # Layout
//!
//! The storage is a [`MaybeUninit`] of the set's union, a tree of
//! `#[repr(C)]` unions following the tree of the set. It is exactly as large
//! and as aligned as the largest member, and every member lives at offset
//! zero.

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    mem::{ManuallyDrop, MaybeUninit},
    ptr::NonNull,
};

use crate::{
    ptr::RawPtr,
    typelist::{CAPACITY, Member, Remap, Subset, TypeSet},
    util::{DropInPlace, Erased, MoveTo},
    val::members::{CloneSet, DebugSet, EqSet, HashableSet, OrdSet, PartialEqSet, PartialOrdSet},
};

/// Inline storage for one member of the type set `S`, plus its tagged index.
///
/// The value owns its member: dropping a [`RawVal`] drops the active member.
/// Moving it is a plain memcpy, like moving any Rust value.
pub struct RawVal<S: TypeSet> {
    /// Tagged index of the active member.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `index <= S::LEN`.
    /// 2. If `index != 0`, `storage` holds a live value of member `index - 1`.
    index: u8,

    /// Storage shared by every member.
    storage: MaybeUninit<S::Union>,
}

impl<S: TypeSet> RawVal<S> {
    /// Creates an empty value.
    #[inline]
    pub const fn empty() -> Self {
        const { assert!(S::LEN < CAPACITY, "type sets hold at most 255 members") };
        Self {
            index: 0,
            storage: MaybeUninit::uninit(),
        }
    }

    /// Creates a value holding `value`.
    #[inline]
    pub fn new<T, I>(value: T) -> Self
    where
        S: Member<T, I>,
    {
        let mut this = Self::empty();
        this.emplace(value);
        this
    }

    /// Type-erased address of the storage, for reading.
    #[inline]
    fn storage_ptr(&self) -> NonNull<Erased> {
        NonNull::from(&self.storage).cast::<Erased>()
    }

    /// Type-erased address of the storage, for writing.
    #[inline]
    fn storage_mut_ptr(&mut self) -> NonNull<Erased> {
        NonNull::from(&mut self.storage).cast::<Erased>()
    }

    /// Returns the tagged index: `0` when empty, `k` when member `k - 1` is
    /// active.
    #[inline]
    pub fn tagged_index(&self) -> usize {
        usize::from(self.index)
    }

    /// Returns `true` if no member is active.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    /// Drops the active member, then constructs `value` in its place.
    #[inline]
    pub fn emplace<T, I>(&mut self, value: T)
    where
        S: Member<T, I>,
    {
        self.destroy();
        debug_assert!(self.is_empty());

        // SAFETY: Every member lives at offset zero of the union, and the union
        // is large and aligned enough for each of them, including `T`.
        unsafe {
            self.storage_mut_ptr().cast::<T>().write(value);
        }
        self.index = (<S as Member<T, I>>::INDEX + 1) as u8;
    }

    /// Drops the active member, leaving the value empty.
    #[inline]
    pub fn destroy(&mut self) {
        let tagged = self.tagged_index();
        if tagged == 0 {
            return;
        }

        // Marking the value empty first means a panicking destructor cannot
        // cause a second drop.
        self.index = 0;
        let ptr = self.storage_mut_ptr();

        // SAFETY:
        // 1. `tagged - 1 < S::LEN`, by the invariants of this type.
        // 2. The storage holds a live value of member `tagged - 1`, which is
        //    never used again since the index is now `0`.
        unsafe {
            S::dispatch(tagged - 1, ptr, DropInPlace);
        }
    }

    /// Returns a pointer core to the active member, valid for shared access
    /// while `self` is borrowed.
    #[inline]
    pub fn as_ptr(&self) -> RawPtr<S> {
        // SAFETY: The tagged index satisfies `index <= S::LEN`, and a non-zero
        // index means the storage holds the matching member at offset zero.
        unsafe { RawPtr::from_parts(self.tagged_index(), self.storage_ptr()) }
    }

    /// Returns a pointer core to the active member, valid for exclusive
    /// access while `self` is mutably borrowed.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> RawPtr<S> {
        let tagged = self.tagged_index();
        // SAFETY: See `as_ptr`.
        unsafe { RawPtr::from_parts(tagged, self.storage_mut_ptr()) }
    }

    /// Gives up ownership of the active member.
    ///
    /// The returned pointer core points into `self`. The value is left empty
    /// without dropping the member, so the caller is responsible for moving
    /// it out or dropping it through the returned pointer before `self` is
    /// reused or moved.
    #[inline]
    pub fn release(&mut self) -> RawPtr<S> {
        let ptr = self.as_mut_ptr();
        self.index = 0;
        ptr
    }

    /// Returns a reference to the active member if it is of type `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        S: Member<T, I>,
    {
        let ptr = self.as_ptr().downcast::<T, I>()?;
        // SAFETY: The active member is of type `T` and lives as long as the
        // borrow of `self`.
        Some(unsafe { ptr.as_ref() })
    }

    /// Returns a mutable reference to the active member if it is of type `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Member<T, I>,
    {
        let mut ptr = self.as_mut_ptr().downcast::<T, I>()?;
        // SAFETY: The active member is of type `T`, and `self` is exclusively
        // borrowed for the lifetime of the reference.
        Some(unsafe { ptr.as_mut() })
    }

    /// Moves the active member out if it is of type `T`, leaving the value
    /// empty.
    #[inline]
    pub fn take<T, I>(&mut self) -> Option<T>
    where
        S: Member<T, I>,
    {
        let ptr = self.as_mut_ptr().downcast::<T, I>()?;
        self.index = 0;
        // SAFETY: The storage holds a live `T`. The index was cleared, so the
        // value is moved out exactly once.
        Some(unsafe { ptr.read() })
    }

    /// Moves the active member into a value over a superset of `S`.
    #[inline]
    pub fn widen<Super, I>(self) -> RawVal<Super>
    where
        S: Subset<Super, I>,
        Super: TypeSet,
    {
        let tagged = Remap::<S, Super, I>::WIDEN[self.tagged_index()];
        // SAFETY: `tagged` is the tagged index of the active member of `self`
        // in `Super`.
        unsafe { self.move_into(usize::from(tagged)) }
    }

    /// Moves the active member into a value over a subset of `S`.
    ///
    /// Returns `self` unchanged if the active member is not part of `Sub`.
    #[inline]
    pub fn narrow<Sub, I>(self) -> Result<RawVal<Sub>, Self>
    where
        Sub: Subset<S, I>,
    {
        let tagged = Remap::<Sub, S, I>::NARROW[self.tagged_index()];
        if tagged == 0 && !self.is_empty() {
            return Err(self);
        }
        // SAFETY: `tagged` is the tagged index of the active member of `self`
        // in `Sub`.
        Ok(unsafe { self.move_into(usize::from(tagged)) })
    }

    /// Moves the active member into a value over another type set.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. If `self` is empty, `tagged == 0`.
    /// 2. Otherwise, member `tagged - 1` of `Target` is the same type as the
    ///    active member of `self`.
    #[inline]
    unsafe fn move_into<Target: TypeSet>(self, tagged: usize) -> RawVal<Target> {
        let mut this = ManuallyDrop::new(self);
        let mut out = RawVal::<Target>::empty();
        let source = this.tagged_index();
        if source != 0 {
            let dst = out.storage_mut_ptr();
            let src = this.storage_mut_ptr();
            // SAFETY:
            // 1. `source - 1 < S::LEN` by the invariants of this type.
            // 2. `src` holds a live value of member `source - 1`, owned by us.
            //    `this` is never dropped, so the value is moved exactly once.
            // 3. `dst` points to the storage of `Target`, which holds that same
            //    type (guaranteed by the caller) at offset zero.
            unsafe {
                S::dispatch(source - 1, src, MoveTo { dst });
            }
            out.index = tagged as u8;
        }
        out
    }

    /// Clones the active member into a value over a superset of `S`.
    #[inline]
    pub fn clone_widen<Super, I>(&self) -> RawVal<Super>
    where
        S: CloneSet + Subset<Super, I>,
        Super: TypeSet,
    {
        let mut out = RawVal::<Super>::empty();
        let source = self.tagged_index();
        if source != 0 {
            let dst = out.storage_mut_ptr();
            // SAFETY:
            // 1. `source - 1 < S::LEN` by the invariants of this type.
            // 2. The storage holds a live value of member `source - 1`.
            // 3. `dst` is the storage of a superset of `S`, so it can hold every
            //    member of `S` at offset zero.
            unsafe {
                S::clone_at(source - 1, self.storage_ptr(), dst);
            }
            out.index = Remap::<S, Super, I>::WIDEN[source];
        }
        out
    }
}

impl<S: TypeSet> Drop for RawVal<S> {
    #[inline]
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<S: CloneSet> Clone for RawVal<S> {
    fn clone(&self) -> Self {
        let mut out = Self::empty();
        let source = self.tagged_index();
        if source != 0 {
            let dst = out.storage_mut_ptr();
            // SAFETY: Same as `clone_widen`, with `S` as its own superset.
            unsafe {
                S::clone_at(source - 1, self.storage_ptr(), dst);
            }
            out.index = self.index;
        }
        out
    }
}

impl<S: PartialEqSet> PartialEq for RawVal<S> {
    fn eq(&self, other: &Self) -> bool {
        if self.index != other.index {
            return false;
        }
        match self.tagged_index() {
            0 => true,
            // SAFETY: Both values hold a live value of member `tagged - 1`.
            tagged => unsafe { S::eq_at(tagged - 1, self.storage_ptr(), other.storage_ptr()) },
        }
    }
}

impl<S: EqSet> Eq for RawVal<S> {}

impl<S: PartialOrdSet> PartialOrd for RawVal<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.index != other.index {
            return Some(self.index.cmp(&other.index));
        }
        match self.tagged_index() {
            0 => Some(Ordering::Equal),
            // SAFETY: Both values hold a live value of member `tagged - 1`.
            tagged => unsafe {
                S::partial_cmp_at(tagged - 1, self.storage_ptr(), other.storage_ptr())
            },
        }
    }
}

impl<S: OrdSet> Ord for RawVal<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.index != other.index {
            return self.index.cmp(&other.index);
        }
        match self.tagged_index() {
            0 => Ordering::Equal,
            // SAFETY: Both values hold a live value of member `tagged - 1`.
            tagged => unsafe { S::cmp_at(tagged - 1, self.storage_ptr(), other.storage_ptr()) },
        }
    }
}

impl<S: HashableSet> Hash for RawVal<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        if let Some(index) = self.tagged_index().checked_sub(1) {
            // SAFETY: The storage holds a live value of member `index`.
            unsafe { S::hash_at(index, self.storage_ptr(), state) }
        }
    }
}

impl<S: DebugSet> fmt::Debug for RawVal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tagged_index().checked_sub(1) {
            None => f.write_str("Empty"),
            // SAFETY: The storage holds a live value of member `index`.
            Some(index) => unsafe { S::fmt_at(index, self.storage_ptr(), f) },
        }
    }
}
