//! Destruction policies for the owning containers.
//!
//! [`UvPtr`] and [`UvRef`] do not hard-code how their member is released.
//! They hold a *deleter* and call [`Destroy::destroy`] on it with the address
//! of the active member, typed as that member, when they are dropped or reset.
//!
//! The deleter is held by value, so its ownership mode follows its type:
//!
//! - [`BoxDelete`]: the default. A zero-sized policy that frees a [`Box`]
//!   allocation.
//! - `&D`: a borrowed policy owned by someone else. It is `Copy`, and the
//!   container cannot outlive it.
//! - [`Arc<D>`](triomphe::Arc): a shared, reference-counted policy.
//!
//! Converting a container to another deleter type goes through [`From`], see
//! [`UvPtr::convert`].
//!
//! [`Box`]: alloc::boxed::Box
//! [`UvPtr`]: crate::UvPtr
//! [`UvRef`]: crate::UvRef
//! [`UvPtr::convert`]: crate::UvPtr::convert

use alloc::boxed::Box;
use core::ptr::NonNull;

/// A policy releasing owned members.
///
/// # Examples
///
/// A deleter counting how many members it released, used by reference:
///
/// ```
/// use core::{cell::Cell, ptr::NonNull};
///
/// use vari::{
///     deleter::{BoxDelete, Destroy, DestroysBox},
///     prelude::*,
/// };
///
/// #[derive(Default)]
/// struct Counting(Cell<usize>);
///
/// impl Destroy for Counting {
///     unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
///         self.0.set(self.0.get() + 1);
///         // SAFETY: Forwarded from our caller.
///         unsafe { BoxDelete.destroy(ptr) }
///     }
/// }
///
/// // SAFETY: Releases members through `BoxDelete`.
/// unsafe impl DestroysBox for Counting {}
///
/// let counting = Counting::default();
/// {
///     let _a: UvRef<types![i32], &Counting> = UvRef::new_in(1i32, &counting);
///     let _b: UvPtr<types![i32, String], &Counting> = UvPtr::new_in(2i32, &counting);
/// }
/// assert_eq!(counting.0.get(), 2);
/// ```
pub trait Destroy {
    /// Releases the member at `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live `T` owned by the caller, which is never used
    ///    again after this call.
    /// 2. `ptr` was allocated in the way this policy expects. For policies
    ///    implementing [`DestroysBox`], allocating it with [`Box`] is enough.
    ///
    /// [`Box`]: alloc::boxed::Box
    unsafe fn destroy<T>(&self, ptr: NonNull<T>);
}

/// A [`Destroy`] policy that releases members allocated with [`Box`].
///
/// The owning containers only accept boxed members from safe code when their
/// deleter implements this trait.
///
/// # Safety
///
/// Implementors must ensure that [`Destroy::destroy`] correctly drops and
/// deallocates any pointer obtained from [`Box::into_raw`] or [`Box::leak`],
/// for every type `T`.
///
/// [`Box`]: alloc::boxed::Box
/// [`Box::into_raw`]: alloc::boxed::Box::into_raw
/// [`Box::leak`]: alloc::boxed::Box::leak
pub unsafe trait DestroysBox: Destroy {}

/// The default destruction policy: drops and deallocates a [`Box`].
///
/// [`Box`]: alloc::boxed::Box
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxDelete;

impl Destroy for BoxDelete {
    #[inline]
    unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
        // SAFETY: The caller guarantees `ptr` came from a `Box<T>` it owns and
        // never uses again.
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        drop(boxed);
    }
}

// SAFETY: `destroy` reconstructs the `Box<T>` and drops it.
unsafe impl DestroysBox for BoxDelete {}

impl<D: Destroy> Destroy for &D {
    #[inline]
    unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
        // SAFETY: Forwarded from our caller.
        unsafe { D::destroy(self, ptr) }
    }
}

// SAFETY: Forwards to `D`, which releases boxes.
unsafe impl<D: DestroysBox> DestroysBox for &D {}

impl<D: Destroy> Destroy for triomphe::Arc<D> {
    #[inline]
    unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
        // SAFETY: Forwarded from our caller.
        unsafe { D::destroy(self, ptr) }
    }
}

// SAFETY: Forwards to `D`, which releases boxes.
unsafe impl<D: DestroysBox> DestroysBox for triomphe::Arc<D> {}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_box_delete_drops_once() {
        let drops = Rc::new(Cell::new(0));
        let ptr = NonNull::from(Box::leak(Box::new(Counted(drops.clone()))));
        // SAFETY: `ptr` comes from a box and is not used again.
        unsafe { BoxDelete.destroy(ptr) };
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_forwarding_policies() {
        let drops = Rc::new(Cell::new(0));
        let shared = triomphe::Arc::new(BoxDelete);
        let by_ref = &BoxDelete;

        let ptr = NonNull::from(Box::leak(Box::new(Counted(drops.clone()))));
        // SAFETY: `ptr` comes from a box and is not used again.
        unsafe { shared.destroy(ptr) };
        let ptr = NonNull::from(Box::leak(Box::new(Counted(drops.clone()))));
        // SAFETY: `ptr` comes from a box and is not used again.
        unsafe { by_ref.destroy(ptr) };
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_policy_traits() {
        static_assertions::assert_impl_all!(BoxDelete: DestroysBox, Copy, Send, Sync, Default);
        static_assertions::assert_impl_all!(&'static BoxDelete: DestroysBox, Copy);
        static_assertions::assert_impl_all!(triomphe::Arc<BoxDelete>: DestroysBox, Clone, Send, Sync);
        assert_eq!(core::mem::size_of::<BoxDelete>(), 0);
    }
}
