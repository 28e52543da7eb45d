//! Owning heap containers: [`UvPtr`] and [`UvRef`].
//!
//! Both own one member allocated outside the container, and release it
//! through their [deleter](crate::deleter) when dropped. They are move-only:
//! ownership of a member is never shared between two containers.
//!
//! [`UvPtr`]: crate::UvPtr
//! [`UvRef`]: crate::UvRef

use core::ptr::NonNull;

use vari_internals::typelist::RawFn;

use crate::deleter::Destroy;

pub(crate) mod ptr;
pub(crate) mod ref_;

/// Releases the pointee through a deleter.
pub(crate) struct DestroyWith<'d, D> {
    /// The deleter releasing the pointee.
    pub(crate) deleter: &'d D,
}

impl<D: Destroy> RawFn for DestroyWith<'_, D> {
    type Output = ();

    #[inline]
    unsafe fn call<T>(self, ptr: NonNull<T>) {
        // SAFETY: The caller guarantees `ptr` points to a live `T` it owns,
        // allocated the way the deleter expects, and never used again.
        unsafe {
            self.deleter.destroy(ptr);
        }
    }
}
