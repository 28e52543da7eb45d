//! Owning inline containers: [`VVal`] and [`VOpt`].
//!
//! These store their member inside the container itself, in storage as
//! large and as aligned as the largest member of the set. Nothing is
//! allocated.
//!
//! [`VVal`]: crate::VVal
//! [`VOpt`]: crate::VOpt

use alloc::boxed::Box;
use core::ptr::NonNull;

use vari_internals::{Erased, typelist::RawFn};

pub(crate) mod opt;
pub(crate) mod val;

/// Moves the pointee into a new [`Box`] and returns the box's address.
struct BoxIt;

impl RawFn for BoxIt {
    type Output = NonNull<Erased>;

    #[inline]
    unsafe fn call<T>(self, ptr: NonNull<T>) -> NonNull<Erased> {
        // SAFETY: The caller guarantees `ptr` points to a live `T` whose
        // ownership is transferred to us.
        let value = unsafe { ptr.read() };
        NonNull::from(Box::leak(Box::new(value))).cast::<Erased>()
    }
}
