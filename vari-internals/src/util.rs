//! Internal utility types and per-member operations.

use core::ptr::NonNull;

use crate::typelist::RawFn;

/// Marker type used as the pointee of type-erased addresses.
///
/// Both cores store their address as a `NonNull<Erased>`. The actual pointee
/// is the member selected by the tagged index stored next to it, which is only
/// known at runtime.
///
/// Using a distinct marker type (rather than `()`) makes the intent clearer
/// in type signatures and error messages.
#[derive(Debug, Clone, Copy)]
pub struct Erased;

/// Runs the destructor of the pointee in place.
pub(crate) struct DropInPlace;

impl RawFn for DropInPlace {
    type Output = ();

    #[inline]
    unsafe fn call<T>(self, ptr: NonNull<T>) {
        // SAFETY: The caller guarantees that `ptr` points to a live `T` that
        // is never used again.
        unsafe {
            // @add-unsafe-context: DropInPlace
            core::ptr::drop_in_place(ptr.as_ptr());
        }
    }
}

/// Moves the pointee into `dst`, leaving the source logically uninitialized.
pub(crate) struct MoveTo {
    /// Destination storage. Must be valid for writes of the pointee type.
    pub(crate) dst: NonNull<Erased>,
}

impl RawFn for MoveTo {
    type Output = ();

    #[inline]
    unsafe fn call<T>(self, ptr: NonNull<T>) {
        // SAFETY: The caller guarantees that `ptr` points to a live `T`, whose
        // ownership is transferred to us.
        let value = unsafe { ptr.read() };
        // SAFETY: The caller guarantees that `dst` is valid for writes of `T`.
        unsafe {
            // @add-unsafe-context: MoveTo
            self.dst.cast::<T>().write(value);
        }
    }
}
