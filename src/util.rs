//! Internal helpers shared by the containers.

use core::{fmt, ptr::NonNull};

use vari_internals::{DebugSet, Erased, RawPtr, typelist::TypeSet};

/// Emits a `tracing` event for an ownership transition of an owning
/// container. Expands to nothing unless the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
macro_rules! trace_ownership {
    ($action:literal, $container:literal, $index:expr) => {
        tracing::trace!(index = $index, "{} {}", $container, $action)
    };
}

/// Emits a `tracing` event for an ownership transition of an owning
/// container. Expands to nothing unless the `tracing` feature is enabled.
#[cfg(not(feature = "tracing"))]
macro_rules! trace_ownership {
    ($action:literal, $container:literal, $index:expr) => {{
        let _ = $index;
    }};
}

pub(crate) use trace_ownership;

/// The identity of a pointer core: its address and tagged index.
///
/// Pointer forms compare and hash by identity, so two containers are equal
/// exactly when they point at the same member object.
#[inline]
pub(crate) fn identity<S: TypeSet>(raw: RawPtr<S>) -> (Option<NonNull<Erased>>, usize) {
    (raw.address(), raw.tagged_index())
}

/// Formats the pointee of `raw` with its own [`Debug`](fmt::Debug)
/// implementation, or as `Empty`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. If `raw` is not empty, its pointee is live and not mutated for the
///    duration of the call.
pub(crate) unsafe fn fmt_member<S: DebugSet>(
    raw: RawPtr<S>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match raw.address() {
        None => f.write_str("Empty"),
        // SAFETY:
        // 1. The pointer is not empty, so `tagged_index() - 1 < S::LEN`.
        // 2. The address points to that member, live as guaranteed by the
        //    caller.
        Some(ptr) => unsafe { S::fmt_at(raw.tagged_index() - 1, ptr, f) },
    }
}
