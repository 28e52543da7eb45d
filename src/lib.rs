#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Closed-set polymorphism without trait objects.
//!
//! ## Overview
//!
//! This crate provides pointers, references and values that hold exactly one
//! member of a fixed, compile-time list of types, together with exhaustive
//! visits over that list. Where a trait object answers "some type
//! implementing this trait", a `vari` container answers "one of *these*
//! types", and the compiler checks that every visit handles each of them.
//!
//! ## Quick Example
//!
//! ```
//! use vari::prelude::*;
//!
//! type Field = types![i32, String];
//!
//! fn describe(ptr: VPtr<'_, Field>) -> String {
//!     ptr.visit(handlers![
//!         |_: Empty| "nothing".to_string(),
//!         |i: &i32| format!("the number {i}"),
//!         |s: &String| format!("the text {s:?}"),
//!     ])
//! }
//!
//! let number = 42;
//! let mut ptr: VPtr<'_, Field> = VPtr::empty();
//! assert_eq!(describe(ptr), "nothing");
//!
//! ptr = VPtr::new(&number);
//! assert_eq!(describe(ptr), "the number 42");
//! ```
//!
//! ## Core Concepts
//!
//! A **type set** is an ordered list of member types, written with the
//! [`types!`] macro. Nested sets are flattened with `..`:
//! `types![u8, ..Shapes, String]`. Every container is parameterized by one.
//!
//! The containers differ in how they hold the active member:
//!
//! | Container       | Holds                  | Empty state | Owns the member |
//! |-----------------|------------------------|-------------|-----------------|
//! | [`VPtr`]        | a shared borrow        | yes         | no              |
//! | [`VRef`]        | a shared borrow        | no          | no              |
//! | [`VMut`]        | an exclusive borrow    | no          | no              |
//! | [`UvPtr`]       | a heap allocation      | yes         | yes             |
//! | [`UvRef`]       | a heap allocation      | no          | yes             |
//! | [`VOpt`]        | inline storage         | yes         | yes             |
//! | [`VVal`]        | inline storage         | no          | yes             |
//!
//! **Visits** take a handler set built with [`handlers!`]: one closure per
//! member, in member order, preceded by a closure taking [`Empty`] for the
//! containers that can be empty. A missing, surplus or mistyped handler is a
//! compile error. A single generic visitor can be used instead by
//! implementing [`Handle`](handlers::Handle) and wrapping it in
//! [`Poly`](handlers::Poly).
//!
//! **Conversions** between type sets are methods. `widen` moves a container
//! to any superset and always succeeds. `try_narrow` moves it to a subset and
//! fails with a [`NarrowError`] holding the original container if the active
//! member is not part of the subset.
//!
//! **Ownership** of the heap forms is single and explicit: they are move-only,
//! and destroy their member through a pluggable [destruction
//! policy](deleter). `take` consumes a container and hands its member to
//! exactly one handler, as an owning reference narrowed to that member.
//!
//! ## Features
//!
//! - `tracing`: emits `tracing` events at the ownership transitions of owning
//!   containers (take, release, reset and destruction).
//!
//! [`Empty`]: markers::Empty

extern crate alloc;

#[macro_use]
mod macros;

pub mod deleter;
pub mod dispatch;
pub mod handlers;
pub mod markers;
pub mod prelude;
pub mod typelist;

mod borrowed;
mod conversion;
mod owned;
mod util;
mod value;

pub use vari_internals::RawPtr;

pub use self::{
    borrowed::{mut_::VMut, ptr::VPtr, ref_::VRef},
    conversion::{NarrowError, vcast},
    owned::{ptr::UvPtr, ref_::UvRef},
    value::{opt::VOpt, val::VVal},
};

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    pub use vari_internals::{
        handlers::{HCons, HNil},
        type_set,
    };
}
