#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`vari`].
//!
//! # Overview
//!
//! This crate contains the type-level machinery and the unsafe, type-erased
//! storage that power the [`vari`] crate. Every container in [`vari`] is a
//! thin, safe shell around one of the two cores defined here.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`vari`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`typelist`]**: Compile-time type sets
//!   - [`Nil`]/[`Leaf`]/[`Node`]: A balanced tree with four branches per
//!     node encoding an ordered type set, built by [`type_set!`]
//!   - [`TypeSet`]: Length, union layout and runtime-index-to-type dispatch
//!   - [`Member`], [`Subset`], [`Remap`]: Index-of and re-indexing tables
//!
//! - **[`handlers`]**: What happens once the active member is known
//!   - [`HCons`]/[`HNil`]: Positional handler lists, one handler per member
//!   - [`Poly`]: A single generic visitor covering every member
//!   - [`Wrap`]: Decides what a handler receives (`&T`, `&mut T`, `T`, ...)
//!
//! - **[`dispatch`]**: Runtime index to const-generic index, through chained
//!   fixed-width match tables
//!
//! - **[`RawPtr`]**: The pointer core, an `(index, address)` pair
//!
//! - **[`RawVal`]**: The inline union core, an `(index, storage)` pair
//!
//! # Safety Strategy
//!
//! Both cores store a type-erased address or union together with a tagged
//! index. Tagged index `0` means "no active member", tagged index `k` means
//! member `k - 1` of the set is live. Every unsafe operation in this crate
//! reduces to one question: does the tagged index match the bytes behind the
//! address?
//!
//! This crate keeps that answer local:
//!
//! - **Module-based encapsulation**: The index and address fields are private
//!   to the module that defines the core, so every write of the index can be
//!   checked in a single file
//! - **Type-level indices**: Indices are only ever computed from [`Member`] and
//!   [`Remap`], never supplied by callers of safe functions
//! - **Documented contracts**: Each `unsafe fn` lists exactly what the caller
//!   must guarantee
//!
//! [`vari`]: https://docs.rs/vari/latest/vari/
//! [`Nil`]: typelist::Nil
//! [`Leaf`]: typelist::Leaf
//! [`Node`]: typelist::Node
//! [`TypeSet`]: typelist::TypeSet
//! [`Member`]: typelist::Member
//! [`Subset`]: typelist::Subset
//! [`Remap`]: typelist::Remap
//! [`HCons`]: handlers::HCons
//! [`HNil`]: handlers::HNil
//! [`Poly`]: handlers::Poly
//! [`Wrap`]: handlers::Wrap

#[cfg(test)]
extern crate alloc;

pub mod dispatch;
pub mod handlers;
mod ptr;
pub mod typelist;
mod util;
mod val;

pub use ptr::RawPtr;
pub use util::Erased;
pub use val::{
    CloneSet, DebugSet, EqSet, HashableSet, OrdSet, PartialEqSet, PartialOrdSet, RawVal,
};
