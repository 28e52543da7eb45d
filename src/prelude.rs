//! Commonly used items for convenient importing.
//!
//! The prelude re-exports the containers, the set and handler macros, and the
//! [`Empty`] marker, so one `use` statement covers typical code.
//!
//! # Usage
//!
//! ```rust
//! use vari::prelude::*;
//!
//! type Shape = types![Circle, Square];
//!
//! struct Circle(f64);
//! struct Square(f64);
//!
//! fn area(shape: VRef<'_, Shape>) -> f64 {
//!     shape.visit(handlers![
//!         |c: &Circle| 3.0 * c.0 * c.0,
//!         |s: &Square| s.0 * s.0,
//!     ])
//! }
//!
//! let shapes: Vec<VVal<Shape>> = vec![VVal::new(Circle(1.0)), VVal::new(Square(2.0))];
//! let total: f64 = shapes.iter().map(|s| area(s.as_ref())).sum();
//! assert_eq!(total, 7.0);
//! ```
//!
//! # What's Included
//!
//! - **[`types!`]** and **[`handlers!`]**: Build type sets and handler lists
//! - **[`VPtr`]**, **[`VRef`]**, **[`VMut`]**: Borrowing containers
//! - **[`UvPtr`]**, **[`UvRef`]**: Owning heap containers
//! - **[`VVal`]**, **[`VOpt`]**: Owning inline containers
//! - **[`Empty`]**: The argument of the empty-case handler
//! - **[`NarrowError`]**: The error returned by `try_narrow`

pub use crate::{
    NarrowError, UvPtr, UvRef, VMut, VOpt, VPtr, VRef, VVal, handlers, markers::Empty, types,
};
