//! Module containing the inline union core

mod members;
mod raw;

pub use self::{
    members::{CloneSet, DebugSet, EqSet, HashableSet, OrdSet, PartialEqSet, PartialOrdSet},
    raw::RawVal,
};
