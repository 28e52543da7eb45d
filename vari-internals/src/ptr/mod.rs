//! Module containing the pointer core

mod raw;

pub use self::raw::RawPtr;
