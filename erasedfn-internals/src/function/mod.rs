//! Module containing the type-erased callable storage

pub(crate) mod data;
pub(crate) mod inline;
mod raw;
pub(crate) mod vtable;

pub use self::raw::RawFunction;
