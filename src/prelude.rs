//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use erasedfn::prelude::*;
//!
//! let mut callbacks: Vec<Function<(i32,), i32>> = vec![
//!     Function::new(|x: i32| x + 1),
//!     Function::new(|x: i32| x * 2),
//! ];
//! let results: Vec<i32> = callbacks
//!     .iter_mut()
//!     .map(|f| f.call((10,)))
//!     .collect::<Result<_, EmptyInvocation>>()
//!     .unwrap();
//! assert_eq!(results, [11, 20]);
//! ```
//!
//! # What's Included
//!
//! - **[`Function`]**: The callable wrapper
//! - **[`Invoke`]**: The trait implemented by every storable callable
//! - **[`Placement`]**: Inline or heap storage
//! - **[`EmptyInvocation`]** and **[`ConstructionFailure`]**: The errors
//! - **[`markers`]**: Thread-safety markers

pub use crate::{
    Function, Placement,
    error::{ConstructionFailure, EmptyInvocation},
    invoke::Invoke,
    markers,
};
