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
//! Internal implementation crate for [`erasedfn`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased storage and the unsafe
//! operations that power the [`erasedfn`] callable wrapper. It provides a
//! small-buffer optimized, vtable-dispatched container for any callable that
//! matches a fixed call signature.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`erasedfn`] crate, not this one.
//!
//! # Architecture
//!
//! The crate is organized in three layers, leaves first:
//!
//! - **[`placement`]**: Decides at compile time whether a callable is stored
//!   inline or on the heap.
//! - **[`invoke`]**: The [`Invoke`] trait that binds a call shape (argument
//!   tuple plus return type) to a concrete callable.
//! - **`function`**: Type-erased storage
//!   - [`RawFunction`]: Owned storage that is empty, inline or heap allocated
//!   - [`FunctionData`]: `#[repr(C)]` pairing of a vtable and a callable
//!   - [`FunctionVtable`]: Function pointers for type-erased dispatch
//!   - [`InlineBuffer`]: The fixed-size, fixed-alignment inline arena
//!
//! # Safety Strategy
//!
//! When we erase a type like `FunctionData<Args, R, MyClosure>` to
//! `FunctionData<Args, R, Erased>`, we must ensure that the vtable function
//! pointers still match the concrete callable stored in memory, no matter
//! whether that memory is the inline arena or a heap allocation.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **`#[repr(C)]` layout**: The vtable is always the first field, so it can
//!   be read through a pointer to an erased payload without constructing an
//!   invalid reference
//! - **Typed relocation**: Payloads only ever move between storage slots
//!   through the vtable's `relocate_into` or `clone_into`, which read and
//!   write exactly one value of the concrete type
//!
//! [`erasedfn`]: https://docs.rs/erasedfn/latest/erasedfn/
//! [`Invoke`]: invoke::Invoke
//! [`FunctionData`]: function::data::FunctionData
//! [`FunctionVtable`]: function::vtable::FunctionVtable
//! [`InlineBuffer`]: function::inline::InlineBuffer

extern crate alloc;

mod function;
pub mod invoke;
pub mod placement;
mod util;

pub use function::RawFunction;
