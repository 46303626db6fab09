#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A key-value map over the chaining table.
///
/// This module provides a `ChainMap` that wraps the `ChainTable` and hashes
/// keys with a configurable `BuildHasher` before folding them into the
/// universal-hashing domain.
pub mod chain_map;

pub mod chain_table;

pub mod universal;

mod store;

pub use chain_map::ChainMap;
pub use chain_table::ChainTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Default hasher builder used by [`ChainMap`] when none is named.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else {
        /// Placeholder hasher builder used when the `foldhash` feature is
        /// disabled. It cannot be constructed; name a hasher builder
        /// explicitly via [`ChainMap::with_hasher`].
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
