#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;

/// The keyed hash table.
///
/// This module provides [`FishTable`], which wraps the raw [`HashTable`] with
/// a configurable hasher, `Result`-returning operations and a value
/// initializer.
pub mod fish_table;

mod fish_table_proptest;

pub mod hash;

pub mod hash_table;

mod id_pair;

pub use error::Error;
pub use fish_table::Entry;
pub use fish_table::FishTable;
pub use hash::BuildIdHasher;
pub use hash::DefaultHashBuilder;
pub use hash::IdHasher;
pub use hash_table::HashTable;
pub use id_pair::IdPair;
