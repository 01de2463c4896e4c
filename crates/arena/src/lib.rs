//! # nebula-arena
//!
//! Fixed-capacity, high-watermark arena over a caller-supplied buffer.
//!
//! A [`BufferManager`] borrows a contiguous region and hands out
//! consecutive chunks of it by advancing a cursor. Nothing is ever given
//! back: the region is reclaimed all at once when its owner discards it.
//! A [`BufferAllocator`] is the typed, cloneable handle containers use;
//! every clone and every rebound handle shares one manager.
//!
//! ## Quick Start
//!
//! ```rust
//! use core::mem::MaybeUninit;
//! use std::rc::Rc;
//! use nebula_arena::prelude::*;
//!
//! let mut buffer = [MaybeUninit::<u64>::uninit(); 8];
//! let manager = Rc::new(BufferManager::from_elements(&mut buffer));
//!
//! let ints = BufferAllocator::<u32>::with_manager(Rc::clone(&manager));
//! let words = ints.rebind::<u64>();
//!
//! ints.allocate(2)?;
//! words.allocate(1)?;
//! assert_eq!(manager.allocated(), 16);
//! assert_eq!(ints, words);
//! # Ok::<(), nebula_arena::MemoryError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): lifecycle and allocation events via `tracing`
//! - `allocator-api2` (default): implements `allocator_api2::alloc::Allocator`
//!   so the arena can back `allocator_api2::vec::Vec` and `hashbrown` tables
//!
//! ## Thread Safety
//!
//! Managers and allocators are single-threaded (`!Send`, `!Sync`).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
// Precision loss in usize -> f64 casts is acceptable for stats
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::elidable_lifetime_names)]

pub mod allocator;
#[cfg(feature = "allocator-api2")]
mod api2;
pub mod config;
mod cursor;
pub mod error;
pub mod manager;
pub mod stats;
pub mod traits;
pub mod utils;

pub use crate::allocator::BufferAllocator;
pub use crate::config::BufferConfig;
pub use crate::error::{AllocResult, MemoryError, MemoryResult};
pub use crate::manager::BufferManager;
pub use crate::stats::{ArenaStats, StatisticsProvider};
pub use crate::traits::{ContainerAllocator, MemoryUsage};

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::allocator::BufferAllocator;
    pub use crate::config::BufferConfig;
    pub use crate::error::{AllocResult, MemoryError, MemoryResult};
    pub use crate::manager::BufferManager;
    pub use crate::stats::{ArenaStats, StatisticsProvider};
    pub use crate::traits::{ContainerAllocator, MemoryUsage};
}
