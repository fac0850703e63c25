//! # name-cache
//!
//! Watch-driven short-name cache over store subtrees.
//!
//! Callers register a short name against one or more store subtrees; the
//! live children of those subtrees are mirrored into an in-process
//! [`NameContainer`] and kept fresh by per-registration watch tasks.
//! Lookups -- one random instance, the designated master, or the full batch
//! -- are answered from the cache without a store round-trip, with bounded
//! staleness of one change-notification round-trip.
//!
//! This library provides:
//! - **[`NameContainer`]**: the two cached mappings (short name -> ordered
//!   full paths, full path -> payload) behind one reader/writer lock.
//! - **[`NameService`]**: the registration + lookup facade owning the
//!   connection pool, one per process.
//! - **Typed misses** ([`LookupError`]) so an unknown or emptied name is a
//!   condition callers match on, never a fault.
#![warn(
    missing_debug_implementations,
    missing_docs,
    missing_copy_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![allow(clippy::cognitive_complexity)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use zk_store;

pub mod container;
pub mod error;
pub mod service;

pub use container::NameContainer;
pub use error::{LookupError, LookupResult, RefreshError};
pub use service::NameService;
