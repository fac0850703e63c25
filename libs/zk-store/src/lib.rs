//! # zk-store
//!
//! ZooKeeper session wrapper and connection pool for the zns name service.
//!
//! This library provides:
//! - **[`ZkSession`]**: node CRUD, child listing with one-shot watch
//!   registration, and lazy reconnect-on-disconnect against one store
//!   server set.
//! - **[`ConnectionPool`]**: a registry holding at most one live session per
//!   server-set identifier, created lazily and replaced when a session is
//!   found disconnected.
//! - **Typed errors** ([`StoreError`]) so callers can tell caller mistakes,
//!   missing-node conditions, and transport failures apart.
//!
//! The store protocol itself comes from the `zookeeper-client` crate,
//! re-exported as [`zk`] so consumers can name its watch and event types
//! without a separate dependency.
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

pub use zookeeper_client as zk;

pub mod error;
pub mod pool;
pub mod session;

pub use error::{StoreError, StoreResult};
pub use pool::ConnectionPool;
pub use session::ZkSession;
