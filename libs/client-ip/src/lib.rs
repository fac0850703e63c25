//! # client-ip
//!
//! Caller IP extraction and request-scoped storage.
//!
//! Parses a peer `ip:port` string (the form HTTP servers report for a
//! connection's remote address) into an [`IpAddr`], and stashes/retrieves it
//! in a request's [`Extensions`]. The extension slot is keyed by a private
//! newtype, so no other crate can collide with or shadow the stored value.
//!
//! Standalone utility -- nothing here touches the name cache or the store.
#![warn(
    missing_debug_implementations,
    missing_docs,
    missing_copy_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::net::{IpAddr, SocketAddr};

use axum::http::Extensions;
use thiserror::Error;

/// Failure to extract a caller IP from a peer address string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientIpError {
    /// The peer address was not an `ip:port` pair.
    #[error("'{addr}' is not an ip:port pair")]
    NotIpPort {
        /// The peer address string as received.
        addr: String,
    },
}

/// Private extension key; the type itself is the key, so keeping it private
/// keeps the slot private.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClientIp(IpAddr);

/// Extract the caller's IP from a peer `ip:port` string.
pub fn from_remote_addr(remote_addr: &str) -> Result<IpAddr, ClientIpError> {
    remote_addr
        .parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .map_err(|_| ClientIpError::NotIpPort {
            addr: remote_addr.to_owned(),
        })
}

/// Store the caller IP in a request's extensions.
pub fn insert(extensions: &mut Extensions, ip: IpAddr) {
    extensions.insert(ClientIp(ip));
}

/// Retrieve the caller IP from a request's extensions, if one was stored.
pub fn get(extensions: &Extensions) -> Option<IpAddr> {
    extensions.get::<ClientIp>().map(|client_ip| client_ip.0)
}
