//! Tessera Trust - Issuer key registry.
//!
//! The [`TrustRegistry`] maps issuer URLs to the key sets that verify their
//! tokens:
//!
//! - Issuers registered as local resolve to a fixed key set and never hit the
//!   network.
//! - Remote issuers are discovered through their
//!   `/.well-known/openid-configuration` document and cached for a TTL.
//! - Concurrent misses for one issuer share a single outbound fetch.
//! - When a refresh fails, keys within the grace period are still served.
//!
//! The registry is a cheap-to-clone handle; construct one at startup and
//! pass it to whatever needs to verify tokens.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod domain;
mod error;
mod registry;
mod source;

pub use domain::{DomainInfo, RegistryConfig, TrustDomain};
pub use error::{TrustError, TrustResult};
pub use registry::{TrustRegistry, TrustRegistryBuilder};
pub use source::{DEFAULT_DISCOVERY_PATH, HttpKeySource, KeySource};
