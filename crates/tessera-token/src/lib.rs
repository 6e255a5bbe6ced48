//! Tessera Token - Signed bearer credentials.
//!
//! This crate provides:
//! - The claims model (issuer, subject, audience, scope, lifetime)
//! - A compact `header.claims.signature` encoding signed with Ed25519
//! - The ordered validation pipeline (parse, signature, issuer, lifetime,
//!   audience, scope)
//! - A minter for self-issued credentials
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::Duration;
//! use tessera_crypto::{KeyPair, KeySet};
//! use tessera_token::{Scope, TokenMinter, TokenValidator};
//!
//! let key = Arc::new(KeyPair::generate());
//! let keys = KeySet::from_keys([key.export_public_key()]);
//! let minter = TokenMinter::new("https://origin.example.org", Some(Arc::clone(&key)));
//!
//! let token = minter
//!     .mint(
//!         "https://origin.example.org",
//!         &["https://origin.example.org".to_owned()],
//!         &[Scope::MONITORING_SCRAPE],
//!         Duration::minutes(5),
//!     )
//!     .unwrap();
//!
//! let claims = TokenValidator::new()
//!     .validate(
//!         &token,
//!         &keys,
//!         "https://origin.example.org",
//!         &[Scope::MONITORING_SCRAPE],
//!     )
//!     .unwrap();
//! assert_eq!(claims.iss, "https://origin.example.org");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod claims;
mod codec;
mod error;
mod minter;
mod scope;
mod validator;

pub use claims::{Audience, Claims, TokenHeader, WLCG_VERSION};
pub use codec::{UnverifiedToken, encode};
pub use error::{MintError, MintResult, TokenError, TokenResult};
pub use minter::{TokenBuilder, TokenMinter};
pub use scope::{Scope, ScopeSet};
pub use validator::{DEFAULT_CLOCK_SKEW_SECS, Requirements, TokenValidator};
