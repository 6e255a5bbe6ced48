//! Tessera Crypto - Key material for signing and verifying bearer tokens.
//!
//! This crate provides:
//! - Ed25519 key pairs with secure memory handling
//! - Detached signatures over token signing input
//! - Per-issuer key sets exchanged as JWK Sets
//!
//! # Example
//!
//! ```
//! use tessera_crypto::{KeyPair, KeySet};
//!
//! let keypair = KeyPair::generate();
//! let signature = keypair.sign(b"header.claims");
//!
//! let keys = KeySet::from_keys([keypair.export_public_key()]);
//! assert!(keys.verify_any(b"header.claims", &signature).is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod encoding;
mod error;
mod keypair;
mod keyset;
mod signature;

pub use encoding::{b64url_decode, b64url_encode};
pub use error::{CryptoError, CryptoResult};
pub use keypair::{KeyPair, PublicKey};
pub use keyset::{Jwk, JwkSet, KeyId, KeySet};
pub use signature::Signature;
