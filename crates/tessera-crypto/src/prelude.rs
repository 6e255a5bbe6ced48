//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key types
pub use crate::{KeyId, KeyPair, PublicKey};

// Signature
pub use crate::Signature;

// Key sets
pub use crate::{Jwk, JwkSet, KeySet};
