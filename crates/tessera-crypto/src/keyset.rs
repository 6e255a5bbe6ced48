//! Per-issuer verification key sets.
//!
//! A [`KeySet`] holds every public key one issuer currently signs with.
//! Issuers publish their set as a JWK Set (RFC 7517) of Ed25519 `OKP`
//! keys (RFC 8037):
//!
//! ```json
//! {"keys": [{"kty": "OKP", "crv": "Ed25519", "x": "…", "kid": "…", "alg": "EdDSA", "use": "sig"}]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::PublicKey;
use crate::signature::Signature;

const KTY_OKP: &str = "OKP";
const CRV_ED25519: &str = "Ed25519";
const ALG_EDDSA: &str = "EdDSA";

/// Key identifier carried in token headers (`kid`) and JWKs.
///
/// Locally generated keys use the hex encoding of the first 8 bytes of the
/// public key; keys fetched from other issuers keep whatever id they publish.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Create a key id from an arbitrary string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create the key id for raw key-id bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type; only `OKP` is usable here.
    pub kty: String,
    /// Curve; only `Ed25519` is usable here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Base64url public key bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Key id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Intended use (`sig`).
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl Jwk {
    /// Build the JWK describing an Ed25519 public key.
    #[must_use]
    pub fn from_public_key(kid: &KeyId, key: &PublicKey) -> Self {
        Self {
            kty: KTY_OKP.to_owned(),
            crv: Some(CRV_ED25519.to_owned()),
            x: Some(key.to_base64url()),
            kid: Some(kid.to_string()),
            alg: Some(ALG_EDDSA.to_owned()),
            key_use: Some("sig".to_owned()),
        }
    }

    /// Whether this JWK describes an Ed25519 signing key.
    #[must_use]
    pub fn is_ed25519(&self) -> bool {
        self.kty == KTY_OKP
            && self.crv.as_deref() == Some(CRV_ED25519)
            && self.key_use.as_deref().is_none_or(|u| u == "sig")
    }

    /// Decode the Ed25519 public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedKey`] for non-Ed25519 keys, or an
    /// encoding error when `x` is missing or malformed.
    pub fn public_key(&self) -> CryptoResult<PublicKey> {
        if !self.is_ed25519() {
            return Err(CryptoError::UnsupportedKey(format!(
                "kty={} crv={}",
                self.kty,
                self.crv.as_deref().unwrap_or("-")
            )));
        }
        let x = self
            .x
            .as_deref()
            .ok_or_else(|| CryptoError::InvalidPublicKey("missing `x` member".into()))?;
        PublicKey::from_base64url(x)
    }
}

/// A JWK Set document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Published keys.
    pub keys: Vec<Jwk>,
}

/// The verification keys of one issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: Vec<(KeyId, PublicKey)>,
}

impl KeySet {
    /// Create an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Build a key set from public keys, deriving each key id.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        let mut set = Self::new();
        for key in keys {
            set.insert(key.key_id(), key);
        }
        set
    }

    /// Build a key set from a JWK Set.
    ///
    /// Keys that are not Ed25519 signing keys are skipped; a JWK without a
    /// `kid` gets the derived key id.
    ///
    /// # Errors
    ///
    /// Returns an error if an Ed25519 JWK carries malformed key bytes.
    pub fn from_jwks(jwks: &JwkSet) -> CryptoResult<Self> {
        let mut set = Self::new();
        for jwk in jwks.keys.iter().filter(|k| k.is_ed25519()) {
            let key = jwk.public_key()?;
            let kid = jwk
                .kid
                .as_deref()
                .map_or_else(|| key.key_id(), KeyId::new);
            set.insert(kid, key);
        }
        Ok(set)
    }

    /// Export as a JWK Set document.
    #[must_use]
    pub fn to_jwks(&self) -> JwkSet {
        JwkSet {
            keys: self
                .keys
                .iter()
                .map(|(kid, key)| Jwk::from_public_key(kid, key))
                .collect(),
        }
    }

    /// Add or replace a key. Returns the replaced key, if any.
    pub fn insert(&mut self, kid: KeyId, key: PublicKey) -> Option<PublicKey> {
        if let Some(slot) = self.keys.iter_mut().find(|(id, _)| *id == kid) {
            return Some(std::mem::replace(&mut slot.1, key));
        }
        self.keys.push((kid, key));
        None
    }

    /// Look up a key by id.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&PublicKey> {
        self.keys
            .iter()
            .find(|(id, _)| id.as_str() == kid)
            .map(|(_, key)| key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids in insertion order.
    pub fn key_ids(&self) -> impl Iterator<Item = &KeyId> {
        self.keys.iter().map(|(id, _)| id)
    }

    /// Verify with the key named `kid`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] if the key is
    /// unknown or the signature does not verify.
    pub fn verify(&self, kid: &str, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        self.get(kid)
            .ok_or(CryptoError::SignatureVerificationFailed)?
            .verify(message, signature)
    }

    /// Verify with whichever key in the set produced the signature.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] if no key verifies.
    pub fn verify_any(&self, message: &[u8], signature: &Signature) -> CryptoResult<&KeyId> {
        self.keys
            .iter()
            .find(|(_, key)| key.verify(message, signature).is_ok())
            .map(|(kid, _)| kid)
            .ok_or(CryptoError::SignatureVerificationFailed)
    }
}
