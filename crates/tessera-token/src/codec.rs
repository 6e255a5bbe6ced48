//! Compact token encoding: `base64url(header).base64url(claims).base64url(signature)`.

use tessera_crypto::{KeyPair, KeySet, Signature, b64url_decode, b64url_encode};

use crate::claims::{ALG_EDDSA, Claims, TokenHeader};
use crate::error::{MintError, MintResult, TokenError, TokenResult};

/// Upper bound on accepted token length in bytes.
const MAX_TOKEN_LEN: usize = 16 * 1024;

/// Sign `claims` with `key` and produce the compact encoding.
///
/// # Errors
///
/// Returns [`MintError::SerializationError`] if the header or claims cannot
/// be serialized.
pub fn encode(header: &TokenHeader, claims: &Claims, key: &KeyPair) -> MintResult<String> {
    let header =
        serde_json::to_vec(header).map_err(|e| MintError::SerializationError(e.to_string()))?;
    let claims =
        serde_json::to_vec(claims).map_err(|e| MintError::SerializationError(e.to_string()))?;

    let signing_input = format!("{}.{}", b64url_encode(header), b64url_encode(claims));
    let signature = key.sign(signing_input.as_bytes());
    Ok(format!("{signing_input}.{}", signature.to_base64url()))
}

/// A structurally valid token whose signature has not been checked yet.
#[derive(Debug, Clone)]
pub struct UnverifiedToken<'a> {
    header: TokenHeader,
    claims: Claims,
    signing_input: &'a str,
    signature: Signature,
}

impl<'a> UnverifiedToken<'a> {
    /// Decode the three segments of a compact token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MalformedToken`] if the token is oversized, does
    /// not have exactly three segments, a segment is not valid base64url/JSON,
    /// or the header names an algorithm other than `EdDSA`.
    pub fn parse(token: &'a str) -> TokenResult<Self> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(malformed("token too long"));
        }

        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| malformed("expected three segments"))?;
        let (header, claims) = signing_input
            .split_once('.')
            .ok_or_else(|| malformed("expected three segments"))?;
        if claims.contains('.') {
            return Err(malformed("expected three segments"));
        }

        let header: TokenHeader = decode_json(header, "header")?;
        if header.alg != ALG_EDDSA {
            return Err(malformed(&format!("unsupported algorithm `{}`", header.alg)));
        }
        let claims: Claims = decode_json(claims, "claims")?;
        let signature = Signature::from_base64url(signature)
            .map_err(|e| malformed(&format!("signature: {e}")))?;

        Ok(Self {
            header,
            claims,
            signing_input,
            signature,
        })
    }

    /// The decoded header.
    #[must_use]
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// The decoded, not yet trusted, claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Check the signature against `keys`, using the header `kid` when present.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidSignature`] if no key in `keys` verifies.
    pub fn verify(&self, keys: &KeySet) -> TokenResult<()> {
        let message = self.signing_input.as_bytes();
        let verified = match self.header.kid.as_deref() {
            Some(kid) => keys.verify(kid, message, &self.signature),
            None => keys.verify_any(message, &self.signature).map(|_| ()),
        };
        verified.map_err(|_| TokenError::InvalidSignature)
    }

    /// Consume into the claims.
    #[must_use]
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

fn malformed(reason: &str) -> TokenError {
    TokenError::MalformedToken(reason.to_owned())
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> TokenResult<T> {
    let bytes = b64url_decode(segment).map_err(|e| malformed(&format!("{what}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| malformed(&format!("{what}: {e}")))
}
