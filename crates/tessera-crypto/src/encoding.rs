//! Unpadded base64url, the alphabet used by every JOSE structure.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{CryptoError, CryptoResult};

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidBase64Encoding`] on any alphabet or padding error.
pub fn b64url_decode(s: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|_| CryptoError::InvalidBase64Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_padding_emitted() {
        assert_eq!(b64url_encode(b"a"), "YQ");
        assert_eq!(b64url_decode("YQ").unwrap(), b"a");
    }

    #[test]
    fn test_rejects_standard_alphabet() {
        // '+' and '/' belong to the standard alphabet only
        assert!(b64url_decode("a+b/").is_err());
        assert!(b64url_decode("YQ==").is_err());
    }
}
