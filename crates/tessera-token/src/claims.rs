//! Token header and claims.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scope::ScopeSet;

/// Value of the `wlcg.ver` claim on minted tokens.
pub const WLCG_VERSION: &str = "1.0";

/// The only accepted signing algorithm.
pub(crate) const ALG_EDDSA: &str = "EdDSA";

/// Token header (first segment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm.
    pub alg: String,
    /// Token type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Id of the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl TokenHeader {
    /// Header for an Ed25519-signed token.
    #[must_use]
    pub fn eddsa(kid: impl Into<String>) -> Self {
        Self {
            alg: ALG_EDDSA.to_owned(),
            typ: Some("JWT".to_owned()),
            kid: Some(kid.into()),
        }
    }
}

/// Intended recipients of a token.
///
/// Serialized as a bare string for a single audience and as an array
/// otherwise; both forms are accepted on input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audience(Vec<String>);

impl Audience {
    /// Create from a list of recipients.
    #[must_use]
    pub fn new(audiences: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(audiences.into_iter().map(Into::into).collect())
    }

    /// Whether `audience` is one of the recipients.
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        self.0.iter().any(|a| a == audience)
    }

    /// Recipients as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether there are no recipients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    One(String),
    Many(Vec<String>),
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match AudienceRepr::deserialize(deserializer)? {
            AudienceRepr::One(a) => Self(vec![a]),
            AudienceRepr::Many(a) => Self(a),
        })
    }
}

/// Token claims (second segment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer URL.
    pub iss: String,
    /// Subject.
    #[serde(default)]
    pub sub: String,
    /// Intended recipients.
    #[serde(default)]
    pub aud: Audience,
    /// Granted scopes.
    #[serde(default)]
    pub scope: ScopeSet,
    /// Expiry (seconds since the epoch).
    pub exp: i64,
    /// Issue time (seconds since the epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Not-before time (seconds since the epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Unique token id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// WLCG token profile version.
    #[serde(
        rename = "wlcg.ver",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub wlcg_ver: Option<String>,
}
