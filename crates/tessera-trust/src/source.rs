//! Where remote key material comes from.

use async_trait::async_trait;
use serde::Deserialize;
use tessera_crypto::{JwkSet, KeySet};
use tracing::debug;
use url::Url;

use crate::error::{TrustError, TrustResult};

/// Path of the issuer metadata document, relative to the issuer URL.
pub const DEFAULT_DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

const USER_AGENT: &str = concat!("tessera/", env!("CARGO_PKG_VERSION"));

/// Fetches the current key set of an issuer.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetch the keys `issuer` signs with.
    async fn fetch(&self, issuer: &str) -> TrustResult<KeySet>;
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

/// Discovers keys over HTTP(S): metadata document first, then the JWK Set
/// named by its `jwks_uri`.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    discovery_path: String,
}

impl HttpKeySource {
    /// Create a source with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Client`] if the client cannot be built.
    pub fn new() -> TrustResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| TrustError::Client(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Create a source around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            discovery_path: DEFAULT_DISCOVERY_PATH.to_owned(),
        }
    }

    /// Override the metadata document path.
    #[must_use]
    pub fn discovery_path(mut self, path: impl Into<String>) -> Self {
        self.discovery_path = path.into();
        self
    }

    fn discovery_url(&self, issuer: &str) -> TrustResult<Url> {
        let raw = format!("{}{}", issuer.trim_end_matches('/'), self.discovery_path);
        Url::parse(&raw).map_err(|e| TrustError::Discovery {
            url: raw,
            reason: e.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> TrustResult<T> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TrustError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TrustError::Fetch {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        response.json().await.map_err(|e| TrustError::Discovery {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self, issuer: &str) -> TrustResult<KeySet> {
        let discovery_url = self.discovery_url(issuer)?;
        debug!(issuer, url = %discovery_url, "fetching issuer metadata");
        let document: DiscoveryDocument = self.get_json(discovery_url.clone()).await?;

        let jwks_url = Url::parse(&document.jwks_uri).map_err(|e| TrustError::Discovery {
            url: discovery_url.to_string(),
            reason: format!("bad jwks_uri: {e}"),
        })?;
        debug!(issuer, url = %jwks_url, "fetching issuer key set");
        let jwks: JwkSet = self.get_json(jwks_url.clone()).await?;

        let keys = KeySet::from_jwks(&jwks).map_err(|e| TrustError::Discovery {
            url: jwks_url.to_string(),
            reason: e.to_string(),
        })?;
        if keys.is_empty() {
            return Err(TrustError::Discovery {
                url: jwks_url.to_string(),
                reason: "no Ed25519 signing keys".into(),
            });
        }
        Ok(keys)
    }
}
