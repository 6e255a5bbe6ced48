//! Shared harness: an in-process federation issuer and token helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::routing::get;
use serde_json::Value;
use tessera_crypto::{KeyPair, KeySet};
use tessera_token::{Audience, Claims, Scope, ScopeSet, TokenHeader, TokenMinter, encode};
use tessera_trust::DEFAULT_DISCOVERY_PATH;

/// External URL of the server under test.
pub const ORIGIN: &str = "https://origin.example.org";

/// An issuer serving its metadata and JWK Set over HTTP on `127.0.0.1`.
pub struct FederationIssuer {
    /// Base URL, also the `iss` of its tokens.
    pub url: String,
    /// The issuer's signing key.
    pub key: Arc<KeyPair>,
    discovery_hits: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl FederationIssuer {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        Self::start_with_delay(Duration::ZERO).await
    }

    /// Like [`start`](Self::start), but the metadata endpoint answers after
    /// `delay`.
    pub async fn start_with_delay(delay: Duration) -> Self {
        let key = Arc::new(KeyPair::generate());
        let discovery_hits = Arc::new(AtomicUsize::new(0));
        let failing = Arc::new(AtomicBool::new(false));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let discovery = serde_json::json!({
            "issuer": url,
            "jwks_uri": format!("{url}/jwks"),
        });
        let jwks = serde_json::to_value(KeySet::from_keys([key.export_public_key()]).to_jwks())
            .unwrap();

        let app = Router::new()
            .route(
                DEFAULT_DISCOVERY_PATH,
                get({
                    let hits = Arc::clone(&discovery_hits);
                    let failing = Arc::clone(&failing);
                    move || serve_json(discovery, hits, failing, delay)
                }),
            )
            .route(
                "/jwks",
                get({
                    let failing = Arc::clone(&failing);
                    let hits = Arc::new(AtomicUsize::new(0));
                    move || serve_json(jwks, hits, failing, Duration::ZERO)
                }),
            );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url,
            key,
            discovery_hits,
            failing,
        }
    }

    /// Number of metadata requests served so far.
    pub fn discovery_hits(&self) -> usize {
        self.discovery_hits.load(Ordering::SeqCst)
    }

    /// Make every endpoint answer `503` (or recover).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// A minter signing as this issuer.
    pub fn minter(&self) -> TokenMinter {
        TokenMinter::new(&self.url, Some(Arc::clone(&self.key)))
    }

    /// Mint a five-minute token for `audience` carrying `scopes`.
    pub fn mint(&self, audience: &str, scopes: &[Scope]) -> String {
        mint(&self.minter(), audience, scopes)
    }
}

async fn serve_json(
    body: Value,
    hits: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    delay: Duration,
) -> Result<Json<Value>, StatusCode> {
    hits.fetch_add(1, Ordering::SeqCst);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if failing.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(body))
}

/// Mint a five-minute token for `audience` carrying `scopes`.
pub fn mint(minter: &TokenMinter, audience: &str, scopes: &[Scope]) -> String {
    minter
        .mint(
            audience,
            &[audience.to_owned()],
            scopes,
            chrono::Duration::minutes(5),
        )
        .unwrap()
}

/// Sign arbitrary claims, bypassing the minter's checks.
pub fn sign_claims(key: &KeyPair, claims: &Claims) -> String {
    encode(&TokenHeader::eddsa(key.key_id().as_str()), claims, key).unwrap()
}

/// Claims from `issuer` for `audience` with `scopes`, expiring at `exp`.
pub fn claims(issuer: &str, audience: &str, scopes: &[Scope], exp: i64) -> Claims {
    Claims {
        iss: issuer.to_owned(),
        sub: "tester".to_owned(),
        aud: Audience::new([audience]),
        scope: scopes.iter().cloned().collect::<ScopeSet>(),
        exp,
        iat: Some(chrono::Utc::now().timestamp()),
        nbf: None,
        jti: None,
        wlcg_ver: Some("1.0".to_owned()),
    }
}

/// Headers carrying `token` as a bearer credential.
pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

/// Headers carrying `token` in the `login` cookie.
pub fn login_cookie(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("theme=dark; login={token}")).unwrap(),
    );
    headers
}
