//! Integration tests for minting, validation, and the policy evaluator
//! against a local issuer.

mod common;

use std::sync::Arc;

use common::{ORIGIN, bearer, claims, login_cookie, mint, sign_claims};
use tessera_crypto::{KeyPair, KeySet};
use tessera_policy::{AuthOption, IssuerRef, PolicyEvaluator, TokenSource};
use tessera_token::{Scope, TokenError, TokenMinter, TokenValidator};
use tessera_trust::{HttpKeySource, TrustRegistry};

struct LocalServer {
    key: Arc<KeyPair>,
    minter: TokenMinter,
    evaluator: PolicyEvaluator,
}

fn local_server() -> LocalServer {
    let key = Arc::new(KeyPair::generate());
    let registry = TrustRegistry::builder(Arc::new(HttpKeySource::new().unwrap()))
        .local_issuer(ORIGIN, KeySet::from_keys([key.export_public_key()]))
        .build();
    LocalServer {
        minter: TokenMinter::new(ORIGIN, Some(Arc::clone(&key))),
        evaluator: PolicyEvaluator::new(registry, ORIGIN, ORIGIN),
        key,
    }
}

fn self_option(sources: &[TokenSource], scopes: &[Scope]) -> AuthOption {
    AuthOption::new(
        sources.iter().copied(),
        [IssuerRef::SelfIssuer],
        scopes.iter().cloned(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_minted_token_round_trips() {
    let server = local_server();
    let token = mint(&server.minter, ORIGIN, &[Scope::MONITORING_SCRAPE]);

    let option = self_option(&[TokenSource::Header], &[Scope::MONITORING_SCRAPE]);
    let claims = server
        .evaluator
        .authorize(&bearer(&token), &option)
        .await
        .unwrap();
    assert_eq!(claims.iss, ORIGIN);
    assert_eq!(claims.wlcg_ver.as_deref(), Some("1.0"));
    assert!(claims.jti.is_some());
}

#[test]
fn test_expiry_boundary() {
    let server = local_server();
    let keys = KeySet::from_keys([server.key.export_public_key()]);
    let validator = TokenValidator::new();
    let now = chrono::Utc::now().timestamp();
    let scopes = [Scope::MONITORING_SCRAPE];

    let expired = sign_claims(
        &server.key,
        &claims(ORIGIN, ORIGIN, &scopes, now.saturating_sub(1)),
    );
    assert!(matches!(
        validator.validate(&expired, &keys, ORIGIN, &scopes),
        Err(TokenError::Expired { .. })
    ));

    let live = sign_claims(
        &server.key,
        &claims(ORIGIN, ORIGIN, &scopes, now.saturating_add(3600)),
    );
    assert!(validator.validate(&live, &keys, ORIGIN, &scopes).is_ok());
}

#[tokio::test]
async fn test_required_scopes_are_all_needed() {
    let server = local_server();
    let read = Scope::new("read");
    let write = Scope::new("write");

    let read_only = mint(&server.minter, ORIGIN, &[read.clone()]);
    let read_write = mint(&server.minter, ORIGIN, &[read.clone(), write.clone()]);

    let needs_both = self_option(&[TokenSource::Header], &[read.clone(), write]);
    let needs_read = self_option(&[TokenSource::Header], &[read]);

    let evaluator = &server.evaluator;
    assert!(!evaluator.check_any_auth(&bearer(&read_only), &needs_both).await);
    assert!(evaluator.check_any_auth(&bearer(&read_write), &needs_read).await);
    assert!(evaluator.check_any_auth(&bearer(&read_write), &needs_both).await);
}

#[tokio::test]
async fn test_any_allowed_source_is_enough() {
    let server = local_server();
    let token = mint(&server.minter, ORIGIN, &[Scope::WEB_UI_ACCESS]);
    let scopes = [Scope::WEB_UI_ACCESS];

    let both = self_option(&[TokenSource::Header, TokenSource::Cookie], &scopes);
    let header_only = self_option(&[TokenSource::Header], &scopes);

    let evaluator = &server.evaluator;
    assert!(evaluator.check_any_auth(&login_cookie(&token), &both).await);
    assert!(!evaluator.check_any_auth(&login_cookie(&token), &header_only).await);
}

#[test]
fn test_foreign_key_is_rejected() {
    let signer = KeyPair::generate();
    let other = KeySet::from_keys([KeyPair::generate().export_public_key()]);
    let scopes = [Scope::MONITORING_SCRAPE];
    let exp = chrono::Utc::now().timestamp().saturating_add(300);

    let token = sign_claims(&signer, &claims(ORIGIN, ORIGIN, &scopes, exp));
    assert_eq!(
        TokenValidator::new().validate(&token, &other, ORIGIN, &scopes),
        Err(TokenError::InvalidSignature)
    );
}

#[tokio::test]
async fn test_token_for_another_audience_is_denied() {
    let server = local_server();
    let token = mint(
        &server.minter,
        "https://elsewhere.example.org",
        &[Scope::MONITORING_SCRAPE],
    );

    let option = self_option(&[TokenSource::Header], &[Scope::MONITORING_SCRAPE]);
    assert!(!server.evaluator.check_any_auth(&bearer(&token), &option).await);
}
