//! Pulling candidate credentials out of request headers.

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};

use crate::option::TokenSource;

/// Cookie that carries the web UI login token.
pub const DEFAULT_COOKIE_NAME: &str = "login";

/// Finds candidate tokens in request headers. Never fails and never
/// modifies the request; absent or malformed transports yield nothing.
#[derive(Debug, Clone)]
pub struct CredentialExtractor {
    cookie_name: String,
}

impl CredentialExtractor {
    /// Create an extractor reading the named cookie.
    #[must_use]
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    /// Name of the cookie read for [`TokenSource::Cookie`].
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// The token carried by `source`, if present and non-empty.
    #[must_use]
    pub fn extract<'h>(&self, headers: &'h HeaderMap, source: TokenSource) -> Option<&'h str> {
        match source {
            TokenSource::Header => bearer_token(headers),
            TokenSource::Cookie => cookie_value(headers, &self.cookie_name),
        }
    }

    /// Lazily yield one candidate per transport present, in `sources` order.
    pub fn candidates<'a>(
        &'a self,
        headers: &'a HeaderMap,
        sources: &'a [TokenSource],
    ) -> impl Iterator<Item = (TokenSource, &'a str)> + 'a {
        sources
            .iter()
            .filter_map(move |&source| self.extract(headers, source).map(|token| (source, token)))
    }
}

impl Default for CredentialExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| key.trim() == name && !unquote(value).is_empty())
        .map(|(_, value)| unquote(value))
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
