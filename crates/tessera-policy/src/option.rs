//! Authorization options.

use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_token::Scope;

use crate::error::{PolicyError, PolicyResult};

/// Where a credential is carried on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// `Authorization: Bearer <token>`.
    Header,
    /// A named cookie.
    Cookie,
}

impl TokenSource {
    /// All transports, header first.
    #[must_use]
    pub fn all() -> [Self; 2] {
        [Self::Header, Self::Cookie]
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}

/// A trusted issuing authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuerRef {
    /// This process.
    SelfIssuer,
    /// The federation-wide issuer.
    Federation,
    /// Any other issuer, by URL.
    Named(String),
}

impl fmt::Display for IssuerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfIssuer => write!(f, "self"),
            Self::Federation => write!(f, "federation"),
            Self::Named(url) => f.write_str(url),
        }
    }
}

/// Transports, issuers and scopes a request is checked against.
///
/// A request passes if any single credential, from one transport and
/// validated against one issuer, grants all scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOption {
    sources: Vec<TokenSource>,
    issuers: Vec<IssuerRef>,
    scopes: Vec<Scope>,
}

impl AuthOption {
    /// Create an option. Order of `sources` and `issuers` is the order tried.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidOption`] if any list is empty.
    pub fn new(
        sources: impl IntoIterator<Item = TokenSource>,
        issuers: impl IntoIterator<Item = IssuerRef>,
        scopes: impl IntoIterator<Item = Scope>,
    ) -> PolicyResult<Self> {
        let mut option = Self {
            sources: Vec::new(),
            issuers: Vec::new(),
            scopes: Vec::new(),
        };
        for source in sources {
            if !option.sources.contains(&source) {
                option.sources.push(source);
            }
        }
        for issuer in issuers {
            if !option.issuers.contains(&issuer) {
                option.issuers.push(issuer);
            }
        }
        for scope in scopes {
            if !option.scopes.contains(&scope) {
                option.scopes.push(scope);
            }
        }

        if option.sources.is_empty() {
            return Err(PolicyError::InvalidOption("no token sources".into()));
        }
        if option.issuers.is_empty() {
            return Err(PolicyError::InvalidOption("no issuers".into()));
        }
        if option.scopes.is_empty() {
            return Err(PolicyError::InvalidOption("no required scopes".into()));
        }
        Ok(option)
    }

    /// Transports, in the order tried.
    #[must_use]
    pub fn sources(&self) -> &[TokenSource] {
        &self.sources
    }

    /// Issuers, in the order tried for each transport.
    #[must_use]
    pub fn issuers(&self) -> &[IssuerRef] {
        &self.issuers
    }

    /// Scopes a credential must all grant.
    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_lists() {
        let scopes = [Scope::MONITORING_SCRAPE];
        assert!(AuthOption::new([], [IssuerRef::SelfIssuer], scopes.clone()).is_err());
        assert!(AuthOption::new([TokenSource::Header], [], scopes.clone()).is_err());
        assert!(AuthOption::new([TokenSource::Header], [IssuerRef::SelfIssuer], []).is_err());
    }

    #[test]
    fn test_keeps_order_and_drops_duplicates() {
        let option = AuthOption::new(
            [TokenSource::Cookie, TokenSource::Header, TokenSource::Cookie],
            [IssuerRef::Federation, IssuerRef::SelfIssuer],
            [Scope::MONITORING_QUERY, Scope::MONITORING_QUERY],
        )
        .unwrap();
        assert_eq!(
            option.sources(),
            &[TokenSource::Cookie, TokenSource::Header]
        );
        assert_eq!(
            option.issuers(),
            &[IssuerRef::Federation, IssuerRef::SelfIssuer]
        );
        assert_eq!(option.scopes().len(), 1);
    }
}
