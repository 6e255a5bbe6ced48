//! Protected surfaces.

use std::borrow::Cow;

use tessera_policy::{AuthOption, IssuerRef, TokenSource};
use tessera_token::Scope;

use crate::error::GateResult;

/// Denial message of the metrics endpoint.
pub const METRICS_DENIAL: &str = "Authentication required to access this endpoint.";

/// Denial message of the query API.
pub const QUERY_DENIAL: &str =
    "Correct authorization required to access Prometheus query engine APIs";

/// A path prefix guarded by an auth option.
#[derive(Debug, Clone)]
pub struct ProtectedSurface {
    prefix: String,
    enforced: bool,
    option: AuthOption,
    denial_message: Cow<'static, str>,
}

impl ProtectedSurface {
    /// Guard paths starting with `prefix`.
    #[must_use]
    pub fn new(
        prefix: impl Into<String>,
        enforced: bool,
        option: AuthOption,
        denial_message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            enforced,
            option,
            denial_message: denial_message.into(),
        }
    }

    /// The metrics endpoint: scrapers present a federation or self-issued
    /// token in the header, web users a login cookie.
    ///
    /// # Errors
    ///
    /// Never in practice; the option lists are fixed and non-empty.
    pub fn metrics(prefix: impl Into<String>, enforced: bool) -> GateResult<Self> {
        let option = AuthOption::new(
            [TokenSource::Header, TokenSource::Cookie],
            [IssuerRef::Federation, IssuerRef::SelfIssuer],
            [Scope::MONITORING_SCRAPE],
        )?;
        Ok(Self::new(prefix, enforced, option, METRICS_DENIAL))
    }

    /// The query API: web users via cookie, external dashboards via header,
    /// both with self-issued tokens.
    ///
    /// # Errors
    ///
    /// Never in practice; the option lists are fixed and non-empty.
    pub fn query_engine(prefix: impl Into<String>, enforced: bool) -> GateResult<Self> {
        let option = AuthOption::new(
            [TokenSource::Cookie, TokenSource::Header],
            [IssuerRef::SelfIssuer],
            [Scope::MONITORING_QUERY],
        )?;
        Ok(Self::new(prefix, enforced, option, QUERY_DENIAL))
    }

    /// Whether `path` falls under this surface.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Path prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether requests are checked at all.
    #[must_use]
    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    /// What requests must satisfy.
    #[must_use]
    pub fn option(&self) -> &AuthOption {
        &self.option
    }

    /// Body message of a denial.
    #[must_use]
    pub fn denial_message(&self) -> &str {
        &self.denial_message
    }
}
