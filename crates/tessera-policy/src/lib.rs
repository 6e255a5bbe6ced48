//! Tessera Policy - Who may reach a protected surface.
//!
//! An [`AuthOption`] lists credential transports, trusted issuers and the
//! scopes a request needs. The [`PolicyEvaluator`] tries every
//! (transport, issuer) pair in order and allows the request as soon as one
//! credential validates with all required scopes.
//!
//! # Example
//!
//! ```no_run
//! use tessera_policy::{AuthOption, IssuerRef, PolicyEvaluator, TokenSource};
//! use tessera_token::Scope;
//!
//! # async fn demo(evaluator: PolicyEvaluator, headers: http::HeaderMap) {
//! let option = AuthOption::new(
//!     [TokenSource::Header, TokenSource::Cookie],
//!     [IssuerRef::Federation, IssuerRef::SelfIssuer],
//!     [Scope::MONITORING_SCRAPE],
//! )
//! .unwrap();
//!
//! if evaluator.check_any_auth(&headers, &option).await {
//!     // serve the request
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod evaluator;
mod extractor;
mod option;

pub use error::{PolicyError, PolicyResult};
pub use evaluator::PolicyEvaluator;
pub use extractor::{CredentialExtractor, DEFAULT_COOKIE_NAME};
pub use option::{AuthOption, IssuerRef, TokenSource};
