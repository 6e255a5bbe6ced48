//! Tessera Gate - Token-guarded monitoring endpoints for `axum`.
//!
//! A [`ProtectedSurface`] names a path prefix, whether enforcement is on,
//! the [`AuthOption`](tessera_policy::AuthOption) requests must satisfy,
//! and the message returned on denial. The [`gate`] middleware applies one
//! surface; the [`Gatekeeper`] wires both monitoring surfaces from
//! configuration and mints the server's own scrape tokens.
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use tessera_config::Config;
//! use tessera_gate::Gatekeeper;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let gatekeeper = Gatekeeper::from_config(&config)?;
//!
//! let app: Router = gatekeeper.protect(
//!     Router::new()
//!         .route("/metrics", get(|| async { "# metrics" }))
//!         .route("/api/v1.0/prometheus/query", get(|| async { "{}" })),
//! );
//! let scrape_token = gatekeeper.mint_scrape_token()?;
//! # let _ = (app, scrape_token);
//! # Ok(())
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
mod gatekeeper;
mod middleware;
mod surface;

pub use error::{GateError, GateResult};
pub use gatekeeper::{Gatekeeper, init_logging, log_config};
pub use middleware::{GateState, gate};
pub use surface::{METRICS_DENIAL, ProtectedSurface, QUERY_DENIAL};
