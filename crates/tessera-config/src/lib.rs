#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the Tessera authorization engine.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tessera_config::Config;
//!
//! let config = Config::load(Some(std::path::Path::new("/etc/tessera/config.toml"))).unwrap();
//! println!("serving as {}", config.server.external_url);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file** passed to [`Config::load`]
//! 2. **Environment variables** (`TESSERA_*`), fallback only: applied to
//!    fields the file left unset
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! The merged result is validated before it is returned.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load defaults, the optional file at `path`, and `TESSERA_*` fallbacks
    /// from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, or
    /// the merged configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path, &env::collect_env_vars())
    }

    /// Like [`Config::load`] with an explicit environment.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_env<S: std::hash::BuildHasher>(
        path: Option<&std::path::Path>,
        env_vars: &std::collections::HashMap<String, String, S>,
    ) -> ConfigResult<Self> {
        loader::load(path, env_vars)
    }
}
