//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_trust::prelude::*;` to import all essential types.

pub use crate::{TrustError, TrustResult};

pub use crate::{KeySource, RegistryConfig, TrustDomain, TrustRegistry};
