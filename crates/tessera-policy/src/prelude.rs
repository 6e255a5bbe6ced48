//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_policy::prelude::*;` to import all essential types.

pub use crate::{PolicyError, PolicyResult};

pub use crate::{AuthOption, CredentialExtractor, IssuerRef, PolicyEvaluator, TokenSource};
