//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_token::prelude::*;` to import all essential types.

// Errors
pub use crate::{MintError, MintResult, TokenError, TokenResult};

// Claims model
pub use crate::{Audience, Claims, Scope, ScopeSet, TokenHeader};

// Validation and minting
pub use crate::{Requirements, TokenBuilder, TokenMinter, TokenValidator};
