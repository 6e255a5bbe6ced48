//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_gate::prelude::*;` to import all essential types.

pub use crate::{GateError, GateResult};

pub use crate::{GateState, Gatekeeper, ProtectedSurface, gate};
