//! The gate middleware.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tessera_policy::PolicyEvaluator;
use tracing::{debug, warn};

use crate::surface::ProtectedSurface;

/// State of one [`gate`] instance.
#[derive(Debug, Clone)]
pub struct GateState {
    evaluator: PolicyEvaluator,
    surface: Arc<ProtectedSurface>,
}

impl GateState {
    /// Guard `surface` using `evaluator`.
    #[must_use]
    pub fn new(evaluator: PolicyEvaluator, surface: ProtectedSurface) -> Self {
        Self {
            evaluator,
            surface: Arc::new(surface),
        }
    }

    /// The guarded surface.
    #[must_use]
    pub fn surface(&self) -> &ProtectedSurface {
        &self.surface
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`.
///
/// Requests outside the surface's prefix, and all requests while
/// enforcement is off, go straight to `next`. Others reach `next` only if
/// the evaluator accepts a credential; otherwise the response is `403` with
/// `{"error": <denial message>}` and `next` is never run.
pub async fn gate(State(state): State<GateState>, request: Request, next: Next) -> Response {
    let surface = &state.surface;
    if !surface.covers(request.uri().path()) || !surface.is_enforced() {
        return next.run(request).await;
    }

    let allowed = state
        .evaluator
        .check_any_auth(request.headers(), surface.option())
        .await;

    if allowed {
        debug!(path = %request.uri().path(), "gate passed");
        next.run(request).await
    } else {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            prefix = surface.prefix(),
            "gate denied request"
        );
        deny(surface.denial_message())
    }
}

fn deny(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
