//! Authorization-policy enforcement middleware.
//!
//! Runs after [`authenticate`](crate::middleware::authenticate) in the
//! middleware list and evaluates the policy table against the request
//! path and whatever principal the filter bound. Violations terminate
//! the request here; handlers never see them.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::is_preflight;
use crate::policy::AccessPolicy;
use crate::types::Principal;

/// State required by the policy middleware.
#[derive(Clone)]
pub struct PolicyState {
    /// The compiled policy table.
    pub policy: Arc<AccessPolicy>,
}

impl PolicyState {
    /// Creates a new policy state.
    #[must_use]
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }
}

/// Evaluates the policy table for a request.
///
/// Preflight probes bypass the table entirely. For everything else the
/// first matching rule decides: missing principal on a protected path
/// yields 401, insufficient authority yields 403.
pub async fn enforce(State(state): State<PolicyState>, request: Request, next: Next) -> Response {
    if is_preflight(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let principal = request.extensions().get::<Principal>();
    match state.policy.evaluate(request.uri().path(), principal) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
