// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer authentication middleware.
//!
//! Resolves `Authorization: Bearer <token>` through the configured
//! [`IdentityProvider`] and stores the resulting [`Identity`] in the request
//! extensions. Requests without a valid bearer are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use toolvault_core::{Identity, ToolvaultError};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Extract the bearer token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ToolvaultError::Unauthenticated)?;

    let identity: Identity = state.identity.authenticate(token).await.inspect_err(|_| {
        tracing::debug!(path = %request.uri().path(), "bearer rejected");
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
