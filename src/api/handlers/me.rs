//! Who-am-I endpoint backed by the bearer-token guard.

use super::auth::{
    principal::require_auth,
    types::{MeResponse, MessageResponse, PrincipalInfo},
    AuthState,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Identity from the access token", body = MeResponse),
        (status = 401, description = "Missing, malformed or expired token", body = MessageResponse),
        (status = 403, description = "Invalid token", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, Extension(state): Extension<Arc<AuthState>>) -> impl IntoResponse {
    match require_auth(&headers, &state) {
        Ok(principal) => (
            StatusCode::OK,
            Json(MeResponse {
                success: true,
                user: PrincipalInfo {
                    id: principal.id,
                    email: principal.email,
                    role: principal.role,
                },
            }),
        )
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
