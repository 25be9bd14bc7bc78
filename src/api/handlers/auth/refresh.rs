//! Access-token refresh from the cookie, and logout.

use super::{
    session::{clear_refresh_cookie, extract_refresh_token},
    state::AuthState,
    types::{MessageResponse, RefreshResponse},
    utils,
};
use crate::store::DynUserStore;
use crate::token::TokenError;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(MessageResponse::fail(message)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    responses(
        (status = 200, description = "New access token issued", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn refresh_access_token(
    headers: HeaderMap,
    Extension(users): Extension<DynUserStore>,
    Extension(state): Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(token) = extract_refresh_token(&headers) else {
        return unauthorized("Refresh token missing");
    };

    let claims = match state.signer().verify_refresh(&token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            return unauthorized("Refresh token expired, please login again")
        }
        Err(_) => return unauthorized("Invalid refresh token"),
    };

    let account = match users.find_by_id(claims.sub).await {
        Ok(Some(account)) => account,
        Ok(None) => return unauthorized("User not found"),
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    // A password reset bumps the stored version; older refresh tokens die here.
    if account.token_version != claims.token_version {
        return unauthorized("Token has been revoked");
    }

    match state
        .signer()
        .access_token(account.id, &account.email, account.role)
    {
        Ok(access_token) => (
            StatusCode::OK,
            Json(RefreshResponse {
                success: true,
                access_token,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("{err:#}");
            utils::server_error()
        }
    }
}

/// Logout clears the cookie; nothing is revoked server side, the access token
/// simply runs out.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(Extension(state): Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();

    match clear_refresh_cookie(state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build clearing cookie: {err}");
        }
    }

    (
        StatusCode::OK,
        headers,
        Json(MessageResponse::ok("Logged out successfully")),
    )
}
