//! Bearer-token guard for authenticated routes.

use super::{state::AuthState, types::MessageResponse};
use crate::store::Role;
use crate::token::TokenError;
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
};
use uuid::Uuid;

/// Identity decoded from a valid access token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

type Rejection = (StatusCode, Json<MessageResponse>);

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(MessageResponse::fail(message)))
}

/// Check the `Authorization: Bearer` header and decode the access token.
///
/// Expiry is the one recoverable failure (the client refreshes and retries),
/// so it gets 401; a bad signature or garbage token gets 403.
///
/// # Errors
///
/// Returns the status and body the route should answer with.
pub fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<Principal, Rejection> {
    let Some(header) = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            "Authorization token missing",
        ));
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "Invalid token format"));
    };

    match state.signer().verify_access(token) {
        Ok(claims) => Ok(Principal {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }),
        Err(TokenError::Expired) => Err(reject(StatusCode::UNAUTHORIZED, "Token expired")),
        Err(_) => Err(reject(StatusCode::FORBIDDEN, "Invalid token")),
    }
}

/// Gate for admin-only routes, applied after [`require_auth`].
///
/// No route in this crate requires it yet; the user-management surface
/// layered on top consumes it as its authorization seam.
///
/// # Errors
///
/// Returns 403 when the principal is not an admin.
pub fn require_admin(principal: &Principal) -> Result<(), Rejection> {
    if principal.role == Role::Admin {
        Ok(())
    } else {
        Err(reject(StatusCode::FORBIDDEN, "Access denied"))
    }
}
