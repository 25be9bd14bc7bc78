//! Refresh-token cookie handling and session issuance.
//!
//! The refresh token only ever travels in an `HttpOnly` cookie; the access
//! token only ever travels in the JSON body. Browsers cannot read the first
//! and scripts cannot leak it.

use super::{
    state::{AuthConfig, AuthState},
    types::{SessionResponse, UserProfile},
};
use crate::store::{Account, DynUserStore};
use anyhow::{Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

pub(crate) const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Cookie carrying a fresh refresh token, valid for the configured TTL.
///
/// # Errors
///
/// Returns an error if the token contains bytes not allowed in a header.
pub(super) fn refresh_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.refresh_ttl_seconds();
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");

    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
}

/// Cookie with `Max-Age=0` so the browser drops the refresh token.
pub(super) fn clear_refresh_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");

    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
}

/// Pull the refresh token out of the request's `Cookie` header, if any.
pub(super) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == REFRESH_COOKIE_NAME && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Issue the access/refresh pair for a verified account, set the cookie and
/// record the login time.
///
/// # Errors
///
/// Returns an error if signing fails or the store rejects the login-time
/// update. Callers translate that into the generic 500.
pub(super) async fn grant_session(
    state: &AuthState,
    users: &DynUserStore,
    account: &Account,
    message: &str,
) -> Result<(HeaderMap, SessionResponse)> {
    let access_token = state
        .signer()
        .access_token(account.id, &account.email, account.role)
        .context("Failed to sign access token")?;
    let refresh_token = state
        .signer()
        .refresh_token(account.id, account.token_version)
        .context("Failed to sign refresh token")?;

    let cookie =
        refresh_cookie(state.config(), &refresh_token).context("Failed to build refresh cookie")?;

    users.touch_last_login(account.id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((
        headers,
        SessionResponse {
            success: true,
            message: message.to_string(),
            access_token,
            user: UserProfile::from(account),
        },
    ))
}
