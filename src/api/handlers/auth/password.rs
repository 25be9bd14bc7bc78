//! Password reset: request a code, trade it for a reset token, set the new
//! password. The final update bumps the account's token version, revoking
//! every refresh token issued before it.

use super::{
    state::AuthState,
    types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, ResetTokenResponse, VerifyOtpRequest},
    utils,
};
use crate::api::email::password_reset_email;
use crate::store::{DynOtpStore, DynUserStore, OtpPurpose, OtpRecord};
use crate::token::RESET_PURPOSE;
use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;

const GENERIC_SENT: &str = "If this email is registered, an OTP has been sent";

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(MessageResponse::fail(message)),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse::fail(message)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Generic answer, code sent when the email is known", body = MessageResponse),
        (status = 400, description = "Validation failed", body = MessageResponse),
        (status = 500, description = "Email delivery failed", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(users): Extension<DynUserStore>,
    Extension(otps): Extension<DynOtpStore>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return utils::validation_failed();
    };

    let email = utils::normalize_email(&request.email);

    if !utils::valid_email(&email) {
        return utils::validation_failed();
    }

    match users.find_by_email(&email).await {
        Ok(Some(_)) => {}
        // Same body and status as the happy path.
        Ok(None) => return (StatusCode::OK, Json(MessageResponse::ok(GENERIC_SENT))).into_response(),
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    }

    let code = utils::generate_otp();
    let record = OtpRecord {
        email: email.clone(),
        code: code.clone(),
        purpose: OtpPurpose::PasswordReset,
        expires_at: utils::otp_expiry(state.config().otp_ttl_seconds()),
    };

    if let Err(err) = otps.upsert(&record).await {
        error!("{err:#}");
        return utils::server_error();
    }

    let message = password_reset_email(&email, &code, state.config().otp_ttl_minutes());
    if let Err(err) = state.mailer().send(&message) {
        error!("Failed to send password reset email: {err:#}");

        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::fail("Failed to send password reset email")),
        )
            .into_response();
    }

    (StatusCode::OK, Json(MessageResponse::ok(GENERIC_SENT))).into_response()
}

#[utoipa::path(
    post,
    path = "/auth/verify-resetpassword-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted, reset token issued", body = ResetTokenResponse),
        (status = 400, description = "Expired or wrong code, or validation failed", body = MessageResponse),
        (status = 404, description = "No pending code", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn verify_password_reset_otp(
    Extension(otps): Extension<DynOtpStore>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return utils::validation_failed();
    };

    let email = utils::normalize_email(&request.email);

    if !utils::valid_email(&email) || !utils::valid_otp_code(&request.otp) {
        return utils::validation_failed();
    }

    let record = match otps.find(&email).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(MessageResponse::fail(
                    "No OTP found for this email. Please request a new OTP to continue.",
                )),
            )
                .into_response()
        }
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    if record.expires_at <= Utc::now() {
        if let Err(err) = otps.delete(&email).await {
            error!("{err:#}");
            return utils::server_error();
        }

        return bad_request("OTP expired. Please request a new one.");
    }

    if record.code != request.otp {
        return bad_request("Invalid OTP");
    }

    if let Err(err) = otps.delete(&email).await {
        error!("{err:#}");
        return utils::server_error();
    }

    match state.signer().reset_token(&email) {
        Ok(token) => (
            StatusCode::OK,
            Json(ResetTokenResponse {
                success: true,
                message: "OTP verified. Use the provided token to reset your password."
                    .to_string(),
                token,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("{err:#}");
            utils::server_error()
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced, previous refresh tokens revoked", body = MessageResponse),
        (status = 400, description = "Validation failed", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired reset token", body = MessageResponse),
        (status = 403, description = "Token purpose mismatch", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    headers: HeaderMap,
    Extension(users): Extension<DynUserStore>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return utils::validation_failed();
    };

    if !utils::valid_password(&request.new_password) {
        return utils::validation_failed();
    }

    let Some(header) = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
        return unauthorized("Authorization token missing");
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return unauthorized("Invalid or expired reset token");
    };

    let claims = match state.signer().verify_reset(token) {
        Ok(claims) => claims,
        Err(_) => return unauthorized("Invalid or expired reset token"),
    };

    if claims.purpose != RESET_PURPOSE {
        return (
            StatusCode::FORBIDDEN,
            Json(MessageResponse::fail("Invalid token purpose")),
        )
            .into_response();
    }

    let password_hash = match utils::hash_password(&request.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    // The update also bumps the token version; an account deleted since the
    // code was verified makes this a no-op, which still answers success.
    match users.update_password(&claims.email, &password_hash).await {
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::ok("Password reset successful")),
        )
            .into_response(),
        Err(err) => {
            error!("{err:#}");
            utils::server_error()
        }
    }
}
