//! One-time codes for email verification: re-send and verify.

use super::{
    session::grant_session,
    state::AuthState,
    types::{MessageResponse, SendOtpRequest, SessionResponse, VerifyOtpRequest},
    utils,
};
use crate::api::email::verification_email;
use crate::store::{DynOtpStore, DynUserStore, OtpPurpose, OtpRecord};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;

// Unknown emails get the same 200 as known ones.
const GENERIC_SENT: &str = "If this email is registered, an OTP has been sent";

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
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
    path = "/auth/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code sent, or generic answer for unknown email", body = MessageResponse),
        (status = 400, description = "Already verified, or validation failed", body = MessageResponse),
        (status = 500, description = "Email delivery failed", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn send_otp(
    Extension(users): Extension<DynUserStore>,
    Extension(otps): Extension<DynOtpStore>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<SendOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return utils::validation_failed();
    };

    let email = utils::normalize_email(&request.email);

    if !utils::valid_email(&email) {
        return utils::validation_failed();
    }

    let account = match users.find_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (StatusCode::OK, Json(MessageResponse::ok(GENERIC_SENT))).into_response()
        }
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    if account.verified {
        return bad_request("User is already verified");
    }

    let code = utils::generate_otp();
    let record = OtpRecord {
        email: email.clone(),
        code: code.clone(),
        purpose: OtpPurpose::EmailVerification,
        expires_at: utils::otp_expiry(state.config().otp_ttl_seconds()),
    };

    if let Err(err) = otps.upsert(&record).await {
        error!("{err:#}");
        return utils::server_error();
    }

    let message = verification_email(&email, &code, state.config().otp_ttl_minutes());
    if let Err(err) = state.mailer().send(&message) {
        error!("Failed to send OTP email: {err:#}");

        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::fail("Failed to send OTP email")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(MessageResponse::ok("OTP sent to email")),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified, session granted", body = SessionResponse),
        (status = 400, description = "Expired or wrong code, or validation failed", body = MessageResponse),
        (status = 404, description = "No pending code, or unknown user", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    Extension(users): Extension<DynUserStore>,
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
        Ok(None) => return not_found("OTP not found. Please request a new one."),
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    // Expired records are removed when observed, not by a background job.
    if record.expires_at <= Utc::now() {
        if let Err(err) = otps.delete(&email).await {
            error!("{err:#}");
            return utils::server_error();
        }

        return bad_request("OTP expired. Please request a new one.");
    }

    // Wrong code keeps the record so the real one can still be used.
    if record.code != request.otp {
        return bad_request("Invalid OTP");
    }

    // Single use: consume before flipping the account.
    if let Err(err) = otps.delete(&email).await {
        error!("{err:#}");
        return utils::server_error();
    }

    let account = match users.mark_verified(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => return not_found("User not found"),
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    match grant_session(&state, &users, &account, "Email successfully verified").await {
        Ok((headers, body)) => (StatusCode::OK, headers, Json(body)).into_response(),
        Err(err) => {
            error!("{err:#}");
            utils::server_error()
        }
    }
}
