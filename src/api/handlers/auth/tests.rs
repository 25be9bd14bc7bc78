//! End-to-end flows across the auth handlers, on the in-memory stores.

use super::test_support::{cookie_token, harness, message_of, read_json};
use super::{login, otp, password, refresh, register, state::AuthConfig, types::*};
use crate::store::{OtpPurpose, OtpRecord};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
};
use chrono::{Duration, Utc};

fn with_cookie(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("refreshToken={token}")).unwrap(),
    );
    headers
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[tokio::test]
async fn registration_to_first_session() {
    let h = harness(AuthConfig::new());

    let response = register::register(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(RegisterRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            age: Some(30),
            password: "hunter22".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Login before verification is refused and re-sends a code.
    let response = login::login(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(LoginRequest {
            email: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.mailer.sent_count(), 2);

    // The re-sent code wins.
    let code = h.mailer.last_code().unwrap();
    let response = otp::verify_otp(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(VerifyOtpRequest {
            email: "asha@example.com".to_string(),
            otp: code,
        })),
    )
    .await
    .into_response();

    let refresh_token = cookie_token(&response).expect("session cookie");
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&body), "Email successfully verified");

    // The granted refresh token works immediately.
    let response = refresh::refresh_access_token(
        with_cookie(&refresh_token),
        Extension(h.users.clone()),
        Extension(h.state.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn password_reset_revokes_old_refresh_tokens() {
    let h = harness(AuthConfig::new());
    super::test_support::seed_account(&h, "asha@example.com", "hunter22", true).await;

    // Establish a session before the reset.
    let response = login::login(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(LoginRequest {
            email: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
        })),
    )
    .await
    .into_response();
    let old_refresh = cookie_token(&response).expect("session cookie");

    // Request and verify the reset code.
    password::forgot_password(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(ForgotPasswordRequest {
            email: "asha@example.com".to_string(),
        })),
    )
    .await;
    let code = h.mailer.last_code().unwrap();

    let response = password::verify_password_reset_otp(
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(VerifyOtpRequest {
            email: "asha@example.com".to_string(),
            otp: code,
        })),
    )
    .await
    .into_response();
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    let reset_token = body["token"].as_str().unwrap().to_string();

    let response = password::reset_password(
        bearer(&reset_token),
        Extension(h.users.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(ResetPasswordRequest {
            new_password: "n3w-password".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    // The pre-reset refresh token is dead.
    let response = refresh::refresh_access_token(
        with_cookie(&old_refresh),
        Extension(h.users.clone()),
        Extension(h.state.clone()),
    )
    .await
    .into_response();
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(&body), "Token has been revoked");

    // Old password refused, new password accepted.
    let response = login::login(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(LoginRequest {
            email: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login::login(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(LoginRequest {
            email: "asha@example.com".to_string(),
            password: "n3w-password".to_string(),
        })),
    )
    .await
    .into_response();
    let new_refresh = cookie_token(&response).expect("session cookie");
    let (status, _) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);

    // A refresh token issued after the reset carries the bumped version.
    let response = refresh::refresh_access_token(
        with_cookie(&new_refresh),
        Extension(h.users.clone()),
        Extension(h.state.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn verify_otp_for_vanished_account_is_not_found() {
    let h = harness(AuthConfig::new());

    // A code without a matching account, as after an account deletion.
    h.otps
        .upsert(&OtpRecord {
            email: "gone@example.com".to_string(),
            code: "123456".to_string(),
            purpose: OtpPurpose::EmailVerification,
            expires_at: Utc::now() + Duration::minutes(10),
        })
        .await
        .unwrap();

    let response = otp::verify_otp(
        Extension(h.users.clone()),
        Extension(h.otps.clone()),
        Extension(h.state.clone()),
        Some(axum::Json(VerifyOtpRequest {
            email: "gone@example.com".to_string(),
            otp: "123456".to_string(),
        })),
    )
    .await
    .into_response();

    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message_of(&body), "User not found");

    // The code was still consumed.
    assert!(h.otps.find("gone@example.com").await.unwrap().is_none());
}
