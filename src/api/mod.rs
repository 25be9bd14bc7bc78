use crate::{
    api::handlers::auth::{AuthConfig, AuthState},
    cli::globals::GlobalArgs,
    store::{
        postgres::{PgOtpStore, PgUserStore},
        DynOtpStore, DynUserStore,
    },
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod email;
pub mod handlers;
// OpenAPI document assembly lives in openapi.rs; the `openapi` bin prints it.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
///
/// Routes match the paths in [`openapi`]; handlers pull their collaborators
/// from request extensions installed by [`new`].
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/register", post(handlers::auth::register::register))
        .route("/auth/login", post(handlers::auth::login::login))
        .route(
            "/auth/refresh-token",
            post(handlers::auth::refresh::refresh_access_token),
        )
        .route("/auth/send-otp", post(handlers::auth::otp::send_otp))
        .route("/auth/verify-otp", post(handlers::auth::otp::verify_otp))
        .route(
            "/auth/forgot-password",
            post(handlers::auth::password::forgot_password),
        )
        .route(
            "/auth/verify-resetpassword-otp",
            post(handlers::auth::password::verify_password_reset_otp),
        )
        .route(
            "/auth/reset-password",
            post(handlers::auth::password::reset_password),
        )
        .route("/auth/logout", post(handlers::auth::refresh::logout))
        .route("/auth/me", get(handlers::me::me))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    globals: &GlobalArgs,
    auth_config: AuthConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let user_store: DynUserStore = Arc::new(PgUserStore::new(pool.clone()));
    let otp_store: DynOtpStore = Arc::new(PgOtpStore::new(pool.clone()));

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        &globals.token_secret,
        Arc::new(email::LogEmailSender),
    ));

    let app = router().layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(CorsLayer::permissive())
            .layer(Extension(auth_state))
            .layer(Extension(user_store))
            .layer(Extension(otp_store))
            .layer(Extension(pool)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
