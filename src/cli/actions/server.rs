use crate::{api, api::handlers::auth::AuthConfig, cli::globals::GlobalArgs};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub globals: GlobalArgs,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub secure_cookies: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new()
        .with_access_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_otp_ttl_seconds(args.otp_ttl_seconds)
        .with_reset_ttl_seconds(args.reset_token_ttl_seconds)
        .with_secure_cookies(args.secure_cookies);

    api::new(args.port, args.dsn, &args.globals, auth_config).await
}
