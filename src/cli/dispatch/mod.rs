//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        globals: GlobalArgs::new(auth_opts.token_secret),
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        reset_token_ttl_seconds: auth_opts.reset_token_ttl_seconds,
        secure_cookies: auth_opts.secure_cookies,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;
    use secrecy::ExposeSecret;

    #[test]
    fn server_action_from_matches() {
        temp_env::with_vars(
            [
                ("PRANA_DSN", Some("postgres://localhost:5432/prana")),
                ("PRANA_TOKEN_SECRET", Some("s3cret")),
                ("PRANA_SECURE_COOKIES", Some("true")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["prana"]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.dsn, "postgres://localhost:5432/prana");
                    assert_eq!(args.globals.token_secret.expose_secret(), "s3cret");
                    assert_eq!(args.access_token_ttl_seconds, 900);
                    assert_eq!(args.refresh_token_ttl_seconds, 604_800);
                    assert!(args.secure_cookies);
                }
            },
        );
    }
}
