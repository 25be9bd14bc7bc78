use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_ACCESS_TOKEN_TTL: &str = "access-token-ttl";
pub const ARG_REFRESH_TOKEN_TTL: &str = "refresh-token-ttl";
pub const ARG_OTP_TTL: &str = "otp-ttl";
pub const ARG_RESET_TOKEN_TTL: &str = "reset-token-ttl";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

/// Parsed token/cookie options for the auth flows.
#[derive(Debug)]
pub struct Options {
    pub token_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl Options {
    /// Extract the auth options from validated CLI matches.
    ///
    /// # Errors
    /// Returns an error if the token secret is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --token-secret")?;

        Ok(Self {
            token_secret: SecretString::from(token_secret),
            access_token_ttl_seconds: matches
                .get_one::<i64>(ARG_ACCESS_TOKEN_TTL)
                .copied()
                .unwrap_or(900),
            refresh_token_ttl_seconds: matches
                .get_one::<i64>(ARG_REFRESH_TOKEN_TTL)
                .copied()
                .unwrap_or(604_800),
            otp_ttl_seconds: matches.get_one::<i64>(ARG_OTP_TTL).copied().unwrap_or(600),
            reset_token_ttl_seconds: matches
                .get_one::<i64>(ARG_RESET_TOKEN_TTL)
                .copied()
                .unwrap_or(600),
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        })
    }
}

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_cookie_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Symmetric secret used to sign all token classes")
                .env("PRANA_TOKEN_SECRET")
                .required(true)
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL)
                .long(ARG_ACCESS_TOKEN_TTL)
                .help("Access token lifetime in seconds")
                .env("PRANA_ACCESS_TOKEN_TTL")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL)
                .long(ARG_REFRESH_TOKEN_TTL)
                .help("Refresh token lifetime in seconds")
                .env("PRANA_REFRESH_TOKEN_TTL")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_OTP_TTL)
                .long(ARG_OTP_TTL)
                .help("One-time code lifetime in seconds")
                .env("PRANA_OTP_TTL")
                .default_value("600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RESET_TOKEN_TTL)
                .long(ARG_RESET_TOKEN_TTL)
                .help("Password-reset token lifetime in seconds")
                .env("PRANA_RESET_TOKEN_TTL")
                .default_value("600")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_cookie_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_SECURE_COOKIES)
            .long(ARG_SECURE_COOKIES)
            .help("Add the Secure attribute to the refresh-token cookie")
            .env("PRANA_SECURE_COOKIES")
            .action(ArgAction::SetTrue),
    )
}
