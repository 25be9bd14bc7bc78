//! Account lifecycle handlers: registration, login, token refresh, one-time
//! codes, and password reset.
//!
//! All handlers read their collaborators from request extensions: the shared
//! [`AuthState`], a [`crate::store::DynUserStore`] and a
//! [`crate::store::DynOtpStore`]. Responses always carry the
//! `{success, message}` envelope from [`types`].

pub mod login;
pub mod otp;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod register;
pub mod session;
pub mod state;
pub mod types;
pub(crate) mod utils;

pub use state::{AuthConfig, AuthState};

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests;
