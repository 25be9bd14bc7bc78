use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Repeated `-v` flags (or a level name via `PRANA_LOG_LEVEL`) land on one
/// scale; zero means errors only.
const fn verbosity_to_level(count: u8) -> Option<tracing::Level> {
    match count {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Parse the command line, bring up logging, and hand the selected action
/// back to the binary for execution.
///
/// # Errors
///
/// Returns an error if telemetry initialization or argument dispatch fails;
/// invalid arguments exit through clap before this returns.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let level = verbosity_to_level(
        matches
            .get_one::<u8>(commands::logging::ARG_VERBOSITY)
            .copied()
            .unwrap_or(0),
    );

    telemetry::init(level)?;

    dispatch::handler(&matches)
}
