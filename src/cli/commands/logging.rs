use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Accepts either a repeat count (`0`..=`5`) or a level name, normalizing
/// both to the count the verbosity scale expects.
#[must_use]
pub fn parse_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity, repeat to increase (-vv) or set a level name via PRANA_LOG_LEVEL; errors only when absent")
            .env("PRANA_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(parse_log_level()),
    )
}
