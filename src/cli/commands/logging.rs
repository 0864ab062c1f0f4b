use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count they stand for.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Parse `PORTERO_LOG_LEVEL`: a level name (any case) or its verbosity count.
///
/// # Errors
/// Returns a message listing the accepted values.
pub fn parse_log_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    let index = match value.parse::<usize>() {
        Ok(count) => (count < LEVELS.len()).then_some(count),
        Err(_) => LEVELS
            .iter()
            .position(|level| level.eq_ignore_ascii_case(value)),
    };

    index
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| format!("expected one of {} or 0-4", LEVELS.join(", ")))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity, repeat for more: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE")
            .env("PORTERO_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_log_level)),
    )
}
