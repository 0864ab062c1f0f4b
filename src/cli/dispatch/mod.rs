//! Map parsed arguments to the action the binary runs.

use crate::cli::actions::{login, shell, verify, Action};
use crate::cli::commands::{
    auth, ARG_PASSWORD, ARG_SWEEP_INTERVAL_SECONDS, ARG_TOKEN, ARG_USERNAME, CMD_LOGIN, CMD_SHELL,
    CMD_VERIFY,
};
use anyhow::{Context, Result};
use std::time::Duration;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let config = auth::Options::parse(matches)?.into_config();

    match matches.subcommand() {
        Some((CMD_LOGIN, sub)) => Ok(Action::Login(login::Args {
            config,
            username: sub
                .get_one::<String>(ARG_USERNAME)
                .cloned()
                .context("missing required argument: --username")?,
            password: sub
                .get_one::<String>(ARG_PASSWORD)
                .cloned()
                .context("missing required argument: --password")?
                .into(),
        })),
        Some((CMD_VERIFY, sub)) => Ok(Action::Verify(verify::Args {
            config,
            token: sub
                .get_one::<String>(ARG_TOKEN)
                .cloned()
                .context("missing required argument: <TOKEN>")?,
        })),
        Some((CMD_SHELL, sub)) => Ok(Action::Shell(shell::Args {
            config,
            sweep_interval: Duration::from_secs(
                sub.get_one::<u64>(ARG_SWEEP_INTERVAL_SECONDS)
                    .copied()
                    .unwrap_or(300),
            ),
        })),
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("missing command"),
    }
}
