use crate::{config::AuthConfig, login::LoginService};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub config: AuthConfig,
    pub username: String,
    pub password: SecretString,
}

/// Run a single login against the demo accounts and print the result.
/// # Errors
/// Returns an error if the result cannot be serialized.
pub fn execute(args: Args) -> Result<()> {
    let service = LoginService::from_config(&args.config);
    let result = service.login(&args.username, args.password.expose_secret());

    let json = serde_json::to_string_pretty(&result).context("failed to encode login result")?;
    println!("{json}");

    Ok(())
}
