use crate::{config::AuthConfig, login::LoginService};
use anyhow::{bail, Context, Result};

#[derive(Debug)]
pub struct Args {
    pub config: AuthConfig,
    pub token: String,
}

/// Verify a token and print its claims, or `null`.
///
/// Revocations from other processes are not visible here; only signature,
/// issuer and expiry are checked.
/// # Errors
/// Returns an error when the token is not valid.
pub fn execute(args: Args) -> Result<()> {
    let service = LoginService::from_config(&args.config);
    let claims = service.verify(&args.token);

    let json = serde_json::to_string_pretty(&claims).context("failed to encode claims")?;
    println!("{json}");

    if claims.is_none() {
        bail!("invalid session token");
    }
    Ok(())
}
