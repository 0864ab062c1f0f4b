//! Line-oriented host loop.
//!
//! One `LoginService` serves every request for the lifetime of the process, so
//! throttling, lockouts and logouts carry over from one line to the next.

use crate::{config::AuthConfig, login::LoginService};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub config: AuthConfig,
    pub sweep_interval: Duration,
}

/// Response for one request line, `None` once the client asked to quit.
pub fn handle_line(service: &LoginService, line: &str) -> Option<Value> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let response = match parts.as_slice() {
        [] => json!({ "error": "empty command" }),
        ["quit" | "exit"] => return None,
        // A missing password field is an empty password.
        ["login", username] => json!(service.login(username, "")),
        ["login", username, password] => json!(service.login(username, password)),
        ["verify", token] => json!(service.verify(token)),
        ["logout", token] => json!(service.logout(token)),
        [command @ ("login" | "verify" | "logout" | "quit" | "exit"), ..] => {
            json!({ "error": format!("wrong number of arguments for {command}") })
        }
        [command, ..] => json!({ "error": format!("unknown command: {command}") }),
    };
    Some(response)
}

/// Serve requests from stdin until EOF or `quit`.
/// # Errors
/// Returns an error if stdin cannot be read or stdout cannot be written.
pub async fn execute(args: Args) -> Result<()> {
    let service = LoginService::from_config(&args.config);
    let sweeper = service.tokens().start_sweep_task(args.sweep_interval);
    let cleaner = service.throttle().start_cleanup_task(args.sweep_interval);
    info!("Serving login requests on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(response) = handle_line(&service, &line) else {
            debug!("Client asked to quit");
            break;
        };
        let mut out = serde_json::to_vec(&response).context("failed to encode response")?;
        out.push(b'\n');
        stdout
            .write_all(&out)
            .await
            .context("failed to write response")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }

    sweeper.abort();
    cleaner.abort();
    Ok(())
}
