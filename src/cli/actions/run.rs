use crate::cli::actions::{login, shell, verify, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args),
        Action::Verify(args) => verify::execute(args),
        Action::Shell(args) => shell::execute(args).await,
    }
}
