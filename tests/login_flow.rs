//! End-to-end login scenarios against the demo accounts.
//!
//! Flow Overview:
//! 1. Build a `LoginService` on a manual clock.
//! 2. Drive it through throttling, lockout, success and logout.
//! 3. Check what callers see at every step.

use anyhow::{ensure, Context, Result};
use chrono::Duration;
use portero::{AuthConfig, Clock, LoginService, ManualClock};
use secrecy::SecretString;
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const RATE_LIMITED: &str = "Too many login attempts. Please wait a while and try again.";

fn service(config: &AuthConfig) -> (LoginService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let service = LoginService::with_sample_identities(config, clock.clone());
    (service, clock)
}

fn config() -> AuthConfig {
    AuthConfig::new(SecretString::from("integration-secret"))
}

#[test]
fn throttle_kicks_in_before_lockout_with_defaults() -> Result<()> {
    let (service, _clock) = service(&config());

    for attempt in 1..=5 {
        let result = service.login("admin", "bad");
        ensure!(!result.success, "attempt {attempt} should fail");
        ensure!(
            result.message == INVALID_CREDENTIALS,
            "attempt {attempt}: unexpected message {}",
            result.message
        );
    }

    let sixth = service.login("admin", "bad");
    ensure!(sixth.message == RATE_LIMITED, "got {}", sixth.message);

    // Even the right password is turned away while throttled.
    let right = service.login("admin", "admin");
    ensure!(!right.success);
    ensure!(right.message == RATE_LIMITED);
    Ok(())
}

#[test]
fn throttle_answers_before_lockout_after_a_success() -> Result<()> {
    let (service, _clock) = service(&config());

    ensure!(service.login("admin", "admin").success);
    for _ in 0..5 {
        ensure!(service.login("admin", "bad").message == INVALID_CREDENTIALS);
    }

    // The fifth miss locked the account, but the full window is checked first.
    let result = service.login("admin", "admin");
    ensure!(!result.success);
    ensure!(result.message == RATE_LIMITED, "got {}", result.message);
    Ok(())
}

#[test]
fn unknown_usernames_are_throttled_too() -> Result<()> {
    let (service, _clock) = service(&config());
    for _ in 0..5 {
        ensure!(service.login("ghost", "x").message == INVALID_CREDENTIALS);
    }
    ensure!(service.login("ghost", "x").message == RATE_LIMITED);

    // Other usernames keep their own window.
    ensure!(service.login("user1", "123").success);
    Ok(())
}

#[test]
fn lockout_reports_minutes_and_expires() -> Result<()> {
    let config = config().with_rate_limit_max_attempts(100);
    let (service, clock) = service(&config);

    for _ in 0..5 {
        ensure!(service.login("admin", "bad").message == INVALID_CREDENTIALS);
    }

    let locked = service.login("admin", "admin");
    ensure!(!locked.success);
    ensure!(
        locked.message == "Account is locked. Try again in 15 minutes.",
        "got {}",
        locked.message
    );

    clock.advance(Duration::minutes(15));
    let unlocked = service.login("admin", "admin");
    ensure!(unlocked.success, "got {}", unlocked.message);
    Ok(())
}

#[test]
fn success_resets_both_counters() -> Result<()> {
    let (service, _clock) = service(&config());

    for _ in 0..4 {
        ensure!(!service.login("admin", "bad").success);
    }
    ensure!(service.login("admin", "admin").success);

    // Fresh window and fresh failure count: four more misses stay generic.
    for _ in 0..4 {
        ensure!(service.login("admin", "bad").message == INVALID_CREDENTIALS);
    }
    ensure!(service.login("admin", "admin").success);
    Ok(())
}

#[test]
fn issued_token_verifies_until_logout() -> Result<()> {
    let (service, clock) = service(&config());

    let result = service.login("user1", "123");
    ensure!(result.success);
    let token = result.token.context("missing token")?;

    let claims = service.verify(&token).context("token should verify")?;
    ensure!(claims.username == "user1");
    ensure!(claims.role == "user");
    ensure!(claims.issuer == "medical-ocr-system");
    ensure!(claims.issued_at == clock.now().timestamp());
    ensure!(claims.expires_at == claims.issued_at + 86_400);
    ensure!(result.expires_at == Some(clock.now() + Duration::hours(24)));

    ensure!(service.logout(&token).success);
    ensure!(service.verify(&token).is_none());
    ensure!(service.logout(&token).success);
    Ok(())
}

#[test]
fn tokens_expire_after_ttl() -> Result<()> {
    let (service, clock) = service(&config().with_token_ttl_seconds(60));
    let token = service
        .login("doctor", "")
        .token
        .context("missing token")?;

    clock.advance(Duration::seconds(59));
    ensure!(service.verify(&token).is_some());
    clock.advance(Duration::seconds(1));
    ensure!(service.verify(&token).is_none());
    Ok(())
}

#[test]
fn relogin_after_logout_gets_a_new_token() -> Result<()> {
    let (service, _clock) = service(&config());

    let first = service.login("admin", "admin").token.context("first token")?;
    ensure!(service.logout(&first).success);

    let second = service.login("admin", "admin").token.context("second token")?;
    ensure!(first != second);
    ensure!(service.verify(&first).is_none());
    ensure!(service.verify(&second).is_some());
    Ok(())
}

#[test]
fn tokens_from_another_secret_are_rejected() -> Result<()> {
    let (ours, _clock) = service(&config());
    let (theirs, _clock) = service(&AuthConfig::new(SecretString::from("someone-else")));

    let foreign = theirs.login("admin", "admin").token.context("token")?;
    ensure!(ours.verify(&foreign).is_none());
    ensure!(ours.verify("not-a-token").is_none());
    Ok(())
}

#[tokio::test]
async fn sweeper_drops_expired_revocations() -> Result<()> {
    let (service, clock) = service(&config().with_token_ttl_seconds(60));
    let token = service.login("admin", "admin").token.context("token")?;
    service.logout(&token);
    ensure!(service.tokens().revoked_count() == 1);

    clock.advance(Duration::seconds(61));
    let sweeper = service
        .tokens()
        .start_sweep_task(std::time::Duration::from_millis(10));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    sweeper.abort();

    ensure!(service.tokens().revoked_count() == 0);
    Ok(())
}
