//! Per-username login throttling.
//!
//! Sliding window: each key keeps the timestamps of its recent attempts and at
//! most `max_attempts` of them may fall inside `window`. Keys are independent.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::{clock::Clock, config::AuthConfig};

pub struct AttemptThrottle {
    attempts: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
    max_attempts: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl AttemptThrottle {
    #[must_use]
    pub fn new(max_attempts: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            window,
            clock,
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.rate_limit_max_attempts(),
            config.rate_limit_window(),
            clock,
        )
    }

    // A window reaching past the earliest representable instant keeps everything.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Admit and record an attempt for `key`.
    ///
    /// Returns `false` without recording anything once the window is full.
    pub fn allow(&self, key: &str) -> bool {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        let cutoff = self.cutoff(now);

        let entry = attempts.entry(key.to_string()).or_default();
        while entry.front().is_some_and(|&t| t <= cutoff) {
            entry.pop_front();
        }

        if entry.len() >= self.max_attempts {
            return false;
        }

        entry.push_back(now);
        true
    }

    /// Forget every recorded attempt for `key`.
    pub fn reset(&self, key: &str) {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.remove(key);
    }

    /// Drop keys whose attempts have all left the window.
    pub fn cleanup(&self) {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = self.cutoff(self.clock.now());

        attempts.retain(|_, times| {
            times.retain(|&t| t > cutoff);
            !times.is_empty()
        });
    }

    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Periodically drop stale keys so abandoned usernames do not pile up.
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let throttle = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            loop {
                interval_timer.tick().await;
                throttle.cleanup();
            }
        })
    }
}
