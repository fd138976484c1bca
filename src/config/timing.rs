use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::PollOptions;

/// Delays and polling budgets of the modal lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Show/hide animation length.
    pub transition_ms: u64,
    /// Added to `transition_ms` before a transition counts as finished.
    pub transition_slack_ms: u64,
    pub form_open_delay_ms: u64,
    pub replace_poll_interval_ms: u64,
    pub settle_poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub force_close_interval_ms: u64,
    pub force_close_cooldown_ms: u64,
    pub transport_error_close_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transition_ms: 200,
            transition_slack_ms: 20,
            form_open_delay_ms: 180,
            replace_poll_interval_ms: 100,
            settle_poll_interval_ms: 50,
            poll_max_attempts: 20,
            force_close_interval_ms: 50,
            force_close_cooldown_ms: 800,
            transport_error_close_delay_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

impl TimingConfig {
    pub const fn transition_window(&self) -> Duration {
        Duration::from_millis(self.transition_ms + self.transition_slack_ms)
    }

    pub const fn form_open_delay(&self) -> Duration {
        Duration::from_millis(self.form_open_delay_ms)
    }

    pub const fn replace_poll(&self) -> PollOptions {
        PollOptions::new(
            Duration::from_millis(self.replace_poll_interval_ms),
            self.poll_max_attempts,
        )
    }

    pub const fn settle_poll(&self) -> PollOptions {
        PollOptions::new(
            Duration::from_millis(self.settle_poll_interval_ms),
            self.poll_max_attempts,
        )
    }

    pub const fn force_close_interval(&self) -> Duration {
        Duration::from_millis(self.force_close_interval_ms)
    }

    pub const fn force_close_cooldown(&self) -> Duration {
        Duration::from_millis(self.force_close_cooldown_ms)
    }

    pub const fn transport_error_close_delay(&self) -> Duration {
        Duration::from_millis(self.transport_error_close_delay_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
