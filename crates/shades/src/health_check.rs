//! Health-check response built on the service's liveness flags.
//!
//! Framework-agnostic: the HTTP layer copies `status_code`, `body` and
//! `retry_after` into its response.

use shades_core::{Component, HealthState};
use std::time::Duration;

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAVAILABLE: u16 = 503;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    state: HealthState,
    retry_after: Duration,
}

impl HealthReport {
    pub fn new(state: HealthState, retry_after: Duration) -> Self {
        Self { state, retry_after }
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Available only when both the store and the broker are up
    pub fn is_available(&self) -> bool {
        self.state.is_healthy()
    }

    pub fn status_code(&self) -> u16 {
        if self.is_available() {
            STATUS_OK
        } else {
            STATUS_UNAVAILABLE
        }
    }

    /// The one subsystem named as the cause when unavailable
    pub fn unavailable(&self) -> Option<Component> {
        self.state.unavailable()
    }

    /// Plain-text body
    pub fn body(&self) -> String {
        match self.unavailable() {
            None => "OK".to_string(),
            Some(component) => format!("{} is unavailable", component),
        }
    }

    /// Retry hint, only set when unavailable
    pub fn retry_after(&self) -> Option<Duration> {
        if self.is_available() {
            None
        } else {
            Some(self.retry_after)
        }
    }
}
