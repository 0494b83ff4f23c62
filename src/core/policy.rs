//! Polling budgets.
//!
//! Live-call analyses settle within a minute or so; audio uploads go through
//! transcription first and need a much longer budget, so each call site picks
//! a profile instead of sharing one constant.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Budgets for one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Attempts allowed while the job is pending or the transport is failing
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Attempts allowed while the service answers 404
    #[serde(default = "default_not_found_budget")]
    pub not_found_retry_budget: u32,
}

fn default_poll_interval() -> u64 {
    2000
}
fn default_max_attempts() -> u32 {
    20
} // 40s at the default interval
fn default_not_found_budget() -> u32 {
    5
}

/// Max attempts for audio uploads (3 min at the default interval)
const UPLOAD_MAX_ATTEMPTS: u32 = 90;

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            not_found_retry_budget: default_not_found_budget(),
        }
    }
}

impl PollPolicy {
    /// Budget for calls analysed straight from a live transcript
    pub fn live() -> Self {
        Self::default()
    }

    /// Budget for uploaded recordings
    pub fn upload() -> Self {
        Self {
            max_attempts: UPLOAD_MAX_ATTEMPTS,
            ..Self::default()
        }
    }

    pub fn for_profile(profile: PollProfile) -> Self {
        match profile {
            PollProfile::Live => Self::live(),
            PollProfile::Upload => Self::upload(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// True once `attempts` pending/error responses have used up the budget
    pub fn is_timed_out(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// True once `attempts` 404 responses have used up the not-found budget
    pub fn is_not_found_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.not_found_retry_budget
    }

    /// Upper bound on total time spent sleeping between attempts
    pub fn max_wait(&self) -> Duration {
        let attempts = self.max_attempts as u64 + self.not_found_retry_budget as u64;
        Duration::from_millis(self.poll_interval_ms.saturating_mul(attempts))
    }
}

/// Call sites with their own attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollProfile {
    /// Transcript submitted from a live call
    Live,

    /// Uploaded audio recording
    Upload,
}

impl Default for PollProfile {
    fn default() -> Self {
        Self::Live
    }
}
