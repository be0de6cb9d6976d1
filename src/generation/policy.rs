//! Retry policy: what to do after a failed attempt, and how long to wait first.

use crate::error::FailureKind;
use rand::Rng;
use std::time::Duration;

/// Where the next attempt goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    RetrySame,
    SwitchModel,
    Abort,
}

/// Decision for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStep {
    pub wait: Duration,
    pub action: NextAction,
}

impl RetryStep {
    fn switch() -> Self {
        Self {
            wait: Duration::ZERO,
            action: NextAction::SwitchModel,
        }
    }
}

/// Backoff and routing rules for the request executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub attempts_per_model: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random jitter, as a fraction of the computed delay.
    pub jitter_ratio: f64,
    /// Longest server-provided wait honored.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_model: 2,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            jitter_ratio: 0.35,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Decide the next step after attempt `attempt` (0-based, per model) failed with `kind`.
    ///
    /// Rate limits with a server hint wait on the same model; without one they move on.
    pub fn next_step<R: Rng>(
        &self,
        attempt: u32,
        kind: FailureKind,
        retry_hint: Option<Duration>,
        rng: &mut R,
    ) -> RetryStep {
        let retry_in_place = match kind {
            FailureKind::Transport | FailureKind::ServerError | FailureKind::MalformedOutput => true,
            FailureKind::RateLimited => retry_hint.is_some(),
            FailureKind::AccessDenied | FailureKind::ModelNotFound | FailureKind::BadRequest => false,
            FailureKind::NoEligibleModels
            | FailureKind::LowSignalOutput
            | FailureKind::LowDiversity => {
                return RetryStep {
                    wait: Duration::ZERO,
                    action: NextAction::Abort,
                }
            }
        };

        if !retry_in_place || attempt + 1 >= self.attempts_per_model {
            return RetryStep::switch();
        }

        let wait = match retry_hint {
            Some(hint) => hint.min(self.max_retry_after),
            None => self.backoff(attempt, rng),
        };
        RetryStep {
            wait,
            action: NextAction::RetrySame,
        }
    }

    /// `base * 2^attempt`, capped, plus up to `jitter_ratio` of it.
    pub fn backoff<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter = if self.jitter_ratio > 0.0 {
            delay.mul_f64(rng.gen_range(0.0..=self.jitter_ratio))
        } else {
            Duration::ZERO
        };
        delay.saturating_add(jitter)
    }
}
