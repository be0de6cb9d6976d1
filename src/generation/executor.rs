//! Request executor: one generation across ranked models with classified retries.
//! Owns the attempt loop; classification comes from the reply, routing from the policy.

use crate::error::{sanitize_message, FailureKind, GenerationError};
use crate::generation::policy::{NextAction, RetryPolicy};
use crate::provider::{extract_text, BackendReply, GenerationOptions, GenerativeBackend, RankedModelList};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Waits between attempts. Swapped out in tests so backoff is observable without delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of a single HTTP-level attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    RetryableFailure(GenerationError),
    SwitchModel(GenerationError),
    FatalFailure(GenerationError),
}

/// Text produced by a successful execution and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSuccess {
    pub text: String,
    pub model: String,
    /// Total requests issued, across models.
    pub attempts: u32,
}

/// Turn a raw reply into text or a classified error.
pub fn classify_reply(reply: &BackendReply) -> Result<String, GenerationError> {
    if reply.is_success() {
        return extract_text(&reply.body);
    }
    let kind = FailureKind::from_status(reply.status);
    Err(GenerationError::new(
        kind,
        format!("HTTP {} {}", reply.status, sanitize_message(&reply.body)),
    )
    .with_retry_after(reply.retry_hint()))
}

/// Drives one generation across models and retries.
pub struct RequestExecutor {
    backend: Arc<dyn GenerativeBackend>,
    policy: RetryPolicy,
    options: GenerationOptions,
    sleeper: Arc<dyn Sleeper>,
}

impl RequestExecutor {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        policy: RetryPolicy,
        options: GenerationOptions,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            backend,
            policy,
            options,
            sleeper,
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Issue one request and decide what it means for the attempt loop.
    async fn attempt(&self, model: &str, prompt: &str, attempt: u32) -> (AttemptOutcome, Duration) {
        let result = match self.backend.generate(model, prompt, &self.options).await {
            Ok(reply) => classify_reply(&reply),
            Err(err) => Err(err),
        };
        let err = match result {
            Ok(text) => return (AttemptOutcome::Success(text), Duration::ZERO),
            Err(err) => err,
        };
        let step = self
            .policy
            .next_step(attempt, err.kind, err.retry_after, &mut rand::thread_rng());
        let outcome = match step.action {
            NextAction::RetrySame => AttemptOutcome::RetryableFailure(err),
            NextAction::SwitchModel => AttemptOutcome::SwitchModel(err),
            NextAction::Abort => AttemptOutcome::FatalFailure(err),
        };
        (outcome, step.wait)
    }

    /// Try each ranked model in order until one returns text.
    ///
    /// Exhaustion yields the last observed error kind so callers can tell quota
    /// outages from everything else.
    pub async fn execute(
        &self,
        prompt: &str,
        models: &RankedModelList,
    ) -> Result<ExecutionSuccess, GenerationError> {
        if models.is_empty() {
            return Err(GenerationError::no_eligible_models());
        }

        let mut last_error: Option<GenerationError> = None;
        let mut total_attempts = 0u32;

        for model in models {
            let mut attempt = 0u32;
            loop {
                total_attempts += 1;
                debug!(model = %model.id, attempt, "Issuing generation request");
                let (outcome, wait) = self.attempt(&model.id, prompt, attempt).await;
                match outcome {
                    AttemptOutcome::Success(text) => {
                        info!(model = %model.id, attempts = total_attempts, "Generation succeeded");
                        return Ok(ExecutionSuccess {
                            text,
                            model: model.id.clone(),
                            attempts: total_attempts,
                        });
                    }
                    AttemptOutcome::RetryableFailure(err) => {
                        warn!(
                            model = %model.id,
                            attempt,
                            kind = %err.kind,
                            wait_ms = wait.as_millis() as u64,
                            "Generation attempt failed; retrying same model"
                        );
                        last_error = Some(err);
                        self.sleeper.sleep(wait).await;
                        attempt += 1;
                    }
                    AttemptOutcome::SwitchModel(err) => {
                        warn!(
                            model = %model.id,
                            attempt,
                            kind = %err.kind,
                            "Generation attempt failed; switching model"
                        );
                        last_error = Some(err);
                        break;
                    }
                    AttemptOutcome::FatalFailure(err) => {
                        warn!(model = %model.id, kind = %err.kind, "Generation aborted");
                        return Err(err);
                    }
                }
            }
        }

        let last = last_error.unwrap_or_else(GenerationError::no_eligible_models);
        Err(GenerationError::new(
            last.kind,
            format!(
                "all {} model(s) exhausted after {} attempt(s); last error: {}",
                models.len(),
                total_attempts,
                last.message
            ),
        ))
    }
}
