use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use loopcraft_critic::{Critic, Verdict};
use loopcraft_llm::ChatClient;
use loopcraft_logging::{LogEvent, Logger};

use crate::context::{IterationRecord, LoopContext};
use crate::error::LoopError;
use crate::generator::Generator;
use crate::outcome::LoopOutcome;

/// Drives the generate/reflect/decide state machine.
///
/// Strictly sequential: each critic call depends on that iteration's
/// artifact, and each revision depends on the full history, so no two
/// steps of one run ever overlap.
pub struct LoopRunner<'a> {
    generator: Generator<'a>,
    critic: Critic<'a>,
    logger: Arc<Logger>,
    interrupted: Arc<AtomicBool>,
}

impl<'a> LoopRunner<'a> {
    pub fn new(
        generator_client: &'a dyn ChatClient,
        critic_client: &'a dyn ChatClient,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            generator: Generator::new(generator_client),
            critic: Critic::new(critic_client),
            logger,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for signalling cancellation. Checked between iterations, not
    /// mid-call.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Run the loop to completion.
    ///
    /// Generation failures abort the run; degraded critiques do not.
    pub async fn run(&self, mut context: LoopContext) -> Result<LoopOutcome, LoopError> {
        if context.max_iterations == 0 {
            return Err(LoopError::Config(
                "max iterations must be at least 1".to_string(),
            ));
        }

        self.logger.log(&LogEvent::LoopStarted {
            task: context.task.clone(),
            max_iterations: context.max_iterations,
        });

        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                info!(
                    completed = context.history.len(),
                    "Loop interrupted by user"
                );
                return Ok(LoopOutcome::interrupted(context));
            }

            let iteration = context.iteration;

            // GENERATE
            self.logger.log(&LogEvent::GeneratorStarted { iteration });
            let generation_started = Instant::now();
            let artifact = match self.generator.draft(&context.task, &context.history).await {
                Ok(artifact) => artifact,
                Err(source) => {
                    self.logger.log(&LogEvent::GenerationFailed {
                        iteration,
                        error: source.to_string(),
                    });
                    return Err(LoopError::Generation { iteration, source });
                }
            };
            let generation_secs = generation_started.elapsed().as_secs_f64();

            self.logger.log(&LogEvent::GeneratorCompleted {
                iteration,
                artifact_chars: artifact.chars().count(),
                duration_secs: generation_secs,
            });

            // REFLECT
            self.logger.log(&LogEvent::CriticStarted { iteration });
            let review_started = Instant::now();
            let verdict = self.critic.review(&context.task, &artifact, iteration).await;
            let review_secs = review_started.elapsed().as_secs_f64();

            if let Verdict::Degraded { reason } = &verdict {
                self.logger.log(&LogEvent::CritiqueDegraded {
                    iteration,
                    reason: reason.clone(),
                });
            }
            self.logger.log(&LogEvent::CriticVerdict {
                iteration,
                verdict: verdict.short_description(),
            });

            // Commit the pair only after both calls succeeded.
            let approved = verdict.is_approved();
            context.push_record(IterationRecord {
                iteration,
                artifact,
                verdict,
                generation_secs,
                review_secs,
                timestamp: Utc::now(),
            });

            // DECIDE
            if approved {
                self.logger.log(&LogEvent::LoopApproved {
                    iterations: iteration,
                    duration_secs: context.total_duration().as_secs_f64(),
                });
                return Ok(LoopOutcome::approved(context));
            }

            if iteration >= context.max_iterations {
                self.logger.log(&LogEvent::MaxIterationsReached {
                    iterations: iteration,
                });
                return Ok(LoopOutcome::max_iterations_reached(context));
            }

            context.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopcraft_critic::APPROVAL_MARKER;
    use loopcraft_llm::testing::ScriptedClient;
    use loopcraft_llm::LlmError;
    use loopcraft_logging::LogFormat;

    fn logger() -> Arc<Logger> {
        Arc::new(Logger::new(LogFormat::Compact))
    }

    const TASK: &str = "write a function that returns the factorial of a non-negative integer";

    #[tokio::test]
    async fn stops_on_approval_without_further_generation() {
        // Reference scenario: critic flags two issues on v1, approves v2.
        let generator = ScriptedClient::replying(&["v1", "v2"]);
        let critic = ScriptedClient::replying(&[
            "- missing input validation for negative numbers\n- no docstring",
            APPROVAL_MARKER,
        ]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let outcome = runner
            .run(LoopContext::new(TASK).with_max_iterations(3))
            .await
            .unwrap();

        assert!(outcome.is_approved());
        assert_eq!(outcome.iterations(), 2);
        assert_eq!(outcome.artifact(), Some("v2"));
        assert_eq!(outcome.history().len(), 2);
        assert_eq!(generator.call_count(), 2);
        assert_eq!(critic.call_count(), 2);
    }

    #[tokio::test]
    async fn runs_at_most_max_iterations() {
        let generator = ScriptedClient::replying(&["v1", "v2", "v3"]);
        let critic = ScriptedClient::replying(&["- fix a", "- fix b", "- fix c"]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let outcome = runner
            .run(LoopContext::new(TASK).with_max_iterations(3))
            .await
            .unwrap();

        assert!(matches!(outcome, LoopOutcome::MaxIterationsReached { .. }));
        assert_eq!(outcome.iterations(), 3);
        assert_eq!(outcome.artifact(), Some("v3"));
        assert_eq!(generator.call_count(), 3);

        // Chronological, one record per completed pass.
        let history = outcome.history();
        assert_eq!(history.len(), 3);
        for (idx, record) in history.iter().enumerate() {
            assert_eq!(record.iteration, idx + 1);
        }
    }

    #[tokio::test]
    async fn revision_calls_receive_the_complete_history() {
        let generator = ScriptedClient::replying(&["v1", "v2", "v3"]);
        let critic = ScriptedClient::replying(&["- first complaint", "- second complaint", "- third complaint"]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        runner
            .run(LoopContext::new(TASK).with_max_iterations(3))
            .await
            .unwrap();

        let calls = generator.calls();
        // Third draft call: system + task + (v1, feedback1) + (v2, feedback2).
        let third = &calls[2];
        assert_eq!(third.len(), 6);
        assert_eq!(third[2].content, "v1");
        assert!(third[3].content.contains("first complaint"));
        assert_eq!(third[4].content, "v2");
        assert!(third[5].content.contains("second complaint"));
    }

    #[tokio::test]
    async fn embedded_approval_phrase_does_not_stop_the_loop() {
        let generator = ScriptedClient::replying(&["v1", "v2"]);
        let critic = ScriptedClient::replying(&[
            "Saying no further changes needed here would be wrong.\n- handle zero",
            "- still broken",
        ]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let outcome = runner
            .run(LoopContext::new(TASK).with_max_iterations(2))
            .await
            .unwrap();

        assert!(!outcome.is_approved());
        assert_eq!(outcome.iterations(), 2);
    }

    #[tokio::test]
    async fn generation_failure_aborts_before_any_critic_call() {
        let generator = ScriptedClient::new(vec![Err(LlmError::InvalidResponse(
            "connection reset".into(),
        ))]);
        let critic = ScriptedClient::replying(&[APPROVAL_MARKER]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let err = runner.run(LoopContext::new(TASK)).await.unwrap_err();

        match err {
            LoopError::Generation { iteration, .. } => assert_eq!(iteration, 1),
            other => panic!("expected Generation error, got {other:?}"),
        }
        assert_eq!(critic.call_count(), 0);
    }

    #[tokio::test]
    async fn single_iteration_never_revises() {
        let generator = ScriptedClient::replying(&["only version"]);
        let critic = ScriptedClient::replying(&["- plenty wrong with this"]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let outcome = runner
            .run(LoopContext::new(TASK).with_max_iterations(1))
            .await
            .unwrap();

        assert!(matches!(outcome, LoopOutcome::MaxIterationsReached { .. }));
        assert_eq!(outcome.artifact(), Some("only version"));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn degraded_critique_advances_the_loop() {
        let generator = ScriptedClient::replying(&["v1", "v2"]);
        let critic = ScriptedClient::new(vec![
            Err(LlmError::RateLimited("busy".into())),
            Ok(APPROVAL_MARKER.to_string()),
        ]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let outcome = runner
            .run(LoopContext::new(TASK).with_max_iterations(3))
            .await
            .unwrap();

        assert!(outcome.is_approved());
        assert_eq!(outcome.iterations(), 2);
        assert!(outcome.history()[0].verdict.is_degraded());
    }

    #[tokio::test]
    async fn interruption_returns_progress_so_far() {
        let generator = ScriptedClient::replying(&["v1", "v2", "v3"]);
        let critic = ScriptedClient::replying(&["- fix a", "- fix b", "- fix c"]);
        let runner = LoopRunner::new(&generator, &critic, logger());
        runner.interrupt_handle().store(true, Ordering::SeqCst);

        let outcome = runner
            .run(LoopContext::new(TASK).with_max_iterations(3))
            .await
            .unwrap();

        assert!(matches!(outcome, LoopOutcome::Interrupted { .. }));
        assert_eq!(outcome.iterations(), 0);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn zero_iteration_bound_is_a_config_error() {
        let generator = ScriptedClient::replying(&[]);
        let critic = ScriptedClient::replying(&[]);
        let runner = LoopRunner::new(&generator, &critic, logger());

        let err = runner
            .run(LoopContext::new(TASK).with_max_iterations(0))
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::Config(_)));
    }
}
