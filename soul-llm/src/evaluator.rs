//! The adapter between the LLM client and the engine's evaluator slot.

use tracing::{debug, warn};

use soul_core::{Belief, BeliefEvaluator, EmotionVector, Evaluation};

use crate::client::LlmClient;
use crate::prompt;
use crate::types::{LlmRequest, WireEvaluation};

/// LLM-backed [`BeliefEvaluator`].
///
/// On any transport, timeout, or parse failure the adapter returns
/// [`Evaluation::neutral`] and logs a warning — a flaky model never
/// corrupts engine state, and the engine itself never sees the failure.
/// Fabricated belief indices are dropped during wire conversion, so the
/// engine-side validation can never trip on this backend.
#[derive(Debug)]
pub struct LlmEvaluator {
    client: LlmClient,
    timeout_ms: u64,
}

impl LlmEvaluator {
    /// Wrap a configured client.
    #[must_use]
    pub fn new(client: LlmClient, timeout_ms: u64) -> Self {
        Self { client, timeout_ms }
    }

    fn evaluate_inner(
        &self,
        beliefs: &[Belief],
        emotions: &EmotionVector,
        scene: &str,
        conversation: &str,
    ) -> Result<Evaluation, crate::LlmError> {
        let user = prompt::evaluation_user_prompt(beliefs, emotions, scene, conversation);
        let request =
            LlmRequest::evaluation(prompt::EVALUATION_SYSTEM, user).with_timeout(self.timeout_ms);

        let response = self.client.generate(&request)?;
        debug!(
            latency_ms = response.latency_ms,
            model = %response.model,
            "belief evaluation completed"
        );
        let wire: WireEvaluation = LlmClient::parse_structured(&response)?;
        Ok(wire.into_evaluation(beliefs.len()))
    }
}

impl BeliefEvaluator for LlmEvaluator {
    fn evaluate(
        &self,
        beliefs: &[Belief],
        emotions: &EmotionVector,
        scene: &str,
        conversation: &str,
    ) -> Evaluation {
        if beliefs.is_empty() {
            return Evaluation::neutral();
        }
        match self.evaluate_inner(beliefs, emotions, scene, conversation) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!("belief evaluation failed, returning neutral: {e}");
                Evaluation::neutral()
            }
        }
    }
}
