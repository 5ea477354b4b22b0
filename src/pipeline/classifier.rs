//! Input classification: question vs. pleasantry.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::clients::CompletionClient;
use crate::pipeline::extract_json_object;
use crate::pipeline::state::InputType;

const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are an AI that classifies user inputs as either:
- 'question' if it seeks information, clarification, or problem-solving.
- 'pleasantry' if it is a greeting, small talk, or a social nicety (e.g. 'Hello', 'Hi').
Respond strictly in JSON with the single key 'type'.";

#[derive(Deserialize)]
struct ClassifierVerdict {
    #[serde(rename = "type")]
    input_type: InputType,
}

/// Decides whether a user utterance is a substantive question or a social
/// pleasantry.
///
/// One completion call, no retry. Any failure — service error, malformed
/// output, an unexpected label — defaults to [`InputType::Question`]: when
/// in doubt, attempt retrieval rather than silently skip it.
pub struct InputClassifier {
    completion: Arc<dyn CompletionClient>,
}

impl InputClassifier {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Classify one utterance. Empty or garbage text is passed through to
    /// the model, not rejected here.
    pub async fn classify(&self, utterance: &str) -> InputType {
        let user = format!("User input: {utterance}");
        match self.completion.complete(CLASSIFIER_SYSTEM_PROMPT, &user).await {
            Ok(raw) => match parse_verdict(&raw) {
                Some(InputType::Pleasantry) => InputType::Pleasantry,
                Some(InputType::Question) => InputType::Question,
                _ => {
                    warn!(reply = %raw, "unrecognized classifier output, defaulting to question");
                    InputType::Question
                }
            },
            Err(error) => {
                warn!(%error, "input classification failed, defaulting to question");
                InputType::Question
            }
        }
    }
}

fn parse_verdict(raw: &str) -> Option<InputType> {
    let object = extract_json_object(raw)?;
    serde_json::from_str::<ClassifierVerdict>(object)
        .ok()
        .map(|verdict| verdict.input_type)
}
